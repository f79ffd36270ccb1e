//! In-memory reservation store.
//!
//! Stores everything in a single mutex-guarded structure, which makes
//! the conditional insert one critical section — the moral equivalent
//! of the exclusion constraint the PostgreSQL store relies on. Suited
//! for unit tests and local development.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::booking_number::parse_seq;
use crate::store::*;
use crate::types::*;

/// In-memory `ReservationStore`.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    data: Arc<Mutex<MemoryData>>,
}

#[derive(Default)]
struct MemoryData {
    vans: HashMap<Uuid, Van>,
    reservations: Vec<Reservation>,
}

/// The overlap predicate over half-open `[start, end)` intervals,
/// identical for the boolean check and the conflict listing.
fn blocks(
    reservation: &Reservation,
    van_id: Uuid,
    start: NaiveDate,
    end: NaiveDate,
    exclude: Option<Uuid>,
) -> bool {
    reservation.van_id == van_id
        && reservation.status.blocks_availability()
        && exclude != Some(reservation.id)
        && !(end <= reservation.start_date || start >= reservation.end_date)
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a van in the catalog.
    pub async fn add_van(&self, van: Van) {
        self.data.lock().await.vans.insert(van.id, van);
    }

    /// Snapshot of all reservations, for assertions.
    pub async fn reservations(&self) -> Vec<Reservation> {
        self.data.lock().await.reservations.clone()
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn find_van(&self, van: &VanRef) -> Result<Option<Van>, StoreError> {
        let data = self.data.lock().await;
        let found = match van {
            VanRef::ById(id) => data.vans.get(id).cloned(),
            VanRef::BySlug(slug) => data.vans.values().find(|v| &v.slug == slug).cloned(),
        };
        Ok(found)
    }

    async fn has_overlap(
        &self,
        van_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let data = self.data.lock().await;
        Ok(data
            .reservations
            .iter()
            .any(|r| blocks(r, van_id, start, end, exclude)))
    }

    async fn overlapping_reservations(
        &self,
        van_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Reservation>, StoreError> {
        let data = self.data.lock().await;
        let mut overlapping: Vec<Reservation> = data
            .reservations
            .iter()
            .filter(|r| blocks(r, van_id, start, end, exclude))
            .cloned()
            .collect();
        overlapping.sort_by_key(|r| r.start_date);
        Ok(overlapping)
    }

    async fn blocking_reservations_from(
        &self,
        van_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError> {
        let data = self.data.lock().await;
        let mut upcoming: Vec<Reservation> = data
            .reservations
            .iter()
            .filter(|r| {
                r.van_id == van_id && r.status.blocks_availability() && r.end_date >= from
            })
            .cloned()
            .collect();
        upcoming.sort_by_key(|r| r.start_date);
        Ok(upcoming)
    }

    async fn max_booking_number(
        &self,
        prefix: &str,
        year: i32,
    ) -> Result<Option<String>, StoreError> {
        let scope = format!("{prefix}-{year}-");
        let data = self.data.lock().await;
        Ok(data
            .reservations
            .iter()
            .filter(|r| r.booking_number.starts_with(&scope))
            .max_by_key(|r| parse_seq(&r.booking_number))
            .map(|r| r.booking_number.clone()))
    }

    async fn insert_reservation(
        &self,
        new: &NewReservation,
    ) -> Result<Reservation, CommitError> {
        // Check-and-insert under one lock; nothing can interleave.
        let mut data = self.data.lock().await;
        if data
            .reservations
            .iter()
            .any(|r| blocks(r, new.van_id, new.start_date, new.end_date, None))
        {
            return Err(CommitError::Overlap);
        }
        if data
            .reservations
            .iter()
            .any(|r| r.booking_number == new.booking_number)
        {
            return Err(CommitError::DuplicateBookingNumber);
        }

        let reservation = Reservation {
            id: Uuid::new_v4(),
            van_id: new.van_id,
            start_date: new.start_date,
            end_date: new.end_date,
            status: ReservationStatus::Confirmed,
            booking_number: new.booking_number.clone(),
            customer_name: new.customer.name.clone(),
            customer_email: new.customer.email.clone(),
            base_price_cents: new.pricing.base_price_cents,
            service_fee_cents: new.pricing.service_fee_cents,
            tax_cents: new.pricing.tax_cents,
            total_amount_cents: new.pricing.total_amount_cents,
            created_at: Utc::now(),
        };
        data.reservations.push(reservation.clone());
        Ok(reservation)
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<Reservation, CommitError> {
        let mut data = self.data.lock().await;
        let index = data
            .reservations
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))?;

        if status.blocks_availability() {
            let (van_id, start, end) = {
                let r = &data.reservations[index];
                (r.van_id, r.start_date, r.end_date)
            };
            if data
                .reservations
                .iter()
                .any(|r| blocks(r, van_id, start, end, Some(id)))
            {
                return Err(CommitError::Overlap);
            }
        }

        data.reservations[index].status = status;
        Ok(data.reservations[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Days;

    use super::*;

    fn van() -> Van {
        Van {
            id: Uuid::new_v4(),
            slug: "kombi-73".to_string(),
            name: "Kombi '73".to_string(),
            active: true,
            daily_rate_cents: 9_500,
        }
    }

    fn new_reservation(van_id: Uuid, start: NaiveDate, end: NaiveDate, number: &str) -> NewReservation {
        NewReservation {
            van_id,
            start_date: start,
            end_date: end,
            booking_number: number.to_string(),
            customer: CustomerDetails {
                name: "Ana Souza".to_string(),
                email: "ana@example.com".to_string(),
            },
            pricing: PricingSnapshot {
                base_price_cents: 38_000,
                service_fee_cents: 4_560,
                tax_cents: 7_220,
                total_amount_cents: 49_780,
            },
        }
    }

    fn day(offset: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, 1).unwrap() + Days::new(offset)
    }

    #[tokio::test]
    async fn insert_then_overlap_detected() {
        let store = InMemoryStore::new();
        let v = van();
        store.add_van(v.clone()).await;

        store
            .insert_reservation(&new_reservation(v.id, day(0), day(4), "VAN-2030-1001"))
            .await
            .unwrap();

        assert!(store.has_overlap(v.id, day(2), day(6), None).await.unwrap());
        assert!(!store.has_overlap(v.id, day(4), day(8), None).await.unwrap());
    }

    #[tokio::test]
    async fn second_overlapping_insert_is_refused() {
        let store = InMemoryStore::new();
        let v = van();
        store.add_van(v.clone()).await;

        store
            .insert_reservation(&new_reservation(v.id, day(0), day(4), "VAN-2030-1001"))
            .await
            .unwrap();
        let err = store
            .insert_reservation(&new_reservation(v.id, day(2), day(6), "VAN-2030-1002"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::Overlap));
    }

    #[tokio::test]
    async fn duplicate_booking_number_is_refused() {
        let store = InMemoryStore::new();
        let v = van();
        store.add_van(v.clone()).await;

        store
            .insert_reservation(&new_reservation(v.id, day(0), day(4), "VAN-2030-1001"))
            .await
            .unwrap();
        let err = store
            .insert_reservation(&new_reservation(v.id, day(10), day(12), "VAN-2030-1001"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::DuplicateBookingNumber));
    }

    #[tokio::test]
    async fn max_booking_number_orders_numerically() {
        let store = InMemoryStore::new();
        let v = van();
        store.add_van(v.clone()).await;

        for (i, number) in ["VAN-2030-1001", "VAN-2030-10002", "VAN-2030-1003"]
            .iter()
            .enumerate()
        {
            let start = day(10 * i as u64);
            store
                .insert_reservation(&new_reservation(v.id, start, start + Days::new(2), number))
                .await
                .unwrap();
        }

        let max = store.max_booking_number("VAN", 2030).await.unwrap();
        assert_eq!(max.as_deref(), Some("VAN-2030-10002"));
        assert_eq!(store.max_booking_number("VAN", 2031).await.unwrap(), None);
    }

    #[tokio::test]
    async fn cancelled_reservation_releases_interval() {
        let store = InMemoryStore::new();
        let v = van();
        store.add_van(v.clone()).await;

        let r = store
            .insert_reservation(&new_reservation(v.id, day(0), day(4), "VAN-2030-1001"))
            .await
            .unwrap();
        store
            .set_status(r.id, ReservationStatus::Cancelled)
            .await
            .unwrap();

        assert!(!store.has_overlap(v.id, day(0), day(4), None).await.unwrap());
        store
            .insert_reservation(&new_reservation(v.id, day(0), day(4), "VAN-2030-1002"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn reinstating_over_taken_interval_is_refused() {
        let store = InMemoryStore::new();
        let v = van();
        store.add_van(v.clone()).await;

        let first = store
            .insert_reservation(&new_reservation(v.id, day(0), day(4), "VAN-2030-1001"))
            .await
            .unwrap();
        store
            .set_status(first.id, ReservationStatus::Cancelled)
            .await
            .unwrap();
        store
            .insert_reservation(&new_reservation(v.id, day(0), day(4), "VAN-2030-1002"))
            .await
            .unwrap();

        let err = store
            .set_status(first.id, ReservationStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, CommitError::Overlap));
    }
}
