use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use rand::Rng;

use crate::booking_number::BookingNumberGenerator;
use crate::store::{CommitError, NewReservation, SharedStore};
use crate::types::{CustomerDetails, PricingSnapshot, Reservation, Van};

/// Fixed-percentage pricing policy applied once at commit time.
///
/// Rates are basis points over the base price; all arithmetic stays in
/// integer cents. Injectable so deployments can change the rates
/// without touching the committer.
#[derive(Debug, Clone, Copy)]
pub struct PricingPolicy {
    /// Service fee, in basis points of the base price
    pub service_fee_bps: i64,
    /// Tax, in basis points of the base price
    pub tax_bps: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            service_fee_bps: 1200,
            tax_bps: 1900,
        }
    }
}

impl PricingPolicy {
    /// Freeze a snapshot for `nights` at `daily_rate_cents`.
    pub fn quote(&self, daily_rate_cents: i64, nights: i64) -> PricingSnapshot {
        let base_price_cents = daily_rate_cents * nights;
        let service_fee_cents = base_price_cents * self.service_fee_bps / 10_000;
        let tax_cents = base_price_cents * self.tax_bps / 10_000;
        PricingSnapshot {
            base_price_cents,
            service_fee_cents,
            tax_cents,
            total_amount_cents: base_price_cents + service_fee_cents + tax_cents,
        }
    }
}

/// Insert attempts before giving up on booking number allocation.
const MAX_COMMIT_ATTEMPTS: u32 = 5;

/// Persists accepted reservations atomically.
///
/// The store re-runs the overlap predicate inside the same transaction
/// as the insert, so a validate-then-commit race surfaces here as
/// [`CommitError::Overlap`]. A booking number collision is the only
/// error retried, with jittered backoff and a bounded attempt count.
pub struct ReservationCommitter {
    store: SharedStore,
    numbers: BookingNumberGenerator,
    pricing: PricingPolicy,
}

impl ReservationCommitter {
    /// Create a committer issuing numbers under `prefix`.
    pub fn new(store: SharedStore, prefix: impl Into<String>, pricing: PricingPolicy) -> Self {
        Self {
            numbers: BookingNumberGenerator::new(store.clone(), prefix),
            store,
            pricing,
        }
    }

    /// Commit `[start, end)` for an already-validated request, freezing
    /// the pricing snapshot and allocating a booking number scoped to
    /// the current year.
    pub async fn commit(
        &self,
        van: &Van,
        start: NaiveDate,
        end: NaiveDate,
        customer: CustomerDetails,
    ) -> Result<Reservation, CommitError> {
        let nights = end.signed_duration_since(start).num_days();
        let pricing = self.pricing.quote(van.daily_rate_cents, nights);
        let year = Utc::now().year();

        let mut attempt = 0;
        loop {
            attempt += 1;
            let booking_number = self.numbers.next(year).await?;
            let new = NewReservation {
                van_id: van.id,
                start_date: start,
                end_date: end,
                booking_number: booking_number.clone(),
                customer: customer.clone(),
                pricing,
            };
            match self.store.insert_reservation(&new).await {
                Ok(reservation) => {
                    tracing::info!(
                        booking_number = %reservation.booking_number,
                        van_id = %van.id,
                        nights,
                        "reservation committed"
                    );
                    return Ok(reservation);
                }
                Err(CommitError::DuplicateBookingNumber) if attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::debug!(
                        %booking_number,
                        attempt,
                        "booking number taken concurrently, recomputing"
                    );
                    let jitter: u64 = rand::rng().random_range(5..25);
                    tokio::time::sleep(Duration::from_millis(u64::from(attempt) * 10 + jitter))
                        .await;
                }
                Err(other) => return Err(other),
            }
        }
    }
}
