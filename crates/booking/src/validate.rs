use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::availability::{AvailabilityOracle, ConflictResolver};
use crate::store::{SharedStore, StoreError};
use crate::types::{AvailabilityWindow, ConflictSummary, Van, VanRef};
use crate::windows::WindowFinder;

/// Closed set of reasons a reservation request can be refused.
///
/// Stable codes consumed by the API layer for differentiated UX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    /// No van matches the given reference
    ResourceNotFound,
    /// The van exists but is not bookable
    ResourceInactive,
    /// The requested start date is in the past
    InvalidStartDate,
    /// The requested end date is not after the start date
    InvalidDateRange,
    /// A blocking reservation overlaps the requested range
    ResourceNotAvailable,
    /// The store failed; reserved for the API layer
    InfrastructureError,
}

impl RejectionReason {
    /// Stable wire code for this reason.
    pub fn code(self) -> &'static str {
        match self {
            RejectionReason::ResourceNotFound => "RESOURCE_NOT_FOUND",
            RejectionReason::ResourceInactive => "RESOURCE_INACTIVE",
            RejectionReason::InvalidStartDate => "INVALID_START_DATE",
            RejectionReason::InvalidDateRange => "INVALID_DATE_RANGE",
            RejectionReason::ResourceNotAvailable => "RESOURCE_NOT_AVAILABLE",
            RejectionReason::InfrastructureError => "INFRASTRUCTURE_ERROR",
        }
    }
}

/// Structured refusal returned to the caller, with the blocking
/// reservations and alternative windows when availability was the
/// problem.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    /// Why the request was refused
    pub reason: RejectionReason,
    /// Human-readable explanation
    pub message: String,
    /// Reservations blocking the requested range
    pub conflicts: Vec<ConflictSummary>,
    /// Alternative free windows of sufficient length
    pub suggestions: Vec<AvailabilityWindow>,
}

impl Rejection {
    /// A rejection carrying no conflict detail.
    pub fn plain(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
            conflicts: Vec::new(),
            suggestions: Vec::new(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason.code(), self.message)
    }
}

/// Outcome of the validation gate.
#[derive(Debug, Clone)]
pub enum Decision {
    /// The request may be committed against this van
    Accepted(Van),
    /// The request was refused
    Rejected(Rejection),
}

/// Sequential, short-circuiting gate combining van lookup, active
/// check, date sanity and the availability check.
///
/// This is the only place low-level signals are translated into the
/// closed [`RejectionReason`] set.
pub struct Validator {
    store: SharedStore,
    oracle: AvailabilityOracle,
    resolver: ConflictResolver,
    windows: WindowFinder,
}

impl Validator {
    /// Create a validator over the given store.
    pub fn new(store: SharedStore) -> Self {
        Self {
            oracle: AvailabilityOracle::new(store.clone()),
            resolver: ConflictResolver::new(store.clone()),
            windows: WindowFinder::new(store.clone()),
            store,
        }
    }

    /// Run the gate for a request over `[start, end)`.
    ///
    /// `exclude` skips one reservation during the availability check,
    /// for re-validating a reservation under modification. `today`
    /// anchors the past-date check.
    pub async fn validate(
        &self,
        van_ref: &VanRef,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
        today: NaiveDate,
    ) -> Result<Decision, StoreError> {
        let Some(van) = self.store.find_van(van_ref).await? else {
            return Ok(Decision::Rejected(Rejection::plain(
                RejectionReason::ResourceNotFound,
                format!("No van matches {van_ref}"),
            )));
        };

        if !van.active {
            return Ok(Decision::Rejected(Rejection::plain(
                RejectionReason::ResourceInactive,
                format!("Van '{}' is not currently bookable", van.slug),
            )));
        }

        if start < today {
            return Ok(Decision::Rejected(Rejection::plain(
                RejectionReason::InvalidStartDate,
                "The start date cannot be in the past",
            )));
        }
        if end <= start {
            return Ok(Decision::Rejected(Rejection::plain(
                RejectionReason::InvalidDateRange,
                "The end date must be after the start date",
            )));
        }

        if self.oracle.is_available(van.id, start, end, exclude).await? {
            return Ok(Decision::Accepted(van));
        }

        let conflicts = self
            .resolver
            .find_overlaps(van.id, start, end, exclude)
            .await?;
        let duration = end.signed_duration_since(start).num_days();
        let suggestions = self.windows.suggest(van.id, start, duration).await?;
        tracing::debug!(
            van_id = %van.id,
            conflicts = conflicts.len(),
            "request rejected for overlapping reservations"
        );
        Ok(Decision::Rejected(Rejection {
            reason: RejectionReason::ResourceNotAvailable,
            message: "The van is already booked for the requested dates".to_string(),
            conflicts,
            suggestions,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Days, Utc};

    use super::*;
    use crate::memory::InMemoryStore;
    use crate::store::{NewReservation, ReservationStore};
    use crate::types::{CustomerDetails, PricingSnapshot};

    fn van(active: bool) -> Van {
        Van {
            id: Uuid::new_v4(),
            slug: "california-t6".to_string(),
            name: "California T6".to_string(),
            active,
            daily_rate_cents: 11_000,
        }
    }

    fn day(offset: u64) -> NaiveDate {
        Utc::now().date_naive() + Days::new(offset)
    }

    async fn seed_reservation(store: &InMemoryStore, van_id: Uuid, start: NaiveDate, end: NaiveDate) {
        store
            .insert_reservation(&NewReservation {
                van_id,
                start_date: start,
                end_date: end,
                booking_number: format!("VAN-2030-{}", 1000 + start.signed_duration_since(day(0)).num_days()),
                customer: CustomerDetails {
                    name: "Kim Otte".to_string(),
                    email: "kim@example.com".to_string(),
                },
                pricing: PricingSnapshot {
                    base_price_cents: 0,
                    service_fee_cents: 0,
                    tax_cents: 0,
                    total_amount_cents: 0,
                },
            })
            .await
            .unwrap();
    }

    fn rejection(decision: Decision) -> Rejection {
        match decision {
            Decision::Rejected(r) => r,
            Decision::Accepted(_) => panic!("expected a rejection"),
        }
    }

    #[tokio::test]
    async fn accepts_free_range_on_active_van() {
        let store = Arc::new(InMemoryStore::new());
        let v = van(true);
        store.add_van(v.clone()).await;

        let validator = Validator::new(store);
        let decision = validator
            .validate(&VanRef::ById(v.id), day(1), day(5), None, day(0))
            .await
            .unwrap();
        assert!(matches!(decision, Decision::Accepted(accepted) if accepted.id == v.id));
    }

    #[tokio::test]
    async fn unknown_reference_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let validator = Validator::new(store);
        let decision = validator
            .validate(
                &VanRef::BySlug("no-such-van".to_string()),
                day(1),
                day(5),
                None,
                day(0),
            )
            .await
            .unwrap();
        assert_eq!(rejection(decision).reason, RejectionReason::ResourceNotFound);
    }

    #[tokio::test]
    async fn inactive_van_rejected_before_availability() {
        let store = Arc::new(InMemoryStore::new());
        let v = van(false);
        store.add_van(v.clone()).await;
        // An overlapping reservation exists, but the inactive check
        // must short-circuit first.
        seed_reservation(&store, v.id, day(1), day(5)).await;

        let validator = Validator::new(store);
        let decision = validator
            .validate(&VanRef::ById(v.id), day(1), day(5), None, day(0))
            .await
            .unwrap();
        assert_eq!(rejection(decision).reason, RejectionReason::ResourceInactive);
    }

    #[tokio::test]
    async fn past_start_date_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let v = van(true);
        store.add_van(v.clone()).await;

        let validator = Validator::new(store);
        let yesterday = day(1) - Days::new(2);
        let decision = validator
            .validate(&VanRef::ById(v.id), yesterday, day(5), None, day(0))
            .await
            .unwrap();
        assert_eq!(rejection(decision).reason, RejectionReason::InvalidStartDate);
    }

    #[tokio::test]
    async fn inverted_range_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let v = van(true);
        store.add_van(v.clone()).await;

        let validator = Validator::new(store);
        let decision = validator
            .validate(&VanRef::ById(v.id), day(5), day(5), None, day(0))
            .await
            .unwrap();
        assert_eq!(rejection(decision).reason, RejectionReason::InvalidDateRange);
    }

    #[tokio::test]
    async fn overlap_rejection_carries_conflicts_and_suggestions() {
        let store = Arc::new(InMemoryStore::new());
        let v = van(true);
        store.add_van(v.clone()).await;
        seed_reservation(&store, v.id, day(1), day(5)).await;
        seed_reservation(&store, v.id, day(10), day(15)).await;

        let validator = Validator::new(store);
        let decision = validator
            .validate(&VanRef::BySlug(v.slug.clone()), day(1), day(4), None, day(0))
            .await
            .unwrap();
        let rejection = rejection(decision);
        assert_eq!(rejection.reason, RejectionReason::ResourceNotAvailable);
        assert_eq!(rejection.conflicts.len(), 1);
        assert_eq!(rejection.conflicts[0].start_date, day(1));
        // First alternative window is the gap between the two bookings.
        assert_eq!(rejection.suggestions[0].start_date, day(5));
        assert_eq!(rejection.suggestions[0].end_date, day(10));
    }

    #[tokio::test]
    async fn excluded_reservation_does_not_block() {
        let store = Arc::new(InMemoryStore::new());
        let v = van(true);
        store.add_van(v.clone()).await;
        seed_reservation(&store, v.id, day(1), day(5)).await;
        let existing = store.reservations().await.remove(0);

        let validator = Validator::new(store);
        let decision = validator
            .validate(
                &VanRef::ById(v.id),
                day(1),
                day(6),
                Some(existing.id),
                day(0),
            )
            .await
            .unwrap();
        assert!(matches!(decision, Decision::Accepted(_)));
    }
}
