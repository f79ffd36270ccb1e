use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::availability::ConflictResolver;
use crate::commit::{PricingPolicy, ReservationCommitter};
use crate::store::{CommitError, SharedStore, StoreError};
use crate::types::{AvailabilityWindow, ConflictSummary, CustomerDetails, Reservation, VanRef};
use crate::validate::{Decision, Rejection, RejectionReason, Validator};
use crate::windows::WindowFinder;

/// Answer to an availability probe.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    /// Whether the requested range can be booked
    pub available: bool,
    /// Reservations blocking the range, when unavailable
    pub conflicts: Vec<ConflictSummary>,
    /// Alternative free windows, when unavailable
    pub suggestions: Vec<AvailabilityWindow>,
}

/// Top-level failure of a booking operation.
///
/// Callers always receive either a confirmed reservation, a structured
/// rejection, or a typed infrastructure failure — never a raw database
/// error.
#[derive(thiserror::Error, Debug)]
pub enum BookingError {
    /// The request was refused for a domain reason
    #[error("{0}")]
    Rejected(Rejection),

    /// The store failed or timed out
    #[error(transparent)]
    Store(#[from] StoreError),

    /// No unique booking number could be allocated within the retry budget
    #[error("could not allocate a unique booking number")]
    BookingNumberExhausted,
}

/// Facade over the booking pipeline, exposing the two operations the
/// request layer consumes.
pub struct BookingService {
    validator: Validator,
    committer: ReservationCommitter,
    resolver: ConflictResolver,
    windows: WindowFinder,
}

impl BookingService {
    /// Wire the pipeline over a store, with the booking number prefix
    /// and the pricing policy to freeze at commit time.
    pub fn new(store: SharedStore, prefix: impl Into<String>, pricing: PricingPolicy) -> Self {
        Self {
            validator: Validator::new(store.clone()),
            committer: ReservationCommitter::new(store.clone(), prefix, pricing),
            resolver: ConflictResolver::new(store.clone()),
            windows: WindowFinder::new(store),
        }
    }

    /// Read-only availability probe. Idempotent: repeated calls without
    /// an intervening commit return the same answer.
    pub async fn check_availability(
        &self,
        van_ref: &VanRef,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AvailabilityReport, BookingError> {
        let today = Utc::now().date_naive();
        match self.validator.validate(van_ref, start, end, None, today).await? {
            Decision::Accepted(_) => Ok(AvailabilityReport {
                available: true,
                conflicts: Vec::new(),
                suggestions: Vec::new(),
            }),
            Decision::Rejected(rejection)
                if rejection.reason == RejectionReason::ResourceNotAvailable =>
            {
                Ok(AvailabilityReport {
                    available: false,
                    conflicts: rejection.conflicts,
                    suggestions: rejection.suggestions,
                })
            }
            Decision::Rejected(rejection) => Err(BookingError::Rejected(rejection)),
        }
    }

    /// Validate and atomically commit a reservation.
    ///
    /// Losing the validate-then-commit race is answered exactly like
    /// any other unavailability: a `RESOURCE_NOT_AVAILABLE` rejection
    /// with freshly recomputed conflicts and suggestions.
    pub async fn create_reservation(
        &self,
        van_ref: &VanRef,
        start: NaiveDate,
        end: NaiveDate,
        customer: CustomerDetails,
    ) -> Result<Reservation, BookingError> {
        let today = Utc::now().date_naive();
        let van = match self.validator.validate(van_ref, start, end, None, today).await? {
            Decision::Accepted(van) => van,
            Decision::Rejected(rejection) => return Err(BookingError::Rejected(rejection)),
        };

        match self.committer.commit(&van, start, end, customer).await {
            Ok(reservation) => Ok(reservation),
            Err(CommitError::Overlap) => {
                tracing::warn!(van_id = %van.id, "commit lost the availability race");
                let conflicts = self
                    .resolver
                    .find_overlaps(van.id, start, end, None)
                    .await?;
                let duration = end.signed_duration_since(start).num_days();
                let suggestions = self.windows.suggest(van.id, start, duration).await?;
                Err(BookingError::Rejected(Rejection {
                    reason: RejectionReason::ResourceNotAvailable,
                    message: "The van was booked by another request just now".to_string(),
                    conflicts,
                    suggestions,
                }))
            }
            Err(CommitError::DuplicateBookingNumber) => Err(BookingError::BookingNumberExhausted),
            Err(CommitError::Store(e)) => Err(BookingError::Store(e)),
        }
    }
}
