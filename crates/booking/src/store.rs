use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::types::*;

/// Failure talking to the reservation store.
///
/// A store problem is never reported as "available" or "success"; it
/// always surfaces as one of these variants.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A storage call exceeded its deadline
    #[error("storage timeout during {0}")]
    Timeout(&'static str),
}

/// Outcome of the conditional insert (and of blocking status
/// transitions).
#[derive(thiserror::Error, Debug)]
pub enum CommitError {
    /// The range was taken between validation and commit
    #[error("the requested date range is no longer available")]
    Overlap,

    /// The booking number was allocated concurrently by another handler
    #[error("booking number already in use")]
    DuplicateBookingNumber,

    /// Underlying store failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Reservation row to be inserted. Status is always `confirmed` at
/// insert time; payment capture happened upstream.
#[derive(Debug, Clone)]
pub struct NewReservation {
    /// Van being reserved
    pub van_id: Uuid,
    /// First rental day (inclusive)
    pub start_date: NaiveDate,
    /// Day the van is returned (exclusive)
    pub end_date: NaiveDate,
    /// Pre-allocated booking number candidate
    pub booking_number: String,
    /// Customer identity
    pub customer: CustomerDetails,
    /// Frozen pricing snapshot
    pub pricing: PricingSnapshot,
}

/// Shared handle to a reservation store.
pub type SharedStore = Arc<dyn ReservationStore>;

/// Storage abstraction for the booking core.
///
/// All correctness under concurrency comes from the implementations:
/// `insert_reservation` must atomically re-check the overlap predicate
/// against the insert (transaction re-check, exclusion constraint, or
/// an equivalent single critical section).
#[async_trait]
pub trait ReservationStore: Send + Sync {
    /// Resolve a tagged van reference to the catalog row, if any.
    async fn find_van(&self, van: &VanRef) -> Result<Option<Van>, StoreError>;

    /// Whether any blocking reservation intersects `[start, end)`.
    ///
    /// Evaluated as one set-oriented query, never a client-side loop.
    /// `exclude` skips a reservation being re-validated under
    /// modification.
    async fn has_overlap(
        &self,
        van_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError>;

    /// The blocking reservations intersecting `[start, end)`, ascending
    /// by start date. Must use the same predicate as [`Self::has_overlap`]
    /// so the boolean decision and the detail listing never diverge.
    async fn overlapping_reservations(
        &self,
        van_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Blocking reservations of a van with `end_date >= from`, ascending
    /// by start date. Input to gap construction.
    async fn blocking_reservations_from(
        &self,
        van_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError>;

    /// Highest existing booking number matching `PREFIX-YEAR-%`, if any.
    async fn max_booking_number(
        &self,
        prefix: &str,
        year: i32,
    ) -> Result<Option<String>, StoreError>;

    /// Atomic conditional insert: persist the reservation unless the
    /// range is blocked or the booking number is taken.
    async fn insert_reservation(
        &self,
        new: &NewReservation,
    ) -> Result<Reservation, CommitError>;

    /// Transition a reservation's status. Moving *into* a blocking
    /// status re-checks the overlap invariant; cancelling releases the
    /// interval.
    async fn set_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<Reservation, CommitError>;
}
