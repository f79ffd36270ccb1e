use chrono::NaiveDate;
use uuid::Uuid;

use crate::store::{SharedStore, StoreError};
use crate::types::ConflictSummary;

/// Read-only availability test for a van over a half-open date range.
///
/// Delegates the overlap predicate to the store so it runs as one
/// set-oriented query. No side effects; a store failure propagates as
/// an error and is never reported as "available".
#[derive(Clone)]
pub struct AvailabilityOracle {
    store: SharedStore,
}

impl AvailabilityOracle {
    /// Create an oracle over the given store.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Whether `[start, end)` is free of blocking reservations.
    ///
    /// `exclude` skips one reservation, for re-validating an existing
    /// reservation under modification.
    pub async fn is_available(
        &self,
        van_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let blocked = self.store.has_overlap(van_id, start, end, exclude).await?;
        Ok(!blocked)
    }
}

/// Lists the reservations blocking a requested range, for rejection
/// payloads. Shares the overlap predicate with [`AvailabilityOracle`]
/// through the store, so the boolean decision and the listing cannot
/// diverge.
#[derive(Clone)]
pub struct ConflictResolver {
    store: SharedStore,
}

impl ConflictResolver {
    /// Create a resolver over the given store.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// The blocking reservations intersecting `[start, end)`, ascending
    /// by start date.
    pub async fn find_overlaps(
        &self,
        van_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<ConflictSummary>, StoreError> {
        let overlapping = self
            .store
            .overlapping_reservations(van_id, start, end, exclude)
            .await?;
        Ok(overlapping.iter().map(ConflictSummary::of).collect())
    }
}
