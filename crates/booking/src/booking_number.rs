use crate::store::{SharedStore, StoreError};

/// First sequence number issued in a fresh (prefix, year) scope.
pub const SEQ_START: u32 = 1001;

/// Format a booking number as `PREFIX-YEAR-SEQ`.
pub fn format_booking_number(prefix: &str, year: i32, seq: u32) -> String {
    format!("{prefix}-{year}-{seq}")
}

/// Numeric suffix of a `PREFIX-YEAR-SEQ` number, if it parses.
pub fn parse_seq(number: &str) -> Option<u32> {
    number.rsplit('-').next()?.parse().ok()
}

/// Produces unique, sortable, year-scoped booking numbers.
///
/// `next` only computes a candidate: reading the current maximum and
/// incrementing is a shared-counter race under concurrency, so
/// uniqueness is closed at insert time by the store's unique
/// constraint plus the committer's bounded retry.
#[derive(Clone)]
pub struct BookingNumberGenerator {
    store: SharedStore,
    prefix: String,
}

impl BookingNumberGenerator {
    /// Create a generator scoped to `prefix`.
    pub fn new(store: SharedStore, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    /// Next candidate booking number for `year`, starting at
    /// [`SEQ_START`] when the scope is empty.
    pub async fn next(&self, year: i32) -> Result<String, StoreError> {
        let seq = match self.store.max_booking_number(&self.prefix, year).await? {
            Some(current) => parse_seq(&current).map_or(SEQ_START, |s| s + 1),
            None => SEQ_START,
        };
        Ok(format_booking_number(&self.prefix, year, seq))
    }
}
