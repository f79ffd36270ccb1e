use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::store::{SharedStore, StoreError};
use crate::types::AvailabilityWindow;

/// How far past `from` the final open-ended gap is bounded, in days.
pub const SUGGESTION_HORIZON_DAYS: u64 = 365;

/// Maximum number of windows a suggestion carries.
pub const MAX_SUGGESTIONS: usize = 5;

/// Computes alternative free windows when a request is rejected.
#[derive(Clone)]
pub struct WindowFinder {
    store: SharedStore,
}

impl WindowFinder {
    /// Create a finder over the given store.
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Up to [`MAX_SUGGESTIONS`] free windows of at least
    /// `duration_days` nights starting at or after `from`, ascending by
    /// start date.
    pub async fn suggest(
        &self,
        van_id: Uuid,
        from: NaiveDate,
        duration_days: i64,
    ) -> Result<Vec<AvailabilityWindow>, StoreError> {
        let upcoming = self.store.blocking_reservations_from(van_id, from).await?;
        let busy: Vec<(NaiveDate, NaiveDate)> = upcoming
            .iter()
            .map(|r| (r.start_date, r.end_date))
            .collect();
        Ok(free_windows(&busy, from, duration_days))
    }
}

/// Build the free gaps between busy intervals.
///
/// `busy` must be sorted ascending by start (the store contract) and
/// contain only intervals with `end >= from`. The final gap runs from
/// the last busy end to `from + SUGGESTION_HORIZON_DAYS`; with no busy
/// intervals that single gap spans the whole horizon. Gaps shorter
/// than `duration_days` are dropped.
pub fn free_windows(
    busy: &[(NaiveDate, NaiveDate)],
    from: NaiveDate,
    duration_days: i64,
) -> Vec<AvailabilityWindow> {
    let horizon = from
        .checked_add_days(Days::new(SUGGESTION_HORIZON_DAYS))
        .unwrap_or(NaiveDate::MAX);

    let mut windows = Vec::new();
    let mut cursor = from;
    for &(start, end) in busy {
        if start >= horizon || windows.len() >= MAX_SUGGESTIONS {
            break;
        }
        if start > cursor {
            push_window(&mut windows, cursor, start, duration_days);
        }
        if end > cursor {
            cursor = end;
        }
    }
    if cursor < horizon && windows.len() < MAX_SUGGESTIONS {
        push_window(&mut windows, cursor, horizon, duration_days);
    }
    windows
}

fn push_window(
    windows: &mut Vec<AvailabilityWindow>,
    start: NaiveDate,
    end: NaiveDate,
    duration_days: i64,
) {
    let window = AvailabilityWindow {
        start_date: start,
        end_date: end,
    };
    if window.nights() >= duration_days {
        windows.push(window);
    }
}
