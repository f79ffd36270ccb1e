use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A rentable camper van as seen by the booking core.
///
/// The van catalog is owned elsewhere; only the fields needed for the
/// accept/reject decision and the pricing snapshot are read here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Van {
    /// Unique identifier of the van
    pub id: Uuid,
    /// URL-friendly identifier, unique across the fleet
    pub slug: String,
    /// Display name of the van
    pub name: String,
    /// Whether the van can currently be booked
    pub active: bool,
    /// Rental rate per night, in cents
    pub daily_rate_cents: i64,
}

/// Tagged reference used to look a van up.
///
/// The caller states explicitly whether it holds an id or a slug; the
/// reference is resolved exactly once at validation entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VanRef {
    /// Lookup by primary key
    ById(Uuid),
    /// Lookup by slug
    BySlug(String),
}

impl fmt::Display for VanRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VanRef::ById(id) => write!(f, "id {id}"),
            VanRef::BySlug(slug) => write!(f, "slug '{slug}'"),
        }
    }
}

/// Lifecycle status of a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    /// Awaiting confirmation; blocks availability
    Pending,
    /// Confirmed booking; blocks availability
    Confirmed,
    /// Cancelled; no longer blocks availability
    Cancelled,
    /// Rental finished; no longer blocks availability
    Completed,
}

impl ReservationStatus {
    /// Whether a reservation in this status blocks the van's dates.
    pub fn blocks_availability(self) -> bool {
        matches!(
            self,
            ReservationStatus::Pending | ReservationStatus::Confirmed
        )
    }

    /// Stable string form, as stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
            ReservationStatus::Completed => "completed",
        }
    }

    /// Parse the stored string form back into a status.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ReservationStatus::Pending),
            "confirmed" => Some(ReservationStatus::Confirmed),
            "cancelled" => Some(ReservationStatus::Cancelled),
            "completed" => Some(ReservationStatus::Completed),
            _ => None,
        }
    }
}

/// A booking of a van over a half-open `[start_date, end_date)` range.
///
/// Once committed, the van, dates and booking number are immutable;
/// only the status may transition afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Reservation {
    /// Unique identifier of the reservation
    pub id: Uuid,
    /// Van being reserved
    pub van_id: Uuid,
    /// First rental day (inclusive)
    pub start_date: NaiveDate,
    /// Day the van is returned (exclusive)
    pub end_date: NaiveDate,
    /// Current lifecycle status
    pub status: ReservationStatus,
    /// Human-readable, year-scoped booking number
    pub booking_number: String,
    /// Customer full name
    pub customer_name: String,
    /// Customer contact email
    pub customer_email: String,
    /// Frozen base price (daily rate × nights), in cents
    pub base_price_cents: i64,
    /// Frozen service fee, in cents
    pub service_fee_cents: i64,
    /// Frozen tax, in cents
    pub tax_cents: i64,
    /// Frozen total amount, in cents
    pub total_amount_cents: i64,
    /// When the reservation was committed
    pub created_at: DateTime<Utc>,
}

impl Reservation {
    /// Number of nights covered by the reservation.
    pub fn nights(&self) -> i64 {
        self.end_date.signed_duration_since(self.start_date).num_days()
    }
}

/// Customer identity captured on a reservation.
#[derive(Debug, Clone)]
pub struct CustomerDetails {
    /// Full name of the customer
    pub name: String,
    /// Contact email of the customer
    pub email: String,
}

/// View of a reservation blocking a requested range. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ConflictSummary {
    /// Id of the blocking reservation
    pub reservation_id: Uuid,
    /// Booking number of the blocking reservation
    pub booking_number: String,
    /// First blocked day (inclusive)
    pub start_date: NaiveDate,
    /// First free day after the block (exclusive end)
    pub end_date: NaiveDate,
    /// Status of the blocking reservation
    pub status: ReservationStatus,
    /// Who holds the blocking reservation
    pub customer_name: String,
}

impl ConflictSummary {
    /// Build a summary from a blocking reservation.
    pub fn of(reservation: &Reservation) -> Self {
        Self {
            reservation_id: reservation.id,
            booking_number: reservation.booking_number.clone(),
            start_date: reservation.start_date,
            end_date: reservation.end_date,
            status: reservation.status,
            customer_name: reservation.customer_name.clone(),
        }
    }
}

/// A computed free interval long enough to host a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AvailabilityWindow {
    /// First free day (inclusive)
    pub start_date: NaiveDate,
    /// End of the free interval (exclusive)
    pub end_date: NaiveDate,
}

impl AvailabilityWindow {
    /// Length of the window in nights.
    pub fn nights(&self) -> i64 {
        self.end_date.signed_duration_since(self.start_date).num_days()
    }
}

/// Frozen pricing captured at commit time, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingSnapshot {
    /// Daily rate × nights
    pub base_price_cents: i64,
    /// Service fee computed once at commit time
    pub service_fee_cents: i64,
    /// Tax computed once at commit time
    pub tax_cents: i64,
    /// Sum of base, fee and tax
    pub total_amount_cents: i64,
}
