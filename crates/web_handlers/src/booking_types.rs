use booking::{
    AvailabilityWindow, BookingError, ConflictSummary, Rejection, RejectionReason, Reservation,
    VanRef,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request body for checking availability of a van.
#[derive(Debug, Deserialize, Validate)]
pub struct CheckAvailabilityRequest {
    /// Id of the van; exactly one of `van_id` / `van_slug` must be set
    pub van_id: Option<Uuid>,
    /// Slug of the van; alternative to `van_id`
    pub van_slug: Option<String>,
    /// First rental day (inclusive)
    pub start_date: NaiveDate,
    /// Day the van is returned (exclusive)
    pub end_date: NaiveDate,
}

impl CheckAvailabilityRequest {
    /// Resolve the tagged van reference, rejecting ambiguous input.
    pub fn van_ref(&self) -> Result<VanRef, ApiError> {
        resolve_van_ref(self.van_id, self.van_slug.as_deref())
    }
}

/// Request body for creating a reservation.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservationRequest {
    /// Id of the van; exactly one of `van_id` / `van_slug` must be set
    pub van_id: Option<Uuid>,
    /// Slug of the van; alternative to `van_id`
    pub van_slug: Option<String>,
    /// First rental day (inclusive)
    pub start_date: NaiveDate,
    /// Day the van is returned (exclusive)
    pub end_date: NaiveDate,
    /// Customer full name
    #[validate(length(min = 1, message = "Customer name is required"))]
    pub customer_name: String,
    /// Customer contact email
    #[validate(email(message = "A valid email address is required"))]
    pub customer_email: String,
}

impl CreateReservationRequest {
    /// Resolve the tagged van reference, rejecting ambiguous input.
    pub fn van_ref(&self) -> Result<VanRef, ApiError> {
        resolve_van_ref(self.van_id, self.van_slug.as_deref())
    }
}

fn resolve_van_ref(id: Option<Uuid>, slug: Option<&str>) -> Result<VanRef, ApiError> {
    match (id, slug) {
        (Some(id), None) => Ok(VanRef::ById(id)),
        (None, Some(slug)) => Ok(VanRef::BySlug(slug.to_string())),
        _ => Err(ApiError::BadRequest(
            "Exactly one of van_id or van_slug is required".to_string(),
        )),
    }
}

/// Response for the availability check endpoint.
#[derive(Debug, Serialize)]
pub struct CheckAvailabilityResponse {
    /// Whether the requested range can be booked
    pub available: bool,
    /// Reservations blocking the range, when unavailable
    pub conflicts: Vec<ConflictSummary>,
    /// Alternative free windows, when unavailable
    pub suggested_dates: Vec<AvailabilityWindow>,
}

/// Response for a committed reservation.
#[derive(Debug, Serialize)]
pub struct CreateReservationResponse {
    /// Human-readable booking number for confirmation messaging
    pub booking_number: String,
    /// The committed reservation
    pub reservation: Reservation,
}

/// API-level error translating core outcomes into HTTP responses.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// Malformed or ambiguous request body
    #[error("{0}")]
    BadRequest(String),

    /// Core booking failure
    #[error(transparent)]
    Booking(#[from] BookingError),
}

impl actix_web::ResponseError for ApiError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            ApiError::BadRequest(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "INVALID_REQUEST",
                "message": msg
            })),
            ApiError::Booking(BookingError::Rejected(rejection)) => rejection_response(rejection),
            ApiError::Booking(_) => {
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": RejectionReason::InfrastructureError.code(),
                    "message": "The booking service is temporarily unavailable"
                }))
            }
        }
    }
}

fn rejection_response(rejection: &Rejection) -> actix_web::HttpResponse {
    use actix_web::HttpResponse;

    let body = serde_json::json!({
        "error": rejection.reason.code(),
        "message": rejection.message,
        "conflicts": rejection.conflicts,
        "suggested_dates": rejection.suggestions,
    });
    match rejection.reason {
        RejectionReason::ResourceNotFound => HttpResponse::NotFound().json(body),
        RejectionReason::ResourceNotAvailable => HttpResponse::Conflict().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}
