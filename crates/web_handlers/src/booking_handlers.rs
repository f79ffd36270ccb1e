use actix_web::{HttpResponse, Result, web};
use booking::{BookingService, CustomerDetails};
use validator::Validate;

use crate::booking_types::*;

/// Checks whether a van is free over a half-open date range
pub async fn check_availability(
    service: web::Data<BookingService>,
    request: web::Json<CheckAvailabilityRequest>,
) -> Result<HttpResponse, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {e}")))?;

    let van_ref = request.van_ref()?;
    let report = service
        .check_availability(&van_ref, request.start_date, request.end_date)
        .await?;

    Ok(HttpResponse::Ok().json(CheckAvailabilityResponse {
        available: report.available,
        conflicts: report.conflicts,
        suggested_dates: report.suggestions,
    }))
}

/// Creates a reservation for the requested van and date range
pub async fn create_reservation(
    service: web::Data<BookingService>,
    request: web::Json<CreateReservationRequest>,
) -> Result<HttpResponse, ApiError> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {e}")))?;

    let van_ref = request.van_ref()?;
    let customer = CustomerDetails {
        name: request.customer_name.clone(),
        email: request.customer_email.clone(),
    };
    let reservation = service
        .create_reservation(&van_ref, request.start_date, request.end_date, customer)
        .await?;

    log::info!("📅 Reservation {} committed", reservation.booking_number);

    Ok(HttpResponse::Created().json(CreateReservationResponse {
        booking_number: reservation.booking_number.clone(),
        reservation,
    }))
}
