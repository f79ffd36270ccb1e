//! # Web Handlers for the Van Rental Booking API
//!
//! This crate provides the web handlers for the availability-check and
//! reservation endpoints of the booking core.

/// Request/response types and API error mapping for booking endpoints
mod booking_types;
pub use booking_types::*;

/// Handlers for availability and reservation endpoints
mod booking_handlers;
pub use booking_handlers::*;
