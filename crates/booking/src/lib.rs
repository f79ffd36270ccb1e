//! # Booking
//!
//! Core booking-availability and conflict-prevention subsystem for the
//! van rental platform. Given a van and a requested half-open date
//! range `[start, end)`, it decides whether a reservation can be
//! accepted, rejects overlapping requests with the blocking
//! reservations and alternative free windows, allocates a
//! human-readable booking number, and commits the reservation
//! atomically through a [`ReservationStore`].

/// Domain types (vans, reservations, conflicts, windows, pricing)
mod types;
pub use types::*;

/// Storage abstraction and its error types
mod store;
pub use store::*;

/// In-memory store for tests and local development
mod memory;
pub use memory::*;

/// Read-only overlap checks (oracle + conflict listing)
mod availability;
pub use availability::*;

/// Alternative free window computation
mod windows;
pub use windows::*;

/// Year-scoped booking number allocation
mod booking_number;
pub use booking_number::*;

/// Sequential validation gate and rejection codes
mod validate;
pub use validate::*;

/// Pricing freeze and atomic reservation commit
mod commit;
pub use commit::*;

/// Facade exposing the two external operations
mod service;
pub use service::*;
