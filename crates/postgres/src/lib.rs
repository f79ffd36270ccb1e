//! # Postgres
//!
//! PostgreSQL storage layer for the van rental booking core: the
//! connection pool, the schema with the no-overlap exclusion
//! constraint, and the `ReservationStore` implementation.

/// Database pool management.
pub mod database;

/// Schema bootstrap for the booking tables.
pub mod schema;

/// `ReservationStore` implementation backed by PostgreSQL.
pub mod store;
pub use store::PgReservationStore;
