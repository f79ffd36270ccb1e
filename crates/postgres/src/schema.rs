//! Schema bootstrap for the booking tables.
//!
//! The no-overlap invariant lives in the database: a `btree_gist`
//! exclusion constraint over `(van_id, daterange(start_date, end_date))`
//! restricted to blocking statuses refuses a conflicting row even when
//! two handlers pass validation at the same time. The constraint also
//! fires on UPDATE, guarding status transitions back into a blocking
//! state. Booking number uniqueness is a plain unique constraint; the
//! committer retries on its violation.

use sqlx::PgPool;

/// DDL for the booking tables and constraints. Idempotent.
const SCHEMA: &str = r#"
CREATE EXTENSION IF NOT EXISTS btree_gist;

CREATE TABLE IF NOT EXISTS vans (
    id UUID PRIMARY KEY,
    slug TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    active BOOLEAN NOT NULL DEFAULT TRUE,
    daily_rate_cents BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS reservations (
    id UUID PRIMARY KEY,
    van_id UUID NOT NULL REFERENCES vans(id),
    start_date DATE NOT NULL,
    end_date DATE NOT NULL,
    status TEXT NOT NULL DEFAULT 'confirmed',
    booking_number TEXT NOT NULL,
    customer_name TEXT NOT NULL,
    customer_email TEXT NOT NULL,
    base_price_cents BIGINT NOT NULL,
    service_fee_cents BIGINT NOT NULL,
    tax_cents BIGINT NOT NULL,
    total_amount_cents BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT reservations_valid_range CHECK (start_date < end_date),
    CONSTRAINT reservations_valid_status CHECK (
        status IN ('pending', 'confirmed', 'cancelled', 'completed')
    ),
    CONSTRAINT reservations_booking_number_key UNIQUE (booking_number),
    CONSTRAINT reservations_no_overlap EXCLUDE USING gist (
        van_id WITH =,
        daterange(start_date, end_date) WITH &&
    ) WHERE (status IN ('pending', 'confirmed'))
);

CREATE INDEX IF NOT EXISTS idx_reservations_van_dates
    ON reservations (van_id, end_date);
"#;

/// Applies the booking schema to the connected database.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    tracing::info!("booking schema applied");
    Ok(())
}
