//! PostgreSQL implementation of the booking core's `ReservationStore`.
//!
//! The overlap predicate is a single SQL `WHERE` fragment shared by
//! the boolean check, the conflict listing and the commit-time
//! re-check, so the accept/reject decision and the rejection detail
//! can never diverge.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use booking::{
    CommitError, NewReservation, Reservation, ReservationStatus, ReservationStore, StoreError,
    Van, VanRef,
};
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// The overlap predicate over half-open `[start, end)` intervals.
/// Bind order: $1 van id, $2 requested start, $3 requested end,
/// $4 optional excluded reservation id.
const OVERLAP_WHERE: &str = "van_id = $1 \
    AND status IN ('pending', 'confirmed') \
    AND NOT (end_date <= $2 OR start_date >= $3) \
    AND ($4::uuid IS NULL OR id <> $4)";

const RESERVATION_COLUMNS: &str = "id, van_id, start_date, end_date, status, booking_number, \
    customer_name, customer_email, base_price_cents, service_fee_cents, tax_cents, \
    total_amount_cents, created_at";

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Transient read failures are retried this many times.
const READ_RETRIES: u32 = 2;

/// PostgreSQL-backed reservation store.
#[derive(Clone)]
pub struct PgReservationStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgReservationStore {
    /// Create a store over an existing pool with the default deadline.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }

    /// Override the per-call deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a read query under the deadline, retrying transient
    /// failures a bounded number of times. Timeouts are not retried;
    /// they surface as [`StoreError::Timeout`] so a slow database is
    /// never mistaken for "available".
    async fn read<T, F, Fut>(&self, label: &'static str, mut query: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        let mut attempt = 0;
        loop {
            match tokio::time::timeout(self.timeout, query()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) if attempt < READ_RETRIES && is_transient(&e) => {
                    attempt += 1;
                    tracing::warn!(label, attempt, error = %e, "transient store error, retrying");
                }
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(StoreError::Timeout(label)),
            }
        }
    }

    async fn insert_tx(&self, new: &NewReservation) -> Result<Reservation, CommitError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;

        // Re-check inside the transaction closes the validate-then-commit
        // window for anything already committed; the exclusion constraint
        // below catches concurrent inserts this snapshot cannot see.
        let exists_sql =
            format!("SELECT EXISTS (SELECT 1 FROM reservations WHERE {OVERLAP_WHERE}) AS blocked");
        let row = sqlx::query(&exists_sql)
            .bind(new.van_id)
            .bind(new.start_date)
            .bind(new.end_date)
            .bind(None::<Uuid>)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        if row.get::<bool, _>("blocked") {
            return Err(CommitError::Overlap);
        }

        let insert_sql = format!(
            "INSERT INTO reservations (id, van_id, start_date, end_date, status, \
             booking_number, customer_name, customer_email, base_price_cents, \
             service_fee_cents, tax_cents, total_amount_cents) \
             VALUES ($1, $2, $3, $4, 'confirmed', $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {RESERVATION_COLUMNS}"
        );
        let row = sqlx::query(&insert_sql)
            .bind(Uuid::new_v4())
            .bind(new.van_id)
            .bind(new.start_date)
            .bind(new.end_date)
            .bind(&new.booking_number)
            .bind(&new.customer.name)
            .bind(&new.customer.email)
            .bind(new.pricing.base_price_cents)
            .bind(new.pricing.service_fee_cents)
            .bind(new.pricing.tax_cents)
            .bind(new.pricing.total_amount_cents)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_constraint_error)?;

        let reservation = reservation_from_row(&row).map_err(StoreError::from)?;
        tx.commit().await.map_err(StoreError::from)?;
        Ok(reservation)
    }
}

/// Translate constraint violations into typed commit outcomes instead
/// of raw database errors.
fn map_constraint_error(e: sqlx::Error) -> CommitError {
    if let sqlx::Error::Database(db) = &e {
        match db.constraint() {
            Some("reservations_no_overlap") => return CommitError::Overlap,
            Some("reservations_booking_number_key") => return CommitError::DuplicateBookingNumber,
            _ => {}
        }
    }
    CommitError::Store(e.into())
}

fn is_transient(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_))
}

fn reservation_from_row(row: &PgRow) -> Result<Reservation, sqlx::Error> {
    let status: String = row.get("status");
    let status = ReservationStatus::parse(&status)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown status '{status}'").into()))?;
    Ok(Reservation {
        id: row.get("id"),
        van_id: row.get("van_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status,
        booking_number: row.get("booking_number"),
        customer_name: row.get("customer_name"),
        customer_email: row.get("customer_email"),
        base_price_cents: row.get("base_price_cents"),
        service_fee_cents: row.get("service_fee_cents"),
        tax_cents: row.get("tax_cents"),
        total_amount_cents: row.get("total_amount_cents"),
        created_at: row.get("created_at"),
    })
}

fn van_from_row(row: &PgRow) -> Van {
    Van {
        id: row.get("id"),
        slug: row.get("slug"),
        name: row.get("name"),
        active: row.get("active"),
        daily_rate_cents: row.get("daily_rate_cents"),
    }
}

#[async_trait]
impl ReservationStore for PgReservationStore {
    async fn find_van(&self, van: &VanRef) -> Result<Option<Van>, StoreError> {
        let pool = self.pool.clone();
        let van = van.clone();
        let row = self
            .read("find_van", move || {
                let pool = pool.clone();
                let van = van.clone();
                async move {
                    match van {
                        VanRef::ById(id) => {
                            sqlx::query(
                                "SELECT id, slug, name, active, daily_rate_cents \
                                 FROM vans WHERE id = $1",
                            )
                            .bind(id)
                            .fetch_optional(&pool)
                            .await
                        }
                        VanRef::BySlug(slug) => {
                            sqlx::query(
                                "SELECT id, slug, name, active, daily_rate_cents \
                                 FROM vans WHERE slug = $1",
                            )
                            .bind(slug)
                            .fetch_optional(&pool)
                            .await
                        }
                    }
                }
            })
            .await?;
        Ok(row.as_ref().map(van_from_row))
    }

    async fn has_overlap(
        &self,
        van_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let pool = self.pool.clone();
        let sql =
            format!("SELECT EXISTS (SELECT 1 FROM reservations WHERE {OVERLAP_WHERE}) AS blocked");
        let row = self
            .read("has_overlap", move || {
                let pool = pool.clone();
                let sql = sql.clone();
                async move {
                    sqlx::query(&sql)
                        .bind(van_id)
                        .bind(start)
                        .bind(end)
                        .bind(exclude)
                        .fetch_one(&pool)
                        .await
                }
            })
            .await?;
        Ok(row.get("blocked"))
    }

    async fn overlapping_reservations(
        &self,
        van_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Reservation>, StoreError> {
        let pool = self.pool.clone();
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE {OVERLAP_WHERE} ORDER BY start_date ASC"
        );
        let rows = self
            .read("overlapping_reservations", move || {
                let pool = pool.clone();
                let sql = sql.clone();
                async move {
                    sqlx::query(&sql)
                        .bind(van_id)
                        .bind(start)
                        .bind(end)
                        .bind(exclude)
                        .fetch_all(&pool)
                        .await
                }
            })
            .await?;
        rows.iter()
            .map(|row| reservation_from_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn blocking_reservations_from(
        &self,
        van_id: Uuid,
        from: NaiveDate,
    ) -> Result<Vec<Reservation>, StoreError> {
        let pool = self.pool.clone();
        let sql = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations \
             WHERE van_id = $1 AND status IN ('pending', 'confirmed') AND end_date >= $2 \
             ORDER BY start_date ASC"
        );
        let rows = self
            .read("blocking_reservations_from", move || {
                let pool = pool.clone();
                let sql = sql.clone();
                async move {
                    sqlx::query(&sql)
                        .bind(van_id)
                        .bind(from)
                        .fetch_all(&pool)
                        .await
                }
            })
            .await?;
        rows.iter()
            .map(|row| reservation_from_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn max_booking_number(
        &self,
        prefix: &str,
        year: i32,
    ) -> Result<Option<String>, StoreError> {
        let pool = self.pool.clone();
        let pattern = format!("{prefix}-{year}-%");
        // Longer suffixes sort above shorter ones, so length-then-text
        // ordering is numeric ordering for the suffix.
        let row = self
            .read("max_booking_number", move || {
                let pool = pool.clone();
                let pattern = pattern.clone();
                async move {
                    sqlx::query(
                        "SELECT booking_number FROM reservations \
                         WHERE booking_number LIKE $1 \
                         ORDER BY LENGTH(booking_number) DESC, booking_number DESC \
                         LIMIT 1",
                    )
                    .bind(pattern)
                    .fetch_optional(&pool)
                    .await
                }
            })
            .await?;
        Ok(row.map(|r| r.get("booking_number")))
    }

    async fn insert_reservation(
        &self,
        new: &NewReservation,
    ) -> Result<Reservation, CommitError> {
        match tokio::time::timeout(self.timeout, self.insert_tx(new)).await {
            Ok(result) => result,
            Err(_) => Err(CommitError::Store(StoreError::Timeout("insert_reservation"))),
        }
    }

    async fn set_status(
        &self,
        id: Uuid,
        status: ReservationStatus,
    ) -> Result<Reservation, CommitError> {
        let sql = format!(
            "UPDATE reservations SET status = $2 WHERE id = $1 RETURNING {RESERVATION_COLUMNS}"
        );
        let update = async {
            // The exclusion constraint fires here too when moving back
            // into a blocking status over a taken interval.
            let row = sqlx::query(&sql)
                .bind(id)
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await
                .map_err(map_constraint_error)?;
            reservation_from_row(&row).map_err(|e| CommitError::Store(e.into()))
        };
        match tokio::time::timeout(self.timeout, update).await {
            Ok(result) => result,
            Err(_) => Err(CommitError::Store(StoreError::Timeout("set_status"))),
        }
    }
}
