use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::model::{Booking, Seat};
use crate::store::{LockMode, SeatStore, SeatTx};

/// SQLx-backed implementation of the seat store.
/// Responsible only for SQL and row mapping; the locking semantics live in
/// the queries themselves.
pub struct PgSeatStore {
    pool: Arc<PgPool>,
}

impl PgSeatStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

pub struct PgSeatTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SeatTx for PgSeatTx {
    async fn find_free_seat(
        &mut self,
        movie_id: i64,
        lock: LockMode,
    ) -> anyhow::Result<Option<Seat>> {
        let sql = match lock {
            LockMode::None => {
                r#"
SELECT id, name, movie_id, user_id FROM seats
WHERE movie_id = $1 AND user_id IS NULL
ORDER BY id LIMIT 1;
"#
            }
            LockMode::ExclusiveSkip => {
                r#"
SELECT id, name, movie_id, user_id FROM seats
WHERE movie_id = $1 AND user_id IS NULL
ORDER BY id LIMIT 1
FOR UPDATE SKIP LOCKED;
"#
            }
            LockMode::Exclusive => {
                r#"
SELECT id, name, movie_id, user_id FROM seats
WHERE movie_id = $1 AND user_id IS NULL
ORDER BY id LIMIT 1
FOR UPDATE;
"#
            }
        };

        let row = sqlx::query(sql)
            .bind(movie_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(row_to_seat).transpose()
    }

    async fn claim_seat(&mut self, seat_id: i64, user_id: i64) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
UPDATE seats SET user_id = $1
WHERE id = $2 AND user_id IS NULL;
"#,
        )
        .bind(user_id)
        .bind(seat_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(res.rows_affected())
    }

    async fn record_booking(
        &mut self,
        user_id: i64,
        seat_id: i64,
        movie_id: i64,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO bookings (user_id, seat_id, movie_id) VALUES ($1, $2, $3);
"#,
        )
        .bind(user_id)
        .bind(seat_id)
        .bind(movie_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}

#[async_trait]
impl SeatStore for PgSeatStore {
    async fn begin(&self) -> anyhow::Result<Box<dyn SeatTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSeatTx { tx }))
    }

    async fn reset_movie(&self, movie_id: i64) -> anyhow::Result<()> {
        sqlx::query(r#"UPDATE seats SET user_id = NULL WHERE movie_id = $1;"#)
            .bind(movie_id)
            .execute(self.pool.as_ref())
            .await?;

        sqlx::query(r#"DELETE FROM bookings WHERE movie_id = $1;"#)
            .bind(movie_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn booked_count(&self, movie_id: i64) -> anyhow::Result<u64> {
        let count: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM seats WHERE movie_id = $1 AND user_id IS NOT NULL;"#,
        )
        .bind(movie_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        i64_to_u64(count)
    }

    async fn seats(&self, movie_id: i64) -> anyhow::Result<Vec<Seat>> {
        let rows = sqlx::query(
            r#"
SELECT id, name, movie_id, user_id FROM seats
WHERE movie_id = $1 ORDER BY id;
"#,
        )
        .bind(movie_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter().map(row_to_seat).collect()
    }

    async fn bookings(&self, movie_id: i64) -> anyhow::Result<Vec<Booking>> {
        let rows = sqlx::query(
            r#"
SELECT id, user_id, seat_id, movie_id, booking_time FROM bookings
WHERE movie_id = $1 ORDER BY id;
"#,
        )
        .bind(movie_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.iter()
            .map(|r| {
                Ok(Booking {
                    id: r.get("id"),
                    user_id: r.get("user_id"),
                    seat_id: r.get("seat_id"),
                    movie_id: r.get("movie_id"),
                    booking_time: r.get("booking_time"),
                })
            })
            .collect()
    }
}

/* =========================
Row mapping + conversions
========================= */

fn row_to_seat(r: &sqlx::postgres::PgRow) -> anyhow::Result<Seat> {
    Ok(Seat {
        id: r.get("id"),
        name: r.get::<String, _>("name"),
        movie_id: r.get("movie_id"),
        user_id: r.get::<Option<i64>, _>("user_id"),
    })
}

fn i64_to_u64(v: i64) -> anyhow::Result<u64> {
    if v < 0 {
        return Err(anyhow!("negative i64 where u64 expected: {v}"));
    }
    Ok(v as u64)
}
