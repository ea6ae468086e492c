//! The transactional seat inventory store.
//!
//! Two backends implement the same pair of traits: `postgres` maps them to
//! real SQL (`FOR UPDATE [SKIP LOCKED]`), `memory` emulates row locking in
//! process so the demo and the test suite run without a server.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::model::{Booking, Seat};

/// Row-lock mode for free-seat selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockMode {
    /// Plain read, no row lock. Selection can race with concurrent writers.
    None,
    /// Lock the row exclusively; rows already locked by another in-flight
    /// transaction are skipped, not waited on.
    ExclusiveSkip,
    /// Lock the row exclusively, waiting on contended rows.
    Exclusive,
}

/// One unit of work against the seat inventory. Dropping a handle without
/// committing rolls the transaction back and releases its row locks.
#[async_trait]
pub trait SeatTx: Send {
    /// Lowest-id seat in the movie's pool with no assignee, honoring `lock`.
    /// `None` means no eligible row right now: either every free seat is
    /// locked elsewhere (skip mode) or none remain.
    async fn find_free_seat(
        &mut self,
        movie_id: i64,
        lock: LockMode,
    ) -> anyhow::Result<Option<Seat>>;

    /// Conditional assignment: sets the assignee only if the seat is still
    /// unassigned. Returns the number of rows affected; zero means a
    /// concurrent claimer got there first.
    async fn claim_seat(&mut self, seat_id: i64, user_id: i64) -> anyhow::Result<u64>;

    /// Appends one audit record for a claim.
    async fn record_booking(
        &mut self,
        user_id: i64,
        seat_id: i64,
        movie_id: i64,
    ) -> anyhow::Result<()>;

    async fn commit(self: Box<Self>) -> anyhow::Result<()>;

    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
}

#[async_trait]
pub trait SeatStore: Send + Sync {
    async fn begin(&self) -> anyhow::Result<Box<dyn SeatTx>>;

    /// Clears every assignee in the movie's pool and deletes its audit
    /// records. Idempotent; makes runs repeatable and independent.
    async fn reset_movie(&self, movie_id: i64) -> anyhow::Result<()>;

    async fn booked_count(&self, movie_id: i64) -> anyhow::Result<u64>;

    /// Every seat in the pool, ordered by id ascending.
    async fn seats(&self, movie_id: i64) -> anyhow::Result<Vec<Seat>>;

    /// Every audit record for the pool, ordered by id ascending.
    async fn bookings(&self, movie_id: i64) -> anyhow::Result<Vec<Booking>>;
}
