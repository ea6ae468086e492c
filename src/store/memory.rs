//! In-process seat store with emulated row locking.
//!
//! Lock semantics mirror what the postgres backend gets from the database:
//! a transaction that selects a seat with an exclusive mode owns that row
//! until it commits, rolls back, or is dropped. Skip mode passes over rows
//! owned by another live transaction; wait mode polls until the contended
//! row is released or booked. Writes apply eagerly with an undo log, so a
//! rolled-back transaction leaves no trace.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::model::{Booking, Seat};
use crate::store::{LockMode, SeatStore, SeatTx};

const LOCK_WAIT_POLL: Duration = Duration::from_millis(1);

#[derive(Clone, Default)]
pub struct MemorySeatStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    seats: BTreeMap<i64, SeatRow>,
    bookings: Vec<Booking>,
    next_booking_id: i64,
    next_tx_id: u64,
}

struct SeatRow {
    seat: Seat,
    locked_by: Option<u64>,
}

enum Undo {
    Unclaim { seat_id: i64 },
    DropBooking { booking_id: i64 },
}

impl MemorySeatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the movie's pool with `count` fresh unassigned seats named
    /// Seat-1..Seat-N. Seat ids are allocated serially across the whole
    /// store, so pools for different movies never collide. Calling it again
    /// rebuilds the same pool.
    pub fn seed(&self, movie_id: i64, count: u32) {
        let mut inner = self.inner.lock();
        inner.seats.retain(|_, row| row.seat.movie_id != movie_id);
        inner.bookings.retain(|b| b.movie_id != movie_id);
        let mut next_id = inner.seats.keys().next_back().copied().unwrap_or(0);
        for i in 1..=i64::from(count) {
            next_id += 1;
            inner.seats.insert(
                next_id,
                SeatRow {
                    seat: Seat {
                        id: next_id,
                        name: format!("Seat-{i}"),
                        movie_id,
                        user_id: None,
                    },
                    locked_by: None,
                },
            );
        }
    }
}

pub struct MemorySeatTx {
    inner: Arc<Mutex<Inner>>,
    id: u64,
    locks: Vec<i64>,
    undo: Vec<Undo>,
    finished: bool,
}

/// Outcome of one guarded pass over the pool in wait mode.
enum WaitPass {
    Found(Option<Seat>),
    Contended,
}

impl MemorySeatTx {
    /// Single pass under the store mutex. For exclusive modes the returned
    /// seat is locked to this transaction before the mutex is released.
    fn select_free(&mut self, movie_id: i64, lock: LockMode) -> Option<Seat> {
        let mut inner = self.inner.lock();
        let id = self.id;
        let row = inner.seats.values_mut().find(|row| {
            row.seat.movie_id == movie_id
                && row.seat.user_id.is_none()
                && (lock == LockMode::None
                    || row.locked_by.is_none()
                    || row.locked_by == Some(id))
        })?;
        if lock != LockMode::None {
            row.locked_by = Some(id);
            if !self.locks.contains(&row.seat.id) {
                self.locks.push(row.seat.id);
            }
        }
        Some(row.seat.clone())
    }

    /// Wait-mode pass: stops at the lowest free seat even when it is locked
    /// by someone else, reporting contention instead of skipping ahead.
    fn select_free_waiting(&mut self, movie_id: i64) -> WaitPass {
        let mut inner = self.inner.lock();
        let id = self.id;
        let Some(row) = inner
            .seats
            .values_mut()
            .find(|row| row.seat.movie_id == movie_id && row.seat.user_id.is_none())
        else {
            return WaitPass::Found(None);
        };
        match row.locked_by {
            Some(owner) if owner != id => WaitPass::Contended,
            _ => {
                row.locked_by = Some(id);
                let seat = row.seat.clone();
                if !self.locks.contains(&seat.id) {
                    self.locks.push(seat.id);
                }
                WaitPass::Found(Some(seat))
            }
        }
    }

    fn finish(&mut self, commit: bool) {
        if self.finished {
            return;
        }
        let mut inner = self.inner.lock();
        if commit {
            self.undo.clear();
        } else {
            for op in self.undo.drain(..).rev() {
                match op {
                    Undo::Unclaim { seat_id } => {
                        if let Some(row) = inner.seats.get_mut(&seat_id) {
                            row.seat.user_id = None;
                        }
                    }
                    Undo::DropBooking { booking_id } => {
                        inner.bookings.retain(|b| b.id != booking_id);
                    }
                }
            }
        }
        for seat_id in self.locks.drain(..) {
            if let Some(row) = inner.seats.get_mut(&seat_id) {
                if row.locked_by == Some(self.id) {
                    row.locked_by = None;
                }
            }
        }
        self.finished = true;
    }
}

#[async_trait]
impl SeatTx for MemorySeatTx {
    async fn find_free_seat(
        &mut self,
        movie_id: i64,
        lock: LockMode,
    ) -> anyhow::Result<Option<Seat>> {
        match lock {
            LockMode::None | LockMode::ExclusiveSkip => Ok(self.select_free(movie_id, lock)),
            LockMode::Exclusive => loop {
                match self.select_free_waiting(movie_id) {
                    WaitPass::Found(seat) => return Ok(seat),
                    WaitPass::Contended => tokio::time::sleep(LOCK_WAIT_POLL).await,
                }
            },
        }
    }

    async fn claim_seat(&mut self, seat_id: i64, user_id: i64) -> anyhow::Result<u64> {
        let mut inner = self.inner.lock();
        let Some(row) = inner.seats.get_mut(&seat_id) else {
            return Err(anyhow!("unknown seat id {seat_id}"));
        };
        if row.seat.user_id.is_some() {
            return Ok(0);
        }
        row.seat.user_id = Some(user_id);
        self.undo.push(Undo::Unclaim { seat_id });
        Ok(1)
    }

    async fn record_booking(
        &mut self,
        user_id: i64,
        seat_id: i64,
        movie_id: i64,
    ) -> anyhow::Result<()> {
        let mut inner = self.inner.lock();
        inner.next_booking_id += 1;
        let booking_id = inner.next_booking_id;
        inner.bookings.push(Booking {
            id: booking_id,
            user_id,
            seat_id,
            movie_id,
            booking_time: Utc::now(),
        });
        self.undo.push(Undo::DropBooking { booking_id });
        Ok(())
    }

    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let mut tx = self;
        tx.finish(true);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        let mut tx = self;
        tx.finish(false);
        Ok(())
    }
}

impl Drop for MemorySeatTx {
    fn drop(&mut self) {
        // Abandoned handle: undo its writes and release its row locks.
        self.finish(false);
    }
}

#[async_trait]
impl SeatStore for MemorySeatStore {
    async fn begin(&self) -> anyhow::Result<Box<dyn SeatTx>> {
        let id = {
            let mut inner = self.inner.lock();
            inner.next_tx_id += 1;
            inner.next_tx_id
        };
        Ok(Box::new(MemorySeatTx {
            inner: Arc::clone(&self.inner),
            id,
            locks: Vec::new(),
            undo: Vec::new(),
            finished: false,
        }))
    }

    async fn reset_movie(&self, movie_id: i64) -> anyhow::Result<()> {
        let mut inner = self.inner.lock();
        for row in inner.seats.values_mut() {
            if row.seat.movie_id == movie_id {
                row.seat.user_id = None;
            }
        }
        inner.bookings.retain(|b| b.movie_id != movie_id);
        Ok(())
    }

    async fn booked_count(&self, movie_id: i64) -> anyhow::Result<u64> {
        let inner = self.inner.lock();
        Ok(inner
            .seats
            .values()
            .filter(|row| row.seat.movie_id == movie_id && row.seat.user_id.is_some())
            .count() as u64)
    }

    async fn seats(&self, movie_id: i64) -> anyhow::Result<Vec<Seat>> {
        let inner = self.inner.lock();
        Ok(inner
            .seats
            .values()
            .filter(|row| row.seat.movie_id == movie_id)
            .map(|row| row.seat.clone())
            .collect())
    }

    async fn bookings(&self, movie_id: i64) -> anyhow::Result<Vec<Booking>> {
        let inner = self.inner.lock();
        Ok(inner
            .bookings
            .iter()
            .filter(|b| b.movie_id == movie_id)
            .cloned()
            .collect())
    }
}
