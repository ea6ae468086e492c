//! Allocation policies: select a candidate free seat inside the caller's
//! transaction and try to claim it.
//!
//! All policies break ties the same way (lowest seat id wins the selection)
//! and none of them retries: a lost race or an empty selection is reported
//! to the orchestrator as-is.

use async_trait::async_trait;

use crate::error::BookingError;
use crate::model::SeatClaim;
use crate::store::{LockMode, SeatTx};

#[async_trait]
pub trait AllocationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// One claim attempt within `tx`. The orchestrator owns commit/rollback.
    async fn attempt(
        &self,
        tx: &mut dyn SeatTx,
        movie_id: i64,
        user_id: i64,
    ) -> Result<SeatClaim, BookingError>;
}

/// Read-modify-write with no row locking. Two concurrent attempts can select
/// the same seat; the conditional update arbitrates, and the loser gets
/// `LostRace`. Exists to expose the race, so it must not add any
/// serialization of its own.
pub struct Unsynchronized;

#[async_trait]
impl AllocationStrategy for Unsynchronized {
    fn name(&self) -> &'static str {
        "unsynchronized"
    }

    async fn attempt(
        &self,
        tx: &mut dyn SeatTx,
        movie_id: i64,
        user_id: i64,
    ) -> Result<SeatClaim, BookingError> {
        let seat = tx
            .find_free_seat(movie_id, LockMode::None)
            .await?
            .ok_or(BookingError::NoSeatAvailable)?;

        if tx.claim_seat(seat.id, user_id).await? == 0 {
            return Err(BookingError::LostRace { seat_id: seat.id });
        }

        Ok(SeatClaim {
            seat_id: seat.id,
            seat_name: seat.name,
        })
    }
}

/// Exclusive row lock with skip-locked selection. The selected row stays
/// free until commit, so the claim cannot race; contention shows up as
/// `NoSeatAvailable` when every remaining free seat is locked elsewhere.
/// Never waits on a locked row, which rules out deadlock.
pub struct LockedSkip;

#[async_trait]
impl AllocationStrategy for LockedSkip {
    fn name(&self) -> &'static str {
        "locked-skip"
    }

    async fn attempt(
        &self,
        tx: &mut dyn SeatTx,
        movie_id: i64,
        user_id: i64,
    ) -> Result<SeatClaim, BookingError> {
        let seat = tx
            .find_free_seat(movie_id, LockMode::ExclusiveSkip)
            .await?
            .ok_or(BookingError::NoSeatAvailable)?;

        if tx.claim_seat(seat.id, user_id).await? == 0 {
            return Err(BookingError::LostRace { seat_id: seat.id });
        }

        Ok(SeatClaim {
            seat_id: seat.id,
            seat_name: seat.name,
        })
    }
}

/// Exclusive row lock that waits on the contended lowest row instead of
/// skipping it. Attempts queue on the same seat, so throughput is the worst
/// of the three, but selection order is closest to strict id order.
pub struct LockedWait;

#[async_trait]
impl AllocationStrategy for LockedWait {
    fn name(&self) -> &'static str {
        "locked-wait"
    }

    async fn attempt(
        &self,
        tx: &mut dyn SeatTx,
        movie_id: i64,
        user_id: i64,
    ) -> Result<SeatClaim, BookingError> {
        let seat = tx
            .find_free_seat(movie_id, LockMode::Exclusive)
            .await?
            .ok_or(BookingError::NoSeatAvailable)?;

        if tx.claim_seat(seat.id, user_id).await? == 0 {
            return Err(BookingError::LostRace { seat_id: seat.id });
        }

        Ok(SeatClaim {
            seat_id: seat.id,
            seat_name: seat.name,
        })
    }
}
