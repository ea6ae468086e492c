//! Drives one booking attempt end-to-end: transaction, strategy, audit,
//! commit/rollback, and normalization of every outcome into a BookingResult.

use std::time::Instant;

use crate::booking::strategy::AllocationStrategy;
use crate::model::BookingResult;
use crate::store::SeatStore;

/// One allocation attempt for one requester.
///
/// The transaction is always finalized: committed on a successful claim,
/// rolled back on any failure path. Strategy and store errors never escape;
/// they come back as a failed result with a non-empty reason.
pub async fn book_one(
    store: &dyn SeatStore,
    strategy: &dyn AllocationStrategy,
    movie_id: i64,
    user_id: i64,
) -> BookingResult {
    let start = Instant::now();

    let mut tx = match store.begin().await {
        Ok(tx) => tx,
        Err(e) => {
            return BookingResult::failure(
                user_id,
                None,
                format!("failed to begin transaction: {e}"),
                start.elapsed(),
            );
        }
    };

    match strategy.attempt(tx.as_mut(), movie_id, user_id).await {
        Ok(claim) => {
            // Audit failure does not revoke the claim: the seat row is the
            // source of truth for occupancy.
            if let Err(e) = tx.record_booking(user_id, claim.seat_id, movie_id).await {
                tracing::warn!(
                    user_id,
                    seat_id = claim.seat_id,
                    error = %e,
                    "failed to insert booking record"
                );
            }

            match tx.commit().await {
                Ok(()) => BookingResult::success(user_id, claim, start.elapsed()),
                Err(e) => BookingResult::failure(
                    user_id,
                    Some(claim),
                    format!("failed to commit transaction: {e}"),
                    start.elapsed(),
                ),
            }
        }
        Err(e) => {
            if let Err(rb) = tx.rollback().await {
                tracing::warn!(user_id, error = %rb, "rollback failed");
            }
            BookingResult::failure(user_id, None, e.to_string(), start.elapsed())
        }
    }
}
