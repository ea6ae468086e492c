use thiserror::Error;

/// Outcome taxonomy for a single booking attempt.
///
/// `NoSeatAvailable` and `LostRace` are expected under load; `Store` is not.
/// A failed audit insert is deliberately absent here: the seat claim is the
/// source of truth for occupancy, so the orchestrator logs a warning and the
/// claim stands.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("no seat available")]
    NoSeatAvailable,

    #[error("seat {seat_id} was already booked by another user")]
    LostRace { seat_id: i64 },

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
