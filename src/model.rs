use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One allocatable seat. `user_id` is `None` until a requester claims it;
/// at most one committed assignee exists per seat at any time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    pub name: String,
    pub movie_id: i64,
    pub user_id: Option<i64>,
}

/// A requester competing for a seat. Immutable for the duration of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// The showing that scopes one pool of seats.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub duration_minutes: i32,
    pub release_date: NaiveDate,
}

/// Append-only proof-of-claim record. Written once on a successful claim,
/// never updated; deleted only by a reset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub seat_id: i64,
    pub movie_id: i64,
    pub booking_time: DateTime<Utc>,
}

/// Strategy success value: the seat this transaction has claimed.
#[derive(Clone, Debug, PartialEq)]
pub struct SeatClaim {
    pub seat_id: i64,
    pub seat_name: String,
}

/// Per-attempt outcome, never persisted. `error` is non-empty on every
/// unsuccessful path.
#[derive(Clone, Debug, Serialize)]
pub struct BookingResult {
    pub user_id: i64,
    pub seat_id: Option<i64>,
    pub seat_name: Option<String>,
    pub success: bool,
    pub error: Option<String>,
    pub duration: Duration,
}

impl BookingResult {
    pub fn success(user_id: i64, claim: SeatClaim, duration: Duration) -> Self {
        Self {
            user_id,
            seat_id: Some(claim.seat_id),
            seat_name: Some(claim.seat_name),
            success: true,
            error: None,
            duration,
        }
    }

    pub fn failure(
        user_id: i64,
        claim: Option<SeatClaim>,
        reason: impl Into<String>,
        duration: Duration,
    ) -> Self {
        let (seat_id, seat_name) = match claim {
            Some(c) => (Some(c.seat_id), Some(c.seat_name)),
            None => (None, None),
        };
        Self {
            user_id,
            seat_id,
            seat_name,
            success: false,
            error: Some(reason.into()),
            duration,
        }
    }
}
