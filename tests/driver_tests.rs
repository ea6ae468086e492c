//! Load-driver behavior: the pre-run reset, one result per requester, and
//! isolation of individual failures (errors and panics alike).

use std::sync::Arc;

use async_trait::async_trait;

use seatlock::booking::driver::LoadDriver;
use seatlock::booking::strategy::{AllocationStrategy, LockedSkip};
use seatlock::error::BookingError;
use seatlock::model::SeatClaim;
use seatlock::store::memory::MemorySeatStore;
use seatlock::store::{SeatStore, SeatTx};

const MOVIE: i64 = 1;

fn seeded(seats: u32) -> Arc<MemorySeatStore> {
    let store = MemorySeatStore::new();
    store.seed(MOVIE, seats);
    Arc::new(store)
}

async fn book_out_of_band(store: &MemorySeatStore, seat_id: i64, user_id: i64) {
    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.claim_seat(seat_id, user_id).await.unwrap(), 1);
    tx.record_booking(user_id, seat_id, MOVIE).await.unwrap();
    tx.commit().await.unwrap();
}

#[tokio::test]
async fn reset_is_idempotent() {
    let store = seeded(10);
    book_out_of_band(&store, 1, 99).await;
    book_out_of_band(&store, 2, 98).await;
    assert_eq!(store.booked_count(MOVIE).await.unwrap(), 2);

    for _ in 0..2 {
        store.reset_movie(MOVIE).await.unwrap();
        assert_eq!(store.booked_count(MOVIE).await.unwrap(), 0);
        assert!(store.bookings(MOVIE).await.unwrap().is_empty());
        let seats = store.seats(MOVIE).await.unwrap();
        assert_eq!(seats.len(), 10);
        assert!(seats.iter().all(|s| s.user_id.is_none()));
    }
}

#[tokio::test]
async fn run_resets_the_pool_before_launching() {
    let store = seeded(5);
    book_out_of_band(&store, 1, 99).await;

    let driver = LoadDriver::new(
        Arc::clone(&store) as Arc<dyn SeatStore>,
        Arc::new(LockedSkip),
        MOVIE,
    );
    let outcome = driver.run(Vec::new()).await.expect("run failed");

    assert!(outcome.results.is_empty());
    assert_eq!(store.booked_count(MOVIE).await.unwrap(), 0);
    assert!(store.bookings(MOVIE).await.unwrap().is_empty());
}

/// Injects a store failure for every even requester id, delegating the rest.
struct FailEven;

#[async_trait]
impl AllocationStrategy for FailEven {
    fn name(&self) -> &'static str {
        "fail-even"
    }

    async fn attempt(
        &self,
        tx: &mut dyn SeatTx,
        movie_id: i64,
        user_id: i64,
    ) -> Result<SeatClaim, BookingError> {
        if user_id % 2 == 0 {
            return Err(BookingError::Store(anyhow::anyhow!(
                "injected store failure"
            )));
        }
        LockedSkip.attempt(tx, movie_id, user_id).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn one_requesters_failure_does_not_block_the_others() {
    let store = seeded(20);
    let driver = LoadDriver::new(
        Arc::clone(&store) as Arc<dyn SeatStore>,
        Arc::new(FailEven),
        MOVIE,
    );
    let outcome = driver.run((1..=20).collect()).await.expect("run failed");

    assert_eq!(outcome.results.len(), 20);
    for r in &outcome.results {
        if r.user_id % 2 == 0 {
            assert!(!r.success);
            assert!(r.error.as_deref().unwrap_or_default().contains("injected"));
        } else {
            assert!(r.success, "requester {} should have booked", r.user_id);
        }
    }
    assert_eq!(store.booked_count(MOVIE).await.unwrap(), 10);
}

/// Panics for one requester id, delegating the rest.
struct PanicOn(i64);

#[async_trait]
impl AllocationStrategy for PanicOn {
    fn name(&self) -> &'static str {
        "panic-on"
    }

    async fn attempt(
        &self,
        tx: &mut dyn SeatTx,
        movie_id: i64,
        user_id: i64,
    ) -> Result<SeatClaim, BookingError> {
        assert_ne!(user_id, self.0, "injected panic");
        LockedSkip.attempt(tx, movie_id, user_id).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_panicked_attempt_becomes_a_failed_result() {
    let store = seeded(10);
    let driver = LoadDriver::new(
        Arc::clone(&store) as Arc<dyn SeatStore>,
        Arc::new(PanicOn(4)),
        MOVIE,
    );
    let outcome = driver.run((1..=10).collect()).await.expect("run failed");

    assert_eq!(outcome.results.len(), 10);
    let panicked = outcome
        .results
        .iter()
        .find(|r| r.user_id == 4)
        .expect("missing result for panicked requester");
    assert!(!panicked.success);
    assert!(
        panicked
            .error
            .as_deref()
            .unwrap_or_default()
            .contains("panicked")
    );

    let successes = outcome.results.iter().filter(|r| r.success).count();
    assert_eq!(successes, 9);
    assert_eq!(store.booked_count(MOVIE).await.unwrap(), 9);
}
