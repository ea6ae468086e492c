//! Postgres backend integration tests. They need exclusive use of a scratch
//! database and are ignored by default:
//!
//!   DATABASE_URL=postgres://localhost/seatlock_test cargo test -- --ignored

use std::sync::Arc;

use seatlock::DEMO_MOVIE_ID;
use seatlock::booking::driver::LoadDriver;
use seatlock::booking::strategy::LockedSkip;
use seatlock::config::AppConfig;
use seatlock::db::Db;
use seatlock::store::postgres::PgSeatStore;
use seatlock::store::{LockMode, SeatStore};

async fn fresh_store(users: u32, seats: u32) -> Arc<PgSeatStore> {
    let cfg = AppConfig::from_env();
    let db = Db::connect(&cfg.database_url, cfg.max_connections)
        .await
        .expect("failed to connect; is DATABASE_URL set?");
    db.recreate(users, seats).await.expect("schema setup failed");
    Arc::new(PgSeatStore::new(db.pool.clone()))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore = "requires a postgres server via DATABASE_URL"]
async fn locked_skip_saturation_is_exact_on_postgres() {
    let store = fresh_store(100, 20).await;
    let driver = LoadDriver::new(
        Arc::clone(&store) as Arc<dyn SeatStore>,
        Arc::new(LockedSkip),
        DEMO_MOVIE_ID,
    );
    let outcome = driver.run((1..=100).collect()).await.expect("run failed");

    let successes = outcome.results.iter().filter(|r| r.success).count();
    assert_eq!(successes, 20);
    assert_eq!(store.booked_count(DEMO_MOVIE_ID).await.unwrap(), 20);
    assert_eq!(store.bookings(DEMO_MOVIE_ID).await.unwrap().len(), 20);
}

#[tokio::test]
#[ignore = "requires a postgres server via DATABASE_URL"]
async fn skip_locked_selection_skips_rows_on_postgres() {
    let store = fresh_store(5, 3).await;

    let mut tx1 = store.begin().await.unwrap();
    let s1 = tx1
        .find_free_seat(DEMO_MOVIE_ID, LockMode::ExclusiveSkip)
        .await
        .unwrap()
        .unwrap();

    let mut tx2 = store.begin().await.unwrap();
    let s2 = tx2
        .find_free_seat(DEMO_MOVIE_ID, LockMode::ExclusiveSkip)
        .await
        .unwrap()
        .unwrap();
    assert_ne!(s1.id, s2.id);

    tx1.rollback().await.unwrap();
    tx2.rollback().await.unwrap();
}

#[tokio::test]
#[ignore = "requires a postgres server via DATABASE_URL"]
async fn reset_is_idempotent_on_postgres() {
    let store = fresh_store(5, 5).await;

    let mut tx = store.begin().await.unwrap();
    assert_eq!(tx.claim_seat(1, 1).await.unwrap(), 1);
    tx.record_booking(1, 1, DEMO_MOVIE_ID).await.unwrap();
    tx.commit().await.unwrap();

    for _ in 0..2 {
        store.reset_movie(DEMO_MOVIE_ID).await.unwrap();
        assert_eq!(store.booked_count(DEMO_MOVIE_ID).await.unwrap(), 0);
        assert!(store.bookings(DEMO_MOVIE_ID).await.unwrap().is_empty());
    }
}
