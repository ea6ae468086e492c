//! Concurrent load driver: resets the pool, fans out one booking task per
//! requester with no staggering, and joins them all. A panicked attempt is
//! folded into a failed result instead of aborting its siblings.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::Instrument;
use uuid::Uuid;

use crate::booking::orchestrator;
use crate::booking::strategy::AllocationStrategy;
use crate::model::BookingResult;
use crate::store::SeatStore;

/// Results of one full run. `results` is unordered with respect to
/// completion time.
pub struct RunOutcome {
    pub results: Vec<BookingResult>,
    pub elapsed: Duration,
}

pub struct LoadDriver {
    store: Arc<dyn SeatStore>,
    strategy: Arc<dyn AllocationStrategy>,
    movie_id: i64,
}

impl LoadDriver {
    pub fn new(
        store: Arc<dyn SeatStore>,
        strategy: Arc<dyn AllocationStrategy>,
        movie_id: i64,
    ) -> Self {
        Self {
            store,
            strategy,
            movie_id,
        }
    }

    pub async fn run(&self, user_ids: Vec<i64>) -> anyhow::Result<RunOutcome> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "booking_run",
            run_id = %run_id,
            strategy = self.strategy.name(),
            requesters = user_ids.len(),
        );

        async {
            self.store.reset_movie(self.movie_id).await?;
            tracing::info!(requesters = user_ids.len(), "pool reset, launching requesters");

            let start = Instant::now();

            let mut ids = Vec::with_capacity(user_ids.len());
            let mut tasks = Vec::with_capacity(user_ids.len());
            for user_id in user_ids {
                let store = Arc::clone(&self.store);
                let strategy = Arc::clone(&self.strategy);
                let movie_id = self.movie_id;
                ids.push(user_id);
                tasks.push(tokio::spawn(async move {
                    let result =
                        orchestrator::book_one(store.as_ref(), strategy.as_ref(), movie_id, user_id)
                            .await;
                    log_result(&result);
                    result
                }));
            }

            let joined = futures::future::join_all(tasks).await;
            let elapsed = start.elapsed();

            let results = ids
                .into_iter()
                .zip(joined)
                .map(|(user_id, joined)| match joined {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(user_id, error = %e, "booking task did not complete");
                        BookingResult::failure(
                            user_id,
                            None,
                            format!("booking task panicked: {e}"),
                            elapsed,
                        )
                    }
                })
                .collect();

            Ok(RunOutcome { results, elapsed })
        }
        .instrument(span)
        .await
    }
}

fn log_result(result: &BookingResult) {
    if result.success {
        tracing::info!(
            user_id = result.user_id,
            seat = result.seat_name.as_deref().unwrap_or(""),
            duration_ms = result.duration.as_millis() as u64,
            "seat assigned"
        );
    } else {
        tracing::info!(
            user_id = result.user_id,
            reason = result.error.as_deref().unwrap_or(""),
            duration_ms = result.duration.as_millis() as u64,
            "no seat assigned"
        );
    }
}
