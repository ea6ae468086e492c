use std::sync::Arc;

use clap::Parser;

use seatlock::{
    DEMO_MOVIE_ID,
    booking::driver::LoadDriver,
    cli::{Cli, StoreCli, build_strategy},
    config::AppConfig,
    db::Db,
    logger::init_tracing,
    report::{self, RunSummary},
    store::{SeatStore, memory::MemorySeatStore, postgres::PgSeatStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    init_tracing(is_production);

    let cfg = AppConfig::from_env();

    tracing::info!(
        strategy = ?cli.strategy,
        store = ?cli.store,
        users = cli.users,
        seats = cli.seats,
        "starting seat booking demo"
    );

    let store: Arc<dyn SeatStore> = match cli.store {
        StoreCli::Memory => {
            let store = MemorySeatStore::new();
            store.seed(DEMO_MOVIE_ID, cli.seats);
            Arc::new(store)
        }
        StoreCli::Postgres => {
            let db = Db::connect(&cfg.database_url, cfg.max_connections).await?;
            if cli.setup {
                db.recreate(cli.users, cli.seats).await?;
            } else {
                db.migrate().await?;
            }
            Arc::new(PgSeatStore::new(db.pool.clone()))
        }
    };

    let strategy = build_strategy(cli.strategy);
    let strategy_name = strategy.name();

    let driver = LoadDriver::new(Arc::clone(&store), strategy, DEMO_MOVIE_ID);
    let user_ids: Vec<i64> = (1..=i64::from(cli.users)).collect();
    let outcome = driver.run(user_ids).await?;

    let successes = outcome.results.iter().filter(|r| r.success).count();
    let snapshot = report::snapshot(store.as_ref(), DEMO_MOVIE_ID).await?;

    if cli.json {
        let summary = RunSummary {
            strategy: strategy_name.to_string(),
            requesters: outcome.results.len(),
            successes,
            booked: snapshot.booked,
            free: snapshot.free,
            total_seats: snapshot.total,
            elapsed_ms: outcome.elapsed.as_millis(),
            bookings_per_sec: snapshot.throughput(outcome.elapsed),
        };
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("\nFinal seat layout (X = booked, . = free):");
        print!("{}", snapshot.render_layout());
        println!();
        println!("booked seats:        {} / {}", snapshot.booked, snapshot.total);
        println!(
            "successful attempts: {} / {}",
            successes,
            outcome.results.len()
        );
        println!("elapsed:             {:?}", outcome.elapsed);
        println!(
            "throughput:          {:.2} bookings/s",
            snapshot.throughput(outcome.elapsed)
        );
    }

    Ok(())
}
