use std::sync::Arc;

use clap::{Parser, ValueEnum};

use crate::booking::strategy::{AllocationStrategy, LockedSkip, LockedWait, Unsynchronized};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyCli {
    /// Read-modify-write with no locking (demonstrates the race)
    Unsync,
    /// Exclusive row lock, skip rows locked elsewhere
    Skip,
    /// Exclusive row lock, wait on contended rows
    Wait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreCli {
    /// In-process store with emulated row locks (no server needed)
    Memory,
    /// PostgreSQL via DATABASE_URL
    Postgres,
}

#[derive(Debug, Parser)]
#[clap(name = "seatlock", version)]
pub struct Cli {
    /// Concurrency-control policy for the run
    #[clap(long, value_enum, default_value_t = StrategyCli::Skip)]
    pub strategy: StrategyCli,

    /// Number of concurrent requesters to simulate
    #[clap(long, default_value = "200")]
    pub users: u32,

    /// Number of seats seeded into the pool
    #[clap(long, default_value = "200")]
    pub seats: u32,

    /// Backing store
    #[clap(long, value_enum, default_value_t = StoreCli::Memory)]
    pub store: StoreCli,

    /// Drop, recreate, and seed the schema before running (postgres only)
    #[clap(long)]
    pub setup: bool,

    /// Print the run summary as JSON instead of the seat layout
    #[clap(long)]
    pub json: bool,
}

/// CLI strategy selection → policy implementation.
pub fn build_strategy(s: StrategyCli) -> Arc<dyn AllocationStrategy> {
    match s {
        StrategyCli::Unsync => Arc::new(Unsynchronized),
        StrategyCli::Skip => Arc::new(LockedSkip),
        StrategyCli::Wait => Arc::new(LockedWait),
    }
}
