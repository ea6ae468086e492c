pub mod booking;
pub mod cli;
pub mod config;
pub mod db;
pub mod model;
pub mod report;
pub mod store;

pub mod error;
pub mod logger;

/// The single showing every demo run allocates against. The schema and the
/// in-memory backend both seed exactly one movie with this id.
pub const DEMO_MOVIE_ID: i64 = 1;
