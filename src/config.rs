#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string (postgres backend only).
    pub database_url: String,

    /// Maximum size of the shared connection pool.
    ///
    /// Every simulated requester competes for a connection from this pool,
    /// so it bounds how many booking transactions are truly in flight at
    /// once. Keep it well below the requester count to exercise pool
    /// contention the way a real service would see it.
    pub max_connections: u32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/seat_demo".to_string());

        let max_connections = std::env::var("SEATLOCK_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(16);

        Self {
            database_url,
            max_connections,
        }
    }
}
