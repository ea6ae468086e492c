pub mod schema;

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

#[derive(Clone)]
pub struct Db {
    pub pool: Arc<PgPool>,
}

impl Db {
    pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        schema::migrate(&self.pool).await
    }

    /// Drop-and-recreate setup: tears the schema down, migrates, then seeds
    /// one movie plus `users` requesters and `seats` seats for it.
    pub async fn recreate(&self, users: u32, seats: u32) -> anyhow::Result<()> {
        schema::drop_all(&self.pool).await?;
        schema::migrate(&self.pool).await?;
        schema::seed(&self.pool, users, seats).await
    }
}
