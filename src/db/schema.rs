use sqlx::PgPool;

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    // Users
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS users (
  id BIGSERIAL PRIMARY KEY,
  username VARCHAR(50) UNIQUE NOT NULL,
  email VARCHAR(100) UNIQUE NOT NULL,
  created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#,
    )
    .execute(pool)
    .await?;

    // Movies
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS movies (
  id BIGSERIAL PRIMARY KEY,
  title VARCHAR(200) NOT NULL,
  duration_minutes INTEGER NOT NULL,
  release_date DATE NOT NULL,
  created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#,
    )
    .execute(pool)
    .await?;

    // Seats
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS seats (
  id BIGSERIAL PRIMARY KEY,
  name VARCHAR(50) NOT NULL,
  movie_id BIGINT NOT NULL REFERENCES movies(id),
  user_id BIGINT NULL REFERENCES users(id),
  created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#,
    )
    .execute(pool)
    .await?;

    // Bookings (append-only audit log)
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS bookings (
  id BIGSERIAL PRIMARY KEY,
  user_id BIGINT NOT NULL REFERENCES users(id),
  seat_id BIGINT NOT NULL REFERENCES seats(id),
  movie_id BIGINT NOT NULL REFERENCES movies(id),
  booking_time TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_seats_movie ON seats(movie_id);"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_bookings_movie ON bookings(movie_id);"#)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn drop_all(pool: &PgPool) -> anyhow::Result<()> {
    // FK order: bookings and seats reference the rest.
    for table in ["bookings", "seats", "movies", "users"] {
        sqlx::query(&format!("DROP TABLE IF EXISTS {table};"))
            .execute(pool)
            .await?;
    }
    Ok(())
}

/// Seeds one movie, `users` requesters (user001.. with matching emails) and
/// `seats` seats (Seat-1..) bound to that movie, all unassigned.
pub async fn seed(pool: &PgPool, users: u32, seats: u32) -> anyhow::Result<()> {
    let movie_id: i64 = sqlx::query_scalar(
        r#"
INSERT INTO movies (title, duration_minutes, release_date)
VALUES ($1, $2, $3)
RETURNING id;
"#,
    )
    .bind("The Multithreading Adventure")
    .bind(120)
    .bind(chrono::NaiveDate::from_ymd_opt(2024, 1, 15))
    .fetch_one(pool)
    .await?;

    sqlx::query(
        r#"
INSERT INTO users (username, email)
SELECT format('user%s', lpad(g::text, 3, '0')),
       format('user%s@example.com', lpad(g::text, 3, '0'))
FROM generate_series(1, $1) AS g;
"#,
    )
    .bind(users as i64)
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
INSERT INTO seats (name, movie_id)
SELECT format('Seat-%s', g), $2
FROM generate_series(1, $1) AS g;
"#,
    )
    .bind(seats as i64)
    .execute(pool)
    .await?;

    tracing::info!(movie_id, users, seats, "database seeded");

    Ok(())
}
