use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Tables backing the relief entities. Assignments hold plain id back-references
/// (no foreign keys) so a deleted volunteer or resource reads back as null.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS resources (
        id            BIGSERIAL PRIMARY KEY,
        resource_type TEXT        NOT NULL,
        quantity      INTEGER     NOT NULL,
        location      TEXT        NOT NULL,
        assigned      BOOLEAN     NOT NULL DEFAULT FALSE,
        created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS volunteers (
        id              BIGSERIAL PRIMARY KEY,
        name            TEXT    NOT NULL,
        contact         TEXT    NOT NULL,
        location        TEXT    NOT NULL,
        available       BOOLEAN NOT NULL DEFAULT TRUE,
        assigned_zone   TEXT,
        assistance_type TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS assignments (
        id           BIGSERIAL PRIMARY KEY,
        zone         TEXT        NOT NULL,
        resource_id  BIGINT      NOT NULL,
        volunteer_id BIGINT      NOT NULL,
        assigned_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS disaster_alerts (
        id          BIGSERIAL PRIMARY KEY,
        alert_type  TEXT             NOT NULL,
        severity    TEXT             NOT NULL,
        description TEXT             NOT NULL,
        location    TEXT             NOT NULL,
        latitude    DOUBLE PRECISION NOT NULL,
        longitude   DOUBLE PRECISION NOT NULL,
        issued_at   TIMESTAMPTZ      NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sensor_data (
        id          BIGSERIAL PRIMARY KEY,
        sensor_type TEXT             NOT NULL,
        value       DOUBLE PRECISION NOT NULL,
        latitude    DOUBLE PRECISION NOT NULL,
        longitude   DOUBLE PRECISION NOT NULL,
        recorded_at TIMESTAMPTZ      NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS resources_location_idx ON resources (location, assigned, id)",
    "CREATE INDEX IF NOT EXISTS volunteers_location_idx ON volunteers (location, available, id)",
    "CREATE INDEX IF NOT EXISTS disaster_alerts_issued_idx ON disaster_alerts (issued_at DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS sensor_data_type_time_idx ON sensor_data (sensor_type, recorded_at DESC)",
];

/// Creates a PostgreSQL connection pool and makes sure the relief tables exist.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");

    ensure_schema(&pool).await?;
    Ok(pool)
}

/// Idempotent table bootstrap. Versioned migrations are managed outside this service.
async fn ensure_schema(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .context("Failed to bootstrap relief schema")?;
    }
    info!("Relief schema verified ({} statements)", SCHEMA.len());
    Ok(())
}
