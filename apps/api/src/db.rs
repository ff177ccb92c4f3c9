use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

/// Creates the `lessons` table if it does not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS lessons (
            id             UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title          TEXT NOT NULL,
            subject        TEXT NOT NULL,
            topic          TEXT,
            academic_grade TEXT NOT NULL,
            word_count     INTEGER NOT NULL,
            lesson_data    JSONB NOT NULL,
            created_at     TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS lessons_created_at_idx ON lessons (created_at DESC)")
        .execute(pool)
        .await?;

    info!("lessons table ready");
    Ok(())
}
