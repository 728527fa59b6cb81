use sqlx::MySqlPool;

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPool::connect(database_url).await
}

/// Creates the timecard table if it does not exist yet.
pub async fn ensure_schema(pool: &MySqlPool, table: &str) -> Result<(), sqlx::Error> {
    let ddl = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            user_month_key VARCHAR(191) NOT NULL PRIMARY KEY,
            records JSON NOT NULL,
            version BIGINT UNSIGNED NOT NULL
        )
        "#,
        table
    );

    sqlx::query(&ddl).execute(pool).await?;
    Ok(())
}
