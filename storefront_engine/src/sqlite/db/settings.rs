use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db_types::Setting;

pub async fn fetch_all(conn: &mut SqliteConnection) -> Result<Vec<Setting>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM settings ORDER BY group_name, key").fetch_all(conn).await
}

/// Password settings are never public, whatever their flag says.
pub async fn fetch_public(conn: &mut SqliteConnection) -> Result<Vec<Setting>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM settings WHERE is_public = TRUE AND setting_type != 'password' ORDER BY key")
        .fetch_all(conn)
        .await
}

pub async fn fetch_for_keys(keys: &[&str], conn: &mut SqliteConnection) -> Result<Vec<Setting>, sqlx::Error> {
    if keys.is_empty() {
        return Ok(vec![]);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM settings WHERE key IN (");
    let mut list = builder.separated(", ");
    for key in keys {
        list.push_bind(*key);
    }
    list.push_unseparated(")");
    builder.build_query_as::<Setting>().fetch_all(conn).await
}

pub async fn fetch(key: &str, conn: &mut SqliteConnection) -> Result<Option<Setting>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM settings WHERE key = $1").bind(key).fetch_optional(conn).await
}

/// Returns `None` if no setting has the given key.
pub async fn update(key: &str, value: &str, conn: &mut SqliteConnection) -> Result<Option<Setting>, sqlx::Error> {
    sqlx::query_as("UPDATE settings SET value = $1, updated_at = CURRENT_TIMESTAMP WHERE key = $2 RETURNING *")
        .bind(value)
        .bind(key)
        .fetch_optional(conn)
        .await
}
