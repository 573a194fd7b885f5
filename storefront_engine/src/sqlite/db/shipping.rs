use sqlx::SqliteConnection;

use crate::db_types::{OrderStatusType, ShippingHistory};

/// Journals a status for the order. A status is journalled at most once per order; the return value is `false` if
/// the entry already existed.
pub async fn insert_history(
    order_id: i64,
    status: OrderStatusType,
    description: &str,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO shipping_histories (order_id, status, description) VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING;
        "#,
    )
    .bind(order_id)
    .bind(status.as_str())
    .bind(description)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_history(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<ShippingHistory>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM shipping_histories WHERE order_id = $1 ORDER BY created_at, id")
        .bind(order_id)
        .fetch_all(conn)
        .await
}
