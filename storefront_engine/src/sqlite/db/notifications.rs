use sqlx::SqliteConnection;

use crate::db_types::{NewPaymentNotification, PaymentNotification};

/// Records the notification. Returns `false`, without writing anything, if an identical delivery (same transaction,
/// status and fraud status) was recorded before.
pub async fn insert_notification(
    notification: NewPaymentNotification,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            INSERT INTO payment_notifications (
                payment_id,
                transaction_id,
                transaction_status,
                fraud_status,
                status_code,
                gross_amount,
                raw_body
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT DO NOTHING;
        "#,
    )
    .bind(notification.payment_id)
    .bind(notification.transaction_id)
    .bind(notification.transaction_status)
    .bind(notification.fraud_status)
    .bind(notification.status_code)
    .bind(notification.gross_amount)
    .bind(notification.raw_body)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn fetch_notifications_for_payment(
    payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentNotification>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payment_notifications WHERE payment_id = $1 ORDER BY id")
        .bind(payment_id)
        .fetch_all(conn)
        .await
}
