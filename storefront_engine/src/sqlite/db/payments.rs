use chrono::Duration;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPayment, Payment, PaymentStatus},
    traits::PaymentGatewayError,
};

pub async fn insert_payment(payment: NewPayment, conn: &mut SqliteConnection) -> Result<Payment, PaymentGatewayError> {
    let order_id = payment.order_id;
    let gateway_order_id = payment.gateway_order_id.clone();
    let payment = sqlx::query_as(
        r#"
            INSERT INTO payments (
                order_id,
                gateway_order_id,
                transaction_id,
                payment_type,
                status,
                amount,
                snap_token,
                snap_redirect_url,
                gateway_response
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(payment.order_id)
    .bind(payment.gateway_order_id)
    .bind(payment.transaction_id)
    .bind(payment.payment_type)
    .bind(payment.status.as_str())
    .bind(payment.amount.sen())
    .bind(payment.snap_token)
    .bind(payment.snap_redirect_url)
    .bind(payment.gateway_response)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            if err.message().contains("gateway_order_id") || err.message().contains("transaction_id") {
                PaymentGatewayError::PaymentAlreadyExists(gateway_order_id)
            } else {
                PaymentGatewayError::LivePaymentExists(order_id)
            }
        },
        _ => PaymentGatewayError::from(e),
    })?;
    Ok(payment)
}

pub async fn fetch_payment(id: i64, conn: &mut SqliteConnection) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_payment_by_gateway_order_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE gateway_order_id = $1")
        .bind(gateway_order_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_payments_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Payment>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payments WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

pub async fn latest_payment_id_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let id: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM payments WHERE order_id = $1")
        .bind(order_id)
        .fetch_one(conn)
        .await?;
    Ok(id)
}

/// Records a gateway outcome on the payment. `paid_at` is stamped the first time the payment reaches `success` and
/// is left alone afterwards.
///
/// A settled payment can only move on to `refunded`, and a refund is final. Returns `None` when the payment does not
/// exist or the outcome cannot follow its current status.
pub async fn update_from_gateway(
    payment_id: i64,
    status: PaymentStatus,
    transaction_id: Option<&str>,
    payment_type: Option<&str>,
    gateway_response: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    let payment: Option<Payment> = sqlx::query_as(
        r#"
            UPDATE payments SET
                status = $1,
                transaction_id = COALESCE($2, transaction_id),
                payment_type = COALESCE($3, payment_type),
                gateway_response = $4,
                paid_at = CASE WHEN $1 = 'success' THEN COALESCE(paid_at, CURRENT_TIMESTAMP) ELSE paid_at END,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $5
              AND (status NOT IN ('success', 'refunded') OR $1 = 'refunded' OR (status = 'success' AND $1 = 'success'))
            RETURNING *;
        "#,
    )
    .bind(status.as_str())
    .bind(transaction_id)
    .bind(payment_type)
    .bind(gateway_response)
    .bind(payment_id)
    .fetch_optional(conn)
    .await?;
    if payment.is_some() {
        debug!("💰️ Payment #{payment_id} is now {status}");
    }
    Ok(payment)
}

/// Cancels the payment if it is still live. Returns `None` if the payment is not live (or does not exist).
pub async fn cancel_live_payment(
    payment_id: i64,
    gateway_response: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<Option<Payment>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE payments SET
                status = 'cancelled',
                gateway_response = COALESCE($1, gateway_response),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status IN ('pending', 'challenge')
            RETURNING *;
        "#,
    )
    .bind(gateway_response)
    .bind(payment_id)
    .fetch_optional(conn)
    .await
}

/// Marks every payment that has been pending for longer than `timeout` as failed, returning those payments.
pub async fn fail_stale_pending_payments(
    timeout: Duration,
    conn: &mut SqliteConnection,
) -> Result<Vec<Payment>, sqlx::Error> {
    let modifier = format!("-{} seconds", timeout.num_seconds());
    sqlx::query_as(
        r#"
            UPDATE payments SET status = 'failed', updated_at = CURRENT_TIMESTAMP
            WHERE status = 'pending' AND created_at < datetime('now', $1)
            RETURNING *;
        "#,
    )
    .bind(modifier)
    .fetch_all(conn)
    .await
}
