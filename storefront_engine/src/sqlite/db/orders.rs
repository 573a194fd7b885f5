use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewOrder, NewOrderItem, Order, OrderItem, OrderNumber, OrderPaymentStatus, OrderStatusType},
    traits::PaymentGatewayError,
};

/// Inserts a new order (without its items) using the given connection. This is not atomic. Embed the call in a
/// transaction, together with [`insert_items`], and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, PaymentGatewayError> {
    let order_number = order.order_number.clone();
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_name,
                customer_email,
                customer_phone,
                shipping_address,
                subtotal,
                discount_amount,
                shipping_cost,
                total_amount,
                notes
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(order.order_number.as_str())
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.shipping_address)
    .bind(order.subtotal().sen())
    .bind(order.discount_amount.sen())
    .bind(order.shipping_cost.sen())
    .bind(order.total_amount().sen())
    .bind(&order.notes)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => PaymentGatewayError::OrderAlreadyExists(order_number),
        _ => PaymentGatewayError::from(e),
    })?;
    Ok(order)
}

pub async fn insert_items(
    order_id: i64,
    items: &[NewOrderItem],
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, sqlx::Error> {
    let mut result = Vec::with_capacity(items.len());
    for item in items {
        let item = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, product_id, product_name, size, color, unit_price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(&item.product_name)
        .bind(&item.size)
        .bind(&item.color)
        .bind(item.unit_price.sen())
        .bind(item.quantity)
        .fetch_one(&mut *conn)
        .await?;
        result.push(item);
    }
    trace!("📝️ {} items saved for order #{order_id}", result.len());
    Ok(result)
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

/// Sets the order's payment status unconditionally.
pub async fn update_payment_status(
    order_id: i64,
    status: OrderPaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<(), PaymentGatewayError> {
    let result =
        sqlx::query("UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
            .bind(status.as_str())
            .bind(order_id)
            .execute(conn)
            .await?;
    if result.rows_affected() == 0 {
        return Err(PaymentGatewayError::OrderIdNotFound(order_id));
    }
    debug!("📝️ Order #{order_id} payment status set to {status}");
    Ok(())
}

/// Sets the payment status only if it currently is `from`. Returns whether the order was updated.
pub async fn update_payment_status_if(
    order_id: i64,
    from: OrderPaymentStatus,
    to: OrderPaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE orders SET payment_status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND payment_status = $3",
    )
    .bind(to.as_str())
    .bind(order_id)
    .bind(from.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Moves the order from `from` to `to`. The update only touches the row if the order is still in `from`, so
/// concurrent callers cannot both succeed. Returns whether the order was updated.
pub async fn transition_status(
    order_id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3")
            .bind(to.as_str())
            .bind(order_id)
            .bind(from.as_str())
            .execute(conn)
            .await?;
    let updated = result.rows_affected() == 1;
    if updated {
        debug!("📝️ Order #{order_id} moved from {from} to {to}");
    } else {
        trace!("📝️ Order #{order_id} is no longer {from}. Not moving it to {to}");
    }
    Ok(updated)
}
