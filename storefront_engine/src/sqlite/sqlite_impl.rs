//! `SqliteDatabase` is a concrete implementation of a storefront engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::{migrate::MigrateError, SqliteConnection, SqlitePool};

use super::db::{db_url, new_pool, notifications, orders, payments, settings, shipping};
use crate::{
    db_types::{
        NewOrder,
        NewPayment,
        Order,
        OrderItem,
        OrderNumber,
        OrderPaymentStatus,
        OrderStatusType,
        Payment,
        PaymentNotification,
        Setting,
        ShippingHistory,
    },
    traits::{
        GatewayStatusUpdate,
        OrderManagement,
        PaymentGatewayDatabase,
        PaymentGatewayError,
        SettingsApiError,
        SettingsManagement,
        StatusUpdateResult,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let saved = orders::insert_order(&order, &mut tx).await?;
        let _ = orders::insert_items(saved.id, &order.items, &mut tx).await?;
        let status = OrderStatusType::Pending;
        shipping::insert_history(saved.id, status, status.history_description(), &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with id {}", saved.order_number, saved.id);
        Ok(saved)
    }

    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_number(order_number, &mut conn).await?)
    }

    async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order_by_id(id, &mut conn).await?)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_items(order_id, &mut conn).await?)
    }

    async fn fetch_shipping_history(&self, order_id: i64) -> Result<Vec<ShippingHistory>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(shipping::fetch_history(order_id, &mut conn).await?)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
        description: &str,
    ) -> Result<Order, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        if !orders::transition_status(order_id, from, to, &mut tx).await? {
            return Err(PaymentGatewayError::OrderModificationConflict { order_id, expected: from });
        }
        shipping::insert_history(order_id, to, description, &mut tx).await?;
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(PaymentGatewayError::OrderIdNotFound(order_id))?;
        tx.commit().await?;
        Ok(order)
    }
}

impl PaymentGatewayDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let payment = payments::insert_payment(payment, &mut tx).await?;
        // The new attempt is now the latest, so the order reflects its status.
        orders::update_payment_status(payment.order_id, OrderPaymentStatus::Pending, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment #{} ({}) saved for order #{}", payment.id, payment.gateway_order_id, payment.order_id);
        Ok(payment)
    }

    async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment(id, &mut conn).await?)
    }

    async fn fetch_payment_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Payment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payment_by_gateway_order_id(gateway_order_id, &mut conn).await?)
    }

    async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(payments::fetch_payments_for_order(order_id, &mut conn).await?)
    }

    async fn apply_gateway_status(
        &self,
        update: GatewayStatusUpdate,
    ) -> Result<StatusUpdateResult, PaymentGatewayError> {
        let GatewayStatusUpdate { payment_id, transition, transaction_id, payment_type, gateway_response, notification } =
            update;
        // The first statement must be a write. A leading read pins a snapshot that a concurrent delivery invalidates.
        let mut tx = self.pool.begin().await?;
        if let Some(notification) = notification {
            if !notifications::insert_notification(notification, &mut tx).await? {
                debug!("🗃️ Notification for payment #{payment_id} was already applied. Ignoring the redelivery.");
                let (payment, order) = payment_with_order(payment_id, &mut tx).await?;
                tx.rollback().await?;
                return Ok(StatusUpdateResult {
                    payment,
                    order,
                    order_confirmed: false,
                    duplicate: true,
                    superseded: false,
                });
            }
        }
        let updated = payments::update_from_gateway(
            payment_id,
            transition.payment_status,
            transaction_id.as_deref(),
            payment_type.as_deref(),
            &gateway_response,
            &mut tx,
        )
        .await?;
        let payment = match updated {
            Some(payment) => payment,
            None => {
                let (payment, order) = payment_with_order(payment_id, &mut tx).await?;
                info!(
                    "🗃️ Payment #{payment_id} is already {}. The reported {} outcome is outdated and was not applied.",
                    payment.status, transition.payment_status
                );
                tx.commit().await?;
                return Ok(StatusUpdateResult {
                    payment,
                    order,
                    order_confirmed: false,
                    duplicate: false,
                    superseded: true,
                });
            },
        };
        let order_id = payment.order_id;
        let latest = payments::latest_payment_id_for_order(order_id, &mut tx).await?;
        if latest == Some(payment_id) || transition.is_success() {
            orders::update_payment_status(order_id, transition.order_payment_status, &mut tx).await?;
        } else {
            info!(
                "🗃️ Payment #{payment_id} is not the latest attempt for order #{order_id}. Leaving the order's payment \
                 status alone."
            );
        }
        let mut order_confirmed = false;
        if let Some(status) = transition.order_status {
            if orders::transition_status(order_id, OrderStatusType::Pending, status, &mut tx).await? {
                order_confirmed = status == OrderStatusType::Confirmed;
                shipping::insert_history(order_id, status, status.history_description(), &mut tx).await?;
            }
        }
        let order =
            orders::fetch_order_by_id(order_id, &mut tx).await?.ok_or(PaymentGatewayError::OrderIdNotFound(order_id))?;
        tx.commit().await?;
        trace!("🗃️ Gateway status applied to payment #{payment_id}. Order is {}/{}", order.status, order.payment_status);
        Ok(StatusUpdateResult { payment, order, order_confirmed, duplicate: false, superseded: false })
    }

    async fn cancel_payment(
        &self,
        payment_id: i64,
        gateway_response: Option<String>,
    ) -> Result<Payment, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let payment = match payments::cancel_live_payment(payment_id, gateway_response, &mut tx).await? {
            Some(p) => p,
            None => {
                let existing = payments::fetch_payment(payment_id, &mut tx)
                    .await?
                    .ok_or(PaymentGatewayError::PaymentNotFound(payment_id))?;
                return Err(PaymentGatewayError::PaymentNotCancellable { id: payment_id, status: existing.status });
            },
        };
        orders::update_payment_status(payment.order_id, OrderPaymentStatus::Cancelled, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Payment #{payment_id} and the payment status of order #{} cancelled", payment.order_id);
        Ok(payment)
    }

    async fn expire_stale_payments(&self, timeout: Duration) -> Result<Vec<Payment>, PaymentGatewayError> {
        let mut tx = self.pool.begin().await?;
        let expired = payments::fail_stale_pending_payments(timeout, &mut tx).await?;
        for payment in &expired {
            let updated = orders::update_payment_status_if(
                payment.order_id,
                OrderPaymentStatus::Pending,
                OrderPaymentStatus::Expired,
                &mut tx,
            )
            .await?;
            trace!("🗃️ Payment #{} expired. Order #{} updated: {updated}", payment.id, payment.order_id);
        }
        tx.commit().await?;
        Ok(expired)
    }

    async fn close(&mut self) -> Result<(), PaymentGatewayError> {
        self.pool.close().await;
        Ok(())
    }
}

impl SettingsManagement for SqliteDatabase {
    async fn fetch_all_settings(&self) -> Result<Vec<Setting>, SettingsApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settings::fetch_all(&mut conn).await?)
    }

    async fn fetch_public_settings(&self) -> Result<Vec<Setting>, SettingsApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settings::fetch_public(&mut conn).await?)
    }

    async fn fetch_settings_for_keys(&self, keys: &[&str]) -> Result<Vec<Setting>, SettingsApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settings::fetch_for_keys(keys, &mut conn).await?)
    }

    async fn fetch_setting(&self, key: &str) -> Result<Option<Setting>, SettingsApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(settings::fetch(key, &mut conn).await?)
    }

    async fn update_setting(&self, key: &str, value: &str) -> Result<Setting, SettingsApiError> {
        let mut conn = self.pool.acquire().await?;
        let setting =
            settings::update(key, value, &mut conn).await?.ok_or_else(|| SettingsApiError::SettingNotFound(key.into()))?;
        debug!("⚙️ Setting {key} updated");
        Ok(setting)
    }

    async fn bulk_update_settings(&self, updates: &[(String, String)]) -> Result<Vec<Setting>, SettingsApiError> {
        let mut tx = self.pool.begin().await?;
        let mut result = Vec::with_capacity(updates.len());
        for (key, value) in updates {
            match settings::update(key, value, &mut tx).await? {
                Some(setting) => result.push(setting),
                None => {
                    tx.rollback().await?;
                    return Err(SettingsApiError::SettingNotFound(key.clone()));
                },
            }
        }
        tx.commit().await?;
        debug!("⚙️ {} settings updated", result.len());
        Ok(result)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The notifications that have been applied to the payment, oldest first.
    pub async fn fetch_notifications_for_payment(
        &self,
        payment_id: i64,
    ) -> Result<Vec<PaymentNotification>, PaymentGatewayError> {
        let mut conn = self.pool.acquire().await?;
        Ok(notifications::fetch_notifications_for_payment(payment_id, &mut conn).await?)
    }
}

async fn payment_with_order(
    payment_id: i64,
    conn: &mut SqliteConnection,
) -> Result<(Payment, Order), PaymentGatewayError> {
    let payment =
        payments::fetch_payment(payment_id, &mut *conn).await?.ok_or(PaymentGatewayError::PaymentNotFound(payment_id))?;
    let order = orders::fetch_order_by_id(payment.order_id, conn)
        .await?
        .ok_or(PaymentGatewayError::OrderIdNotFound(payment.order_id))?;
    Ok((payment, order))
}
