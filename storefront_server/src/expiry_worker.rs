use chrono::Duration;
use log::*;
use midtrans_tools::MidtransApi;
use storefront_engine::{db_types::Payment, PaymentFlowApi, SqliteDatabase};
use tokio::task::JoinHandle;

/// How often the worker looks for abandoned payments.
pub const EXPIRY_CHECK_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Starts the payment expiry worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every minute, payments that have been pending for longer than `timeout` are marked as failed, and their orders'
/// payment status becomes `expired`.
pub fn start_expiry_worker(api: PaymentFlowApi<SqliteDatabase, MidtransApi>, timeout: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(EXPIRY_CHECK_INTERVAL);
        info!("🕰️ Pending payment expiry worker started. Payments expire after {} hours", timeout.num_hours());
        loop {
            timer.tick().await;
            trace!("🕰️ Running pending payment expiry job");
            match api.expire_stale_payments(timeout).await {
                Ok(expired) if expired.is_empty() => trace!("🕰️ No payments expired"),
                Ok(expired) => {
                    info!("🕰️ {} payments expired", expired.len());
                    debug!("🕰️ Expired payments: {}", payment_list(&expired));
                },
                Err(e) => {
                    error!("🕰️ Error running pending payment expiry job: {e}");
                },
            }
        }
    })
}

fn payment_list(payments: &[Payment]) -> String {
    payments
        .iter()
        .map(|p| format!("[{}] {} for order #{}", p.id, p.gateway_order_id, p.order_id))
        .collect::<Vec<String>>()
        .join(", ")
}
