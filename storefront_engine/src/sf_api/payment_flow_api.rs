use std::fmt::Debug;

use chrono::Duration;
use log::*;
use midtrans_tools::{
    data_objects::SnapCallbacks,
    helpers::parse_gross_amount,
    ChargeRequest,
    MidtransApiError,
    MidtransNotification,
    PaymentGateway,
    PaymentMethod,
    SnapRequest,
    TransactionStatusResponse,
};
use sf_common::Rupiah;

use crate::{
    db_types::{
        NewPayment,
        NewPaymentNotification,
        Order,
        OrderItem,
        OrderNumber,
        OrderPaymentStatus,
        OrderStatusType,
        Payment,
        PaymentStatus,
    },
    events::{EventProducers, PaymentConfirmedEvent},
    helpers::{customer_details, gateway_order_id, item_details, map_gateway_status, transaction_details},
    sf_api::{
        errors::PaymentFlowError,
        payment_objects::{ChargeResult, PaymentOptions, SnapPayment},
    },
    traits::{GatewayStatusUpdate, PaymentGatewayDatabase, PaymentGatewayError, StatusTransition, StatusUpdateResult},
};

/// Bank codes accepted for virtual account transfers.
pub const SUPPORTED_BANKS: [&str; 5] = ["bca", "bni", "bri", "permata", "cimb"];

/// `PaymentFlowApi` creates payments at the gateway and reconciles what the gateway reports back into local order
/// and payment state.
///
/// Every gateway outcome, whether pushed by a notification or pulled by polling, goes through the same path: the
/// gateway status is mapped to a [`StatusTransition`] and applied to the payment and its order in a single database
/// transaction. When the order is confirmed as a result, a `PaymentConfirmed` event is published.
pub struct PaymentFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    options: PaymentOptions,
}

impl<B, G> Debug for PaymentFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaymentFlowApi")
    }
}

impl<B, G> PaymentFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, options: PaymentOptions::default() }
    }

    pub fn with_options(mut self, options: PaymentOptions) -> Self {
        self.options = options;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> PaymentFlowApi<B, G>
where
    B: PaymentGatewayDatabase,
    G: PaymentGateway,
{
    /// Opens a Snap payment page for the order.
    ///
    /// The order must exist, must not be paid, refunded or cancelled, and must not already have a live payment.
    pub async fn create_snap_payment(&self, order_number: &OrderNumber) -> Result<SnapPayment, PaymentFlowError> {
        let (order, items, attempts) = self.payable_order(order_number).await?;
        let gateway_order_id = gateway_order_id(&order.order_number, attempts);
        let item_details = item_details(&order, &items);
        let request = SnapRequest {
            transaction_details: transaction_details(&gateway_order_id, &item_details),
            item_details,
            customer_details: customer_details(&order),
            callbacks: self.options.finish_url.clone().map(|finish| SnapCallbacks { finish }),
        };
        let amount = Rupiah::from_rupiah(request.transaction_details.gross_amount);
        let response = self.gateway.create_snap_transaction(&request).await?;
        let payment = NewPayment::new(order.id, gateway_order_id, amount)
            .with_snap(response.token.clone(), response.redirect_url.clone());
        let payment = self.save_payment(payment, &order).await?;
        info!("🔄️💳️ Snap payment #{} ({amount}) opened for order {order_number}", payment.id);
        Ok(SnapPayment { payment, token: response.token, redirect_url: response.redirect_url })
    }

    /// Charges the order directly through the Core API using the given payment channel.
    pub async fn charge(
        &self,
        order_number: &OrderNumber,
        method: PaymentMethod,
    ) -> Result<ChargeResult, PaymentFlowError> {
        if let PaymentMethod::BankTransfer { bank } = &method {
            let bank = bank.to_lowercase();
            if !SUPPORTED_BANKS.contains(&bank.as_str()) {
                return Err(PaymentFlowError::Validation(format!(
                    "bank '{bank}' is not supported. Use one of {}",
                    SUPPORTED_BANKS.join(", ")
                )));
            }
        }
        let (order, items, attempts) = self.payable_order(order_number).await?;
        let gateway_order_id = gateway_order_id(&order.order_number, attempts);
        let item_details = item_details(&order, &items);
        let request = ChargeRequest::new(
            &method,
            transaction_details(&gateway_order_id, &item_details),
            item_details,
            customer_details(&order),
            self.options.ewallet_callback_url.clone(),
        );
        let amount = Rupiah::from_rupiah(request.transaction_details.gross_amount);
        let response = self.gateway.charge(&request).await?;
        let transition = match response.transaction_status.as_deref() {
            Some(status) => map_gateway_status(status, response.fraud_status.as_deref())
                .map_err(|e| PaymentFlowError::Validation(e.to_string()))?,
            None => StatusTransition::new(PaymentStatus::Pending, OrderPaymentStatus::Pending),
        };
        let raw = serialize_response(&response);
        let payment = NewPayment::new(order.id, gateway_order_id, amount).with_charge(
            method.payment_type().to_string(),
            response.transaction_id.clone(),
            raw.clone(),
        );
        let mut payment = self.save_payment(payment, &order).await?;
        info!("🔄️💳️ Direct charge #{} via {method} ({amount}) created for order {order_number}", payment.id);
        if !transition.payment_status.is_live() {
            debug!("🔄️💳️ Charge #{} completed immediately as {}", payment.id, transition.payment_status);
            let update = GatewayStatusUpdate {
                payment_id: payment.id,
                transition,
                transaction_id: response.transaction_id.clone(),
                payment_type: response.payment_type.clone(),
                gateway_response: raw,
                notification: None,
            };
            let result = self.apply(update).await?;
            payment = result.payment;
        }
        Ok(ChargeResult { payment, gateway: response })
    }

    /// Applies a gateway notification.
    ///
    /// The signature is checked first; a notification that fails the check, names an unknown transaction, reports
    /// an amount that differs from the payment's, or carries an unrecognised status is rejected without writing
    /// anything. Redelivered notifications are detected and ignored.
    pub async fn handle_notification(
        &self,
        notification: MidtransNotification,
    ) -> Result<StatusUpdateResult, PaymentFlowError> {
        let gateway_order_id = notification.order_id.clone();
        if !self.gateway.verify_notification(&notification) {
            warn!("🔄️🔔️ Notification for {gateway_order_id} has an invalid signature. Ignoring it.");
            return Err(PaymentFlowError::InvalidSignature);
        }
        let payment = self
            .db
            .fetch_payment_by_gateway_order_id(&gateway_order_id)
            .await?
            .ok_or_else(|| PaymentFlowError::UnknownGatewayOrder(gateway_order_id.clone()))?;
        let gross_amount = parse_gross_amount(&notification.gross_amount)
            .map_err(|e| PaymentFlowError::Validation(e.to_string()))?;
        if gross_amount != payment.amount {
            warn!(
                "🔄️🔔️ Notification for {gateway_order_id} reports {gross_amount} but payment #{} is for {}",
                payment.id, payment.amount
            );
            return Err(PaymentFlowError::Validation(format!(
                "gross amount {} does not match the payment amount",
                notification.gross_amount
            )));
        }
        let transition =
            map_gateway_status(&notification.transaction_status, notification.fraud_status.as_deref())
                .map_err(|e| PaymentFlowError::Validation(e.to_string()))?;
        debug!(
            "🔄️🔔️ Notification for {gateway_order_id}: {} / {:?} → {transition:?}",
            notification.transaction_status, notification.fraud_status
        );
        let raw = serde_json::to_string(&notification).unwrap_or_default();
        let record = NewPaymentNotification {
            payment_id: payment.id,
            transaction_id: notification.transaction_id.clone(),
            transaction_status: notification.transaction_status.clone(),
            fraud_status: notification.fraud_status.clone(),
            status_code: notification.status_code.clone(),
            gross_amount: notification.gross_amount.clone(),
            raw_body: raw.clone(),
        };
        let update = GatewayStatusUpdate {
            payment_id: payment.id,
            transition,
            transaction_id: Some(notification.transaction_id),
            payment_type: notification.payment_type,
            gateway_response: raw,
            notification: Some(record),
        };
        self.apply(update).await
    }

    /// Asks the gateway for the current status of the payment and applies it.
    ///
    /// If the gateway cannot be reached, or does not know the transaction, the error is returned and nothing is
    /// written.
    pub async fn sync_payment_status(&self, payment_id: i64) -> Result<StatusUpdateResult, PaymentFlowError> {
        let payment = self.fetch_payment(payment_id).await?;
        let response = self.gateway.transaction_status(&payment.gateway_order_id).await?;
        let status = response.transaction_status.as_deref().ok_or_else(|| {
            PaymentFlowError::Validation(format!("the gateway reported no status for {}", payment.gateway_order_id))
        })?;
        let transition = map_gateway_status(status, response.fraud_status.as_deref())
            .map_err(|e| PaymentFlowError::Validation(e.to_string()))?;
        debug!("🔄️🔍️ Gateway reports {status} for payment #{payment_id}");
        let update = GatewayStatusUpdate {
            payment_id,
            transition,
            transaction_id: response.transaction_id.clone(),
            payment_type: response.payment_type.clone(),
            gateway_response: serialize_response(&response),
            notification: None,
        };
        self.apply(update).await
    }

    /// Cancels a live payment at the gateway and locally. The order's payment status becomes `cancelled`.
    ///
    /// A Snap payment for which the customer never chose a payment channel does not exist at the gateway yet; the
    /// gateway's "not found" answer is accepted in that case.
    pub async fn cancel_payment(&self, payment_id: i64) -> Result<Payment, PaymentFlowError> {
        let payment = self.fetch_payment(payment_id).await?;
        if !payment.status.is_live() {
            return Err(PaymentFlowError::PaymentNotCancellable { id: payment_id, status: payment.status });
        }
        let response = match self.gateway.cancel_transaction(&payment.gateway_order_id).await {
            Ok(response) => Some(serialize_response(&response)),
            Err(MidtransApiError::GatewayError { status_code, .. })
                if status_code == "404" && payment.transaction_id.is_none() =>
            {
                debug!("🔄️🚫️ Payment #{payment_id} was never started at the gateway. Cancelling locally only.");
                None
            },
            Err(e) => return Err(e.into()),
        };
        let payment = self.db.cancel_payment(payment_id, response).await.map_err(|e| match e {
            PaymentGatewayError::PaymentNotCancellable { id, status } => {
                PaymentFlowError::PaymentNotCancellable { id, status }
            },
            e => e.into(),
        })?;
        info!("🔄️🚫️ Payment #{payment_id} cancelled");
        Ok(payment)
    }

    /// Fails every payment that has been pending for longer than `timeout` and marks its order's payment as expired.
    pub async fn expire_stale_payments(&self, timeout: Duration) -> Result<Vec<Payment>, PaymentFlowError> {
        let expired = self.db.expire_stale_payments(timeout).await?;
        for payment in &expired {
            info!("🔄️⌛️ Payment #{} ({}) expired after {timeout}", payment.id, payment.gateway_order_id);
        }
        Ok(expired)
    }

    pub async fn fetch_payment(&self, payment_id: i64) -> Result<Payment, PaymentFlowError> {
        self.db.fetch_payment(payment_id).await?.ok_or(PaymentFlowError::PaymentNotFound(payment_id))
    }

    async fn payable_order(
        &self,
        order_number: &OrderNumber,
    ) -> Result<(Order, Vec<OrderItem>, usize), PaymentFlowError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| PaymentFlowError::OrderNotFound(order_number.clone()))?;
        let not_payable = |reason: &str| {
            Err(PaymentFlowError::OrderNotPayable { order_number: order_number.clone(), reason: reason.to_string() })
        };
        if order.status == OrderStatusType::Cancelled {
            return not_payable("the order has been cancelled");
        }
        if order.status != OrderStatusType::Pending {
            return not_payable(&format!("the order is already {}", order.status));
        }
        if matches!(order.payment_status, OrderPaymentStatus::Paid | OrderPaymentStatus::Refunded) {
            return not_payable("the order has already been paid");
        }
        if order.total_amount.whole_rupiah() <= 0 {
            return not_payable("there is nothing to pay");
        }
        let payments = self.db.fetch_payments_for_order(order.id).await?;
        if payments.iter().any(|p| p.status.is_live()) {
            return Err(PaymentFlowError::LivePaymentExists(order_number.clone()));
        }
        let items = self.db.fetch_order_items(order.id).await?;
        Ok((order, items, payments.len()))
    }

    async fn save_payment(&self, payment: NewPayment, order: &Order) -> Result<Payment, PaymentFlowError> {
        let gateway_order_id = payment.gateway_order_id.clone();
        self.db.insert_payment(payment).await.map_err(|e| match e {
            PaymentGatewayError::LivePaymentExists(_) | PaymentGatewayError::PaymentAlreadyExists(_) => {
                warn!(
                    "🔄️💳️ Another payment for order {} was created concurrently. Gateway transaction {gateway_order_id} \
                     will be left to expire.",
                    order.order_number
                );
                PaymentFlowError::LivePaymentExists(order.order_number.clone())
            },
            e => e.into(),
        })
    }

    async fn apply(&self, update: GatewayStatusUpdate) -> Result<StatusUpdateResult, PaymentFlowError> {
        let result = self.db.apply_gateway_status(update).await?;
        if result.duplicate {
            info!("🔄️🔔️ Payment #{} update was a redelivery. Nothing changed.", result.payment.id);
            return Ok(result);
        }
        if result.superseded {
            warn!(
                "🔄️🔔️ Payment #{} has already reached {}. The gateway's older outcome was ignored.",
                result.payment.id, result.payment.status
            );
            return Ok(result);
        }
        info!(
            "🔄️🔔️ Payment #{} is {}. Order {} is {} / {}",
            result.payment.id,
            result.payment.status,
            result.order.order_number,
            result.order.status,
            result.order.payment_status
        );
        if result.order_confirmed {
            self.call_payment_confirmed_hook(&result).await;
        }
        Ok(result)
    }

    async fn call_payment_confirmed_hook(&self, result: &StatusUpdateResult) {
        for emitter in &self.producers.payment_confirmed_producer {
            debug!("🔄️🔔️ Notifying payment confirmed hook subscribers");
            let event = PaymentConfirmedEvent::new(result.order.clone(), result.payment.clone());
            emitter.publish_event(event).await;
        }
    }
}

fn serialize_response(response: &TransactionStatusResponse) -> String {
    serde_json::to_string(response).unwrap_or_default()
}
