use std::fmt::Debug;

use chrono::Utc;
use log::*;

use crate::{
    db_types::{Order, OrderNumber, OrderStatusType},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    sf_api::{
        errors::OrderFlowError,
        order_objects::{CheckoutRequest, OrderDetails, OrderStatusUpdate},
    },
    traits::{PaymentGatewayDatabase, PaymentGatewayError},
};

/// Order numbers are random, so a collision is unlikely. This many attempts are made before giving up.
const ORDER_NUMBER_ATTEMPTS: usize = 3;

/// `OrderFlowApi` handles checkout, order lookups and the back-office fulfilment flow.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: PaymentGatewayDatabase
{
    /// Stores a new order from a checkout.
    ///
    /// The order gets a fresh order number, `pending` status and `pending` payment status. Its totals are derived
    /// from the items: `subtotal - discount + shipping`. Subscribers to the `OrderCreated` event are notified.
    pub async fn create_order(&self, checkout: CheckoutRequest) -> Result<OrderDetails, OrderFlowError> {
        checkout.validate()?;
        let mut attempt = 0;
        let order = loop {
            attempt += 1;
            let new_order = checkout.clone().into_new_order(OrderNumber::generate(Utc::now()));
            match self.db.insert_order(new_order).await {
                Ok(order) => break order,
                Err(PaymentGatewayError::OrderAlreadyExists(n)) if attempt < ORDER_NUMBER_ATTEMPTS => {
                    warn!("🔄️📦️ Order number {n} is already taken. Generating another.");
                },
                Err(e) => return Err(e.into()),
            }
        };
        info!("🔄️📦️ Order {} created for {}. Total {}", order.order_number, order.customer_email, order.total_amount);
        let details = self.order_details(order).await?;
        self.call_order_created_hook(&details).await;
        Ok(details)
    }

    async fn call_order_created_hook(&self, details: &OrderDetails) {
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            let event = OrderCreatedEvent::new(details.order.clone(), details.items.clone());
            emitter.publish_event(event).await;
        }
    }

    pub async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Order, OrderFlowError> {
        self.db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_number.clone()))
    }

    /// The order with its items, payment attempts and shipping history.
    pub async fn fetch_order_details(&self, order_number: &OrderNumber) -> Result<OrderDetails, OrderFlowError> {
        let order = self.fetch_order(order_number).await?;
        self.order_details(order).await
    }

    async fn order_details(&self, order: Order) -> Result<OrderDetails, OrderFlowError> {
        let items = self.db.fetch_order_items(order.id).await?;
        let payments = self.db.fetch_payments_for_order(order.id).await?;
        let shipping_history = self.db.fetch_shipping_history(order.id).await?;
        Ok(OrderDetails { order, items, payments, shipping_history })
    }

    /// Moves an order along the fulfilment flow.
    ///
    /// Orders only move forward (`pending → confirmed → processing → shipped → delivered → completed`), and may be
    /// cancelled until they ship. The change is journalled in the shipping history, with the note appended if one is
    /// given, and subscribers to the `OrderStatusChanged` event are notified.
    pub async fn update_order_status(
        &self,
        order_number: &OrderNumber,
        update: OrderStatusUpdate,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(order_number).await?;
        let from = order.status;
        let to = update.status;
        if !from.can_transition_to(to) {
            debug!("🔄️📦️ Refusing to move order {order_number} from {from} to {to}");
            return Err(OrderFlowError::IllegalTransition { order_number: order_number.clone(), from, to });
        }
        let note = update.note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let description = match &note {
            Some(note) => format!("{}: {note}", to.history_description()),
            None => to.history_description().to_string(),
        };
        let updated = self.db.update_order_status(order.id, from, to, &description).await?;
        info!("🔄️📦️ Order {order_number} moved from {from} to {to}");
        self.call_order_status_changed_hook(&updated, from, note).await;
        Ok(updated)
    }

    async fn call_order_status_changed_hook(&self, order: &Order, old_status: OrderStatusType, note: Option<String>) {
        for emitter in &self.producers.order_status_changed_producer {
            debug!("🔄️📦️ Notifying order status changed hook subscribers");
            let event = OrderStatusChangedEvent::new(order.clone(), old_status, note.clone());
            emitter.publish_event(event).await;
        }
    }
}
