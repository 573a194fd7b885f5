use cucumber::{then, when};
use sf_common::Rupiah;
use storefront_engine::{
    db_types::{OrderPaymentStatus, OrderStatusType, PaymentStatus},
    OrderManagement,
};

use crate::{
    cucumber::StoreWorld,
    support::{checkout_with, fake_gateway::signed_notification, item},
};

#[when(expr = "a customer checks out {int} x '{word}' at Rp{int} with Rp{int} shipping")]
async fn place_order(world: &mut StoreWorld, qty: i64, product: String, price: i64, shipping: i64) {
    let mut request = checkout_with(vec![item(&product, price, qty)]);
    request.shipping_cost = Rupiah::from_rupiah(shipping);
    let details = world.system().orders.create_order(request).await.expect("Error creating order");
    world.order_number = Some(details.order.order_number);
}

#[when("the customer opens a Snap payment")]
async fn open_snap(world: &mut StoreWorld) {
    let number = world.order_number().clone();
    let result = world.system().payments.create_snap_payment(&number).await;
    match result {
        Ok(snap) => world.payment = Some(snap.payment),
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "the gateway reports {string} for the payment")]
async fn gateway_reports(world: &mut StoreWorld, status: String) {
    let payment = world.payment().clone();
    let gross = payment.amount.to_gateway_string();
    let notification = signed_notification(&payment.gateway_order_id, &status, None, &gross);
    let result = world.system().payments.handle_notification(notification).await;
    match result {
        Ok(result) => world.payment = Some(result.payment),
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when("the customer cancels the payment")]
async fn cancel_payment(world: &mut StoreWorld) {
    let id = world.payment().id;
    let payment = world.system().payments.cancel_payment(id).await.expect("Error cancelling payment");
    world.payment = Some(payment);
}

#[then(expr = "the order total is Rp{int}")]
async fn order_total(world: &mut StoreWorld, total: i64) {
    let order = world.system().orders.fetch_order(world.order_number()).await.expect("Error fetching order");
    assert_eq!(order.total_amount, Rupiah::from_rupiah(total));
}

#[then(expr = "the order is {word} with payment status {word}")]
async fn order_state(world: &mut StoreWorld, status: String, payment_status: String) {
    let order = world.system().orders.fetch_order(world.order_number()).await.expect("Error fetching order");
    assert_eq!(order.status, status.parse::<OrderStatusType>().expect("Unknown order status"));
    assert_eq!(order.payment_status, payment_status.parse::<OrderPaymentStatus>().expect("Unknown payment status"));
}

#[then(expr = "the payment is {word}")]
async fn payment_state(world: &mut StoreWorld, status: String) {
    let id = world.payment().id;
    let payment = world.system().payments.fetch_payment(id).await.expect("Error fetching payment");
    assert_eq!(payment.status, status.parse::<PaymentStatus>().expect("Unknown payment status"));
}

#[then(expr = "the shipping history has {int} entries")]
async fn history_length(world: &mut StoreWorld, count: usize) {
    let order = world.system().orders.fetch_order(world.order_number()).await.expect("Error fetching order");
    let history = world.system().db.fetch_shipping_history(order.id).await.expect("Error fetching history");
    assert_eq!(history.len(), count);
}

#[then(expr = "the request fails with {string}")]
async fn request_failed(world: &mut StoreWorld, message: String) {
    let err = world.last_error.take().expect("The request did not fail");
    assert!(err.contains(&message), "'{err}' does not mention '{message}'");
}
