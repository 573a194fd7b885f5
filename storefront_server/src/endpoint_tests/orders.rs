use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;
use storefront_engine::{
    db_types::{OrderNumber, OrderStatusType},
    events::EventProducers,
    OrderFlowApi,
    PaymentGatewayError,
};

use super::{
    helpers::{get_request, json, post_request, put_request, ADMIN_KEY, STAFF_KEY},
    mocks::{sample_order, MockPaymentDb, ORDER_NUMBER},
};
use crate::routes::{CreateOrderRoute, OrderDetailsRoute, UpdateOrderStatusRoute};

fn configure(db: MockPaymentDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = OrderFlowApi::new(db, EventProducers::default());
        cfg.app_data(web::Data::new(api))
            .service(CreateOrderRoute::<MockPaymentDb>::new())
            .service(OrderDetailsRoute::<MockPaymentDb>::new())
            .service(UpdateOrderStatusRoute::<MockPaymentDb>::new());
    }
}

fn details_lookups(db: &mut MockPaymentDb) {
    db.expect_fetch_order_items().returning(|_| Ok(vec![]));
    db.expect_fetch_payments_for_order().returning(|_| Ok(vec![]));
    db.expect_fetch_shipping_history().returning(|_| Ok(vec![]));
}

#[actix_web::test]
async fn checkout_creates_an_order() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_insert_order()
        .withf(|o| o.customer_email == "dewi@example.com" && o.order_number.as_str().starts_with("ORD-"))
        .times(1)
        .returning(|_| Ok(sample_order()));
    details_lookups(&mut db);
    let checkout = json!({
        "customer_name": "Dewi",
        "customer_email": "dewi@example.com",
        "shipping_address": "Jl. Malioboro 5, Yogyakarta",
        "items": [{"product_id": 3, "product_name": "Kemeja Batik", "size": "M", "color": "Biru", "unit_price": 150000, "quantity": 1}]
    });
    let (status, body) = post_request("", "/orders", checkout, configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let body = json(&body);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["order"]["order_number"], ORDER_NUMBER);
    assert_eq!(body["data"]["order"]["total_amount"], 150000);
}

#[actix_web::test]
async fn invalid_checkout_is_rejected() {
    let _ = env_logger::try_init();
    let db = MockPaymentDb::new();
    let checkout = json!({
        "customer_name": "Dewi",
        "customer_email": "dewi@example.com",
        "shipping_address": "Jl. Malioboro 5, Yogyakarta",
        "items": []
    });
    let (status, body) = post_request("", "/orders", checkout, configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid order: an order needs at least one item");
}

#[actix_web::test]
async fn oversized_checkout_is_rejected() {
    let _ = env_logger::try_init();
    let db = MockPaymentDb::new();
    let checkout = json!({
        "customer_name": "Dewi",
        "customer_email": "dewi@example.com",
        "shipping_address": "Jl. Malioboro 5, Yogyakarta",
        "items": [{"product_id": 3, "product_name": "Kemeja Batik", "unit_price": 150000, "quantity": 1_000_000_000_000i64}]
    });
    let (status, body) = post_request("", "/orders", checkout, configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body = json(&body);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid order: quantity for Kemeja Batik cannot exceed 10000");
}

#[actix_web::test]
async fn malformed_checkout_body() {
    let _ = env_logger::try_init();
    let db = MockPaymentDb::new();
    let (status, body) =
        post_request("", "/orders", json!({"customer_name": 42}), configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
}

#[actix_web::test]
async fn fetch_order_details() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_order_by_number()
        .withf(|n| n.as_str() == ORDER_NUMBER)
        .returning(|_| Ok(Some(sample_order())));
    details_lookups(&mut db);
    let path = format!("/orders/{ORDER_NUMBER}");
    let (status, body) = get_request("", &path, configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["data"]["order"]["status"], "pending");
    assert_eq!(body["data"]["payments"], json!([]));
}

#[actix_web::test]
async fn unknown_order_is_not_found() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(None));
    let (status, body) = get_request("", "/orders/ORD-NOPE", configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["message"], "Order ORD-NOPE does not exist");
}

#[actix_web::test]
async fn database_errors_are_not_leaked() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_order_by_number()
        .returning(|_| Err(PaymentGatewayError::DatabaseError("no such table: orders".into())));
    let (status, body) = get_request("", "/orders/ORD-1", configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("no such table"));
    assert_eq!(json(&body)["message"], crate::errors::GENERIC_SERVER_ERROR);
}

#[actix_web::test]
async fn status_update_requires_an_api_key() {
    let _ = env_logger::try_init();
    let db = MockPaymentDb::new();
    let path = format!("/orders/{ORDER_NUMBER}/status");
    let (status, body) =
        put_request("", &path, json!({"status": "confirmed"}), configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["success"], false);
    let db = MockPaymentDb::new();
    let (status, _) =
        put_request("not-a-key", &path, json!({"status": "confirmed"}), configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn staff_can_ship_orders() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_order_by_number().returning(|_| {
        let mut order = sample_order();
        order.status = OrderStatusType::Processing;
        Ok(Some(order))
    });
    db.expect_update_order_status()
        .withf(|id, from, to, desc| {
            *id == 1 &&
                *from == OrderStatusType::Processing &&
                *to == OrderStatusType::Shipped &&
                desc == "Pesanan Dikirim: JNE 0123456789"
        })
        .times(1)
        .returning(|_, _, to, _| {
            let mut order = sample_order();
            order.status = to;
            Ok(order)
        });
    let path = format!("/orders/{ORDER_NUMBER}/status");
    let body = json!({"status": "shipped", "note": "JNE 0123456789"});
    let (status, body) = put_request(STAFF_KEY, &path, body, configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["data"]["status"], "shipped");
}

#[actix_web::test]
async fn backwards_transition_is_rejected() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_order_by_number().returning(|_| {
        let mut order = sample_order();
        order.status = OrderStatusType::Shipped;
        Ok(Some(order))
    });
    db.expect_update_order_status().never();
    let path = format!("/orders/{ORDER_NUMBER}/status");
    let (status, body) =
        put_request(ADMIN_KEY, &path, json!({"status": "cancelled"}), configure(db)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json(&body)["message"],
        format!("Order {} cannot move from shipped to cancelled", OrderNumber::from(ORDER_NUMBER))
    );
}
