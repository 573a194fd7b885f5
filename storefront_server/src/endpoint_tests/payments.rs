use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::Utc;
use midtrans_tools::{MidtransApiError, SnapResponse, TransactionStatusResponse};
use serde_json::json;
use sf_common::Rupiah;
use storefront_engine::{
    db_types::{OrderItem, OrderPaymentStatus, OrderStatusType, PaymentStatus},
    events::EventProducers,
    traits::StatusUpdateResult,
    PaymentFlowApi,
    PaymentGatewayError,
};

use super::{
    helpers::{get_request, json, post_request},
    mocks::{sample_order, sample_payment, MockGateway, MockPaymentDb, ORDER_NUMBER},
};
use crate::routes::{CancelPaymentRoute, CreatePaymentRoute, PaymentNotificationRoute, PaymentStatusRoute};

fn configure(db: MockPaymentDb, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg| {
        let api = PaymentFlowApi::new(db, gateway, EventProducers::default());
        cfg.app_data(web::Data::new(api))
            .service(
                web::scope("/payments/notification")
                    .service(PaymentNotificationRoute::<MockPaymentDb, MockGateway>::new()),
            )
            .service(CreatePaymentRoute::<MockPaymentDb, MockGateway>::new())
            .service(PaymentStatusRoute::<MockPaymentDb, MockGateway>::new())
            .service(CancelPaymentRoute::<MockPaymentDb, MockGateway>::new());
    }
}

fn sample_item() -> OrderItem {
    OrderItem {
        id: 1,
        order_id: 1,
        product_id: 3,
        product_name: "Kemeja Batik".into(),
        size: Some("M".into()),
        color: Some("Biru".into()),
        unit_price: Rupiah::from_rupiah(150_000),
        quantity: 1,
        created_at: Utc::now(),
    }
}

fn settlement() -> serde_json::Value {
    json!({
        "transaction_status": "settlement",
        "transaction_id": "e48447d1-cfa9-4b02-b163-2e915d4417ac",
        "order_id": ORDER_NUMBER,
        "status_code": "200",
        "gross_amount": "150000.00",
        "signature_key": "0123abcd",
        "fraud_status": "accept",
        "payment_type": "bank_transfer"
    })
}

#[actix_web::test]
async fn open_snap_payment() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order())));
    db.expect_fetch_payments_for_order().returning(|_| Ok(vec![]));
    db.expect_fetch_order_items().returning(|_| Ok(vec![sample_item()]));
    db.expect_insert_payment()
        .withf(|p| p.gateway_order_id == ORDER_NUMBER && p.amount == Rupiah::from_rupiah(150_000))
        .times(1)
        .returning(|_| Ok(sample_payment()));
    let mut gateway = MockGateway::new();
    gateway
        .expect_create_snap_transaction()
        .withf(|req| req.transaction_details.gross_amount == 150_000)
        .times(1)
        .returning(|_| {
            Ok(SnapResponse {
                token: "snap-token".into(),
                redirect_url: "https://app.sandbox.midtrans.com/snap/v4/redirection/snap-token".into(),
            })
        });
    let body = json!({ "order_number": ORDER_NUMBER });
    let (status, body) =
        post_request("", "/payments/create", body, configure(db, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::CREATED);
    let body = json(&body);
    assert_eq!(body["data"]["token"], "snap-token");
    assert_eq!(body["data"]["payment"]["status"], "pending");
}

#[actix_web::test]
async fn second_live_payment_is_refused() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_order_by_number().returning(|_| Ok(Some(sample_order())));
    db.expect_fetch_payments_for_order().returning(|_| Ok(vec![sample_payment()]));
    let mut gateway = MockGateway::new();
    gateway.expect_create_snap_transaction().never();
    let body = json!({ "order_number": ORDER_NUMBER });
    let (status, body) =
        post_request("", "/payments/create", body, configure(db, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["message"], format!("Order {ORDER_NUMBER} already has a payment awaiting completion"));
}

#[actix_web::test]
async fn notification_with_bad_signature() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_payment_by_gateway_order_id().never();
    db.expect_apply_gateway_status().never();
    let mut gateway = MockGateway::new();
    gateway.expect_verify_notification().returning(|_| false);
    let (status, body) = post_request("", "/payments/notification", settlement(), configure(db, gateway))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["message"], "The notification signature is invalid");
}

#[actix_web::test]
async fn notification_for_unknown_order() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_payment_by_gateway_order_id().returning(|_| Ok(None));
    let mut gateway = MockGateway::new();
    gateway.expect_verify_notification().returning(|_| true);
    let (status, _) = post_request("", "/payments/notification", settlement(), configure(db, gateway))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn settlement_notification_confirms_order() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_payment_by_gateway_order_id()
        .withf(|id| id == ORDER_NUMBER)
        .returning(|_| Ok(Some(sample_payment())));
    db.expect_apply_gateway_status()
        .withf(|u| {
            u.payment_id == 7 &&
                u.transition.payment_status == PaymentStatus::Success &&
                u.transition.order_status == Some(OrderStatusType::Confirmed) &&
                u.notification.is_some()
        })
        .times(1)
        .returning(|u| {
            let mut payment = sample_payment();
            payment.status = u.transition.payment_status;
            let mut order = sample_order();
            order.status = OrderStatusType::Confirmed;
            order.payment_status = OrderPaymentStatus::Paid;
            Ok(StatusUpdateResult { payment, order, order_confirmed: true, duplicate: false, superseded: false })
        });
    let mut gateway = MockGateway::new();
    gateway.expect_verify_notification().returning(|_| true);
    let (status, body) = post_request("", "/payments/notification", settlement(), configure(db, gateway))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["data"]["order_status"], "confirmed");
    assert_eq!(body["data"]["order_payment_status"], "paid");
    assert_eq!(body["data"]["duplicate"], false);
}

#[actix_web::test]
async fn amount_mismatch_is_rejected() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_payment_by_gateway_order_id().returning(|_| Ok(Some(sample_payment())));
    db.expect_apply_gateway_status().never();
    let mut gateway = MockGateway::new();
    gateway.expect_verify_notification().returning(|_| true);
    let mut notification = settlement();
    notification["gross_amount"] = json!("1.00");
    let (status, _) = post_request("", "/payments/notification", notification, configure(db, gateway))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn gateway_errors_are_passed_through() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_payment().returning(|_| Ok(Some(sample_payment())));
    db.expect_apply_gateway_status().never();
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_status().returning(|_| {
        Err(MidtransApiError::GatewayError {
            status_code: "404".into(),
            message: "Transaction doesn't exist.".into(),
        })
    });
    let (status, body) = get_request("", "/payments/7/status", configure(db, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let message = json(&body)["message"].as_str().unwrap().to_string();
    assert!(message.contains("Transaction doesn't exist."), "{message}");
}

#[actix_web::test]
async fn polled_status_is_applied() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_payment().returning(|_| Ok(Some(sample_payment())));
    db.expect_apply_gateway_status()
        .withf(|u| u.transition.payment_status == PaymentStatus::Failed && u.notification.is_none())
        .returning(|u| {
            let mut payment = sample_payment();
            payment.status = u.transition.payment_status;
            let mut order = sample_order();
            order.payment_status = OrderPaymentStatus::Expired;
            Ok(StatusUpdateResult { payment, order, order_confirmed: false, duplicate: false, superseded: false })
        });
    let mut gateway = MockGateway::new();
    gateway.expect_transaction_status().returning(|_| {
        Ok(TransactionStatusResponse {
            status_code: "407".into(),
            transaction_status: Some("expire".into()),
            ..Default::default()
        })
    });
    let (status, body) = get_request("", "/payments/7/status", configure(db, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let body = json(&body);
    assert_eq!(body["data"]["payment"]["status"], "failed");
    assert_eq!(body["data"]["order_payment_status"], "expired");
}

#[actix_web::test]
async fn cancel_unknown_payment() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_payment().returning(|_| Ok(None));
    let mut gateway = MockGateway::new();
    gateway.expect_cancel_transaction().never();
    let (status, body) =
        post_request("", "/payments/99/cancel", json!({}), configure(db, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["message"], "Payment 99 does not exist");
}

#[actix_web::test]
async fn cancel_database_failure_is_masked() {
    let _ = env_logger::try_init();
    let mut db = MockPaymentDb::new();
    db.expect_fetch_payment().returning(|_| Err(PaymentGatewayError::DatabaseError("database is locked".into())));
    let gateway = MockGateway::new();
    let (status, body) =
        post_request("", "/payments/7/cancel", json!({}), configure(db, gateway)).await.expect("Request failed");
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body.contains("locked"));
}

#[actix_web::test]
async fn invalid_payment_id_in_path() {
    let _ = env_logger::try_init();
    let (status, body) = get_request("", "/payments/abc/status", configure(MockPaymentDb::new(), MockGateway::new()))
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
}
