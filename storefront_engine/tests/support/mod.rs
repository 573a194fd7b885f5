#![allow(dead_code)]
pub mod fake_gateway;

use log::*;
use sf_common::Rupiah;
use storefront_engine::{
    db_types::NewOrderItem,
    events::EventProducers,
    order_objects::CheckoutRequest,
    test_utils::prepare_env::{drop_test_database, prepare_test_env, random_db_path},
    OrderFlowApi,
    PaymentFlowApi,
    PaymentGatewayDatabase,
    SqliteDatabase,
};

pub use self::fake_gateway::{FakeGateway, SERVER_KEY};

pub struct TestSystem {
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub payments: PaymentFlowApi<SqliteDatabase, FakeGateway>,
    pub gateway: FakeGateway,
}

impl TestSystem {
    pub async fn new() -> Self {
        Self::with_producers(EventProducers::default()).await
    }

    pub async fn with_producers(producers: EventProducers) -> Self {
        let db = prepare_test_env(&random_db_path()).await;
        let gateway = FakeGateway::default();
        let orders = OrderFlowApi::new(db.clone(), producers.clone());
        let payments = PaymentFlowApi::new(db.clone(), gateway.clone(), producers);
        Self { db, orders, payments, gateway }
    }

    pub async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        if let Err(e) = self.db.close().await {
            error!("🚀️ Failed to close database: {e}");
        }
        drop(self.orders);
        drop(self.payments);
        drop_test_database(&url).await;
    }
}

pub fn item(name: &str, price: i64, quantity: i64) -> NewOrderItem {
    NewOrderItem {
        product_id: 1,
        product_name: name.to_string(),
        size: Some("M".to_string()),
        color: Some("Black".to_string()),
        unit_price: Rupiah::from_rupiah(price),
        quantity,
    }
}

/// A checkout for a single Rp150.000 item.
pub fn checkout() -> CheckoutRequest {
    checkout_with(vec![item("Kaos Polos", 150_000, 1)])
}

pub fn checkout_with(items: Vec<NewOrderItem>) -> CheckoutRequest {
    CheckoutRequest {
        customer_name: "Budi Santoso".to_string(),
        customer_email: "budi@example.com".to_string(),
        customer_phone: Some("081234567890".to_string()),
        shipping_address: "Jl. Merdeka No. 1, Bandung".to_string(),
        items,
        discount_amount: Rupiah::default(),
        shipping_cost: Rupiah::default(),
        notes: None,
    }
}
