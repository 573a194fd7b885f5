use chrono::{Duration, TimeZone, Utc};
use midtrans_tools::{
    ChargeRequest,
    MidtransApiError,
    MidtransNotification,
    PaymentGateway,
    SnapRequest,
    SnapResponse,
    TransactionStatusResponse,
};
use mockall::mock;
use sf_common::Rupiah;
use storefront_engine::{
    db_types::{
        NewOrder,
        NewPayment,
        Order,
        OrderItem,
        OrderNumber,
        OrderPaymentStatus,
        OrderStatusType,
        Payment,
        PaymentStatus,
        ShippingHistory,
    },
    traits::{GatewayStatusUpdate, OrderManagement, PaymentGatewayDatabase, PaymentGatewayError, StatusUpdateResult},
};

mock! {
    pub PaymentDb {}
    impl Clone for PaymentDb {
        fn clone(&self) -> Self;
    }
    impl OrderManagement for PaymentDb {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, PaymentGatewayError>;
        async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fetch_order_by_id(&self, id: i64) -> Result<Option<Order>, PaymentGatewayError>;
        async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, PaymentGatewayError>;
        async fn fetch_shipping_history(&self, order_id: i64) -> Result<Vec<ShippingHistory>, PaymentGatewayError>;
        async fn update_order_status(&self, order_id: i64, from: OrderStatusType, to: OrderStatusType, description: &str) -> Result<Order, PaymentGatewayError>;
    }
    impl PaymentGatewayDatabase for PaymentDb {
        fn url(&self) -> &str;
        async fn insert_payment(&self, payment: NewPayment) -> Result<Payment, PaymentGatewayError>;
        async fn fetch_payment(&self, id: i64) -> Result<Option<Payment>, PaymentGatewayError>;
        async fn fetch_payment_by_gateway_order_id(&self, gateway_order_id: &str) -> Result<Option<Payment>, PaymentGatewayError>;
        async fn fetch_payments_for_order(&self, order_id: i64) -> Result<Vec<Payment>, PaymentGatewayError>;
        async fn apply_gateway_status(&self, update: GatewayStatusUpdate) -> Result<StatusUpdateResult, PaymentGatewayError>;
        async fn cancel_payment(&self, payment_id: i64, gateway_response: Option<String>) -> Result<Payment, PaymentGatewayError>;
        async fn expire_stale_payments(&self, timeout: Duration) -> Result<Vec<Payment>, PaymentGatewayError>;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn create_snap_transaction(&self, request: &SnapRequest) -> Result<SnapResponse, MidtransApiError>;
        async fn charge(&self, request: &ChargeRequest) -> Result<TransactionStatusResponse, MidtransApiError>;
        async fn transaction_status(&self, gateway_order_id: &str) -> Result<TransactionStatusResponse, MidtransApiError>;
        async fn cancel_transaction(&self, gateway_order_id: &str) -> Result<TransactionStatusResponse, MidtransApiError>;
        fn verify_notification(&self, notification: &MidtransNotification) -> bool;
    }
}

pub const ORDER_NUMBER: &str = "ORD-20240315-K7Q2ZD";

pub fn sample_order() -> Order {
    let created = Utc.with_ymd_and_hms(2024, 3, 15, 8, 30, 0).unwrap();
    Order {
        id: 1,
        order_number: OrderNumber::from(ORDER_NUMBER),
        customer_name: "Dewi".into(),
        customer_email: "dewi@example.com".into(),
        customer_phone: Some("081234567890".into()),
        shipping_address: "Jl. Malioboro 5, Yogyakarta".into(),
        status: OrderStatusType::Pending,
        payment_status: OrderPaymentStatus::Pending,
        subtotal: Rupiah::from_rupiah(150_000),
        discount_amount: Rupiah::default(),
        shipping_cost: Rupiah::default(),
        total_amount: Rupiah::from_rupiah(150_000),
        notes: None,
        created_at: created,
        updated_at: created,
    }
}

pub fn sample_payment() -> Payment {
    let created = Utc.with_ymd_and_hms(2024, 3, 15, 8, 31, 0).unwrap();
    Payment {
        id: 7,
        order_id: 1,
        gateway_order_id: ORDER_NUMBER.into(),
        transaction_id: None,
        payment_type: None,
        status: PaymentStatus::Pending,
        amount: Rupiah::from_rupiah(150_000),
        snap_token: Some("snap-token".into()),
        snap_redirect_url: Some("https://app.sandbox.midtrans.com/snap/v4/redirection/snap-token".into()),
        gateway_response: None,
        paid_at: None,
        created_at: created,
        updated_at: created,
    }
}
