use std::fmt::Debug;

use cucumber::World;
use storefront_engine::db_types::{OrderNumber, Payment};

use crate::support::TestSystem;

#[derive(Default, World)]
pub struct StoreWorld {
    pub system: Option<TestSystem>,
    pub order_number: Option<OrderNumber>,
    pub payment: Option<Payment>,
    pub last_error: Option<String>,
}

impl Debug for StoreWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreWorld")
            .field("order_number", &self.order_number)
            .field("payment", &self.payment.as_ref().map(|p| p.id))
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl StoreWorld {
    pub fn system(&self) -> &TestSystem {
        self.system.as_ref().expect("Store not initialised")
    }

    pub fn order_number(&self) -> &OrderNumber {
        self.order_number.as_ref().expect("No order has been placed")
    }

    pub fn payment(&self) -> &Payment {
        self.payment.as_ref().expect("No payment has been opened")
    }
}
