//! Turns an order into the payload the payment gateway expects.
//!
//! The gateway rejects a transaction unless `gross_amount` equals the sum of `price * quantity` over the items, and
//! it only accepts whole rupiah. Every line is therefore rounded first, and the gross amount is computed from the
//! rounded lines. The discount is sent as a negative line and shipping as a positive one.
use midtrans_tools::{CustomerDetails, ItemDetail, TransactionDetails};

use crate::db_types::{Order, OrderItem, OrderNumber};

pub const DISCOUNT_ITEM_ID: &str = "DISCOUNT";
pub const SHIPPING_ITEM_ID: &str = "SHIPPING";

/// The first attempt uses the order number itself. Retries get a numeric suffix, since the gateway refuses to reuse
/// an order id.
pub fn gateway_order_id(order_number: &OrderNumber, previous_attempts: usize) -> String {
    if previous_attempts == 0 {
        order_number.to_string()
    } else {
        format!("{order_number}-{}", previous_attempts + 1)
    }
}

pub fn item_details(order: &Order, items: &[OrderItem]) -> Vec<ItemDetail> {
    let mut result = items
        .iter()
        .map(|item| {
            let name = match (&item.size, &item.color) {
                (Some(size), Some(color)) => format!("{} ({size}, {color})", item.product_name),
                (Some(v), None) | (None, Some(v)) => format!("{} ({v})", item.product_name),
                (None, None) => item.product_name.clone(),
            };
            ItemDetail::new(item.product_id.to_string(), item.unit_price.whole_rupiah(), item.quantity, &name)
        })
        .collect::<Vec<_>>();
    let discount = order.discount_amount.whole_rupiah();
    if discount != 0 {
        result.push(ItemDetail::new(DISCOUNT_ITEM_ID, -discount, 1, "Diskon"));
    }
    let shipping = order.shipping_cost.whole_rupiah();
    if shipping != 0 {
        result.push(ItemDetail::new(SHIPPING_ITEM_ID, shipping, 1, "Ongkos Kirim"));
    }
    result
}

pub fn transaction_details(gateway_order_id: &str, items: &[ItemDetail]) -> TransactionDetails {
    let gross_amount = items.iter().map(ItemDetail::line_total).sum();
    TransactionDetails { order_id: gateway_order_id.to_string(), gross_amount }
}

pub fn customer_details(order: &Order) -> CustomerDetails {
    let mut names = order.customer_name.trim().splitn(2, ' ');
    let first_name = names.next().unwrap_or_default().to_string();
    let last_name = names.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    CustomerDetails {
        first_name,
        last_name,
        email: order.customer_email.clone(),
        phone: order.customer_phone.clone(),
    }
}
