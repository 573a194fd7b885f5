mod status_mapper;
mod transaction_builder;

pub use status_mapper::{map_gateway_status, UnknownGatewayStatus};
pub use transaction_builder::{
    customer_details,
    gateway_order_id,
    item_details,
    transaction_details,
    DISCOUNT_ITEM_ID,
    SHIPPING_ITEM_ID,
};
