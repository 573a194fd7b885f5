use thiserror::Error;

use crate::{
    db_types::{OrderPaymentStatus, OrderStatusType, PaymentStatus},
    traits::StatusTransition,
};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unrecognised gateway transaction status: {0}")]
pub struct UnknownGatewayStatus(pub String);

/// Maps a gateway `transaction_status` (and `fraud_status`, which only matters for card captures) to its local
/// effect.
///
/// | transaction_status      | fraud_status       | payment   | order payment | order     |
/// |-------------------------|--------------------|-----------|---------------|-----------|
/// | capture                 | accept or absent   | success   | paid          | confirmed |
/// | capture                 | challenge          | challenge | pending       |           |
/// | capture                 | deny               | failed    | failed        |           |
/// | settlement              |                    | success   | paid          | confirmed |
/// | cancel                  |                    | failed    | cancelled     |           |
/// | deny                    |                    | failed    | failed        |           |
/// | expire                  |                    | failed    | expired       |           |
/// | pending                 |                    | pending   | pending       |           |
/// | refund, partial_refund  |                    | refunded  | refunded      |           |
pub fn map_gateway_status(
    transaction_status: &str,
    fraud_status: Option<&str>,
) -> Result<StatusTransition, UnknownGatewayStatus> {
    use OrderPaymentStatus as Order;
    use PaymentStatus as Pay;
    let paid = StatusTransition::new(Pay::Success, Order::Paid).with_order_status(OrderStatusType::Confirmed);
    let transition = match transaction_status {
        "capture" => match fraud_status {
            None | Some("accept") => paid,
            Some("challenge") => StatusTransition::new(Pay::Challenge, Order::Pending),
            Some("deny") => StatusTransition::new(Pay::Failed, Order::Failed),
            Some(other) => return Err(UnknownGatewayStatus(format!("capture with fraud status {other}"))),
        },
        "settlement" => paid,
        "cancel" => StatusTransition::new(Pay::Failed, Order::Cancelled),
        "deny" => StatusTransition::new(Pay::Failed, Order::Failed),
        "expire" => StatusTransition::new(Pay::Failed, Order::Expired),
        "pending" => StatusTransition::new(Pay::Pending, Order::Pending),
        "refund" | "partial_refund" => StatusTransition::new(Pay::Refunded, Order::Refunded),
        other => return Err(UnknownGatewayStatus(other.to_string())),
    };
    Ok(transition)
}
