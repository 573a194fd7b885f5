use sf_common::Rupiah;
use sha2::{Digest, Sha512};

use crate::MidtransApiError;

/// The gateway sends amounts as decimal strings, e.g. `"150000.00"`.
pub fn parse_gross_amount(amount: &str) -> Result<Rupiah, MidtransApiError> {
    amount
        .parse::<Rupiah>()
        .map_err(|e| MidtransApiError::InvalidCurrencyAmount(format!("Invalid gross amount: {amount}. {e}.")))
}

/// `hex(sha512(order_id + status_code + gross_amount + server_key))`, lower case.
pub fn notification_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    format!("{:x}", hasher.finalize())
}
