use log::*;
use sf_common::{helpers::parse_boolean_flag, Secret};

const SANDBOX_SNAP_URL: &str = "https://app.sandbox.midtrans.com/snap/v1";
const PRODUCTION_SNAP_URL: &str = "https://app.midtrans.com/snap/v1";
const SANDBOX_CORE_URL: &str = "https://api.sandbox.midtrans.com/v2";
const PRODUCTION_CORE_URL: &str = "https://api.midtrans.com/v2";

#[derive(Debug, Clone, Default)]
pub struct MidtransConfig {
    /// The merchant server key. Used for HTTP Basic auth against the API and for notification signatures.
    pub server_key: Secret<String>,
    /// The client key is public; it is handed to the storefront so that Snap.js can be initialised.
    pub client_key: String,
    pub is_production: bool,
    /// Where Snap sends the customer after the payment page closes.
    pub finish_url: Option<String>,
    /// If set, sent as `X-Override-Notification` so that notifications for transactions created here are delivered
    /// to this URL instead of the one configured in the Midtrans dashboard.
    pub notification_url: Option<String>,
}

impl MidtransConfig {
    pub fn new_from_env_or_default() -> Self {
        let server_key = Secret::new(std::env::var("SF_MIDTRANS_SERVER_KEY").unwrap_or_else(|_| {
            warn!("SF_MIDTRANS_SERVER_KEY not set. Gateway calls and notification signature checks will fail.");
            String::default()
        }));
        let client_key = std::env::var("SF_MIDTRANS_CLIENT_KEY").unwrap_or_else(|_| {
            warn!("SF_MIDTRANS_CLIENT_KEY not set. The storefront will not be able to open the Snap payment page.");
            String::default()
        });
        let is_production = parse_boolean_flag(std::env::var("SF_MIDTRANS_PRODUCTION").ok(), false);
        if is_production {
            info!("Midtrans is configured for PRODUCTION. Real money will change hands.");
        } else {
            info!("Midtrans is configured for the sandbox environment.");
        }
        let finish_url = std::env::var("SF_MIDTRANS_FINISH_URL").ok().filter(|s| !s.is_empty());
        let notification_url = std::env::var("SF_MIDTRANS_NOTIFICATION_URL").ok().filter(|s| !s.is_empty());
        Self { server_key, client_key, is_production, finish_url, notification_url }
    }

    pub fn snap_url(&self) -> &'static str {
        if self.is_production {
            PRODUCTION_SNAP_URL
        } else {
            SANDBOX_SNAP_URL
        }
    }

    pub fn core_url(&self) -> &'static str {
        if self.is_production {
            PRODUCTION_CORE_URL
        } else {
            SANDBOX_CORE_URL
        }
    }
}
