use std::{env, net::IpAddr};

use chrono::Duration;
use log::*;
use midtrans_tools::MidtransConfig;
use sf_common::helpers::parse_boolean_flag;
use storefront_engine::payment_objects::PaymentOptions;

use crate::auth::AccessKeys;

const DEFAULT_SF_HOST: &str = "127.0.0.1";
const DEFAULT_SF_PORT: u16 = 8370;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/storefront.db";
const DEFAULT_PENDING_PAYMENT_TIMEOUT_HOURS: i64 = 24;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Back-office API keys and their roles.
    pub access_keys: AccessKeys,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address.
    pub use_forwarded: bool,
    /// If supplied, gateway notifications are only accepted from these addresses.
    pub midtrans_whitelist: Option<Vec<IpAddr>>,
    /// The time before a pending payment is considered abandoned and marked as failed.
    pub pending_payment_timeout: Duration,
    pub midtrans: MidtransConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_SF_HOST.to_string(),
            port: DEFAULT_SF_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            access_keys: AccessKeys::default(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            midtrans_whitelist: None,
            pending_payment_timeout: Duration::hours(DEFAULT_PENDING_PAYMENT_TIMEOUT_HOURS),
            midtrans: MidtransConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("SF_HOST").ok().unwrap_or_else(|| DEFAULT_SF_HOST.into());
        let port = env::var("SF_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!("🪛️ {s} is not a valid port for SF_PORT. {e} Using the default, {DEFAULT_SF_PORT}, instead.");
                    DEFAULT_SF_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_SF_PORT);
        let database_url = env::var("SF_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ SF_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let access_keys = configure_access_keys();
        let use_x_forwarded_for = parse_boolean_flag(env::var("SF_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("SF_USE_FORWARDED").ok(), false);
        let midtrans_whitelist = configure_whitelist(env::var("SF_MIDTRANS_IP_WHITELIST").ok());
        let pending_payment_timeout = configure_payment_timeout();
        let midtrans = MidtransConfig::new_from_env_or_default();
        Self {
            host,
            port,
            database_url,
            access_keys,
            use_x_forwarded_for,
            use_forwarded,
            midtrans_whitelist,
            pending_payment_timeout,
            midtrans,
        }
    }

    pub fn payment_options(&self) -> PaymentOptions {
        PaymentOptions {
            finish_url: self.midtrans.finish_url.clone(),
            ewallet_callback_url: self.midtrans.finish_url.clone(),
        }
    }
}

fn configure_access_keys() -> AccessKeys {
    match env::var("SF_ACCESS_KEYS") {
        Ok(s) => s.parse::<AccessKeys>().unwrap_or_else(|e| {
            error!("🪛️ SF_ACCESS_KEYS is invalid. {e}. No back-office keys will be accepted.");
            AccessKeys::default()
        }),
        Err(_) => {
            warn!("🪛️ SF_ACCESS_KEYS is not set. Back-office routes will refuse every request.");
            AccessKeys::default()
        },
    }
}

/// `None` disables the whitelist. Explicitly disabled with "none", "false" or "0".
fn configure_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let whitelist = value.and_then(|s| {
        if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
            return None;
        }
        let ip_addrs = s
            .split(',')
            .map(str::trim)
            .filter_map(|s| {
                s.parse::<IpAddr>().map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in SF_MIDTRANS_IP_WHITELIST: {e}")).ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The Midtrans IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 gateway notifications."
            );
        },
        None => {
            info!("🪛️ No Midtrans IP whitelist is set. Only signature validation will be used.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Midtrans IP whitelist: {addrs}");
        },
    }
    whitelist
}

fn configure_payment_timeout() -> Duration {
    env::var("SF_PENDING_PAYMENT_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ SF_PENDING_PAYMENT_TIMEOUT is not set. Using the default value of \
                 {DEFAULT_PENDING_PAYMENT_TIMEOUT_HOURS} hrs."
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for SF_PENDING_PAYMENT_TIMEOUT. {e}"))
        })
        .ok()
        .filter(|d| *d > Duration::zero())
        .unwrap_or_else(|| Duration::hours(DEFAULT_PENDING_PAYMENT_TIMEOUT_HOURS))
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. It excludes secrets so that
/// it can be handed to request handlers freely.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self { use_x_forwarded_for: config.use_x_forwarded_for, use_forwarded: config.use_forwarded }
    }
}
