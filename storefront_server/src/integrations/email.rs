//! Customer e-mail notifications.
//!
//! The notifier listens to order and payment events and writes to the customer when an order is placed, when its
//! payment is confirmed and when it moves along the fulfilment flow. SMTP credentials, the sender and the on/off
//! toggles are read from the settings store through the settings cache on every send, so back-office changes apply
//! without a restart (once the cache refreshes).
//!
//! Sending happens inside the event handler tasks. The request that triggered the event never waits for it, and a
//! failed send is logged and dropped.
use std::collections::HashMap;

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
};
use log::*;
use sf_common::{helpers::setting_is_enabled, Secret};
use storefront_engine::{
    db_types::{Order, OrderItem, Payment},
    events::{EventHooks, OrderCreatedEvent, OrderStatusChangedEvent, PaymentConfirmedEvent},
    SettingsApi,
    SettingsApiError,
    SqliteDatabase,
};
use thiserror::Error;

const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Could not read the e-mail settings. {0}")]
    Settings(#[from] SettingsApiError),
    #[error("Invalid e-mail address. {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("Could not build the message. {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error. {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// The kinds of e-mail the store sends, each with its own toggle in the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    OrderConfirmation,
    PaymentConfirmation,
    OrderStatus,
}

impl EmailKind {
    pub fn toggle_key(&self) -> &'static str {
        match self {
            EmailKind::OrderConfirmation => "order_confirmation_email_enabled",
            EmailKind::PaymentConfirmation => "payment_confirmation_email_enabled",
            EmailKind::OrderStatus => "order_status_email_enabled",
        }
    }
}

/// SMTP configuration as held in the settings store.
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    /// Implicit TLS when true, STARTTLS otherwise.
    pub secure: bool,
    pub from_email: String,
    pub from_name: String,
    pub store_name: String,
}

impl SmtpSettings {
    /// Reads the SMTP settings for an e-mail of the given kind.
    ///
    /// Returns `None` if e-mail is switched off (globally or for this kind) or if no SMTP host or sender is configured.
    pub fn for_kind(settings: &HashMap<String, String>, kind: EmailKind) -> Option<Self> {
        let get = |key: &str| settings.get(key).map(|s| s.trim().to_string()).unwrap_or_default();
        if !setting_is_enabled(settings.get("email_notifications_enabled").map(String::as_str)) {
            trace!("📧️ E-mail notifications are switched off");
            return None;
        }
        if !setting_is_enabled(settings.get(kind.toggle_key()).map(String::as_str)) {
            trace!("📧️ {kind:?} e-mails are switched off");
            return None;
        }
        let host = get("smtp_host");
        let from_email = get("smtp_from_email");
        if host.is_empty() || from_email.is_empty() {
            debug!("📧️ SMTP host or sender address is not configured. Not sending e-mail.");
            return None;
        }
        let port = get("smtp_port").parse::<u16>().unwrap_or_else(|_| {
            warn!("📧️ smtp_port setting is not a valid port. Using {DEFAULT_SMTP_PORT}.");
            DEFAULT_SMTP_PORT
        });
        let store_name = get("store_name");
        let from_name = Some(get("smtp_from_name")).filter(|s| !s.is_empty()).unwrap_or_else(|| store_name.clone());
        Some(Self {
            host,
            port,
            user: get("smtp_user"),
            password: Secret::new(get("smtp_password")),
            secure: setting_is_enabled(settings.get("smtp_secure").map(String::as_str)),
            from_email,
            from_name,
            store_name,
        })
    }

    fn sender(&self) -> Result<Mailbox, EmailError> {
        Ok(Mailbox::new(Some(self.from_name.clone()), self.from_email.parse()?))
    }

    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, EmailError> {
        let builder = if self.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.host)?
        };
        let builder = builder.port(self.port);
        let builder = if self.user.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(self.user.clone(), self.password.reveal().clone()))
        };
        Ok(builder.build())
    }
}

/// A composed e-mail, before it is addressed from the store's sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to_name: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingEmail {
    pub fn into_message(self, smtp: &SmtpSettings) -> Result<Message, EmailError> {
        let to = Mailbox::new(Some(self.to_name), self.to_email.parse()?);
        let message = Message::builder()
            .from(smtp.sender()?)
            .to(to)
            .subject(self.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(self.body)?;
        Ok(message)
    }
}

pub fn order_confirmation_email(store_name: &str, order: &Order, items: &[OrderItem]) -> OutgoingEmail {
    let lines = items
        .iter()
        .map(|item| {
            let variant = [item.size.as_deref(), item.color.as_deref()].into_iter().flatten().collect::<Vec<_>>();
            let variant = if variant.is_empty() { String::new() } else { format!(" ({})", variant.join(", ")) };
            format!("- {}{variant} x{} @ {}", item.product_name, item.quantity, item.unit_price)
        })
        .collect::<Vec<_>>()
        .join("\n");
    let body = format!(
        "Halo {name},\n\nTerima kasih telah berbelanja di {store_name}. Pesanan {number} telah kami terima.\n\n{lines}\n\n\
         Subtotal: {subtotal}\nDiskon: {discount}\nOngkos kirim: {shipping}\nTotal: {total}\n\n\
         Pesanan akan diproses setelah pembayaran dikonfirmasi.\n",
        name = order.customer_name,
        number = order.order_number,
        subtotal = order.subtotal,
        discount = order.discount_amount,
        shipping = order.shipping_cost,
        total = order.total_amount,
    );
    OutgoingEmail {
        to_name: order.customer_name.clone(),
        to_email: order.customer_email.clone(),
        subject: format!("[{store_name}] Order {} received", order.order_number),
        body,
    }
}

pub fn payment_confirmation_email(store_name: &str, order: &Order, payment: &Payment) -> OutgoingEmail {
    let method = payment.payment_type.as_deref().unwrap_or("Midtrans");
    let body = format!(
        "Halo {name},\n\nPembayaran sebesar {amount} untuk pesanan {number} melalui {method} telah kami terima.\n\
         Pesanan Anda akan segera kami proses.\n\nTerima kasih,\n{store_name}\n",
        name = order.customer_name,
        amount = payment.amount,
        number = order.order_number,
    );
    OutgoingEmail {
        to_name: order.customer_name.clone(),
        to_email: order.customer_email.clone(),
        subject: format!("[{store_name}] Payment for order {} confirmed", order.order_number),
        body,
    }
}

pub fn order_status_email(store_name: &str, event: &OrderStatusChangedEvent) -> OutgoingEmail {
    let order = &event.order;
    let note = event.note.as_deref().map(|n| format!("\nCatatan: {n}\n")).unwrap_or_default();
    let body = format!(
        "Halo {name},\n\nStatus pesanan {number} berubah menjadi: {status}.\n{note}\nTerima kasih,\n{store_name}\n",
        name = order.customer_name,
        number = order.order_number,
        status = order.status.history_description(),
    );
    OutgoingEmail {
        to_name: order.customer_name.clone(),
        to_email: order.customer_email.clone(),
        subject: format!("[{store_name}] Order {} is now {}", order.order_number, order.status),
        body,
    }
}

/// Sends customer e-mails using the SMTP settings from the settings store.
#[derive(Clone)]
pub struct EmailNotifier {
    settings: SettingsApi<SqliteDatabase>,
}

impl EmailNotifier {
    pub fn new(settings: SettingsApi<SqliteDatabase>) -> Self {
        Self { settings }
    }

    /// Composes and sends an e-mail of the given kind, if that kind of e-mail is switched on.
    ///
    /// Returns `Ok(false)` if nothing was sent because e-mail is switched off or not configured.
    pub async fn send<F>(&self, kind: EmailKind, compose: F) -> Result<bool, EmailError>
    where F: FnOnce(&str) -> OutgoingEmail {
        let settings = self.settings.fetch_settings().await?;
        let Some(smtp) = SmtpSettings::for_kind(&settings, kind) else {
            return Ok(false);
        };
        let email = compose(&smtp.store_name);
        let recipient = email.to_email.clone();
        let message = email.into_message(&smtp)?;
        let mailer = smtp.transport()?;
        mailer.send(message).await?;
        info!("📧️ {kind:?} e-mail sent to {recipient}");
        Ok(true)
    }

    async fn send_and_log<F>(&self, kind: EmailKind, order: &Order, compose: F)
    where F: FnOnce(&str) -> OutgoingEmail {
        if let Err(e) = self.send(kind, compose).await {
            error!("📧️ Could not send {kind:?} e-mail for order {}. {e}", order.order_number);
        }
    }
}

/// Event hooks that send the customer e-mails. Failures are logged and never reach the caller.
pub fn email_hooks(notifier: EmailNotifier) -> EventHooks {
    let mut hooks = EventHooks::default();
    let n = notifier.clone();
    hooks.on_order_created(move |ev: OrderCreatedEvent| {
        let n = n.clone();
        Box::pin(async move {
            n.send_and_log(EmailKind::OrderConfirmation, &ev.order, |store| {
                order_confirmation_email(store, &ev.order, &ev.items)
            })
            .await;
        })
    });
    let n = notifier.clone();
    hooks.on_payment_confirmed(move |ev: PaymentConfirmedEvent| {
        let n = n.clone();
        Box::pin(async move {
            n.send_and_log(EmailKind::PaymentConfirmation, &ev.order, |store| {
                payment_confirmation_email(store, &ev.order, &ev.payment)
            })
            .await;
        })
    });
    let n = notifier;
    hooks.on_order_status_changed(move |ev: OrderStatusChangedEvent| {
        let n = n.clone();
        Box::pin(async move {
            n.send_and_log(EmailKind::OrderStatus, &ev.order, |store| order_status_email(store, &ev)).await;
        })
    });
    hooks
}
