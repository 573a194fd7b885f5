use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    HttpServer,
};
use futures::{future::ok, FutureExt};
use log::*;
use midtrans_tools::MidtransApi;
use storefront_engine::{
    events::{EventHandlers, EventProducers},
    OrderFlowApi,
    PaymentFlowApi,
    SettingsApi,
    SqliteDatabase,
};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    expiry_worker::start_expiry_worker,
    helpers::get_remote_ip_for_service,
    integrations::email::{email_hooks, EmailNotifier},
    routes::{
        health,
        AllSettingsRoute,
        BulkUpdateSettingsRoute,
        CancelPaymentRoute,
        ChargePaymentRoute,
        ClearSettingsCacheRoute,
        CreateOrderRoute,
        CreatePaymentRoute,
        OrderDetailsRoute,
        PaymentNotificationRoute,
        PaymentStatusRoute,
        PublicSettingsRoute,
        UpdateOrderStatusRoute,
        UpdateSettingRoute,
    },
};

const EVENT_BUFFER_SIZE: usize = 50;
const DB_MAX_CONNECTIONS: u32 = 25;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, DB_MAX_CONNECTIONS)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(format!("Database migration failed. {e}")))?;
    info!("🚀️ Database ready at {}", config.database_url);
    let gateway = MidtransApi::new(config.midtrans.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if !config.midtrans.is_production {
        info!("🚀️ Midtrans is running in sandbox mode");
    }
    let settings = SettingsApi::new(db.clone());
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, email_hooks(EmailNotifier::new(settings.clone())));
    let producers = handlers.producers();
    handlers.start_handlers().await;
    let payments = PaymentFlowApi::new(db.clone(), gateway.clone(), EventProducers::default())
        .with_options(config.payment_options());
    let _expiry_worker = start_expiry_worker(payments, config.pending_payment_timeout);
    let srv = create_server_instance(config, db, gateway, producers, settings)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: MidtransApi,
    producers: EventProducers,
    settings: SettingsApi<SqliteDatabase>,
) -> Result<Server, ServerError> {
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), producers.clone());
        let payments_api = PaymentFlowApi::new(db.clone(), gateway.clone(), producers.clone())
            .with_options(config.payment_options());
        let options = ServerOptions::from_config(&config);
        let midtrans_whitelist = config.midtrans_whitelist.clone();
        let notification_scope = web::scope("/payments/notification")
            .wrap_fn(move |req, srv| {
                let peer_ip = get_remote_ip_for_service(&req, options);
                let allowed = match (peer_ip, &midtrans_whitelist) {
                    (_, None) => true,
                    (Some(ip), Some(whitelist)) => {
                        debug!("💻️ Payment notification from {ip}");
                        whitelist.contains(&ip)
                    },
                    (None, Some(_)) => {
                        warn!("💻️ No IP address found for payment notification sender, denying access.");
                        false
                    },
                };
                if allowed {
                    srv.call(req).boxed_local()
                } else {
                    let peer = peer_ip.map(|ip| ip.to_string()).unwrap_or_else(|| "unknown".into());
                    warn!("💻️ Payment notification from {peer} is not whitelisted. Denying access.");
                    ok(req.error_response(ServerError::ForbiddenPeer(peer))).boxed_local()
                }
            })
            .service(PaymentNotificationRoute::<SqliteDatabase, MidtransApi>::new());
        let api_scope = web::scope("/api")
            .service(notification_scope)
            .service(CreateOrderRoute::<SqliteDatabase>::new())
            .service(OrderDetailsRoute::<SqliteDatabase>::new())
            .service(UpdateOrderStatusRoute::<SqliteDatabase>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, MidtransApi>::new())
            .service(ChargePaymentRoute::<SqliteDatabase, MidtransApi>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, MidtransApi>::new())
            .service(CancelPaymentRoute::<SqliteDatabase, MidtransApi>::new())
            .service(PublicSettingsRoute::<SqliteDatabase>::new())
            .service(ClearSettingsCacheRoute::<SqliteDatabase>::new())
            .service(AllSettingsRoute::<SqliteDatabase>::new())
            .service(BulkUpdateSettingsRoute::<SqliteDatabase>::new())
            .service(UpdateSettingRoute::<SqliteDatabase>::new());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("sf::access_log"))
            .app_data(json_config())
            .app_data(path_config())
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(payments_api))
            .app_data(web::Data::new(settings.clone()))
            .app_data(web::Data::new(config.access_keys.clone()))
            .service(health)
            .service(api_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((bind_addr.0.as_str(), bind_addr.1))?
    .run();
    Ok(srv)
}

/// Malformed JSON bodies are reported in the same envelope as every other error.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Could not deserialize request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| ServerError::InvalidRequestPath(err.to_string()).into())
}
