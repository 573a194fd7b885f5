//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every handler is async. Database and gateway calls are awaited, so a worker thread keeps serving other requests
//! while one is waiting on SQLite or on Midtrans. Never block a worker thread in a handler.
//!
//! Successful responses are wrapped in [`ApiResponse`], i.e. `{ "success": true, "data": … }`. Failures are rendered
//! by [`ServerError`] as `{ "success": false, "message": … }`.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use midtrans_tools::{MidtransNotification, PaymentGateway};
use serde_json::json;
use storefront_engine::{
    db_types::OrderNumber,
    order_objects::{CheckoutRequest, OrderStatusUpdate},
    traits::{PaymentGatewayDatabase, SettingsManagement},
    OrderFlowApi,
    PaymentFlowApi,
    SettingsApi,
};

use crate::{
    auth::Capability,
    data_objects::{
        ApiResponse,
        BulkSettingsUpdate,
        CreatePaymentRequest,
        DirectChargeRequest,
        JsonResponse,
        PaymentStatusResult,
        SettingUpdate,
    },
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal requires [$($caps:expr),*]) => {
        paste::paste! { pub struct [<$name:camel Route>];}
        paste::paste! {
                impl [<$name:camel Route>] {
                #[allow(clippy::new_without_default)]
                pub fn new() -> Self { Self }
            }
        }
        paste::paste! {
            impl actix_web::dev::HttpServiceFactory for [<$name:camel Route>] {
                fn register(self, config: &mut actix_web::dev::AppService) {
                    let res = actix_web::Resource::new($path)
                        .name(stringify!($name))
                        .guard(actix_web::guard::$method())
                        .to($name)
                        .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($caps),+]));
                    actix_web::dev::HttpServiceFactory::register(res, config);
                }
            }
        }
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+ where requires [$($caps:expr),*])  => {
        paste::paste! { pub struct [<$name:camel Route>]<A>(core::marker::PhantomData<fn() -> A>);}
        paste::paste! { impl<A> [<$name:camel Route>]<A> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> A>)
            }
        }}
        paste::paste! { impl<A> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<A>
        where
            A: $($bounds)++ 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<A>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($caps),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().json(ApiResponse::ok(json!({ "status": "ok" })))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(create_order => Post "/orders" impl PaymentGatewayDatabase);
/// Checkout. The line items arrive priced by the storefront; totals and the order number are assigned here.
///
/// Responds with `201 Created` and the stored order, its items and its first shipping history entry.
pub async fn create_order<B: PaymentGatewayDatabase>(
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let checkout = body.into_inner();
    debug!("💻️ POST checkout for {} with {} items", checkout.customer_email, checkout.items.len());
    let details = api.create_order(checkout).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(details)))
}

route!(order_details => Get "/orders/{order_number}" impl PaymentGatewayDatabase);
pub async fn order_details<B: PaymentGatewayDatabase>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = OrderNumber::from(path.into_inner());
    debug!("💻️ GET order {order_number}");
    let details = api.fetch_order_details(&order_number).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(details)))
}

route!(update_order_status => Put "/orders/{order_number}/status" impl PaymentGatewayDatabase where requires [Capability::ManageOrders]);
/// Back-office order status change, e.g. `{"status": "shipped", "note": "JNE 0123456789"}`.
pub async fn update_order_status<B: PaymentGatewayDatabase>(
    path: web::Path<String>,
    body: web::Json<OrderStatusUpdate>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = OrderNumber::from(path.into_inner());
    let update = body.into_inner();
    debug!("💻️ PUT status {} for order {order_number}", update.status);
    let order = api.update_order_status(&order_number, update).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(order)))
}

//----------------------------------------------   Payments  ----------------------------------------------------
route!(create_payment => Post "/payments/create" impl PaymentGatewayDatabase, PaymentGateway);
/// Opens a Snap payment page. The response carries the Snap token and redirect URL for the storefront.
pub async fn create_payment<B: PaymentGatewayDatabase, G: PaymentGateway>(
    body: web::Json<CreatePaymentRequest>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_number = body.into_inner().order_number;
    debug!("💻️ POST snap payment for order {order_number}");
    let payment = api.create_snap_payment(&order_number).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(payment)))
}

route!(charge_payment => Post "/payments/charge" impl PaymentGatewayDatabase, PaymentGateway);
pub async fn charge_payment<B: PaymentGatewayDatabase, G: PaymentGateway>(
    body: web::Json<DirectChargeRequest>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let DirectChargeRequest { order_number, method } = body.into_inner();
    debug!("💻️ POST {method} charge for order {order_number}");
    let result = api.charge(&order_number, method).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(result)))
}

route!(payment_notification => Post "" impl PaymentGatewayDatabase, PaymentGateway);
/// The Midtrans HTTP notification webhook, `POST /api/payments/notification`.
///
/// The route is mounted at the root of its own `/payments/notification` scope, which carries the sender address check.
///
/// There is no API key on this route. Notifications are authenticated by their signature. Redelivered notifications
/// are acknowledged with a `200` so that the gateway stops retrying.
pub async fn payment_notification<B: PaymentGatewayDatabase, G: PaymentGateway>(
    body: web::Json<MidtransNotification>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let notification = body.into_inner();
    info!(
        "💻️ Received payment notification for {}: {} / {:?}",
        notification.order_id, notification.transaction_status, notification.fraud_status
    );
    let result = api.handle_notification(notification).await.map_err(|e| {
        warn!("💻️ Payment notification was not applied. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(PaymentStatusResult::from(result))))
}

route!(payment_status => Get "/payments/{payment_id}/status" impl PaymentGatewayDatabase, PaymentGateway);
/// Polls the gateway for the payment's status and reconciles it, for when a notification has not (yet) arrived.
pub async fn payment_status<B: PaymentGatewayDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ GET status for payment #{payment_id}");
    let result = api.sync_payment_status(payment_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(PaymentStatusResult::from(result))))
}

route!(cancel_payment => Post "/payments/{payment_id}/cancel" impl PaymentGatewayDatabase, PaymentGateway);
pub async fn cancel_payment<B: PaymentGatewayDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    api: web::Data<PaymentFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ POST cancel payment #{payment_id}");
    let payment = api.cancel_payment(payment_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(payment)))
}

//----------------------------------------------   Settings  ----------------------------------------------------
route!(public_settings => Get "/settings/public" impl SettingsManagement);
pub async fn public_settings<B: SettingsManagement>(
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET public settings");
    let settings = api.fetch_public_settings().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

route!(all_settings => Get "/settings" impl SettingsManagement where requires [Capability::ManageSettings]);
/// Every setting. Password values are masked.
pub async fn all_settings<B: SettingsManagement>(
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET all settings");
    let settings = api.fetch_all_settings().await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}

route!(clear_settings_cache => Post "/settings/cache/clear" impl SettingsManagement where requires [Capability::ManageSettings]);
pub async fn clear_settings_cache<B: SettingsManagement>(api: web::Data<SettingsApi<B>>) -> impl Responder {
    api.clear_cache().await;
    HttpResponse::Ok().json(JsonResponse::success("Settings cache cleared"))
}

route!(update_setting => Put "/settings/{key}" impl SettingsManagement where requires [Capability::ManageSettings]);
/// Updates one setting. The settings cache is not cleared, so cached readers see the new value once the cache expires
/// or is cleared explicitly.
pub async fn update_setting<B: SettingsManagement>(
    path: web::Path<String>,
    body: web::Json<SettingUpdate>,
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let key = path.into_inner();
    debug!("💻️ PUT setting {key}");
    let setting = api.update_setting(&key, &body.value).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(setting)))
}

route!(bulk_update_settings => Put "/settings" impl SettingsManagement where requires [Capability::ManageSettings]);
/// Updates several settings at once and clears the settings cache.
pub async fn bulk_update_settings<B: SettingsManagement>(
    body: web::Json<BulkSettingsUpdate>,
    api: web::Data<SettingsApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let updates = body.into_inner().into_pairs();
    debug!("💻️ PUT {} settings", updates.len());
    let settings = api.bulk_update_settings(updates).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(settings)))
}
