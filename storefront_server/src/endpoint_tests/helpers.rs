use actix_web::{
    body::MessageBody,
    http::{Method, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use log::debug;
use serde_json::Value;

use crate::{
    auth::{AccessKeys, API_KEY_HEADER},
    server::{json_config, path_config},
};

pub const ADMIN_KEY: &str = "test-admin-key";
pub const STAFF_KEY: &str = "test-staff-key";

/// Test keys. DO NOT re-use these anywhere.
pub fn access_keys() -> AccessKeys {
    format!("{ADMIN_KEY}:admin,{STAFF_KEY}:staff").parse().unwrap()
}

pub async fn get_request(
    api_key: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(Method::GET, api_key, path, None, configure).await
}

pub async fn post_request(
    api_key: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(Method::POST, api_key, path, Some(body), configure).await
}

pub async fn put_request(
    api_key: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    send_request(Method::PUT, api_key, path, Some(body), configure).await
}

/// Sends a request to an app configured with `configure`, the test access keys and the server's extractor error
/// handlers. Errors raised before a response is built (e.g. by the ACL middleware) are rendered the same way the
/// server renders them.
pub async fn send_request(
    method: Method,
    api_key: &str,
    path: &str,
    body: Option<Value>,
    configure: impl FnOnce(&mut ServiceConfig),
) -> Result<(StatusCode, String), String> {
    let mut req = TestRequest::default().method(method).uri(path);
    if !api_key.is_empty() {
        req = req.insert_header((API_KEY_HEADER, api_key));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    let req = req.to_request();
    let app = App::new()
        .app_data(json_config())
        .app_data(path_config())
        .app_data(actix_web::web::Data::new(access_keys()))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    match test::try_call_service(&service, req).await {
        Ok(res) => {
            let (_, res) = res.into_parts();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            Ok((status, body))
        },
        Err(e) => {
            let res = e.error_response();
            let status = res.status();
            let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
            if status.is_client_error() || status.is_server_error() {
                Ok((status, body))
            } else {
                Err(e.to_string())
            }
        },
    }
}

pub fn json(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}
