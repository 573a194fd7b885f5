mod helpers;
mod mocks;
mod orders;
mod payments;
mod settings;

use actix_web::http::StatusCode;

use crate::routes::health;

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init();
    let (status, body) = helpers::get_request("", "/health", |cfg| {
        cfg.service(health);
    })
    .await
    .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"data":{"status":"ok"}}"#);
}
