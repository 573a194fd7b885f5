use actix_web::{http::StatusCode, web, web::ServiceConfig};
use serde_json::json;
use storefront_engine::{
    test_utils::prepare_env::{drop_test_database, prepare_test_env, random_db_path},
    PaymentGatewayDatabase,
    SettingsApi,
    SqliteDatabase,
};

use super::helpers::{get_request, json, post_request, put_request, ADMIN_KEY, STAFF_KEY};
use crate::routes::{
    AllSettingsRoute,
    BulkUpdateSettingsRoute,
    ClearSettingsCacheRoute,
    PublicSettingsRoute,
    UpdateSettingRoute,
};

struct SettingsFixture {
    db: SqliteDatabase,
    api: SettingsApi<SqliteDatabase>,
}

impl SettingsFixture {
    async fn new() -> Self {
        let db = prepare_test_env(&random_db_path()).await;
        let api = SettingsApi::new(db.clone());
        Self { db, api }
    }

    /// Each request gets a clone of the API, sharing the cache with the fixture, as HTTP workers do.
    fn configure(&self) -> impl FnOnce(&mut ServiceConfig) {
        let api = self.api.clone();
        move |cfg| {
            cfg.app_data(web::Data::new(api))
                .service(PublicSettingsRoute::<SqliteDatabase>::new())
                .service(ClearSettingsCacheRoute::<SqliteDatabase>::new())
                .service(AllSettingsRoute::<SqliteDatabase>::new())
                .service(BulkUpdateSettingsRoute::<SqliteDatabase>::new())
                .service(UpdateSettingRoute::<SqliteDatabase>::new());
        }
    }

    async fn cached(&self, key: &str) -> Option<String> {
        self.api.setting_value(key).await.unwrap()
    }

    async fn tear_down(mut self) {
        let url = self.db.url().to_string();
        let _ = self.db.close().await;
        drop_test_database(&url).await;
    }
}

fn setting<'a>(list: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
    list.as_array().and_then(|a| a.iter().find(|s| s["key"] == key))
}

#[actix_web::test]
async fn public_settings_hide_private_ones() {
    let fixture = SettingsFixture::new().await;
    let (status, body) = get_request("", "/settings/public", fixture.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let data = json(&body)["data"].clone();
    assert_eq!(setting(&data, "store_name").unwrap()["value"], "Toko Pakaian");
    assert!(setting(&data, "smtp_password").is_none());
    assert!(setting(&data, "smtp_host").is_none());
    fixture.tear_down().await;
}

#[actix_web::test]
async fn only_admins_manage_settings() {
    let fixture = SettingsFixture::new().await;
    let (status, body) = get_request("", "/settings", fixture.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["success"], false);
    let (status, _) = get_request(STAFF_KEY, "/settings", fixture.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) =
        post_request(STAFF_KEY, "/settings/cache/clear", json!({}), fixture.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = put_request(STAFF_KEY, "/settings/store_name", json!({"value": "X"}), fixture.configure())
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = get_request(ADMIN_KEY, "/settings", fixture.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    fixture.tear_down().await;
}

#[actix_web::test]
async fn passwords_are_masked() {
    let fixture = SettingsFixture::new().await;
    let update = json!({"settings": [{"key": "smtp_password", "value": "hunter2"}]});
    let (status, body) = put_request(ADMIN_KEY, "/settings", update, fixture.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("hunter2"));
    let (_, body) = get_request(ADMIN_KEY, "/settings", fixture.configure()).await.expect("Request failed");
    assert!(!body.contains("hunter2"));
    assert_eq!(setting(&json(&body)["data"], "smtp_password").unwrap()["value"], "********");
    // Saving the mask back leaves the password alone
    let (status, _) = put_request(ADMIN_KEY, "/settings/smtp_password", json!({"value": "********"}), fixture.configure())
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fixture.cached("smtp_password").await.as_deref(), Some("hunter2"));
    fixture.tear_down().await;
}

#[actix_web::test]
async fn single_update_leaves_cache_stale() {
    let fixture = SettingsFixture::new().await;
    assert_eq!(fixture.cached("store_name").await.as_deref(), Some("Toko Pakaian"));
    let (status, body) =
        put_request(ADMIN_KEY, "/settings/store_name", json!({"value": "Butik Sari"}), fixture.configure())
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["data"]["value"], "Butik Sari");
    assert_eq!(fixture.cached("store_name").await.as_deref(), Some("Toko Pakaian"));
    let (status, _) =
        post_request(ADMIN_KEY, "/settings/cache/clear", json!({}), fixture.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fixture.cached("store_name").await.as_deref(), Some("Butik Sari"));
    fixture.tear_down().await;
}

#[actix_web::test]
async fn bulk_update_refreshes_cache() {
    let fixture = SettingsFixture::new().await;
    assert_eq!(fixture.cached("smtp_host").await.as_deref(), Some(""));
    let update = json!({"settings": [
        {"key": "smtp_host", "value": "smtp.example.com"},
        {"key": "email_notifications_enabled", "value": "true"}
    ]});
    let (status, body) = put_request(ADMIN_KEY, "/settings", update, fixture.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["data"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(fixture.cached("smtp_host").await.as_deref(), Some("smtp.example.com"));
    assert_eq!(fixture.cached("email_notifications_enabled").await.as_deref(), Some("true"));
    fixture.tear_down().await;
}

#[actix_web::test]
async fn invalid_updates() {
    let fixture = SettingsFixture::new().await;
    let (status, body) =
        put_request(ADMIN_KEY, "/settings/smtp_secure", json!({"value": "perhaps"}), fixture.configure())
            .await
            .expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["success"], false);
    let (status, _) = put_request(ADMIN_KEY, "/settings/no_such_key", json!({"value": "1"}), fixture.configure())
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    let update = json!({"settings": [
        {"key": "store_name", "value": "Butik Sari"},
        {"key": "no_such_key", "value": "1"}
    ]});
    let (status, _) = put_request(ADMIN_KEY, "/settings", update, fixture.configure()).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(fixture.cached("store_name").await.as_deref(), Some("Toko Pakaian"));
    fixture.tear_down().await;
}
