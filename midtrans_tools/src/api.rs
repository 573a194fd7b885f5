use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::{
    config::MidtransConfig,
    ChargeRequest,
    MidtransApiError,
    MidtransNotification,
    PaymentGateway,
    SnapRequest,
    SnapResponse,
    TransactionStatusResponse,
};

#[derive(Clone)]
pub struct MidtransApi {
    config: MidtransConfig,
    client: Arc<Client>,
}

impl MidtransApi {
    pub fn new(config: MidtransConfig) -> Result<Self, MidtransApiError> {
        let mut headers = HeaderMap::with_capacity(4);
        let credentials = base64::encode(format!("{}:", config.server_key.reveal()));
        let mut auth = HeaderValue::from_str(&format!("Basic {credentials}"))
            .map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(url) = &config.notification_url {
            let val = HeaderValue::from_str(url).map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
            headers.insert("X-Override-Notification", val);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| MidtransApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &MidtransConfig {
        &self.config
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        url: String,
        body: Option<&B>,
    ) -> Result<T, MidtransApiError> {
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await.map_err(|e| MidtransApiError::RestRequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("💳️ REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| MidtransApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| MidtransApiError::RestResponseError(e.to_string()))?;
            Err(MidtransApiError::QueryError { status, message: error_message_from_body(&text) })
        }
    }

    /// Core API calls report failure inside a 200 response, so the embedded `status_code` is checked here.
    async fn core_query<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<TransactionStatusResponse, MidtransApiError> {
        let url = format!("{}{path}", self.config.core_url());
        let response = self.rest_query::<TransactionStatusResponse, B>(method, url, body).await?;
        if response.is_ok() {
            Ok(response)
        } else {
            warn!("💳️ Gateway rejected {path}: [{}] {}", response.status_code, response.status_message);
            Err(MidtransApiError::GatewayError {
                status_code: response.status_code,
                message: response.status_message,
            })
        }
    }
}

impl PaymentGateway for MidtransApi {
    async fn create_snap_transaction(&self, request: &SnapRequest) -> Result<SnapResponse, MidtransApiError> {
        let order_id = &request.transaction_details.order_id;
        debug!("💳️ Creating Snap transaction for {order_id}");
        let url = format!("{}/transactions", self.config.snap_url());
        let result = self.rest_query::<SnapResponse, SnapRequest>(Method::POST, url, Some(request)).await?;
        info!("💳️ Snap transaction created for {order_id}");
        Ok(result)
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<TransactionStatusResponse, MidtransApiError> {
        let order_id = &request.transaction_details.order_id;
        debug!("💳️ Charging {order_id} via {}", request.payment_type);
        let result = self.core_query(Method::POST, "/charge", Some(request)).await?;
        info!(
            "💳️ Charge for {order_id} accepted. Transaction {}",
            result.transaction_id.as_deref().unwrap_or("(none)")
        );
        Ok(result)
    }

    async fn transaction_status(&self, gateway_order_id: &str) -> Result<TransactionStatusResponse, MidtransApiError> {
        debug!("💳️ Fetching gateway status for {gateway_order_id}");
        let path = format!("/{gateway_order_id}/status");
        self.core_query::<()>(Method::GET, &path, None).await
    }

    async fn cancel_transaction(
        &self,
        gateway_order_id: &str,
    ) -> Result<TransactionStatusResponse, MidtransApiError> {
        debug!("💳️ Cancelling gateway transaction {gateway_order_id}");
        let path = format!("/{gateway_order_id}/cancel");
        let result = self.core_query::<()>(Method::POST, &path, None).await?;
        info!("💳️ Gateway transaction {gateway_order_id} cancelled");
        Ok(result)
    }

    fn verify_notification(&self, notification: &MidtransNotification) -> bool {
        notification.is_signed_with(self.config.server_key.reveal())
    }
}

/// Snap errors come back as `{"error_messages": ["..."]}`. Falls back to the raw body.
fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v["error_messages"].as_array().map(|msgs| {
                msgs.iter().map(|m| m.as_str().unwrap_or_default().to_string()).collect::<Vec<_>>().join(", ")
            })
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| body.to_string())
}
