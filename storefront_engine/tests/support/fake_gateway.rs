use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use midtrans_tools::{
    helpers::notification_signature,
    ChargeRequest,
    MidtransApiError,
    MidtransNotification,
    PaymentGateway,
    SnapRequest,
    SnapResponse,
    TransactionStatusResponse,
};

pub const SERVER_KEY: &str = "SB-Mid-server-test";

#[derive(Default)]
struct GatewayState {
    snap_requests: Vec<SnapRequest>,
    charge_requests: Vec<ChargeRequest>,
    charge_status: Option<String>,
    statuses: HashMap<String, TransactionStatusResponse>,
    cancelled: Vec<String>,
    unknown_on_cancel: bool,
    offline: bool,
}

/// An in-memory stand-in for the Midtrans API. Notifications are verified against [`SERVER_KEY`].
#[derive(Clone, Default)]
pub struct FakeGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl FakeGateway {
    pub fn snap_requests(&self) -> Vec<SnapRequest> {
        self.state.lock().unwrap().snap_requests.clone()
    }

    pub fn charge_requests(&self) -> Vec<ChargeRequest> {
        self.state.lock().unwrap().charge_requests.clone()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled.clone()
    }

    /// The transaction status returned by the next charges. `pending` when unset.
    pub fn set_charge_status(&self, status: &str) {
        self.state.lock().unwrap().charge_status = Some(status.to_string());
    }

    pub fn set_status(&self, gateway_order_id: &str, status: &str, fraud_status: Option<&str>) {
        let response = TransactionStatusResponse {
            status_code: "200".to_string(),
            transaction_id: Some(format!("tx-{gateway_order_id}")),
            order_id: Some(gateway_order_id.to_string()),
            payment_type: Some("bank_transfer".to_string()),
            transaction_status: Some(status.to_string()),
            fraud_status: fraud_status.map(str::to_string),
            ..Default::default()
        };
        self.state.lock().unwrap().statuses.insert(gateway_order_id.to_string(), response);
    }

    /// Cancels answer 404, as they do for Snap transactions the customer never started.
    pub fn unknown_on_cancel(&self) {
        self.state.lock().unwrap().unknown_on_cancel = true;
    }

    pub fn go_offline(&self) {
        self.state.lock().unwrap().offline = true;
    }

    fn check_online(&self) -> Result<(), MidtransApiError> {
        if self.state.lock().unwrap().offline {
            return Err(MidtransApiError::RestRequestError("connection refused".to_string()));
        }
        Ok(())
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_snap_transaction(&self, request: &SnapRequest) -> Result<SnapResponse, MidtransApiError> {
        self.check_online()?;
        let order_id = request.transaction_details.order_id.clone();
        self.state.lock().unwrap().snap_requests.push(request.clone());
        Ok(SnapResponse {
            token: format!("snap-{order_id}"),
            redirect_url: format!("https://app.sandbox.midtrans.com/snap/v4/redirection/snap-{order_id}"),
        })
    }

    async fn charge(&self, request: &ChargeRequest) -> Result<TransactionStatusResponse, MidtransApiError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        state.charge_requests.push(request.clone());
        let order_id = request.transaction_details.order_id.clone();
        Ok(TransactionStatusResponse {
            status_code: "201".to_string(),
            status_message: "Success, transaction is created".to_string(),
            transaction_id: Some(format!("tx-{order_id}")),
            gross_amount: Some(format!("{}.00", request.transaction_details.gross_amount)),
            payment_type: Some(request.payment_type.clone()),
            transaction_status: Some(state.charge_status.clone().unwrap_or_else(|| "pending".to_string())),
            order_id: Some(order_id),
            ..Default::default()
        })
    }

    async fn transaction_status(&self, gateway_order_id: &str) -> Result<TransactionStatusResponse, MidtransApiError> {
        self.check_online()?;
        self.state.lock().unwrap().statuses.get(gateway_order_id).cloned().ok_or_else(|| {
            MidtransApiError::GatewayError {
                status_code: "404".to_string(),
                message: "Transaction doesn't exist.".to_string(),
            }
        })
    }

    async fn cancel_transaction(&self, gateway_order_id: &str) -> Result<TransactionStatusResponse, MidtransApiError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        if state.unknown_on_cancel {
            return Err(MidtransApiError::GatewayError {
                status_code: "404".to_string(),
                message: "Transaction doesn't exist.".to_string(),
            });
        }
        state.cancelled.push(gateway_order_id.to_string());
        Ok(TransactionStatusResponse {
            status_code: "200".to_string(),
            order_id: Some(gateway_order_id.to_string()),
            transaction_status: Some("cancel".to_string()),
            ..Default::default()
        })
    }

    fn verify_notification(&self, notification: &MidtransNotification) -> bool {
        notification.is_signed_with(SERVER_KEY)
    }
}

/// A notification as the gateway would send it, correctly signed.
pub fn signed_notification(
    gateway_order_id: &str,
    transaction_status: &str,
    fraud_status: Option<&str>,
    gross_amount: &str,
) -> MidtransNotification {
    let status_code = if transaction_status == "pending" { "201" } else { "200" };
    MidtransNotification {
        transaction_status: transaction_status.to_string(),
        transaction_id: format!("tx-{gateway_order_id}"),
        order_id: gateway_order_id.to_string(),
        status_code: status_code.to_string(),
        gross_amount: gross_amount.to_string(),
        signature_key: notification_signature(gateway_order_id, status_code, gross_amount, SERVER_KEY),
        fraud_status: fraud_status.map(str::to_string),
        payment_type: Some("bank_transfer".to_string()),
        ..Default::default()
    }
}
