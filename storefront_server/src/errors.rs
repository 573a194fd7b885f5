use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use storefront_engine::{OrderFlowError, PaymentFlowError, PaymentGatewayError, SettingsApiError};
use thiserror::Error;

/// The message sent to clients in place of the details of an internal failure.
pub const GENERIC_SERVER_ERROR: &str = "An internal error occurred. Please try again later.";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The payment gateway rejected the request. {0}")]
    GatewayError(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Requests from {0} are not accepted on this route")]
    ForbiddenPeer(String),
}

impl ServerError {
    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::GatewayError(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::ForbiddenPeer(_) => StatusCode::FORBIDDEN,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client errors carry their message. Internal errors are logged and replaced with a generic message.
    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            error!("💻️ Request failed with an internal error. {self}");
            GENERIC_SERVER_ERROR.to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "message": message }).to_string())
    }
}

impl From<PaymentGatewayError> for ServerError {
    fn from(e: PaymentGatewayError) -> Self {
        match e {
            PaymentGatewayError::OrderNotFound(_)
            | PaymentGatewayError::OrderIdNotFound(_)
            | PaymentGatewayError::PaymentNotFound(_) => Self::NoRecordFound(e.to_string()),
            PaymentGatewayError::OrderAlreadyExists(_)
            | PaymentGatewayError::LivePaymentExists(_)
            | PaymentGatewayError::PaymentAlreadyExists(_)
            | PaymentGatewayError::OrderModificationConflict { .. }
            | PaymentGatewayError::PaymentNotCancellable { .. } => Self::ValidationError(e.to_string()),
            PaymentGatewayError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Validation(_) | OrderFlowError::IllegalTransition { .. } => {
                Self::ValidationError(e.to_string())
            },
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::Database(e) => e.into(),
        }
    }
}

impl From<PaymentFlowError> for ServerError {
    fn from(e: PaymentFlowError) -> Self {
        match e {
            PaymentFlowError::Validation(_)
            | PaymentFlowError::InvalidSignature
            | PaymentFlowError::LivePaymentExists(_)
            | PaymentFlowError::OrderNotPayable { .. }
            | PaymentFlowError::PaymentNotCancellable { .. } => Self::ValidationError(e.to_string()),
            PaymentFlowError::OrderNotFound(_)
            | PaymentFlowError::PaymentNotFound(_)
            | PaymentFlowError::UnknownGatewayOrder(_) => Self::NoRecordFound(e.to_string()),
            PaymentFlowError::Gateway(e) => Self::GatewayError(e.to_string()),
            PaymentFlowError::Database(e) => e.into(),
        }
    }
}

impl From<SettingsApiError> for ServerError {
    fn from(e: SettingsApiError) -> Self {
        match e {
            SettingsApiError::SettingNotFound(_) => Self::NoRecordFound(e.to_string()),
            SettingsApiError::InvalidValue { .. } => Self::ValidationError(e.to_string()),
            SettingsApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
        }
    }
}
