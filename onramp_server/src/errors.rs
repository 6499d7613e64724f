use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use onramp_engine::{
    traits::{GatewayError, OrderManagementError, PriceFeedError},
    OrderFlowError,
    PriceOracleError,
    QuoteError,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("An upstream service timed out. {0}")]
    UpstreamTimeout(String),
    #[error("An upstream service failed. {0}")]
    UpstreamError(String),
    #[error("Webhook signature verification failed. {0}")]
    InvalidSignature(String),
    #[error("Missing {0} header")]
    MissingSignature(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature(_) => StatusCode::BAD_REQUEST,
            Self::MissingSignature(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingApiKey => StatusCode::UNAUTHORIZED,
                AuthError::InvalidApiKey => StatusCode::FORBIDDEN,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ Request failed with {status}. {self}");
        }
        HttpResponse::build(status)
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "success": false, "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("API key is required.")]
    MissingApiKey,
    #[error("Invalid API key.")]
    InvalidApiKey,
}

impl From<PriceFeedError> for ServerError {
    fn from(e: PriceFeedError) -> Self {
        match e {
            PriceFeedError::Timeout(_) => Self::UpstreamTimeout(e.to_string()),
            _ => Self::UpstreamError(e.to_string()),
        }
    }
}

impl From<GatewayError> for ServerError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Timeout(_) => Self::UpstreamTimeout(e.to_string()),
            GatewayError::InvalidAmount(_) => Self::ValidationError(e.to_string()),
            GatewayError::InvalidSignature(_) | GatewayError::MalformedPayload(_) => {
                Self::InvalidSignature(e.to_string())
            },
            GatewayError::RequestFailed(_) | GatewayError::Rejected { .. } => Self::UpstreamError(e.to_string()),
        }
    }
}

impl From<OrderManagementError> for ServerError {
    fn from(e: OrderManagementError) -> Self {
        match e {
            OrderManagementError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            _ => Self::BackendError(e.to_string()),
        }
    }
}

impl From<PriceOracleError> for ServerError {
    fn from(e: PriceOracleError) -> Self {
        match e {
            PriceOracleError::UnsupportedAsset(_) => Self::ValidationError(e.to_string()),
            PriceOracleError::InvalidPrice { .. } => Self::UpstreamError(e.to_string()),
            PriceOracleError::Feed(e) => e.into(),
        }
    }
}

impl From<QuoteError> for ServerError {
    fn from(e: QuoteError) -> Self {
        match e {
            QuoteError::AmountOutOfRange { .. } | QuoteError::UnsupportedAsset(_) => {
                Self::ValidationError(e.to_string())
            },
            QuoteError::InvalidPrice { .. } => Self::UpstreamError(e.to_string()),
            QuoteError::PriceFeed(e) => e.into(),
        }
    }
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::Quote(e) => e.into(),
            OrderFlowError::Gateway(e) => e.into(),
            OrderFlowError::Store(e) => e.into(),
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InvalidWalletAddress { .. } |
            OrderFlowError::ValidationError(_) |
            OrderFlowError::NotRefundable { .. } |
            OrderFlowError::RefundExceedsCharge { .. } => Self::ValidationError(e.to_string()),
        }
    }
}
