use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use storefront_engine::{
    helpers::WebhookSignatureError,
    CartError,
    CheckoutError,
    OrderFlowError,
    PaymentFlowError,
};
use thiserror::Error;

const BACKEND_ERROR_MESSAGE: &str = "An error occurred on the backend of the server. Please try again later.";

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
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("{0}")]
    Checkout(#[from] CheckoutError),
    #[error("{0}")]
    OrderFlow(#[from] OrderFlowError),
    #[error("{0}")]
    Payment(#[from] PaymentFlowError),
    /// A verified webhook that could not be applied. Unlike [`ServerError::Payment`], an unknown order is the
    /// provider's mistake here, not a missing resource.
    #[error("{0}")]
    WebhookRejected(PaymentFlowError),
    #[error("{0}")]
    WebhookSignature(#[from] WebhookSignatureError),
    #[error("{0}")]
    Cart(#[from] CartError),
}

impl ServerError {
    /// The reason given to the caller. Infrastructure failures are logged in full and replaced with a generic message.
    fn public_message(&self) -> String {
        match self {
            Self::InitializeError(_)
            | Self::BackendError(_)
            | Self::IOError(_)
            | Self::ConfigurationError(_)
            | Self::Unspecified(_)
            | Self::Checkout(CheckoutError::DatabaseError(_))
            | Self::OrderFlow(OrderFlowError::DatabaseError(_))
            | Self::Payment(PaymentFlowError::DatabaseError(_))
            | Self::WebhookRejected(PaymentFlowError::DatabaseError(_))
            | Self::Cart(CartError::DatabaseError(_)) => {
                error!("💻️ {self}");
                BACKEND_ERROR_MESSAGE.to_string()
            },
            Self::WebhookSignature(WebhookSignatureError::NotConfigured) => {
                error!("💻️ {self}");
                "Invalid webhook signature".to_string()
            },
            Self::Checkout(CheckoutError::TryAgainLater(detail))
            | Self::OrderFlow(OrderFlowError::TryAgainLater(detail))
            | Self::Payment(PaymentFlowError::TryAgainLater(detail))
            | Self::WebhookRejected(PaymentFlowError::TryAgainLater(detail))
            | Self::Cart(CartError::TryAgainLater(detail)) => {
                error!("💻️ Giving up after repeated lock contention. {detail}");
                self.to_string()
            },
            _ => self.to_string(),
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Checkout(e) => match e {
                CheckoutError::CartEmpty => StatusCode::BAD_REQUEST,
                CheckoutError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
                CheckoutError::TotalTooLarge => StatusCode::BAD_REQUEST,
                CheckoutError::TryAgainLater(_) => StatusCode::SERVICE_UNAVAILABLE,
                CheckoutError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::OrderFlow(e) => match e {
                OrderFlowError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                OrderFlowError::AlreadyCompleted => StatusCode::BAD_REQUEST,
                OrderFlowError::InvalidTransition { .. } => StatusCode::BAD_REQUEST,
                OrderFlowError::InvalidStatus(_) => StatusCode::BAD_REQUEST,
                OrderFlowError::Forbidden(_) => StatusCode::FORBIDDEN,
                OrderFlowError::TryAgainLater(_) => StatusCode::SERVICE_UNAVAILABLE,
                OrderFlowError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Payment(e) => match e {
                PaymentFlowError::OrderNotFound | PaymentFlowError::PaymentNotFound => StatusCode::NOT_FOUND,
                e => payment_rejection_status(e),
            },
            Self::WebhookRejected(e) => payment_rejection_status(e),
            Self::WebhookSignature(_) => StatusCode::BAD_REQUEST,
            Self::Cart(e) => match e {
                CartError::InvalidQuantity | CartError::QuantityTooLarge | CartError::TotalTooLarge => {
                    StatusCode::BAD_REQUEST
                },
                CartError::ProductNotFound(_) | CartError::NotInCart(_) => StatusCode::NOT_FOUND,
                CartError::TryAgainLater(_) => StatusCode::SERVICE_UNAVAILABLE,
                CartError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.public_message() }).to_string())
    }
}

fn payment_rejection_status(e: &PaymentFlowError) -> StatusCode {
    match e {
        PaymentFlowError::Conflict { .. } | PaymentFlowError::OrderAlreadySettled => StatusCode::CONFLICT,
        PaymentFlowError::TryAgainLater(_) => StatusCode::SERVICE_UNAVAILABLE,
        PaymentFlowError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token was provided.")]
    MissingToken,
    #[error("Access token is not in the correct format. {0}")]
    PoorlyFormattedToken(String),
    #[error("Access token is invalid. {0}")]
    ValidationError(String),
}
