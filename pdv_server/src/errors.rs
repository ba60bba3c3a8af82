use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use pdv_engine::{
    traits::{BotApiError, CatalogApiError, CustomerApiError, MerchantApiError, OrderFlowError},
    CartError,
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
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Invalid input. {0}")]
    InvalidInput(String),
    #[error("Conflict. {0}")]
    Conflict(String),
    #[error("Plan limit reached. {0}")]
    PlanLimitReached(String),
    #[error("The request timed out. {0}")]
    Timeout(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::ForbiddenMerchant => StatusCode::FORBIDDEN,
                AuthError::CouldNotIssueToken(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PlanLimitReached(_) => StatusCode::FORBIDDEN,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            error!("💻️ {self}");
        }
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
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
    #[error("Access token has expired.")]
    TokenExpired,
    #[error("Invalid e-mail or password.")]
    InvalidCredentials,
    #[error("The access token does not grant access to this merchant.")]
    ForbiddenMerchant,
    #[error("The bot key is missing or invalid.")]
    InvalidBotKey,
    #[error("Could not issue an access token. {0}")]
    CouldNotIssueToken(String),
}

impl From<OrderFlowError> for ServerError {
    fn from(e: OrderFlowError) -> Self {
        match e {
            OrderFlowError::DatabaseError(_) => Self::BackendError(e.to_string()),
            OrderFlowError::ProductNotFound(_) |
            OrderFlowError::CustomerNotFound(_) |
            OrderFlowError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderFlowError::InvalidOrder(_) |
            OrderFlowError::TotalMismatch { .. } |
            OrderFlowError::InsufficientStock { .. } |
            OrderFlowError::StatusUnchanged(..) => Self::InvalidInput(e.to_string()),
            OrderFlowError::IllegalTransition { .. } | OrderFlowError::OrderModified(_) => {
                Self::Conflict(e.to_string())
            },
            OrderFlowError::Timeout(_) => Self::Timeout(e.to_string()),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
            CatalogApiError::ProductNotFound(_) => Self::NoRecordFound(e.to_string()),
            CatalogApiError::InvalidInput(_) => Self::InvalidInput(e.to_string()),
            CatalogApiError::PlanLimitReached { .. } => Self::PlanLimitReached(e.to_string()),
        }
    }
}

impl From<CustomerApiError> for ServerError {
    fn from(e: CustomerApiError) -> Self {
        match e {
            CustomerApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
            CustomerApiError::CustomerNotFound(_) => Self::NoRecordFound(e.to_string()),
            CustomerApiError::InvalidInput(_) => Self::InvalidInput(e.to_string()),
            CustomerApiError::DuplicateChatId(_) | CustomerApiError::CustomerHasOrders(_) => {
                Self::Conflict(e.to_string())
            },
        }
    }
}

impl From<MerchantApiError> for ServerError {
    fn from(e: MerchantApiError) -> Self {
        match e {
            MerchantApiError::DatabaseError(_) | MerchantApiError::PasswordHashError(_) => {
                Self::BackendError(e.to_string())
            },
            MerchantApiError::EmailAlreadyRegistered(_) => Self::Conflict(e.to_string()),
            MerchantApiError::InvalidCredentials => Self::AuthenticationError(AuthError::InvalidCredentials),
            MerchantApiError::MerchantNotFound(_) => Self::NoRecordFound(e.to_string()),
            MerchantApiError::InvalidInput(_) => Self::InvalidInput(e.to_string()),
        }
    }
}

impl From<BotApiError> for ServerError {
    fn from(e: BotApiError) -> Self {
        match e {
            BotApiError::DatabaseError(_) => Self::BackendError(e.to_string()),
            BotApiError::BotInstanceNotFound(_) | BotApiError::NoBotForMerchant(_) => Self::NoRecordFound(e.to_string()),
            BotApiError::InvalidInput(_) => Self::InvalidInput(e.to_string()),
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::EmptyCart | CartError::InvalidQuantity(_) | CartError::AmountTooLarge => {
                Self::InvalidInput(e.to_string())
            },
            CartError::LockError(_) => Self::BackendError(e.to_string()),
        }
    }
}
