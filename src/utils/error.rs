use thiserror::Error;

use crate::core::orchestrator::OrderState;

#[derive(Error, Debug)]
pub enum OrderError {
    #[error("Not available: {message}")]
    NotAvailable { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid input for {label}: {message}")]
    InputError { label: String, message: String },

    #[error("API error ({status}): {message}")]
    ApiError {
        status: u16,
        class: Option<String>,
        message: String,
    },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Order run exceeded its deadline of {seconds}s")]
    DeadlineExceeded { seconds: u64 },

    #[error("{operation} failed ({context}): {source}")]
    Aborted {
        state: OrderState,
        operation: String,
        context: String,
        #[source]
        source: Box<OrderError>,
    },
}

pub type Result<T> = std::result::Result<T, OrderError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Availability,
    Authentication,
    Validation,
    Input,
    External,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl OrderError {
    pub fn validation(message: impl Into<String>) -> Self {
        OrderError::ValidationError {
            message: message.into(),
        }
    }

    /// Innermost error, skipping any `Aborted` context wrappers.
    pub fn root(&self) -> &OrderError {
        match self {
            OrderError::Aborted { source, .. } => source.root(),
            other => other,
        }
    }

    pub fn is_not_available(&self) -> bool {
        matches!(self.root(), OrderError::NotAvailable { .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self.root(), OrderError::Forbidden { .. })
    }

    pub fn category(&self) -> ErrorCategory {
        match self.root() {
            OrderError::NotAvailable { .. } => ErrorCategory::Availability,
            OrderError::Forbidden { .. } => ErrorCategory::Authentication,
            OrderError::ValidationError { .. }
            | OrderError::MissingConfigError { .. }
            | OrderError::InvalidConfigValueError { .. }
            | OrderError::ConfigError { .. } => ErrorCategory::Validation,
            OrderError::InputError { .. } => ErrorCategory::Input,
            OrderError::ApiError { .. }
            | OrderError::HttpError(_)
            | OrderError::SerializationError(_)
            | OrderError::DeadlineExceeded { .. } => ErrorCategory::External,
            OrderError::IoError(_) | OrderError::Aborted { .. } => ErrorCategory::Internal,
        }
    }

    /// An aborted run is never rated below `High`, whatever its root cause.
    pub fn severity(&self) -> ErrorSeverity {
        if let OrderError::Aborted { source, .. } = self {
            return source.severity().max(ErrorSeverity::High);
        }
        match self {
            OrderError::NotAvailable { .. } => ErrorSeverity::Low,
            OrderError::DeadlineExceeded { .. } => ErrorSeverity::Medium,
            OrderError::IoError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self.root() {
            OrderError::NotAvailable { .. } => {
                "Try again later or widen the datacenter list with --datacenters any".to_string()
            }
            OrderError::Forbidden { .. } => {
                "Check the application key, secret and consumer key, and that the consumer key \
                 grants POST on /order/cart/*"
                    .to_string()
            }
            OrderError::ValidationError { .. }
            | OrderError::MissingConfigError { .. }
            | OrderError::InvalidConfigValueError { .. } => {
                "Check the command line flags and environment variables".to_string()
            }
            OrderError::ConfigError { .. } => "Check the configuration file syntax".to_string(),
            OrderError::InputError { .. } => {
                "Enter the index of one of the listed values, or pass it with --item-configuration"
                    .to_string()
            }
            OrderError::ApiError { status, .. } if *status >= 500 => {
                "The API is having trouble, retry in a few minutes".to_string()
            }
            OrderError::ApiError { .. } => {
                "Check the plan code, options and price settings against the catalog".to_string()
            }
            OrderError::HttpError(_) => {
                "Check network connectivity to the API endpoint".to_string()
            }
            OrderError::SerializationError(_) => {
                "The API answered with an unexpected payload, retry with --verbose".to_string()
            }
            OrderError::DeadlineExceeded { .. } => "Raise --timeout or drop it".to_string(),
            OrderError::IoError(_) | OrderError::Aborted { .. } => {
                "Retry with --verbose to get more details".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            OrderError::Aborted {
                operation,
                context,
                source,
                ..
            } => format!(
                "Order aborted while trying to {} ({}): {}",
                operation,
                context,
                source.user_friendly_message()
            ),
            OrderError::NotAvailable { message } => format!("Not available: {}", message),
            OrderError::Forbidden { .. } => "Authentication was refused by the API".to_string(),
            OrderError::ApiError { message, .. } => {
                format!("The API rejected the request: {}", message)
            }
            other => other.to_string(),
        }
    }
}
