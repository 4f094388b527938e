use thiserror::Error;

/// Main error type for the storefront engine
#[derive(Error, Debug)]
pub enum StorefrontError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// HTTP request errors
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Catalog source errors
    #[error("Source '{source_name}' error: {message}")]
    Source { source_name: String, message: String },

    /// Key-value storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Checkout attempted with nothing in the cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Checkout validation errors
    #[error("Checkout error: {0}")]
    Checkout(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl StorefrontError {
    /// Shorthand for a source failure
    pub fn source_failure(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        StorefrontError::Source {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

impl From<String> for StorefrontError {
    fn from(s: String) -> Self {
        StorefrontError::Other(s)
    }
}

impl From<&str> for StorefrontError {
    fn from(s: &str) -> Self {
        StorefrontError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, StorefrontError>;
