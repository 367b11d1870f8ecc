//! Client-facing error taxonomy for the query surface.
//!
//! Validation failures carry their message verbatim. Everything else is
//! logged with the logical operation that failed and surfaced as a
//! generic "Failed to <operation>" so internal query text never leaks.

use async_graphql::ErrorExtensions;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{0}")]
    Validation(String),

    #[error("Failed to {operation}")]
    Internal { operation: &'static str },
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        GatewayError::Validation(message.into())
    }

    /// Log the underlying failure with its operation context, then
    /// return the generic client-facing error.
    pub fn internal(operation: &'static str, source: impl std::fmt::Display) -> Self {
        tracing::error!(operation, error = %source, "operation failed");
        GatewayError::Internal { operation }
    }
}

impl ErrorExtensions for GatewayError {
    fn extend(&self) -> async_graphql::Error {
        let code = match self {
            GatewayError::Validation(_) => "VALIDATION",
            GatewayError::Internal { .. } => "INTERNAL",
        };
        async_graphql::Error::new(self.to_string()).extend_with(|_, ext| ext.set("code", code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_message_names_operation_only() {
        let err = GatewayError::internal("fetch price data", "relation prices does not exist");
        assert_eq!(err.to_string(), "Failed to fetch price data");
    }

    #[test]
    fn test_validation_message_passes_through() {
        let err = GatewayError::validation("Search query must be at least 2 characters");
        assert_eq!(
            err.to_string(),
            "Search query must be at least 2 characters"
        );
    }
}
