//! Error types for mailproof.

use thiserror::Error;

/// Errors that can occur while handling a preview request.
///
/// The `Display` output doubles as the plaintext response body, so messages
/// are short and addressed to a store administrator.
#[derive(Debug, Clone, Error)]
pub enum PreviewError {
    /// Missing capability or rejected token.
    #[error("Invalid request")]
    Unauthorized,

    /// The email type key is not in the registry.
    #[error("Email type {0} doesn't exist")]
    UnknownEmailType(String),

    /// The query string could not be parsed.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The order id could not be parsed.
    #[error("Invalid order id: {0}")]
    InvalidOrderId(String),

    /// No order with this id exists in the store.
    #[error("Order {0} not found")]
    OrderNotFound(u64),

    /// The registry points at a template the store has not activated.
    #[error("Email template {0} is not active")]
    TemplateNotActive(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(String),

    /// CSS inlining error. Recovered inside the inliner, never shown.
    #[error("Inlining error: {0}")]
    Inline(String),

    /// Configuration error (missing env var, invalid value, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl PreviewError {
    /// HTTP status code used when this error is the response.
    pub fn status(&self) -> u16 {
        match self {
            Self::Unauthorized => 403,
            Self::UnknownEmailType(_)
            | Self::OrderNotFound(_)
            | Self::TemplateNotActive(_) => 404,
            Self::BadRequest(_) | Self::InvalidOrderId(_) => 400,
            Self::Template(_) | Self::Inline(_) | Self::Configuration(_) => 500,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::UnknownEmailType(_) => "unknown_email_type",
            Self::BadRequest(_) => "bad_request",
            Self::InvalidOrderId(_) => "invalid_order_id",
            Self::OrderNotFound(_) => "order_not_found",
            Self::TemplateNotActive(_) => "template_not_active",
            Self::Template(_) => "template_error",
            Self::Inline(_) => "inline_error",
            Self::Configuration(_) => "configuration_error",
        }
    }
}

impl From<askama::Error> for PreviewError {
    fn from(err: askama::Error) -> Self {
        Self::Template(err.to_string())
    }
}

#[cfg(feature = "inline")]
impl From<css_inline::InlineError> for PreviewError {
    fn from(err: css_inline::InlineError) -> Self {
        Self::Inline(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_does_not_leak_details() {
        assert_eq!(PreviewError::Unauthorized.to_string(), "Invalid request");
        assert_eq!(PreviewError::Unauthorized.status(), 403);
    }

    #[test]
    fn test_unknown_type_names_the_key() {
        let err = PreviewError::UnknownEmailType("not_a_real_type".into());
        assert_eq!(err.to_string(), "Email type not_a_real_type doesn't exist");
        assert_eq!(err.status(), 404);
    }

    #[test]
    fn test_order_not_found_message() {
        let err = PreviewError::OrderNotFound(9999);
        assert_eq!(err.to_string(), "Order 9999 not found");
        assert_eq!(err.kind(), "order_not_found");
    }
}
