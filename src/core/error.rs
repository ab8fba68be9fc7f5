use thiserror::Error;

use crate::download::error::FetchError;

/// Centralized error types for the application
///
/// Everything that can go wrong while serving a request ends up in this enum,
/// so handlers can turn it into one user-visible message.
///
/// # Example
///
/// ```no_run
/// use dorasong::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Fetch pipeline errors (search, download, tagging, relocation)
    #[error("{0}")]
    Fetch(#[from] FetchError),

    /// Handing the finished artifact to Telegram failed
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_message_passes_through() {
        let err: AppError = FetchError::ArtifactMissing.into();
        assert_eq!(err.to_string(), FetchError::ArtifactMissing.to_string());
    }

    #[test]
    fn test_delivery_message() {
        let err = AppError::Delivery("file is too big".to_string());
        assert_eq!(err.to_string(), "Delivery failed: file is too big");
    }

    #[test]
    fn test_url_parse_error_converts() {
        let err: AppError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, AppError::Url(_)));
        assert!(err.to_string().starts_with("URL parsing error"));
    }
}
