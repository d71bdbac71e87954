//! Error kinds for projcraft operations

use std::fmt;

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Invalid configuration or parameters
    ConfigInvalid,

    /// Invalid argument passed to function
    InvalidArgument,

    /// The operation was cancelled before it finished
    Cancelled,

    // =========================================================================
    // Inference/LLM errors
    // =========================================================================
    /// LLM inference failed
    InferenceFailed,

    /// Rate limit exceeded
    RateLimited,

    /// The model refused the prompt on content-policy grounds
    ContentRejected,

    /// Provider not available
    ProviderUnavailable,

    // =========================================================================
    // Extraction errors
    // =========================================================================
    /// Failed to parse input
    ParseFailed,

    /// No structured payload could be recovered from model output
    ExtractionFailed,

    // =========================================================================
    // Storage errors
    // =========================================================================
    /// Storage key not found
    StorageNotFound,

    /// Storage operation failed
    StorageFailed,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    /// Network error
    NetworkFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::Cancelled => "Cancelled",

            // Inference
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::ContentRejected => "ContentRejected",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",

            // Extraction
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::ExtractionFailed => "ExtractionFailed",

            // Storage
            ErrorKind::StorageNotFound => "StorageNotFound",
            ErrorKind::StorageFailed => "StorageFailed",

            // IO
            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ProviderUnavailable
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::ExtractionFailed.to_string(), "ExtractionFailed");
        assert_eq!(ErrorKind::ContentRejected.to_string(), "ContentRejected");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::ContentRejected.is_retryable());
        assert!(!ErrorKind::ExtractionFailed.is_retryable());
        assert!(!ErrorKind::Cancelled.is_retryable());
    }
}
