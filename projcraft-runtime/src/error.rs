//! Runtime error types
//!
//! Re-exports projcraft-error so runtime callers need a single import path.

pub use projcraft_error::{
    Error, ErrorKind, ErrorStatus, Result, CONTENT_POLICY_VIOLATION, RATE_LIMIT_RETRY_FAILED,
};
