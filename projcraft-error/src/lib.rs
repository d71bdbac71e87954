//! # projcraft-error
//!
//! Unified error handling for projcraft, modelled on OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., RateLimited, ExtractionFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use projcraft_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::ExtractionFailed, "no structured payload in response")
//!         .with_operation("planner::primary")
//!         .with_context("stage", "planner")
//!         .with_context("tier", "primary"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All fallible functions return `Result<T, projcraft_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::{Error, CONTENT_POLICY_VIOLATION, RATE_LIMIT_RETRY_FAILED};
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using projcraft Error
pub type Result<T> = std::result::Result<T, Error>;
