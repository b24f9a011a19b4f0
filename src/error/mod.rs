//! Error handling module for cmdctl.
//!
//! This module provides the crate-wide error type with:
//! - Usage errors that point the user back to `-h`
//! - Build-time completion table errors
//! - Resolver failures, which the completion path always swallows
//! - Configuration and template errors
//!
//! # Example
//!
//! ```rust
//! use cmdctl::error::{CmdctlError, Result, UsageError};
//!
//! fn pick_shell(args: &[String]) -> Result<&str> {
//!     match args {
//!         [shell] => Ok(shell.as_str()),
//!         _ => Err(UsageError::new("cmdctl completion", "Shell not specified.").into()),
//!     }
//! }
//!
//! assert!(matches!(pick_shell(&[]), Err(CmdctlError::Usage(_))));
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{
    CmdctlError, CompletionError, ConfigError, ResolveError, Result, TemplateError, UsageError,
};
