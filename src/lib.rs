//! cmdctl library
//!
//! This library provides the core functionality behind the `cmdctl` binary,
//! most notably its shell completion engine.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `completion`: Completion script generation and dynamic resource lookup
//! - `config`: Configuration management
//! - `error`: Error types and handling
//!
//! # Example
//!
//! ```no_run
//! use clap::CommandFactory;
//! use cmdctl::cli::CliArgs;
//! use cmdctl::completion::{CommandTree, CompletionGenerator, Dialect, DispatchTable};
//!
//! fn main() -> cmdctl::Result<()> {
//!     let tree = CommandTree::from_command(&CliArgs::command());
//!     let table = DispatchTable::with_defaults(&tree)?;
//!     let script = CompletionGenerator::new(tree, table).generate(Dialect::Bash)?;
//!     print!("{script}");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod completion;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use completion::{CompletionGenerator, Dialect};
pub use config::Config;
pub use error::{CmdctlError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
