use std::{fmt, io, time::Duration};

/// Crate-wide `Result` type using [`CmdctlError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, CmdctlError>;

/// Top-level error type for cmdctl operations.
///
/// This type wraps more specific error kinds and provides a single
/// error type that can be used throughout the crate.
#[derive(Debug)]
pub enum CmdctlError {
    /// Bad command-line usage (reported with a pointer to `-h`).
    Usage(UsageError),

    /// Completion table construction errors.
    Completion(CompletionError),

    /// Configuration errors.
    Config(ConfigError),

    /// Output template errors.
    Template(TemplateError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),

    /// Feature not available in this build.
    NotImplemented(String),
}

/// A usage error tied to the command that rejected its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageError {
    /// What was wrong with the input.
    pub message: String,

    /// Full command path, e.g. `cmdctl completion`.
    pub command_path: String,
}

/// Errors raised while building the completion dispatch table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// Trigger string could not be parsed.
    InvalidTrigger(String),

    /// Trigger references no command path in the tree.
    DeadTrigger(String),

    /// The same trigger was declared twice.
    DuplicateTrigger(String),

    /// Flag value rule names a flag no command declares.
    DeadFlagRule(String),

    /// Unknown resource kind token.
    UnknownResourceKind(String),

    /// A rewrite rule pattern failed to compile.
    InvalidRewriteRule { pattern: String, reason: String },
}

/// Failures of the completion self-invocation.
#[derive(Debug)]
pub enum ResolveError {
    /// The child process could not be started.
    Spawn(io::Error),

    /// The child did not finish in time.
    Timeout(Duration),

    /// The child exited unsuccessfully.
    NonZeroExit(Option<i32>),

    /// The child's output is not a flat list of names.
    InvalidOutput(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// A named entry does not exist.
    UnknownEntry { section: String, name: String },

    /// Generic configuration problem.
    Generic(String),
}

/// Output template errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    /// Malformed template text.
    Syntax(String),

    /// `range` applied to something that is not a list.
    NotIterable(String),
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for CmdctlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmdctlError::Usage(e) => write!(f, "{e}"),
            CmdctlError::Completion(e) => write!(f, "Completion error: {e}"),
            CmdctlError::Config(e) => write!(f, "Configuration error: {e}"),
            CmdctlError::Template(e) => write!(f, "Template error: {e}"),
            CmdctlError::Io(e) => write!(f, "I/O error: {e}"),
            CmdctlError::Generic(msg) => write!(f, "{msg}"),
            CmdctlError::NotImplemented(msg) => write!(f, "Not implemented: {msg}"),
        }
    }
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\nSee '{} -h' for help and examples.",
            self.message, self.command_path
        )
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::InvalidTrigger(t) => write!(f, "Invalid dispatch trigger: {t}"),
            CompletionError::DeadTrigger(t) => {
                write!(f, "Dispatch trigger '{t}' matches no command")
            }
            CompletionError::DuplicateTrigger(t) => {
                write!(f, "Dispatch trigger '{t}' declared more than once")
            }
            CompletionError::DeadFlagRule(flag) => {
                write!(f, "No command declares a value flag '--{flag}'")
            }
            CompletionError::UnknownResourceKind(kind) => {
                write!(f, "Unknown resource kind: {kind}")
            }
            CompletionError::InvalidRewriteRule { pattern, reason } => {
                write!(f, "Invalid rewrite rule '{pattern}': {reason}")
            }
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Spawn(e) => write!(f, "Failed to start process: {e}"),
            ResolveError::Timeout(after) => write!(f, "Timed out after {after:?}"),
            ResolveError::NonZeroExit(Some(code)) => write!(f, "Exited with status {code}"),
            ResolveError::NonZeroExit(None) => write!(f, "Terminated by signal"),
            ResolveError::InvalidOutput(msg) => write!(f, "Unparsable output: {msg}"),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::UnknownEntry { section, name } => {
                write!(f, "No entry named '{name}' in {section}")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Syntax(msg) => write!(f, "Syntax error: {msg}"),
            TemplateError::NotIterable(path) => write!(f, "Cannot range over '{path}'"),
        }
    }
}

impl std::error::Error for CmdctlError {}
impl std::error::Error for UsageError {}
impl std::error::Error for CompletionError {}
impl std::error::Error for ResolveError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for TemplateError {}

/* ========================= Conversions to CmdctlError ========================= */

impl From<io::Error> for CmdctlError {
    fn from(err: io::Error) -> Self {
        CmdctlError::Io(err)
    }
}

impl From<UsageError> for CmdctlError {
    fn from(err: UsageError) -> Self {
        CmdctlError::Usage(err)
    }
}

impl From<CompletionError> for CmdctlError {
    fn from(err: CompletionError) -> Self {
        CmdctlError::Completion(err)
    }
}

impl From<ConfigError> for CmdctlError {
    fn from(err: ConfigError) -> Self {
        CmdctlError::Config(err)
    }
}

impl From<TemplateError> for CmdctlError {
    fn from(err: TemplateError) -> Self {
        CmdctlError::Template(err)
    }
}

impl From<toml::de::Error> for CmdctlError {
    fn from(err: toml::de::Error) -> Self {
        CmdctlError::Config(ConfigError::InvalidFormat(err.to_string()))
    }
}

impl From<toml::ser::Error> for CmdctlError {
    fn from(err: toml::ser::Error) -> Self {
        CmdctlError::Config(ConfigError::Generic(format!(
            "Failed to serialize configuration: {err}"
        )))
    }
}

impl From<serde_json::Error> for CmdctlError {
    fn from(err: serde_json::Error) -> Self {
        CmdctlError::Generic(format!("JSON error: {err}"))
    }
}

impl From<String> for CmdctlError {
    fn from(msg: String) -> Self {
        CmdctlError::Generic(msg)
    }
}

impl From<&str> for CmdctlError {
    fn from(msg: &str) -> Self {
        CmdctlError::Generic(msg.to_owned())
    }
}

impl UsageError {
    /// Create a usage error for the given command path.
    pub fn new(command_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            command_path: command_path.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_error_points_to_help() {
        let err = UsageError::new("cmdctl completion", "Shell not specified.");
        assert_eq!(
            err.to_string(),
            "Shell not specified.\nSee 'cmdctl completion -h' for help and examples."
        );
    }

    #[test]
    fn test_usage_error_display_has_no_prefix() {
        let err: CmdctlError = UsageError::new("cmdctl completion", "boom").into();
        assert!(err.to_string().starts_with("boom"));
    }

    #[test]
    fn test_resolve_error_display() {
        assert_eq!(
            ResolveError::NonZeroExit(Some(3)).to_string(),
            "Exited with status 3"
        );
        assert!(
            ResolveError::Timeout(Duration::from_millis(20))
                .to_string()
                .contains("20ms")
        );
    }
}
