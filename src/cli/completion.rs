//! Shell completion for cmdctl
//!
//! This module backs two commands:
//! - `completion SHELL`, which prints a bash or zsh script
//! - the hidden `__complete KIND`, which generated scripts call to list
//!   live resource names

use clap::builder::{PossibleValue, TypedValueParser};
use clap::CommandFactory;
use std::ffi::OsStr;
use std::path::Path;
use tracing::debug;

use crate::cli::CliArgs;
use crate::completion::{
    CommandTree, CompletionGenerator, Dialect, DispatchTable, ResourceKind, parse_dialect,
    process_resolver, track_overrides,
};
use crate::config::Config;
use crate::error::{Result, UsageError};

/// Value parser for the SHELL argument.
///
/// Advertises the supported shells for help and completion but accepts any
/// value, so unknown names reach [`select_dialect`] and get its usage error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DialectNameParser;

impl TypedValueParser for DialectNameParser {
    type Value = String;

    fn parse_ref(
        &self,
        _cmd: &clap::Command,
        _arg: Option<&clap::Arg>,
        value: &OsStr,
    ) -> std::result::Result<Self::Value, clap::Error> {
        Ok(value.to_string_lossy().into_owned())
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        Some(Box::new(
            Dialect::ALL.iter().map(|dialect| PossibleValue::new(dialect.name())),
        ))
    }
}

/// Command path used in usage errors
fn command_path() -> String {
    format!("{} completion", CliArgs::command().get_name())
}

/// Pick the dialect from the positional arguments of `completion`
///
/// # Arguments
/// * `shells` - Every positional argument given
///
/// # Returns
/// * `Result<Dialect>` - The dialect, or a usage error
pub fn select_dialect(shells: &[String]) -> Result<Dialect> {
    match shells {
        [] => Err(UsageError::new(command_path(), "Shell not specified.").into()),
        [name] => parse_dialect(name).ok_or_else(|| {
            UsageError::new(command_path(), format!("Unsupported shell type {name:?}.")).into()
        }),
        _ => Err(UsageError::new(
            command_path(),
            "Too many arguments. Expected only the shell type.",
        )
        .into()),
    }
}

/// Completion tree and dispatch table for cmdctl itself
pub fn build_generator(config: &Config) -> Result<CompletionGenerator> {
    let tree = CommandTree::from_command(&CliArgs::command());
    let table = DispatchTable::with_defaults(&tree)?;
    let generator = CompletionGenerator::new(tree, table);

    match &config.completion.boilerplate_file {
        Some(path) => Ok(generator.with_boilerplate(read_boilerplate(path)?)),
        None => Ok(generator),
    }
}

fn read_boilerplate(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading completion boilerplate");
    Ok(std::fs::read_to_string(path)?)
}

/// Render the completion script for the `completion` command
///
/// Nothing is written here; the caller prints the returned script, so a
/// failure leaves stdout untouched.
///
/// # Arguments
/// * `shells` - Positional arguments of `completion`
/// * `config` - Effective configuration
///
/// # Returns
/// * `Result<String>` - The whole script
pub fn generate_completion(shells: &[String], config: &Config) -> Result<String> {
    let dialect = select_dialect(shells)?;
    build_generator(config)?.generate(dialect)
}

/// Program the resolver re-invokes
fn resolver_program(config: &Config) -> String {
    if let Some(executable) = &config.completion.executable {
        return executable.clone();
    }
    std::env::current_exe()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|_| CliArgs::command().get_name().to_string())
}

/// Handle `__complete`: list candidates for `kind`, one line, space separated.
///
/// Never fails; every problem results in no output.
///
/// # Arguments
/// * `kind` - Resource kind token from the generated script
/// * `current` - The partial word being completed
/// * `nouns` - Positional words typed after the command
/// * `words` - All words before the cursor, scanned for override flags
/// * `config` - Effective configuration
pub async fn complete_resources(
    kind: &str,
    current: &str,
    nouns: &[String],
    words: &[String],
    config: &Config,
) -> Option<String> {
    let kind: ResourceKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => {
            debug!(error = %e, "ignoring completion request");
            return None;
        }
    };

    let resolver = match process_resolver(resolver_program(config), config.completion_timeout()) {
        Ok(resolver) => resolver,
        Err(e) => {
            debug!(error = %e, "no resolver available");
            return None;
        }
    };

    let overrides = track_overrides(words);
    debug!(%kind, overrides = overrides.len(), "completing resources");
    let candidates = resolver.complete(kind, nouns, &overrides, current).await;
    if candidates.is_empty() {
        None
    } else {
        Some(candidates.to_string())
    }
}
