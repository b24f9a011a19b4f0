//! Shell completion engine
//!
//! This module turns the CLI's command tree into shell completion scripts:
//! - Static completion of subcommands, flags and fixed nouns
//! - Dynamic completion of live resource names via `cmdctl __complete`
//! - Override flags typed on the line forwarded to that call
//! - A zsh script derived from the bash one
//!
//! # Example
//!
//! ```rust
//! use cmdctl::completion::{CommandNode, CommandTree, CompletionGenerator, Dialect, DispatchTable};
//!
//! let tree = CommandTree::new(CommandNode::new("cmdctl").with_child(CommandNode::new("version")));
//! let table = DispatchTable::build(&tree, vec![], vec![]).unwrap();
//! let script = CompletionGenerator::new(tree, table).generate(Dialect::Bash).unwrap();
//! assert!(script.contains("_cmdctl_version()"));
//! ```

pub mod bash;
pub mod dispatch;
pub mod overrides;
pub mod resolver;
pub mod tree;
pub mod zsh;

use std::fmt;

use clap_complete::Shell;

pub use bash::BashEmitter;
pub use dispatch::{DispatchRule, DispatchTable, FlagValueRule, ResourceKind, Trigger};
pub use overrides::{OverrideFlags, OverrideValue, track_overrides};
pub use resolver::{
    CandidateSet, CommandRunner, Invocation, ProcessRunner, ResourceResolver, process_resolver,
};
pub use tree::{CommandNode, CommandTree, FlagSpec};
pub use zsh::{RewriteRule, ShimFunction, Transpiler, ZshEmitter};

use crate::error::Result;

/// License header placed at the top of generated scripts
pub const DEFAULT_BOILERPLATE: &str = "\
# Copyright The cmdctl Authors.
#
# Licensed under the Apache License, Version 2.0 (the \"License\");
# you may not use this file except in compliance with the License.
# You may obtain a copy of the License at
#
#     http://www.apache.org/licenses/LICENSE-2.0
#
# Unless required by applicable law or agreed to in writing, software
# distributed under the License is distributed on an \"AS IS\" BASIS,
# WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
# See the License for the specific language governing permissions and
# limitations under the License.
";

/// Shells a completion script can be generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Bash,
    Zsh,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Bash, Dialect::Zsh];

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Bash => "bash",
            Dialect::Zsh => "zsh",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parse a shell name, ignoring case.
///
/// # Arguments
/// * `name` - Shell name as typed, e.g. `bash` or `ZSH`
///
/// # Returns
/// * `Option<Dialect>` - The dialect, or `None` for any other shell
pub fn parse_dialect(name: &str) -> Option<Dialect> {
    match name.to_lowercase().parse::<Shell>() {
        Ok(Shell::Bash) => Some(Dialect::Bash),
        Ok(Shell::Zsh) => Some(Dialect::Zsh),
        _ => None,
    }
}

/// Produces complete, self-contained completion scripts
#[derive(Debug, Clone)]
pub struct CompletionGenerator {
    tree: CommandTree,
    table: DispatchTable,
    boilerplate: String,
}

impl CompletionGenerator {
    /// Generator using [`DEFAULT_BOILERPLATE`]
    pub fn new(tree: CommandTree, table: DispatchTable) -> Self {
        Self {
            tree,
            table,
            boilerplate: DEFAULT_BOILERPLATE.to_string(),
        }
    }

    /// Replace the license header
    pub fn with_boilerplate(mut self, boilerplate: impl Into<String>) -> Self {
        self.boilerplate = boilerplate.into();
        self
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }

    /// Render the script for `dialect` entirely in memory.
    pub fn generate(&self, dialect: Dialect) -> Result<String> {
        let bash = BashEmitter::new(&self.tree, &self.table).emit();
        tracing::debug!(%dialect, program = self.tree.program(), "generating completion script");

        match dialect {
            Dialect::Bash => {
                let mut script = self.boilerplate.clone();
                if !script.is_empty() && !script.ends_with('\n') {
                    script.push('\n');
                }
                if !script.is_empty() {
                    script.push('\n');
                }
                script.push_str(&bash);
                Ok(script)
            }
            Dialect::Zsh => {
                let emitter = ZshEmitter::new(self.tree.program())?;
                Ok(emitter.emit(&self.boilerplate, &bash))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generator() -> CompletionGenerator {
        let tree = CommandTree::new(
            CommandNode::new("cmdctl")
                .with_flag(FlagSpec::value("namespace").persistent())
                .with_child(CommandNode::new("config").with_child(CommandNode::new("use-context")))
                .with_child(CommandNode::new("version")),
        );
        let table = DispatchTable::build(
            &tree,
            vec![DispatchRule::new("config_use-context", ResourceKind::Contexts).unwrap()],
            vec![FlagValueRule::new("namespace", ResourceKind::Namespaces)],
        )
        .unwrap();
        CompletionGenerator::new(tree, table)
    }

    #[test]
    fn test_parse_dialect() {
        assert_eq!(parse_dialect("bash"), Some(Dialect::Bash));
        assert_eq!(parse_dialect("ZSH"), Some(Dialect::Zsh));
        assert_eq!(parse_dialect("Bash"), Some(Dialect::Bash));
        assert_eq!(parse_dialect("fish"), None);
        assert_eq!(parse_dialect("powershell"), None);
        assert_eq!(parse_dialect(""), None);
    }

    #[test]
    fn test_bash_starts_with_boilerplate() {
        let script = generator().generate(Dialect::Bash).unwrap();
        assert!(script.starts_with(DEFAULT_BOILERPLATE));
        assert!(script.contains("# bash completion for cmdctl"));
    }

    #[test]
    fn test_custom_boilerplate() {
        let script = generator()
            .with_boilerplate("# mine")
            .generate(Dialect::Bash)
            .unwrap();
        assert!(script.starts_with("# mine\n\n# bash completion"));
    }

    #[test]
    fn test_zsh_wraps_rewritten_bash() {
        let script = generator().generate(Dialect::Zsh).unwrap();
        assert!(script.starts_with("#compdef cmdctl\n\n# Copyright"));
        assert!(script.contains("flags+=(\"--namespace\"); two_word_flags+=(\"--namespace\")"));
        assert!(script.contains("local c; c=0"));
        assert!(script.contains("whence -w _init_completion"));
        assert!(!script.contains("\n    local c=0\n"));
    }
}
