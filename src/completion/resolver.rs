//! Dynamic resource name resolution
//!
//! This module plans and runs the self-invocation that lists live resource
//! names for a completion request. The process boundary sits behind the
//! [`CommandRunner`] trait so tests can substitute canned output.
//!
//! Every failure (spawn error, non-zero exit, timeout, garbage output)
//! degrades to an empty [`CandidateSet`]; nothing here may surface an error
//! inside the user's shell.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::dispatch::{DispatchTable, ResourceKind};
use super::overrides::OverrideFlags;
use crate::error::{ResolveError, Result};

/// Template extracting `.metadata.name` from every listed item
pub const ITEM_NAME_TEMPLATE: &str = "{{ range .items }}{{ .metadata.name }} {{ end }}";

/// Template extracting container names from a single pod
pub const CONTAINER_NAME_TEMPLATE: &str = "{{ range .spec.containers }}{{ .name }} {{ end }}";

/// Default bound on a single self-invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// A planned child process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Executable to run
    pub program: String,
    /// Arguments, not including the program
    pub args: Vec<String>,
    /// Hard limit on the run time
    pub timeout: Duration,
}

/// Runs an [`Invocation`] and returns its standard output.
///
/// Implementations must return an error for a non-zero exit and must not
/// wait longer than `invocation.timeout`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> std::result::Result<String, ResolveError>;
}

/// [`CommandRunner`] backed by a real child process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> std::result::Result<String, ResolveError> {
        let child = tokio::process::Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(ResolveError::Spawn)?;

        // Dropping the future on timeout drops the child, which kills it
        let output = tokio::time::timeout(invocation.timeout, child.wait_with_output())
            .await
            .map_err(|_| ResolveError::Timeout(invocation.timeout))?
            .map_err(ResolveError::Spawn)?;

        if !output.status.success() {
            return Err(ResolveError::NonZeroExit(output.status.code()));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| ResolveError::InvalidOutput("not valid UTF-8".to_string()))
    }
}

/// Completion candidates in first-seen order, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateSet {
    names: Vec<String>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse whitespace-separated names.
    ///
    /// Output that still contains template markers or control characters is
    /// not a name listing and is rejected.
    pub fn parse(output: &str) -> std::result::Result<Self, ResolveError> {
        if output.contains("{{") || output.contains("}}") {
            return Err(ResolveError::InvalidOutput("unrendered template".to_string()));
        }
        if output.chars().any(|c| c.is_control() && !c.is_whitespace()) {
            return Err(ResolveError::InvalidOutput("control characters in output".to_string()));
        }
        Ok(output.split_whitespace().collect())
    }

    /// Keep only names starting with `prefix`
    pub fn filter_prefix(self, prefix: &str) -> Self {
        Self {
            names: self
                .names
                .into_iter()
                .filter(|name| name.starts_with(prefix))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn into_vec(self) -> Vec<String> {
        self.names
    }
}

impl<S: AsRef<str>> FromIterator<S> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut names: Vec<String> = Vec::new();
        for name in iter {
            let name = name.as_ref();
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
        Self { names }
    }
}

impl std::fmt::Display for CandidateSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.names.join(" "))
    }
}

/// Lists resource names by re-invoking the tool
pub struct ResourceResolver<R> {
    runner: R,
    program: String,
    timeout: Duration,
}

impl<R: CommandRunner> ResourceResolver<R> {
    /// Create a resolver re-invoking `program` through `runner`
    pub fn new(runner: R, program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            program: program.into(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Work out which invocation lists `kind` given the nouns typed so far.
    ///
    /// Returns `None` when nothing should be listed: a bare `noun` dispatch
    /// with no noun yet, or a container listing with more than one noun.
    pub fn plan<S: AsRef<str>>(
        &self,
        kind: ResourceKind,
        nouns: &[S],
        overrides: &OverrideFlags,
    ) -> Option<Invocation> {
        let args = match kind {
            ResourceKind::Noun => {
                let noun = nouns.last()?.as_ref();
                self.get_args(overrides, ITEM_NAME_TEMPLATE, &[noun])
            }
            ResourceKind::Pods => self.get_args(overrides, ITEM_NAME_TEMPLATE, &["pods"]),
            ResourceKind::ReplicationControllers => {
                self.get_args(overrides, ITEM_NAME_TEMPLATE, &["rc"])
            }
            ResourceKind::Nodes => self.get_args(overrides, ITEM_NAME_TEMPLATE, &["nodes"]),
            ResourceKind::Namespaces => {
                self.get_args(overrides, ITEM_NAME_TEMPLATE, &["namespaces"])
            }
            ResourceKind::Contexts => self.config_args(overrides, "contexts"),
            ResourceKind::Clusters => self.config_args(overrides, "clusters"),
            ResourceKind::Users => self.config_args(overrides, "users"),
            ResourceKind::PodContainers => match nouns {
                [] => self.get_args(overrides, ITEM_NAME_TEMPLATE, &["pods"]),
                [pod] => self.get_args(overrides, CONTAINER_NAME_TEMPLATE, &["pods", pod.as_ref()]),
                _ => return None,
            },
        };

        Some(Invocation {
            program: self.program.clone(),
            args,
            timeout: self.timeout,
        })
    }

    /// List names for `kind`; failures give an empty set.
    pub async fn resolve<S: AsRef<str>>(
        &self,
        kind: ResourceKind,
        nouns: &[S],
        overrides: &OverrideFlags,
    ) -> CandidateSet {
        let Some(invocation) = self.plan(kind, nouns, overrides) else {
            debug!(%kind, "nothing to resolve");
            return CandidateSet::new();
        };

        debug!(program = %invocation.program, args = ?invocation.args, "resolving candidates");
        let result = self
            .runner
            .run(&invocation)
            .await
            .and_then(|output| CandidateSet::parse(&output));

        match result {
            Ok(candidates) => candidates,
            Err(e) => {
                debug!(%kind, error = %e, "resolver failed, offering no candidates");
                CandidateSet::new()
            }
        }
    }

    /// [`Self::resolve`] followed by prefix filtering against `current`
    pub async fn complete<S: AsRef<str>>(
        &self,
        kind: ResourceKind,
        nouns: &[S],
        overrides: &OverrideFlags,
        current: &str,
    ) -> CandidateSet {
        self.resolve(kind, nouns, overrides)
            .await
            .filter_prefix(current)
    }

    /// Resolve for a command path through the dispatch table.
    pub async fn resolve_path<P: AsRef<str>, S: AsRef<str>>(
        &self,
        table: &DispatchTable,
        path: &[P],
        nouns: &[S],
        overrides: &OverrideFlags,
    ) -> CandidateSet {
        match table.lookup(path) {
            Some(kind) => self.resolve(kind, nouns, overrides).await,
            None => CandidateSet::new(),
        }
    }

    fn get_args(&self, overrides: &OverrideFlags, template: &str, nouns: &[&str]) -> Vec<String> {
        let mut args = vec!["get".to_string()];
        args.extend(overrides.to_args());
        args.extend(template_args(template));
        args.extend(nouns.iter().map(|n| n.to_string()));
        args
    }

    fn config_args(&self, overrides: &OverrideFlags, section: &str) -> Vec<String> {
        let mut args = vec!["config".to_string(), "view".to_string()];
        args.extend(overrides.to_args());
        args.extend(template_args(&format!(
            "{{{{ range .{section} }}}}{{{{ .name }}}} {{{{ end }}}}"
        )));
        args
    }
}

fn template_args(template: &str) -> [String; 3] {
    [
        "-o".to_string(),
        "template".to_string(),
        format!("--template={template}"),
    ]
}

/// Resolver over real processes, re-invoking `program`
pub fn process_resolver(
    program: impl Into<String>,
    timeout: Duration,
) -> Result<ResourceResolver<ProcessRunner>> {
    let program = program.into();
    if program.is_empty() {
        return Err("completion executable must not be empty".into());
    }
    Ok(ResourceResolver::new(ProcessRunner, program, timeout))
}
