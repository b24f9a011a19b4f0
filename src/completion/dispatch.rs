//! Mapping from command paths to dynamically listed resource kinds
//!
//! A [`DispatchTable`] is a validated, precedence-ordered list of
//! [`DispatchRule`]s plus the [`FlagValueRule`]s used for flag values.
//! Triggers come in three shapes:
//!
//! - `config_use-context`: exactly that command path
//! - `rollout_*`: any command below `rollout`
//! - `*_status`: any command whose last segment is `status`
//!
//! Exact triggers always win. Among wildcard triggers the one with more
//! literal segments wins, then the one with the longer literal text, then
//! the one declared first.

use std::cmp::Reverse;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::tree::CommandTree;
use crate::error::{CompletionError, Result};

/// What the resolver lists for a matched command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Whatever resource noun was typed last
    Noun,
    Pods,
    ReplicationControllers,
    Nodes,
    Namespaces,
    Contexts,
    Clusters,
    Users,
    /// A pod first, then one of its containers
    PodContainers,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Noun,
        ResourceKind::Pods,
        ResourceKind::ReplicationControllers,
        ResourceKind::Nodes,
        ResourceKind::Namespaces,
        ResourceKind::Contexts,
        ResourceKind::Clusters,
        ResourceKind::Users,
        ResourceKind::PodContainers,
    ];

    /// Token passed from the generated script to `__complete`
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Noun => "noun",
            ResourceKind::Pods => "pods",
            ResourceKind::ReplicationControllers => "rc",
            ResourceKind::Nodes => "nodes",
            ResourceKind::Namespaces => "namespaces",
            ResourceKind::Contexts => "contexts",
            ResourceKind::Clusters => "clusters",
            ResourceKind::Users => "users",
            ResourceKind::PodContainers => "containers",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CompletionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CompletionError::UnknownResourceKind(s.to_string()))
    }
}

/// Which command paths a rule applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Exactly this path
    Exact(Vec<String>),
    /// Any path strictly below this prefix
    Family(Vec<String>),
    /// Any path ending in this segment
    Suffix(String),
}

impl Trigger {
    /// Parse `a_b`, `a_*` or `*_b`
    pub fn parse(text: &str) -> std::result::Result<Self, CompletionError> {
        let invalid = || CompletionError::InvalidTrigger(text.to_string());
        let segments: Vec<&str> = text.split('_').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(invalid());
        }

        let wildcards = segments.iter().filter(|s| s.contains('*')).count();
        match (wildcards, segments.as_slice()) {
            (0, _) => Ok(Trigger::Exact(owned(&segments))),
            (1, [prefix @ .., "*"]) if !prefix.is_empty() => Ok(Trigger::Family(owned(prefix))),
            (1, ["*", segment]) => Ok(Trigger::Suffix(segment.to_string())),
            _ => Err(invalid()),
        }
    }

    pub fn matches<S: AsRef<str>>(&self, path: &[S]) -> bool {
        match self {
            Trigger::Exact(exact) => segments_eq(exact, path),
            Trigger::Family(prefix) => {
                path.len() > prefix.len() && segments_eq(prefix, &path[..prefix.len()])
            }
            Trigger::Suffix(segment) => {
                path.len() > 1 && path.last().is_some_and(|last| last.as_ref() == segment)
            }
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Trigger::Exact(_))
    }

    /// Shell `case` pattern matched against `last_command`
    pub fn case_pattern(&self, program: &str) -> String {
        match self {
            Trigger::Exact(path) => format!("{}_{}", program, path.join("_")),
            Trigger::Family(prefix) => format!("{}_{}_*", program, prefix.join("_")),
            Trigger::Suffix(segment) => format!("{}_*_{}", program, segment),
        }
    }

    fn precedence(&self) -> (bool, usize, usize) {
        match self {
            Trigger::Exact(path) => (true, path.len(), path.iter().map(String::len).sum()),
            Trigger::Family(prefix) => (false, prefix.len(), prefix.iter().map(String::len).sum()),
            Trigger::Suffix(segment) => (false, 1, segment.len()),
        }
    }

    fn validate(&self, tree: &CommandTree) -> bool {
        match self {
            Trigger::Exact(path) => tree.find(path).is_some(),
            Trigger::Family(prefix) => tree.find(prefix).is_some_and(|node| !node.is_leaf()),
            Trigger::Suffix(_) => tree.nodes().iter().any(|node| self.matches(node.path())),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Exact(path) => write!(f, "{}", path.join("_")),
            Trigger::Family(prefix) => write!(f, "{}_*", prefix.join("_")),
            Trigger::Suffix(segment) => write!(f, "*_{}", segment),
        }
    }
}

fn owned(segments: &[&str]) -> Vec<String> {
    segments.iter().map(|s| s.to_string()).collect()
}

fn segments_eq<S: AsRef<str>>(expected: &[String], path: &[S]) -> bool {
    expected.len() == path.len()
        && expected
            .iter()
            .zip(path)
            .all(|(e, p)| e.as_str() == p.as_ref())
}

/// Complete positional arguments of matching commands with `kind`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchRule {
    pub trigger: Trigger,
    pub kind: ResourceKind,
}

impl DispatchRule {
    pub fn new(trigger: &str, kind: ResourceKind) -> Result<Self> {
        Ok(Self {
            trigger: Trigger::parse(trigger)?,
            kind,
        })
    }
}

/// Complete the value of `--flag` with `kind`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagValueRule {
    pub flag: String,
    pub kind: ResourceKind,
}

impl FlagValueRule {
    pub fn new(flag: &str, kind: ResourceKind) -> Self {
        Self {
            flag: flag.to_string(),
            kind,
        }
    }
}

/// Validated dispatch rules in precedence order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTable {
    rules: Vec<DispatchRule>,
    flag_rules: Vec<FlagValueRule>,
}

impl DispatchTable {
    /// Validate rules against the tree and sort them by precedence.
    ///
    /// Fails on a trigger that matches no command, on a trigger declared
    /// twice, and on a flag rule whose flag no command accepts a value for.
    pub fn build(
        tree: &CommandTree,
        mut rules: Vec<DispatchRule>,
        flag_rules: Vec<FlagValueRule>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for rule in &rules {
            let key = rule.trigger.to_string();
            if !rule.trigger.validate(tree) {
                return Err(CompletionError::DeadTrigger(key).into());
            }
            if !seen.insert(key.clone()) {
                return Err(CompletionError::DuplicateTrigger(key).into());
            }
        }

        for rule in &flag_rules {
            if !tree.has_value_flag(&rule.flag) {
                return Err(CompletionError::DeadFlagRule(rule.flag.clone()).into());
            }
        }

        // Stable sort keeps declaration order among equal precedence
        rules.sort_by_key(|rule| {
            let (exact, segments, literal) = rule.trigger.precedence();
            (Reverse(exact), Reverse(segments), Reverse(literal))
        });

        tracing::debug!(
            rules = rules.len(),
            flag_rules = flag_rules.len(),
            "dispatch table built"
        );
        Ok(Self { rules, flag_rules })
    }

    /// Build the table cmdctl ships with.
    pub fn with_defaults(tree: &CommandTree) -> Result<Self> {
        Self::build(tree, default_rules()?, default_flag_rules())
    }

    /// Resource kind for a command path, honouring precedence
    pub fn lookup<S: AsRef<str>>(&self, path: &[S]) -> Option<ResourceKind> {
        self.rules
            .iter()
            .find(|rule| rule.trigger.matches(path))
            .map(|rule| rule.kind)
    }

    /// Resource kind completing the value of `--flag`
    pub fn flag_kind(&self, flag: &str) -> Option<ResourceKind> {
        self.flag_rules
            .iter()
            .find(|rule| rule.flag == flag)
            .map(|rule| rule.kind)
    }

    /// Rules in precedence order
    pub fn rules(&self) -> &[DispatchRule] {
        &self.rules
    }

    pub fn flag_rules(&self) -> &[FlagValueRule] {
        &self.flag_rules
    }
}

/// Rules for the commands cmdctl registers
pub fn default_rules() -> Result<Vec<DispatchRule>> {
    use ResourceKind::*;

    let noun = [
        "get",
        "describe",
        "delete",
        "label",
        "stop",
        "edit",
        "patch",
        "annotate",
        "expose",
        "scale",
        "autoscale",
        "taint",
        "rollout_*",
    ];
    let table: [(&[&str], ResourceKind); 6] = [
        (&noun, Noun),
        (&["logs", "attach"], PodContainers),
        (&["exec", "port-forward", "top_pod"], Pods),
        (&["rolling-update"], ReplicationControllers),
        (&["cordon", "uncordon", "drain", "top_node"], Nodes),
        (&["config_use-context"], Contexts),
    ];

    table
        .iter()
        .flat_map(|&(triggers, kind)| triggers.iter().map(move |t| DispatchRule::new(t, kind)))
        .collect()
}

/// Override flags whose values complete dynamically
pub fn default_flag_rules() -> Vec<FlagValueRule> {
    vec![
        FlagValueRule::new("namespace", ResourceKind::Namespaces),
        FlagValueRule::new("context", ResourceKind::Contexts),
        FlagValueRule::new("cluster", ResourceKind::Clusters),
        FlagValueRule::new("user", ResourceKind::Users),
    ]
}
