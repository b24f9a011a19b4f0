//! Static command tree read by the completion engine
//!
//! The tree mirrors the clap definition of the CLI: every reachable command
//! path with its long flags, aliases and the fixed choices of its positional
//! arguments. It is built once and never mutated afterwards.

use std::collections::BTreeMap;

use super::overrides;

/// A long flag declared on a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagSpec {
    /// Long name without leading dashes
    pub name: String,
    /// Optional single-character form
    pub short: Option<char>,
    /// Whether the flag consumes a value
    pub takes_argument: bool,
    /// Whether the flag is one of the global override flags
    pub global_override: bool,
    /// Inherited by every subcommand
    pub persistent: bool,
    /// Must be given for the command to run
    pub required: bool,
}

impl FlagSpec {
    fn new(name: &str, takes_argument: bool) -> Self {
        Self {
            name: name.to_string(),
            short: None,
            takes_argument,
            global_override: overrides::lookup(name).is_some(),
            persistent: false,
            required: false,
        }
    }

    /// Flag taking a value
    pub fn value(name: &str) -> Self {
        Self::new(name, true)
    }

    /// Boolean flag
    pub fn switch(name: &str) -> Self {
        Self::new(name, false)
    }

    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// One command in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNode {
    name: String,
    path: Vec<String>,
    flags: BTreeMap<String, FlagSpec>,
    children: BTreeMap<String, CommandNode>,
    aliases: Vec<String>,
    nouns: Vec<String>,
}

impl CommandNode {
    /// Create a detached node; its path is fixed when it is attached.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            path: Vec::new(),
            flags: BTreeMap::new(),
            children: BTreeMap::new(),
            aliases: Vec::new(),
            nouns: Vec::new(),
        }
    }

    pub fn with_flag(mut self, flag: FlagSpec) -> Self {
        self.flags.insert(flag.name.clone(), flag);
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    pub fn with_noun(mut self, noun: &str) -> Self {
        if !self.nouns.iter().any(|n| n == noun) {
            self.nouns.push(noun.to_string());
        }
        self
    }

    pub fn with_child(mut self, mut child: CommandNode) -> Self {
        let mut prefix = self.path.clone();
        prefix.push(child.name.clone());
        child.reroot(prefix);
        self.children.insert(child.name.clone(), child);
        self
    }

    fn reroot(&mut self, path: Vec<String>) {
        for child in self.children.values_mut() {
            let mut child_path = path.clone();
            child_path.push(child.name.clone());
            child.reroot(child_path);
        }
        self.path = path;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Segments from the root; empty for the root itself
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Path segments joined with `_`, the form used by dispatch triggers
    pub fn path_key(&self) -> String {
        self.path.join("_")
    }

    pub fn flags(&self) -> impl Iterator<Item = &FlagSpec> {
        self.flags.values()
    }

    pub fn flag(&self, name: &str) -> Option<&FlagSpec> {
        self.flags.get(name)
    }

    pub fn children(&self) -> impl Iterator<Item = &CommandNode> {
        self.children.values()
    }

    pub fn child(&self, name: &str) -> Option<&CommandNode> {
        self.children.get(name)
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn nouns(&self) -> &[String] {
        &self.nouns
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn from_clap(command: &clap::Command, path: Vec<String>) -> Self {
        let mut node = CommandNode::new(command.get_name());
        node.path = path;

        for arg in command.get_arguments().filter(|a| !a.is_hide_set()) {
            if arg.is_positional() {
                for value in arg.get_possible_values() {
                    if !value.is_hide_set() {
                        node = node.with_noun(value.get_name());
                    }
                }
                continue;
            }

            // Short-only flags cannot be rendered as `--name`
            let Some(long) = arg.get_long() else {
                continue;
            };
            let mut flag = FlagSpec::new(long, arg.get_action().takes_values());
            flag.short = arg.get_short();
            flag.persistent = arg.is_global_set();
            flag.required = arg.is_required_set();
            node = node.with_flag(flag);
        }

        for sub in command.get_subcommands().filter(|s| !s.is_hide_set()) {
            let mut child_path = node.path.clone();
            child_path.push(sub.get_name().to_string());
            let mut child = CommandNode::from_clap(sub, child_path);
            child.aliases = sub.get_all_aliases().map(str::to_string).collect();
            node.children.insert(child.name.clone(), child);
        }

        node
    }
}

/// The whole command tree, rooted at the program itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTree {
    root: CommandNode,
}

impl CommandTree {
    pub fn new(mut root: CommandNode) -> Self {
        root.reroot(Vec::new());
        Self { root }
    }

    /// Build from a clap command definition.
    ///
    /// The command is built first so that global flags and the generated
    /// help flags show up on every subcommand. Hidden commands, hidden flags
    /// and short-only flags are left out.
    pub fn from_command(command: &clap::Command) -> Self {
        let mut command = command.clone();
        command.build();
        Self {
            root: CommandNode::from_clap(&command, Vec::new()),
        }
    }

    pub fn root(&self) -> &CommandNode {
        &self.root
    }

    /// Name the completion handler is registered for
    pub fn program(&self) -> &str {
        self.root.name()
    }

    /// Find the node at `path`; the empty path is the root.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&CommandNode> {
        path.iter()
            .try_fold(&self.root, |node, segment| node.child(segment.as_ref()))
    }

    /// All nodes, parents before children, siblings in name order
    pub fn nodes(&self) -> Vec<&CommandNode> {
        let mut out = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            out.push(node);
            let mut children: Vec<_> = node.children().collect();
            children.reverse();
            stack.extend(children);
        }
        out
    }

    /// Whether any command declares `--name` as a value-taking flag
    pub fn has_value_flag(&self, name: &str) -> bool {
        self.nodes()
            .iter()
            .any(|node| node.flag(name).is_some_and(|f| f.takes_argument))
    }
}
