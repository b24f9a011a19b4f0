//! Reconstruction of global override flags from a partially typed line
//!
//! Dynamic completion re-invokes cmdctl, and that call has to see the same
//! namespace, context, cluster, user and server the user already typed.
//! [`track_overrides`] scans the words once, left to right, and tolerates the
//! flags appearing anywhere on the line in either `--flag value` or
//! `--flag=value` form. Flags with a short alias are also recognised as
//! `-x value`, `-x=value` and `-xvalue`.

use std::collections::BTreeMap;

/// How an override flag is written on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideForm {
    /// Takes a value, either `--flag value` or `--flag=value`
    Valued,
    /// Standalone boolean, `--flag`
    Switch,
}

/// A recognised global override flag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverrideFlagSpec {
    /// Long flag name without the leading dashes
    pub name: &'static str,
    /// Short alias, for the flags the CLI declares one for
    pub short: Option<char>,
    /// Accepted shape
    pub form: OverrideForm,
}

impl OverrideFlagSpec {
    const fn valued(name: &'static str) -> Self {
        Self {
            name,
            short: None,
            form: OverrideForm::Valued,
        }
    }

    const fn switch(name: &'static str) -> Self {
        Self {
            name,
            short: None,
            form: OverrideForm::Switch,
        }
    }

    const fn with_short(self, short: char) -> Self {
        Self {
            short: Some(short),
            ..self
        }
    }
}

/// Every flag whose value is forwarded to completion self-invocations.
///
/// The order here is the order in which [`OverrideFlags::to_args`] renders.
pub const OVERRIDE_FLAGS: &[OverrideFlagSpec] = &[
    OverrideFlagSpec::valued("config").with_short('c'),
    OverrideFlagSpec::valued("cluster"),
    OverrideFlagSpec::valued("user"),
    OverrideFlagSpec::valued("context"),
    OverrideFlagSpec::valued("namespace").with_short('n'),
    OverrideFlagSpec::valued("server").with_short('s'),
    OverrideFlagSpec::switch("all-namespaces"),
];

/// Look up an override flag by long name
pub fn lookup(name: &str) -> Option<&'static OverrideFlagSpec> {
    OVERRIDE_FLAGS.iter().find(|spec| spec.name == name)
}

/// Look up a valued override flag by short alias
pub fn lookup_short(short: char) -> Option<&'static OverrideFlagSpec> {
    OVERRIDE_FLAGS.iter().find(|spec| spec.short == Some(short))
}

/// Reconstructed value of one override flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideValue {
    /// Value given to a valued flag
    Value(String),
    /// A switch was present
    Present,
}

/// Override flags found on the command line, keyed by flag name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideFlags {
    values: BTreeMap<&'static str, OverrideValue>,
}

impl OverrideFlags {
    /// Value recorded for a flag, if any
    pub fn get(&self, name: &str) -> Option<&OverrideValue> {
        self.values.get(name)
    }

    /// Value of a valued flag as a string slice
    pub fn value(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OverrideValue::Value(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Whether no override flag was found
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of distinct flags recorded
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Render as arguments for a child invocation, attached form.
    pub fn to_args(&self) -> Vec<String> {
        OVERRIDE_FLAGS
            .iter()
            .filter_map(|spec| match self.values.get(spec.name)? {
                OverrideValue::Value(v) => Some(format!("--{}={}", spec.name, v)),
                OverrideValue::Present => Some(format!("--{}", spec.name)),
            })
            .collect()
    }
}

/// Scan typed words and reconstruct the override flags among them.
///
/// The word following a two-word flag is taken as its value whatever it
/// looks like. Words that are not override flags are skipped. When a flag
/// appears more than once the last occurrence wins.
pub fn track_overrides<S: AsRef<str>>(words: &[S]) -> OverrideFlags {
    let mut values = BTreeMap::new();
    let mut pending: Option<&'static OverrideFlagSpec> = None;

    for word in words {
        let word: &str = word.as_ref();
        if let Some(spec) = pending.take() {
            values.insert(spec.name, OverrideValue::Value(word.to_string()));
            continue;
        }

        let Some(flag) = word.strip_prefix("--") else {
            if let Some((spec, value)) = short_override(word) {
                match value {
                    Some(value) => {
                        values.insert(spec.name, OverrideValue::Value(value.to_string()));
                    }
                    None => pending = Some(spec),
                }
            }
            continue;
        };

        for spec in OVERRIDE_FLAGS {
            match spec.form {
                OverrideForm::Valued => {
                    if flag == spec.name {
                        pending = Some(spec);
                    } else if let Some(value) = flag
                        .strip_prefix(spec.name)
                        .and_then(|rest| rest.strip_prefix('='))
                    {
                        // `--user=` carries nothing worth forwarding
                        if !value.is_empty() {
                            values.insert(spec.name, OverrideValue::Value(value.to_string()));
                        }
                    }
                }
                OverrideForm::Switch => {
                    if flag == spec.name {
                        values.insert(spec.name, OverrideValue::Present);
                    }
                }
            }
        }
    }

    OverrideFlags { values }
}

/// Match `-x`, `-x=value` or `-xvalue` against the short aliases.
///
/// Returns the flag and its attached value, `None` when the value is the
/// next word. An empty attached value matches nothing.
fn short_override(word: &str) -> Option<(&'static OverrideFlagSpec, Option<&str>)> {
    let rest = word.strip_prefix('-')?;
    let mut chars = rest.chars();
    let spec = lookup_short(chars.next()?)?;
    let attached = chars.as_str();
    let value = attached.strip_prefix('=').unwrap_or(attached);

    match (attached.is_empty(), value.is_empty()) {
        (true, _) => Some((spec, None)),
        (false, true) => None,
        (false, false) => Some((spec, Some(value))),
    }
}
