//! Zsh support by rewriting the bash script
//!
//! Zsh loads the bash script through `bashcompinit`. The constructs
//! `bashcompinit` does not emulate are rewritten by an ordered list of
//! [`RewriteRule`]s, and the bash-completion helpers the script relies on are
//! provided by [`ShimFunction`]s emitted ahead of it.

use regex::Regex;

use crate::error::{CompletionError, Result};

/// A single regex rewrite applied line by line.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    pattern: Regex,
    replacement: String,
    global: bool,
}

impl RewriteRule {
    /// Compile a rule.
    ///
    /// `replacement` uses `regex` expansion syntax: `${1}` for a group and
    /// `$$` for a literal dollar. A non-global rule rewrites only the first
    /// match on each line.
    pub fn new(pattern: &str, replacement: &str, global: bool) -> Result<Self> {
        let compiled = Regex::new(pattern).map_err(|e| CompletionError::InvalidRewriteRule {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            pattern: compiled,
            replacement: replacement.to_string(),
            global,
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn is_global(&self) -> bool {
        self.global
    }
}

/// Rules turning cmdctl's bash script into something `bashcompinit` runs
pub fn default_rules(program: &str) -> Result<Vec<RewriteRule>> {
    let p = program;
    let first = [
        (r"declare -F", "whence -w".to_string()),
        (
            r#"_get_comp_words_by_ref "\$@""#,
            format!(r#"__{p}_get_comp_words_by_ref "$$*""#),
        ),
        (r"local ([a-zA-Z0-9_]*)=", "local ${1}; ${1}=".to_string()),
        (
            r#"\bflags\+=\("(--[^"]*)="\)"#,
            r#"flags+=("${1}"); two_word_flags+=("${1}")"#.to_string(),
        ),
        (
            r#"must_have_one_flag\+=\("(--[^"]*)="\)"#,
            r#"must_have_one_flag+=("${1}")"#.to_string(),
        ),
    ];
    let global = [
        (r"\b_filedir\b", format!("__{p}_filedir")),
        (
            r"\b_get_comp_words_by_ref\b",
            format!("__{p}_get_comp_words_by_ref"),
        ),
        (
            r"\b__ltrim_colon_completions\b",
            format!("__{p}_ltrim_colon_completions"),
        ),
        (r"\bcompgen\b", format!("__{p}_compgen")),
        (r"\bcompopt\b", format!("__{p}_compopt")),
        (r"\bdeclare\b", "builtin declare".to_string()),
        (r"\$\(type\b", format!("$$(__{p}_type")),
    ];

    first
        .iter()
        .map(|(pattern, replacement)| RewriteRule::new(pattern, replacement, false))
        .chain(
            global
                .iter()
                .map(|(pattern, replacement)| RewriteRule::new(pattern, replacement, true)),
        )
        .collect()
}

/// Applies an ordered rule list to a script
#[derive(Debug, Clone)]
pub struct Transpiler {
    rules: Vec<RewriteRule>,
}

impl Transpiler {
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// Transpiler with the [`default_rules`] for `program`
    pub fn for_program(program: &str) -> Result<Self> {
        Ok(Self::new(default_rules(program)?))
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Rewrite every line of `script`.
    ///
    /// Line breaks are preserved exactly, so a script no rule matches comes
    /// back unchanged.
    pub fn rewrite(&self, script: &str) -> String {
        script
            .split('\n')
            .map(|line| self.rewrite_line(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Apply the rules to one line in declared order.
    ///
    /// Each rule makes one left-to-right pass over the line as left by the
    /// rules before it. Text produced by an earlier rule is frozen: a later
    /// match touching it is skipped, so replacements are never re-scanned.
    fn rewrite_line(&self, line: &str) -> String {
        let mut text = line.to_string();
        // replaced spans, sorted and disjoint
        let mut frozen: Vec<(usize, usize)> = Vec::new();

        for rule in &self.rules {
            let mut out = String::with_capacity(text.len());
            let mut spans = Vec::with_capacity(frozen.len() + 1);
            let mut old = frozen.iter().copied().peekable();
            let mut copied = 0;
            let mut pos = 0;

            while pos < text.len() {
                let Some(caps) = rule.pattern.captures_at(&text, pos) else {
                    break;
                };
                let Some(matched) = caps.get(0) else {
                    break;
                };
                let (start, end) = (matched.start(), matched.end());

                if overlaps_frozen(&frozen, start, end) {
                    pos = next_char_boundary(&text, start);
                    continue;
                }

                while let Some(&(a, b)) = old.peek() {
                    if b > start {
                        break;
                    }
                    spans.push((a + out.len() - copied, b + out.len() - copied));
                    old.next();
                }

                out.push_str(&text[copied..start]);
                let replaced_at = out.len();
                caps.expand(&rule.replacement, &mut out);
                spans.push((replaced_at, out.len()));
                copied = end;

                if !rule.global {
                    break;
                }
                pos = if start == end { next_char_boundary(&text, end) } else { end };
            }

            let base = out.len();
            spans.extend(old.map(|(a, b)| (a + base - copied, b + base - copied)));
            out.push_str(&text[copied..]);

            text = out;
            frozen = spans;
        }

        text
    }
}

/// Whether the match `start..end` touches a frozen span
fn overlaps_frozen(frozen: &[(usize, usize)], start: usize, end: usize) -> bool {
    frozen.iter().any(|&(a, b)| {
        if start == end {
            a < start && start < b
        } else {
            (start < b && a < end) || (a == b && start < a && a < end)
        }
    })
}

fn next_char_boundary(text: &str, at: usize) -> usize {
    text[at..]
        .chars()
        .next()
        .map_or(text.len(), |c| at + c.len_utf8())
}

/// A zsh function standing in for a bash-only builtin or helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShimFunction {
    pub name: String,
    pub body: String,
}

impl ShimFunction {
    fn new(program: &str, suffix: &str, body: &str) -> Self {
        Self {
            name: format!("__{program}_{suffix}"),
            body: body.replace("{prog}", program),
        }
    }

    /// Render as a zsh function definition
    pub fn render(&self) -> String {
        format!("{}() {{\n{}\n}}\n", self.name, self.body.trim_end())
    }
}

/// Functions defined before the rewritten script is sourced
pub fn shim_functions(program: &str) -> Vec<ShimFunction> {
    vec![
        ShimFunction::new(
            program,
            "bash_source",
            r#"	alias shopt=':'
	alias _expand=_bash_expand
	alias _complete=_bash_comp
	emulate -L sh
	setopt kshglob noshglob braceexpand

	source "$@""#,
        ),
        ShimFunction::new(
            program,
            "type",
            r#"	# zsh has no -t; report the shimmed compopt as a builtin so the
	# script takes the compopt code path
	if [ "$1" = "-t" ]; then
		shift
		if [ "$1" = "__{prog}_compopt" ]; then
			echo builtin
			return 0
		fi
	fi
	type "$@""#,
        ),
        ShimFunction::new(
            program,
            "compgen",
            r#"	local completions w
	completions=( $(compgen "$@") ) || return $?

	# filter by given word as prefix
	while [[ "$1" = -* && "$1" != -- ]]; do
		shift
		shift
	done
	if [[ "$1" == -- ]]; then
		shift
	fi
	for w in "${completions[@]}"; do
		if [[ "${w}" = "$1"* ]]; then
			echo "${w}"
		fi
	done"#,
        ),
        ShimFunction::new(program, "compopt", "\ttrue # not supported by bashcompinit"),
        ShimFunction::new(
            program,
            "ltrim_colon_completions",
            r#"	if [[ "$1" == *:* && "$COMP_WORDBREAKS" == *:* ]]; then
		# Remove colon-word prefix from COMPREPLY items
		local colon_word=${1%${1##*:}}
		local i=${#COMPREPLY[*]}
		while [[ $((--i)) -ge 0 ]]; do
			COMPREPLY[$i]=${COMPREPLY[$i]#"$colon_word"}
		done
	fi"#,
        ),
        ShimFunction::new(
            program,
            "get_comp_words_by_ref",
            r#"	cur="${COMP_WORDS[COMP_CWORD]}"
	prev="${COMP_WORDS[${COMP_CWORD}-1]}"
	words=("${COMP_WORDS[@]}")
	cword=("${COMP_CWORD[@]}")"#,
        ),
        ShimFunction::new(
            program,
            "filedir",
            r#"	local RET OLD_IFS w qw

	__{prog}_debug "_filedir $@ cur=$cur"
	OLD_IFS="$IFS"
	IFS=$'\n'
	if [ "$1" = "-d" ]; then
		shift
		RET=( $(compgen -d) )
	else
		RET=( $(compgen -f) )
	fi
	IFS="$OLD_IFS"

	for w in ${RET[@]}; do
		if [[ ! "${w}" = "${cur}"* ]]; then
			continue
		fi
		# dot-files only when the word asks for them
		if [[ "${w}" = .* && "${cur}" != .* ]]; then
			continue
		fi
		qw="$(__{prog}_quote "${w}")"
		if [ -d "${w}" ]; then
			COMPREPLY+=("${qw}/")
		else
			COMPREPLY+=("${qw}")
		fi
	done"#,
        ),
        ShimFunction::new(
            program,
            "quote",
            r#"	if [[ $1 == \'* || $1 == \"* ]]; then
		# Leave out first character
		printf %q "${1:1}"
	else
		printf %q "$1"
	fi"#,
        ),
    ]
}

const HEREDOC_MARKER: &str = "BASH_COMPLETION_EOF";

/// Renders the zsh script around a bash script
#[derive(Debug, Clone)]
pub struct ZshEmitter {
    program: String,
    transpiler: Transpiler,
}

impl ZshEmitter {
    pub fn new(program: &str) -> Result<Self> {
        Ok(Self {
            program: program.to_string(),
            transpiler: Transpiler::for_program(program)?,
        })
    }

    /// Full zsh script: header, shims, rewritten body, trailer.
    pub fn emit(&self, boilerplate: &str, bash_script: &str) -> String {
        let program = &self.program;
        let mut out = format!("#compdef {program}\n\n");
        out.push_str(boilerplate);
        if !boilerplate.is_empty() && !boilerplate.ends_with('\n') {
            out.push('\n');
        }
        out.push('\n');

        for shim in shim_functions(program) {
            out.push_str(&shim.render());
            out.push('\n');
        }
        out.push_str("autoload -U +X compinit && compinit\n");
        out.push_str("autoload -U +X bashcompinit && bashcompinit\n\n");

        out.push_str(&format!("__{program}_bash_body() {{\n\tcat <<'{HEREDOC_MARKER}'\n"));
        out.push_str(&self.transpiler.rewrite(bash_script));
        if !bash_script.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&format!("{HEREDOC_MARKER}\n}}\n\n"));

        out.push_str(&format!("__{program}_bash_source <(__{program}_bash_body)\n"));
        // `_complete` is aliased to `_bash_comp` by the bash_source shim
        out.push_str(&format!("_complete {program} 2>/dev/null\n"));
        out
    }
}
