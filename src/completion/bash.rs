//! Bash completion script generation
//!
//! The emitted script walks the words typed so far through one shell
//! function per command path, accumulating the flags, subcommands and nouns
//! valid at the cursor. Positional arguments that name live resources are
//! handed to `__<prog>_custom_func`, a `case` over the command path generated
//! from the [`DispatchTable`], which calls back into `<prog> __complete`.

use std::collections::BTreeMap;

use super::dispatch::{DispatchTable, ResourceKind, Trigger};
use super::tree::{CommandNode, CommandTree, FlagSpec};

const PROG: &str = "{prog}";

/// Helpers shared by every generated script; `{prog}` is the program name.
const PREAMBLE: &str = r#"# bash completion for {prog}                              -*- shell-script -*-

__{prog}_debug()
{
    if [[ -n ${BASH_COMP_DEBUG_FILE:-} ]]; then
        echo "$*" >> "${BASH_COMP_DEBUG_FILE}"
    fi
}

# Minimal stand-in for _init_completion on old bash-completion releases
__{prog}_init_completion()
{
    COMPREPLY=()
    _get_comp_words_by_ref "$@" cur prev words cword
}

__{prog}_index_of_word()
{
    local w word=$1
    shift
    index=0
    for w in "$@"; do
        [[ $w = "$word" ]] && return
        index=$((index+1))
    done
    index=-1
}

__{prog}_contains_word()
{
    local w word=$1; shift
    for w in "$@"; do
        [[ $w = "$word" ]] && return
    done
    return 1
}

__{prog}_fallback_filedir()
{
    local comp
    if declare -F _filedir >/dev/null; then
        _filedir
    else
        while IFS='' read -r comp; do
            COMPREPLY+=("$comp")
        done < <(compgen -f -- "$cur")
    fi
}

__{prog}_dynamic_complete()
{
    local kind=$1
    local noun out
    local noun_args
    noun_args=()
    for noun in "${nouns[@]}"; do
        noun_args+=("--noun=${noun}")
    done
    out=$({prog} __complete "${kind}" --cur="${cur}" "${noun_args[@]}" -- "${words[@]:1:$((cword-1))}" 2>/dev/null)
    COMPREPLY=( $(compgen -W "${out}" -- "$cur") )
}

__{prog}_handle_reply()
{
    __{prog}_debug "${FUNCNAME[0]}"
    local comp
    case $cur in
        -*)
            if [[ $(type -t compopt) = "builtin" ]]; then
                compopt -o nospace
            fi
            local allflags
            if [ ${#must_have_one_flag[@]} -ne 0 ]; then
                allflags=("${must_have_one_flag[@]}")
            else
                allflags=("${flags[*]} ${two_word_flags[*]}")
            fi
            while IFS='' read -r comp; do
                COMPREPLY+=("$comp")
            done < <(compgen -W "${allflags[*]}" -- "$cur")
            if [[ $(type -t compopt) = "builtin" ]]; then
                [[ "${COMPREPLY[0]}" == *= ]] || compopt +o nospace
            fi

            # --flag=partial
            if [[ $cur == *=* ]]; then
                if [[ $(type -t compopt) = "builtin" ]]; then
                    compopt +o nospace
                fi

                local index flag
                flag="${cur%=*}"
                __{prog}_index_of_word "${flag}" "${flags_with_completion[@]}"
                COMPREPLY=()
                if [[ ${index} -ge 0 ]]; then
                    PREFIX=""
                    cur="${cur#*=}"
                    ${flags_completion[${index}]}
                    if [ -n "${ZSH_VERSION:-}" ]; then
                        eval "COMPREPLY=( \"\${COMPREPLY[@]/#/${flag}=}\" )"
                    fi
                fi
            fi
            return 0;
            ;;
    esac

    # value of a flag with its own completion
    local index
    __{prog}_index_of_word "${prev}" "${flags_with_completion[@]}"
    if [[ ${index} -ge 0 ]]; then
        ${flags_completion[${index}]}
        return
    fi

    # value of some other flag: nothing to offer
    if [[ ${cur} != "${words[cword]}" ]]; then
        return
    fi

    local completions
    completions=("${commands[@]}")
    if [[ ${#must_have_one_noun[@]} -ne 0 ]]; then
        completions+=("${must_have_one_noun[@]}")
    fi
    if [[ ${#must_have_one_flag[@]} -ne 0 ]]; then
        completions+=("${must_have_one_flag[@]}")
    fi
    while IFS='' read -r comp; do
        COMPREPLY+=("$comp")
    done < <(compgen -W "${completions[*]}" -- "$cur")

    if [[ ${#COMPREPLY[@]} -eq 0 ]]; then
        __{prog}_custom_func
    fi

    if [[ ${#COMPREPLY[@]} -eq 0 ]]; then
        __{prog}_fallback_filedir
    fi

    # bash-completion >= 2 only
    if declare -F __ltrim_colon_completions >/dev/null; then
        __ltrim_colon_completions "$cur"
    fi

    # a single --flag= candidate must not get a trailing space
    if [[ "${#COMPREPLY[@]}" -eq "1" ]] && [[ $(type -t compopt) = "builtin" ]] && [[ "${COMPREPLY[0]}" == --*= ]]; then
        compopt -o nospace
    fi
}

__{prog}_handle_flag()
{
    __{prog}_debug "${FUNCNAME[0]}: c is $c words[c] is ${words[c]}"

    local flagname=${words[c]}
    if [[ ${words[c]} == *"="* ]]; then
        flagname=${flagname%=*}
        flagname="${flagname}="
    fi
    __{prog}_debug "${FUNCNAME[0]}: looking for ${flagname}"
    if __{prog}_contains_word "${flagname}" "${must_have_one_flag[@]}"; then
        must_have_one_flag=()
    fi

    # a flag local to this command hides its subcommands
    if __{prog}_contains_word "${flagname%=}" "${local_nonpersistent_flags[@]}"; then
        commands=()
    fi

    # skip the value of a two word flag
    if [[ ${words[c]} != *"="* ]] && __{prog}_contains_word "${words[c]}" "${two_word_flags[@]}"; then
        __{prog}_debug "${FUNCNAME[0]}: found a flag ${words[c]}, skip the next argument"
        c=$((c+1))
        if [[ $c -eq $cword ]]; then
            commands=()
        fi
    fi

    c=$((c+1))
}

__{prog}_handle_noun()
{
    __{prog}_debug "${FUNCNAME[0]}: c is $c words[c] is ${words[c]}"

    if __{prog}_contains_word "${words[c]}" "${must_have_one_noun[@]}"; then
        must_have_one_noun=()
    fi

    nouns+=("${words[c]}")
    c=$((c+1))
}

__{prog}_handle_command()
{
    __{prog}_debug "${FUNCNAME[0]}: c is $c words[c] is ${words[c]}"

    local next_command
    if [[ -n ${last_command} ]]; then
        next_command="_${last_command}_${words[c]//:/__}"
    else
        next_command="_{prog}_root_command"
    fi
    c=$((c+1))
    __{prog}_debug "${FUNCNAME[0]}: looking for ${next_command}"
    declare -F "$next_command" >/dev/null && $next_command
}

__{prog}_handle_word()
{
    if [[ $c -ge $cword ]]; then
        __{prog}_handle_reply
        return
    fi
    __{prog}_debug "${FUNCNAME[0]}: c is $c words[c] is ${words[c]}"
    if [[ "${words[c]}" == -* ]]; then
        __{prog}_handle_flag
    elif [[ $c -eq 0 ]]; then
        __{prog}_handle_command
    elif __{prog}_contains_word "${words[c]}" "${commands[@]}"; then
        __{prog}_handle_command
    elif __{prog}_contains_word "${words[c]}" "${command_aliases[@]}"; then
        local index
        __{prog}_index_of_word "${words[c]}" "${command_aliases[@]}"
        words[c]=${alias_targets[${index}]}
        __{prog}_handle_command
    else
        __{prog}_handle_noun
    fi
    __{prog}_handle_word
}

"#;

const START: &str = r#"__start_{prog}()
{
    local cur prev words cword
    if declare -F _init_completion >/dev/null 2>&1; then
        _init_completion -s || return
    else
        __{prog}_init_completion -n "=" || return
    fi

    local c=0
    local flags=()
    local two_word_flags=()
    local local_nonpersistent_flags=()
    local flags_with_completion=()
    local flags_completion=()
    local commands=("{prog}")
    local command_aliases=()
    local alias_targets=()
    local must_have_one_flag=()
    local must_have_one_noun=()
    local nouns=()
    local last_command=""

    __{prog}_handle_word
}

if [[ $(type -t compopt) = "builtin" ]]; then
    complete -o default -F __start_{prog} {prog}
else
    complete -o default -o nospace -F __start_{prog} {prog}
fi

# ex: ts=4 sw=4 et filetype=sh
"#;

/// Renders the bash completion script for a command tree
pub struct BashEmitter<'a> {
    tree: &'a CommandTree,
    table: &'a DispatchTable,
}

impl<'a> BashEmitter<'a> {
    pub fn new(tree: &'a CommandTree, table: &'a DispatchTable) -> Self {
        Self { tree, table }
    }

    fn program(&self) -> &str {
        self.tree.program()
    }

    /// Render the complete script, without any license header.
    ///
    /// The output depends only on the tree and the table; children and
    /// flags are emitted in name order.
    pub fn emit(&self) -> String {
        let program = self.program();
        let mut out = PREAMBLE.replace(PROG, program);
        out.push_str(&self.custom_func());
        out.push('\n');

        let nodes = self.tree.nodes();
        // Children before parents, as cobra-style scripts do
        for node in nodes.iter().rev() {
            out.push_str(&self.command_function(node));
            out.push('\n');
        }

        out.push_str(&START.replace(PROG, program));
        out
    }

    /// Shell function name for a node
    pub fn function_name(&self, node: &CommandNode) -> String {
        if node.path().is_empty() {
            format!("_{}_root_command", self.program())
        } else {
            format!("_{}", self.last_command(node))
        }
    }

    /// Value the script assigns to `last_command` inside a node's function
    pub fn last_command(&self, node: &CommandNode) -> String {
        if node.path().is_empty() {
            self.program().to_string()
        } else {
            format!("{}_{}", self.program(), node.path_key())
        }
    }

    /// The dispatch function: exact arms grouped by kind, then wildcard arms
    /// in precedence order.
    fn custom_func(&self) -> String {
        let program = self.program();
        let mut exact: Vec<(ResourceKind, Vec<String>)> = Vec::new();
        let mut wildcards: Vec<(ResourceKind, String)> = Vec::new();

        for rule in self.table.rules() {
            let pattern = rule.trigger.case_pattern(program);
            match rule.trigger {
                Trigger::Exact(_) => match exact.iter_mut().find(|(kind, _)| *kind == rule.kind) {
                    Some((_, patterns)) => patterns.push(pattern),
                    None => exact.push((rule.kind, vec![pattern])),
                },
                Trigger::Family(_) | Trigger::Suffix(_) => wildcards.push((rule.kind, pattern)),
            }
        }

        let arms = exact
            .into_iter()
            .map(|(kind, patterns)| (kind, patterns.join(" | ")))
            .chain(wildcards);

        let mut out = format!("__{program}_custom_func()\n{{\n    case ${{last_command}} in\n");
        for (kind, pattern) in arms {
            out.push_str(&format!(
                "        {pattern})\n            __{program}_dynamic_complete {kind}\n            return\n            ;;\n"
            ));
        }
        out.push_str("        *)\n            ;;\n    esac\n}\n");
        out
    }

    /// Flags visible on a node: its own plus the persistent flags of its
    /// ancestors, own declarations taking priority.
    fn effective_flags(&self, node: &CommandNode) -> Vec<FlagSpec> {
        let mut flags: BTreeMap<String, FlagSpec> = node
            .flags()
            .map(|flag| (flag.name.clone(), flag.clone()))
            .collect();

        for depth in 0..node.path().len() {
            let Some(ancestor) = self.tree.find(&node.path()[..depth]) else {
                continue;
            };
            for flag in ancestor.flags().filter(|f| f.persistent) {
                flags
                    .entry(flag.name.clone())
                    .or_insert_with(|| flag.clone());
            }
        }

        flags.into_values().collect()
    }

    fn command_function(&self, node: &CommandNode) -> String {
        let program = self.program();
        let mut body = Vec::new();

        body.push(format!("last_command={}", quote(&self.last_command(node))));
        body.push(String::new());

        body.push("command_aliases=()".to_string());
        body.push("alias_targets=()".to_string());
        body.push(String::new());

        body.push("commands=()".to_string());
        for child in node.children() {
            body.push(format!("commands+=({})", quote(child.name())));
            for alias in child.aliases() {
                body.push(format!("command_aliases+=({})", quote(alias)));
                body.push(format!("alias_targets+=({})", quote(child.name())));
            }
        }
        body.push(String::new());

        body.push("flags=()".to_string());
        body.push("two_word_flags=()".to_string());
        body.push("local_nonpersistent_flags=()".to_string());
        body.push("flags_with_completion=()".to_string());
        body.push("flags_completion=()".to_string());
        body.push(String::new());

        let flags = self.effective_flags(node);
        for flag in &flags {
            let long = format!("--{}", flag.name);
            let completion = self
                .table
                .flag_kind(&flag.name)
                .filter(|_| flag.takes_argument)
                .map(|kind| format!("__{program}_dynamic_complete {kind}"));

            if flag.takes_argument {
                body.push(format!("flags+=({})", quote(&format!("{long}="))));
                body.push(format!("two_word_flags+=({})", quote(&long)));
            } else {
                body.push(format!("flags+=({})", quote(&long)));
            }
            if let Some(completion) = &completion {
                body.push(format!("flags_with_completion+=({})", quote(&long)));
                body.push(format!("flags_completion+=({})", quote(completion)));
            }

            if let Some(short) = flag.short {
                let short = format!("-{short}");
                body.push(format!("flags+=({})", quote(&short)));
                if flag.takes_argument {
                    body.push(format!("two_word_flags+=({})", quote(&short)));
                }
                if let Some(completion) = &completion {
                    body.push(format!("flags_with_completion+=({})", quote(&short)));
                    body.push(format!("flags_completion+=({})", quote(completion)));
                }
            }

            if !flag.persistent {
                body.push(format!("local_nonpersistent_flags+=({})", quote(&long)));
            }
        }
        body.push(String::new());

        body.push("must_have_one_flag=()".to_string());
        for flag in flags.iter().filter(|f| f.required) {
            let rendered = if flag.takes_argument {
                format!("--{}=", flag.name)
            } else {
                format!("--{}", flag.name)
            };
            body.push(format!("must_have_one_flag+=({})", quote(&rendered)));
        }
        body.push("must_have_one_noun=()".to_string());
        for noun in node.nouns() {
            body.push(format!("must_have_one_noun+=({})", quote(noun)));
        }

        let mut out = format!("{}()\n{{\n", self.function_name(node));
        for line in body {
            if line.is_empty() {
                out.push('\n');
            } else {
                out.push_str("    ");
                out.push_str(&line);
                out.push('\n');
            }
        }
        out.push_str("}\n");
        out
    }
}

/// Double-quote a word for the generated script
fn quote(word: &str) -> String {
    let mut out = String::with_capacity(word.len() + 2);
    out.push('"');
    for c in word.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::dispatch::{DispatchRule, FlagValueRule};

    fn tree() -> CommandTree {
        CommandTree::new(
            CommandNode::new("cmdctl")
                .with_flag(FlagSpec::value("namespace").with_short('n').persistent())
                .with_flag(FlagSpec::switch("all-namespaces").persistent())
                .with_child(
                    CommandNode::new("config")
                        .with_child(CommandNode::new("use-context"))
                        .with_child(
                            CommandNode::new("view").with_flag(FlagSpec::value("template")),
                        ),
                )
                .with_child(
                    CommandNode::new("get")
                        .with_noun("pods")
                        .with_noun("nodes")
                        .with_flag(FlagSpec::value("output").with_short('o')),
                )
                .with_child(
                    CommandNode::new("rollout")
                        .with_child(CommandNode::new("status"))
                        .with_child(CommandNode::new("undo")),
                )
                .with_child(CommandNode::new("logs"))
                .with_child(CommandNode::new("completion").with_alias("com"))
                .with_child(
                    CommandNode::new("drain").with_flag(FlagSpec::switch("force").required()),
                )
                .with_child(CommandNode::new("version")),
        )
    }

    fn table(tree: &CommandTree) -> DispatchTable {
        DispatchTable::build(
            tree,
            vec![
                DispatchRule::new("rollout_*", ResourceKind::Noun).unwrap(),
                DispatchRule::new("get", ResourceKind::Noun).unwrap(),
                DispatchRule::new("config_use-context", ResourceKind::Contexts).unwrap(),
                DispatchRule::new("logs", ResourceKind::PodContainers).unwrap(),
                DispatchRule::new("rollout_undo", ResourceKind::Pods).unwrap(),
            ],
            vec![FlagValueRule::new("namespace", ResourceKind::Namespaces)],
        )
        .unwrap()
    }

    fn emit() -> String {
        let tree = tree();
        let table = table(&tree);
        BashEmitter::new(&tree, &table).emit()
    }

    #[test]
    fn test_every_path_has_function_and_last_command() {
        let tree = tree();
        let table = table(&tree);
        let emitter = BashEmitter::new(&tree, &table);
        let script = emitter.emit();

        for node in tree.nodes() {
            let function = format!("\n{}()\n{{\n", emitter.function_name(node));
            assert!(script.contains(&function), "missing {function}");
            let assignment = format!("last_command=\"{}\"", emitter.last_command(node));
            assert!(script.contains(&assignment), "missing {assignment}");
        }
        assert!(script.contains("_cmdctl_root_command()"));
        assert!(script.contains("_cmdctl_config_use-context()"));
    }

    #[test]
    fn test_registration() {
        let script = emit();
        assert!(script.starts_with("# bash completion for cmdctl"));
        assert!(script.contains("complete -o default -F __start_cmdctl cmdctl"));
        assert!(script.contains("complete -o default -o nospace -F __start_cmdctl cmdctl"));
        assert!(!script.contains("{prog}"));
    }

    #[test]
    fn test_value_flags_and_flag_completion() {
        let script = emit();
        assert!(script.contains("flags+=(\"--namespace=\")"));
        assert!(script.contains("two_word_flags+=(\"--namespace\")"));
        assert!(script.contains("two_word_flags+=(\"-n\")"));
        assert!(script.contains("flags_with_completion+=(\"--namespace\")"));
        assert!(script.contains("flags_completion+=(\"__cmdctl_dynamic_complete namespaces\")"));
        assert!(script.contains("flags+=(\"--all-namespaces\")"));
        assert!(!script.contains("flags+=(\"--all-namespaces=\")"));
        assert!(script.contains("local_nonpersistent_flags+=(\"--output\")"));
        assert!(!script.contains("local_nonpersistent_flags+=(\"--namespace\")"));
    }

    #[test]
    fn test_persistent_flags_reach_descendants() {
        let tree = tree();
        let table = table(&tree);
        let emitter = BashEmitter::new(&tree, &table);
        let node = tree.find(&["config", "use-context"]).unwrap();
        let function = emitter.command_function(node);
        assert!(function.contains("flags+=(\"--namespace=\")"));
        assert!(!function.contains("--output"));
    }

    #[test]
    fn test_nouns_aliases_and_required_flags() {
        let script = emit();
        assert!(script.contains("must_have_one_noun+=(\"pods\")"));
        assert!(script.contains("must_have_one_noun+=(\"nodes\")"));
        assert!(script.contains("command_aliases+=(\"com\")"));
        assert!(script.contains("alias_targets+=(\"completion\")"));
        assert!(script.contains("must_have_one_flag+=(\"--force\")"));
    }

    #[test]
    fn test_case_arms_follow_precedence() {
        let script = emit();
        let exact_noun = script
            .find("        cmdctl_get)\n            __cmdctl_dynamic_complete noun")
            .unwrap();
        let undo = script
            .find("        cmdctl_rollout_undo)\n            __cmdctl_dynamic_complete pods")
            .unwrap();
        let family = script
            .find("        cmdctl_rollout_*)\n            __cmdctl_dynamic_complete noun")
            .unwrap();
        assert!(exact_noun < family);
        assert!(undo < family);
        assert!(
            script.contains("cmdctl_config_use-context)\n            __cmdctl_dynamic_complete contexts")
        );
        assert!(script.contains("cmdctl_logs)\n            __cmdctl_dynamic_complete containers"));
    }

    #[test]
    fn test_leaf_without_rule_has_no_arm() {
        let script = emit();
        assert!(!script.contains("cmdctl_version)"));
        assert!(script.contains("_cmdctl_version()"));
    }

    #[test]
    fn test_output_is_deterministic() {
        assert_eq!(emit(), emit());
    }

    #[test]
    fn test_dynamic_complete_calls_back() {
        let script = emit();
        assert!(script.contains("cmdctl __complete \"${kind}\" --cur=\"${cur}\""));
        assert!(script.contains("compgen -f -- \"$cur\""));
        assert!(script.contains("declare -F _filedir"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("a\"$b"), "\"a\\\"\\$b\"");
    }
}
