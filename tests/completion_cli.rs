use std::path::Path;
use std::process::{Command, Output};

const CONFIG: &str = r#"
current_context = "dev"

[[contexts]]
name = "dev"
cluster = "local"

[[contexts]]
name = "prod"
cluster = "east"

[[clusters]]
name = "local"

[[clusters]]
name = "east"
"#;

/// Run the binary with HOME pointed at `home` and colors off
fn run_cmdctl(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_cmdctl"))
        .args(args)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("CMDCTL_LOG_LEVEL")
        .env_remove("CMDCTL_COMPLETION_TIMEOUT_MS")
        .output()
        .expect("failed to execute cmdctl")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[test]
fn unsupported_shell_is_a_usage_error_with_empty_stdout() {
    let home = tempfile::tempdir().unwrap();
    let output = run_cmdctl(home.path(), &["completion", "bogus"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty(), "stdout: {}", stdout(&output));
    assert!(stderr(&output).contains("Unsupported shell type \"bogus\"."));
    assert!(stderr(&output).contains("See 'cmdctl completion -h' for help and examples."));
}

#[test]
fn missing_and_extra_shell_arguments_fail() {
    let home = tempfile::tempdir().unwrap();

    let output = run_cmdctl(home.path(), &["completion"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("Shell not specified."));

    let output = run_cmdctl(home.path(), &["completion", "bash", "zsh"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(stderr(&output).contains("Too many arguments. Expected only the shell type."));
}

#[test]
fn bash_script_is_printed() {
    let home = tempfile::tempdir().unwrap();
    let output = run_cmdctl(home.path(), &["completion", "BASH"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let script = stdout(&output);
    assert!(script.starts_with("# Copyright The cmdctl Authors."));
    assert!(script.contains("_cmdctl_root_command()"));
    assert!(script.contains("last_command=\"cmdctl_logs\""));
    assert!(script.contains("complete -o default -F __start_cmdctl cmdctl"));
}

#[test]
fn zsh_script_through_alias() {
    let home = tempfile::tempdir().unwrap();
    let output = run_cmdctl(home.path(), &["com", "zsh"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let script = stdout(&output);
    assert!(script.starts_with("#compdef cmdctl\n"));
    assert!(script.contains("__cmdctl_bash_source <(__cmdctl_bash_body)"));
}

#[test]
fn config_view_renders_templates() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, CONFIG).unwrap();
    let config = config.to_str().unwrap();

    let output = run_cmdctl(
        home.path(),
        &[
            "config",
            "view",
            "--config",
            config,
            "-o",
            "template",
            "--template={{ range .contexts }}{{ .name }} {{ end }}",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "dev prod ");
}

#[test]
fn complete_lists_contexts_through_self_invocation() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, CONFIG).unwrap();
    let config_flag = format!("--config={}", config.display());

    let output = run_cmdctl(
        home.path(),
        &[
            "__complete",
            "contexts",
            "--cur=",
            "--",
            &config_flag,
            "config",
            "use-context",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "dev prod");

    let output = run_cmdctl(
        home.path(),
        &[
            "__complete",
            "clusters",
            "--cur=ea",
            "--",
            &config_flag,
            "--cluster",
        ],
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "east");

    // short form of --config
    let output = run_cmdctl(
        home.path(),
        &[
            "__complete",
            "contexts",
            "--cur=pr",
            "--",
            "-c",
            config.to_str().unwrap(),
            "config",
            "use-context",
        ],
    );
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "prod");
}

#[test]
fn toolkit_commands_are_completed_but_not_run() {
    let home = tempfile::tempdir().unwrap();
    let script = stdout(&run_cmdctl(home.path(), &["completion", "bash"]));
    assert!(script.contains("_cmdctl_template_export()"));
    assert!(script.contains("commands+=(\"validate\")"));

    let output = run_cmdctl(home.path(), &["li"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("list requires a toolkit server connection"));
}

#[test]
fn complete_swallows_resolver_failures() {
    let home = tempfile::tempdir().unwrap();
    // `get` needs a cluster API and exits non-zero
    let output = run_cmdctl(home.path(), &["__complete", "pods", "--", "logs"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let output = run_cmdctl(home.path(), &["__complete", "widgets", "--"]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn use_context_persists() {
    let home = tempfile::tempdir().unwrap();
    let config = home.path().join("config.toml");
    std::fs::write(&config, CONFIG).unwrap();
    let config = config.to_str().unwrap();

    let output = run_cmdctl(home.path(), &["--config", config, "config", "use-context", "prod"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let output = run_cmdctl(home.path(), &["--config", config, "config", "current-context"]);
    assert_eq!(stdout(&output).trim(), "prod");

    let output = run_cmdctl(home.path(), &["--config", config, "config", "use-context", "nope"]);
    assert!(!output.status.success());
}
