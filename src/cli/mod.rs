//! Command-line interface for cmdctl
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Dispatch of subcommands

pub mod completion;

use clap::builder::PossibleValuesParser;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use crate::config::{Config, LogLevel};
use crate::config::template;
use crate::error::{CmdctlError, ConfigError, Result};

use completion::DialectNameParser;

/// Resource types accepted by the resource commands
pub const RESOURCE_TYPES: &[&str] = &[
    "pods",
    "rc",
    "services",
    "deployments",
    "replicasets",
    "daemonsets",
    "statefulsets",
    "jobs",
    "nodes",
    "namespaces",
    "configmaps",
    "secrets",
    "events",
];

/// cmdctl - microservices toolkit control
#[derive(Parser, Debug)]
#[command(
    name = "cmdctl",
    version,
    about = "Microservices toolkit command-line client",
    long_about = "cmdctl controls services and the cluster resources they run on.

Shell completion for bash and zsh is available through `cmdctl completion`.",
    disable_help_subcommand = true
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Namespace scope for this request
    #[arg(short = 'n', long, value_name = "NAMESPACE", global = true)]
    pub namespace: Option<String>,

    /// Context to use from the configuration file
    #[arg(long, value_name = "NAME", global = true)]
    pub context: Option<String>,

    /// Cluster to use from the configuration file
    #[arg(long, value_name = "NAME", global = true)]
    pub cluster: Option<String>,

    /// User to use from the configuration file
    #[arg(long, value_name = "NAME", global = true)]
    pub user: Option<String>,

    /// Address of the API server
    #[arg(short = 's', long, value_name = "URL", global = true)]
    pub server: Option<String>,

    /// Apply to all namespaces
    #[arg(long, global = true)]
    pub all_namespaces: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Arguments shared by the commands acting on named resources
#[derive(Args, Debug, Clone, Default)]
pub struct ResourceArgs {
    /// Resource type
    #[arg(value_name = "RESOURCE", value_parser = PossibleValuesParser::new(RESOURCE_TYPES))]
    pub resource: Option<String>,

    /// Resource names
    #[arg(value_name = "NAME")]
    pub names: Vec<String>,

    /// Output format
    #[arg(short = 'o', long, value_name = "FORMAT")]
    pub output: Option<String>,

    /// Template for `-o template`
    #[arg(long, value_name = "TEMPLATE")]
    pub template: Option<String>,

    /// Label selector
    #[arg(short = 'l', long, value_name = "SELECTOR")]
    pub selector: Option<String>,
}

/// Arguments of commands addressing a pod and optionally a container
#[derive(Args, Debug, Clone, Default)]
pub struct PodArgs {
    /// Pod name
    #[arg(value_name = "POD")]
    pub pod: Option<String>,

    /// Container name
    #[arg(value_name = "CONTAINER")]
    pub container_name: Option<String>,

    /// Container name, as a flag
    #[arg(long, value_name = "CONTAINER")]
    pub container: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct NodeArgs {
    /// Node name
    #[arg(value_name = "NODE")]
    pub node: Option<String>,
}

/// Subcommands for cmdctl
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a shell completion script (bash or zsh)
    #[command(visible_alias = "com")]
    Completion {
        /// Shell type (bash, zsh)
        #[arg(value_name = "SHELL", value_parser = DialectNameParser)]
        shells: Vec<String>,
    },

    /// Show version information
    Version,

    /// Display one or many resources
    Get(ResourceArgs),

    /// Show details of a resource
    Describe(ResourceArgs),

    /// Delete resources
    Delete(ResourceArgs),

    /// Update the labels on a resource
    Label(ResourceArgs),

    /// Update the annotations on a resource
    Annotate(ResourceArgs),

    /// Edit a resource
    Edit(ResourceArgs),

    /// Patch a resource
    Patch(ResourceArgs),

    /// Expose a resource as a service
    Expose(ResourceArgs),

    /// Set a new size for a resource
    Scale(ResourceArgs),

    /// Auto-scale a resource
    Autoscale(ResourceArgs),

    /// Update the taints on nodes
    Taint(ResourceArgs),

    /// Gracefully shut down a resource
    Stop(ResourceArgs),

    /// Print the logs of a container in a pod
    Logs {
        #[command(flatten)]
        target: PodArgs,

        /// Stream the logs
        #[arg(short = 'f', long)]
        follow: bool,
    },

    /// Attach to a running container
    Attach(PodArgs),

    /// Execute a command in a container
    Exec {
        /// Pod name
        #[arg(value_name = "POD")]
        pod: Option<String>,

        /// Container name
        #[arg(long, value_name = "CONTAINER")]
        container: Option<String>,

        /// Command to run
        #[arg(last = true, value_name = "COMMAND")]
        command: Vec<String>,
    },

    /// Forward local ports to a pod
    PortForward {
        /// Pod name
        #[arg(value_name = "POD")]
        pod: Option<String>,

        /// Port mappings, LOCAL:REMOTE
        #[arg(value_name = "PORT")]
        ports: Vec<String>,
    },

    /// Perform a rolling update of a replication controller
    RollingUpdate {
        /// Replication controller name
        #[arg(value_name = "RC")]
        name: Option<String>,
    },

    /// Display resource usage
    Top {
        #[command(subcommand)]
        command: TopCommands,
    },

    /// Manage rollouts
    Rollout {
        #[command(subcommand)]
        command: RolloutCommands,
    },

    /// Mark a node unschedulable
    Cordon(NodeArgs),

    /// Mark a node schedulable
    Uncordon(NodeArgs),

    /// Drain a node in preparation for maintenance
    Drain {
        #[command(flatten)]
        target: NodeArgs,

        /// Continue even if there are unmanaged pods
        #[arg(long)]
        force: bool,
    },

    /// Inspect and modify the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Add a user
    Add {
        #[arg(value_name = "USERNAME")]
        username: Option<String>,

        #[arg(value_name = "PASSWORD")]
        password: Option<String>,

        /// Specify the user email
        #[arg(short = 'e', long, value_name = "EMAIL")]
        email: Option<String>,
    },

    /// List existing users
    #[command(visible_alias = "li")]
    List,

    /// Initialize the database
    Init {
        /// Drop tables if they exist
        #[arg(short = 'f', long)]
        force: bool,
    },

    /// Hello world command
    Test {
        /// Create the template
        #[arg(long)]
        create: bool,

        /// Application id
        #[arg(short = 'a', long = "appId", value_name = "ID")]
        app_id: Option<String>,

        /// File format, json or yaml
        #[arg(long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },

    /// Print the host information
    Info {
        /// Specify the server password
        #[arg(short = 'p', long, value_name = "PASSWORD")]
        passwd: Option<String>,

        /// Print details
        #[arg(short = 'd', long)]
        detail: bool,
    },

    /// Generate the source file of a new command
    New {
        #[arg(value_name = "CMDNAME")]
        name: Option<String>,

        #[arg(value_name = "CMDFUNCNAME")]
        func_name: Option<String>,

        #[arg(value_name = "CMDDESCRIPTION")]
        description: Option<String>,

        /// The command has subcommands
        #[arg(short = 'g', long)]
        group: bool,

        /// Build with options
        #[arg(short = 'o', long)]
        option: bool,
    },

    /// Get http server basic information
    Finfo,

    /// Import and export templates
    #[command(visible_alias = "tp")]
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// List the options accepted by every command
    Options,

    /// Validate the environment cmdctl runs in
    #[command(visible_alias = "va")]
    Validate,

    /// List completion candidates (used by generated completion scripts)
    #[command(name = "__complete", hide = true)]
    Complete {
        /// Resource kind to list
        kind: String,

        /// Word being completed
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        cur: String,

        /// Positional words typed after the command
        #[arg(long = "noun", allow_hyphen_values = true)]
        nouns: Vec<String>,

        /// Words typed before the cursor
        #[arg(last = true)]
        words: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum TopCommands {
    /// Resource usage of pods
    Pod {
        #[arg(value_name = "POD")]
        name: Option<String>,
    },
    /// Resource usage of nodes
    Node {
        #[arg(value_name = "NODE")]
        name: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RolloutCommands {
    /// Show the status of a rollout
    Status(ResourceArgs),
    /// Show rollout history
    History(ResourceArgs),
    /// Roll back to a previous rollout
    Undo(ResourceArgs),
    /// Pause a rollout
    Pause(ResourceArgs),
    /// Resume a paused rollout
    Resume(ResourceArgs),
}

#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// Import a template from a tar file
    #[command(visible_alias = "imp")]
    Import {
        #[arg(value_name = "FILE")]
        file: Option<PathBuf>,

        /// Template description
        #[arg(long, value_name = "TEXT")]
        description: Option<String>,

        /// Application id to use
        #[arg(long = "appId", value_name = "ID")]
        app_id: Option<u32>,
    },
    /// Export a template
    Export {
        /// Export from an application
        #[arg(short = 'a', long)]
        application: bool,

        /// File format, json or yaml
        #[arg(short = 'f', long, value_name = "FORMAT", default_value = "yaml")]
        format: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the configuration
    View {
        /// Output format (toml, json, template)
        #[arg(short = 'o', long, value_name = "FORMAT")]
        output: Option<String>,

        /// Template for `-o template`
        #[arg(long, value_name = "TEMPLATE")]
        template: Option<String>,
    },

    /// Set the current context
    UseContext {
        /// Context name
        #[arg(value_name = "CONTEXT")]
        name: String,
    },

    /// Print the current context
    CurrentContext,

    /// List the configured contexts
    GetContexts,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = match Self::load_config(&args) {
            Ok(config) => config,
            // completion must keep working with a broken config file
            Err(e) if matches!(args.command, Some(Commands::Complete { .. })) => {
                debug!(error = %e, "falling back to default configuration");
                Config::default()
            }
            Err(e) => return Err(e),
        };

        Ok(Self { args, config })
    }

    /// Load configuration from file, environment and arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;
        config.apply_env()?;

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {e}");
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_logging_args(&mut config, args);
        Ok(config)
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose || args.debug {
            LogLevel::Debug
        } else {
            config.logging.level
        };
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Configuration file path (from args or default)
    pub fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_path)
    }

    /// Handle subcommands
    ///
    /// # Returns
    /// * `Result<bool>` - True if a subcommand was handled, false if none was given
    pub async fn handle_subcommand(&self) -> Result<bool> {
        let Some(command) = &self.args.command else {
            return Ok(false);
        };

        match command {
            Commands::Completion { shells } => {
                let script = completion::generate_completion(shells, &self.config)?;
                print!("{script}");
            }
            Commands::Version => self.show_version(),
            Commands::Config { command } => self.handle_config_command(command)?,
            Commands::Options => Self::show_options(),
            Commands::Complete {
                kind,
                cur,
                nouns,
                words,
            } => {
                if let Some(line) =
                    completion::complete_resources(kind, cur, nouns, words, &self.config).await
                {
                    println!("{line}");
                }
            }
            other => return Err(Self::not_available(other)),
        }

        Ok(true)
    }

    /// Error for commands that need the cluster API
    fn not_available(command: &Commands) -> CmdctlError {
        let name = match command {
            Commands::Get(_) => "get",
            Commands::Describe(_) => "describe",
            Commands::Delete(_) => "delete",
            Commands::Label(_) => "label",
            Commands::Annotate(_) => "annotate",
            Commands::Edit(_) => "edit",
            Commands::Patch(_) => "patch",
            Commands::Expose(_) => "expose",
            Commands::Scale(_) => "scale",
            Commands::Autoscale(_) => "autoscale",
            Commands::Taint(_) => "taint",
            Commands::Stop(_) => "stop",
            Commands::Logs { .. } => "logs",
            Commands::Attach(_) => "attach",
            Commands::Exec { .. } => "exec",
            Commands::PortForward { .. } => "port-forward",
            Commands::RollingUpdate { .. } => "rolling-update",
            Commands::Top { .. } => "top",
            Commands::Rollout { .. } => "rollout",
            Commands::Cordon(_) => "cordon",
            Commands::Uncordon(_) => "uncordon",
            Commands::Drain { .. } => "drain",
            Commands::Add { .. } => return Self::needs_server("add"),
            Commands::List => return Self::needs_server("list"),
            Commands::Init { .. } => return Self::needs_server("init"),
            Commands::Test { .. } => return Self::needs_server("test"),
            Commands::Info { .. } => return Self::needs_server("info"),
            Commands::New { .. } => return Self::needs_server("new"),
            Commands::Finfo => return Self::needs_server("finfo"),
            Commands::Template { .. } => return Self::needs_server("template"),
            Commands::Validate => return Self::needs_server("validate"),
            Commands::Completion { .. }
            | Commands::Version
            | Commands::Config { .. }
            | Commands::Options
            | Commands::Complete { .. } => "this command",
        };
        CmdctlError::NotImplemented(format!("{name} requires a cluster API connection"))
    }

    /// Error for the toolkit commands backed by the service database
    fn needs_server(name: &str) -> CmdctlError {
        CmdctlError::NotImplemented(format!("{name} requires a toolkit server connection"))
    }

    /// Print the global options, which every command accepts
    fn show_options() {
        println!("The following options can be passed to any command:\n");
        let command = CliArgs::command();
        for arg in command.get_arguments().filter(|arg| arg.is_global_set()) {
            let Some(long) = arg.get_long() else {
                continue;
            };
            let short = arg.get_short().map(|c| format!("-{c}, ")).unwrap_or_default();
            let help = arg.get_help().map(ToString::to_string).unwrap_or_default();
            println!("  {short}--{long}: {help}");
        }
    }

    /// Show version information
    fn show_version(&self) {
        println!("cmdctl version {}", env!("CARGO_PKG_VERSION"));
        println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    }

    /// Handle config subcommand
    fn handle_config_command(&self, command: &ConfigCommands) -> Result<()> {
        match command {
            ConfigCommands::View { output, template } => {
                print!("{}", self.view_config(output.as_deref(), template.as_deref())?);
            }
            ConfigCommands::UseContext { name } => {
                let mut config = Config::load_from_file(self.args.config_file.as_deref())?;
                config.use_context(name)?;
                config.save(self.config_path())?;
                println!("Switched to context \"{name}\".");
            }
            ConfigCommands::CurrentContext => match &self.config.current_context {
                Some(name) => println!("{name}"),
                None => {
                    let message = "current-context is not set".to_string();
                    return Err(ConfigError::Generic(message).into());
                }
            },
            ConfigCommands::GetContexts => {
                for name in self.config.context_names() {
                    let marker = if self.config.current_context.as_deref() == Some(name) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{marker} {name}");
                }
            }
        }
        Ok(())
    }

    /// Render `config view` output
    ///
    /// # Arguments
    /// * `output` - Output format: `toml` (default), `json` or `template`
    /// * `template_text` - Template, required for `template`
    ///
    /// # Returns
    /// * `Result<String>` - Text to print
    pub fn view_config(&self, output: Option<&str>, template_text: Option<&str>) -> Result<String> {
        match output.unwrap_or("toml") {
            "toml" => self.config.to_toml(),
            "json" => {
                let mut text = serde_json::to_string_pretty(&self.config.to_template_value()?)?;
                text.push('\n');
                Ok(text)
            }
            "template" | "go-template" => {
                let text = template_text.ok_or_else(|| {
                    CmdctlError::Generic("template format requires --template".to_string())
                })?;
                Ok(template::render(text, &self.config.to_template_value()?)?)
            }
            other => Err(ConfigError::InvalidValue {
                field: "output".to_string(),
                value: other.to_string(),
            }
            .into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CommandTree, DispatchTable, ResourceKind};

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(args).unwrap()
    }

    fn interface_with(config: Config, args: &[&str]) -> CliInterface {
        CliInterface {
            args: parse(args),
            config,
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_completion_alias() {
        let args = parse(&["cmdctl", "com", "bash"]);
        assert!(matches!(
            args.command,
            Some(Commands::Completion { ref shells }) if shells == &["bash".to_string()]
        ));
    }

    #[test]
    fn test_completion_accepts_any_arity() {
        let args = parse(&["cmdctl", "completion"]);
        assert!(matches!(
            args.command,
            Some(Commands::Completion { ref shells }) if shells.is_empty()
        ));
        let args = parse(&["cmdctl", "completion", "bogus", "more"]);
        assert!(matches!(
            args.command,
            Some(Commands::Completion { ref shells }) if shells.len() == 2
        ));
    }

    #[test]
    fn test_global_overrides_in_both_forms() {
        let args = parse(&["cmdctl", "get", "pods", "--namespace", "prod", "--cluster=east"]);
        assert_eq!(args.namespace.as_deref(), Some("prod"));
        assert_eq!(args.cluster.as_deref(), Some("east"));

        let args = parse(&["cmdctl", "-n", "dev", "logs", "web-0", "--all-namespaces"]);
        assert_eq!(args.namespace.as_deref(), Some("dev"));
        assert!(args.all_namespaces);
    }

    #[test]
    fn test_get_rejects_unknown_resource() {
        assert!(CliArgs::try_parse_from(["cmdctl", "get", "widgets"]).is_err());
    }

    #[test]
    fn test_hidden_complete_command() {
        let args = parse(&[
            "cmdctl",
            "__complete",
            "containers",
            "--cur=ap",
            "--noun=web-0",
            "--",
            "logs",
            "--namespace",
            "prod",
            "web-0",
        ]);
        match args.command {
            Some(Commands::Complete {
                kind,
                cur,
                nouns,
                words,
            }) => {
                assert_eq!(kind, "containers");
                assert_eq!(cur, "ap");
                assert_eq!(nouns, vec!["web-0"]);
                assert_eq!(words, vec!["logs", "--namespace", "prod", "web-0"]);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(args.namespace.is_none());
    }

    #[test]
    fn test_default_dispatch_table_fits_cli() {
        let tree = CommandTree::from_command(&CliArgs::command());
        let table = DispatchTable::with_defaults(&tree).unwrap();
        assert_eq!(table.lookup(&["config", "use-context"]), Some(ResourceKind::Contexts));
        assert_eq!(table.lookup(&["logs"]), Some(ResourceKind::PodContainers));
        assert_eq!(table.lookup(&["rollout", "undo"]), Some(ResourceKind::Noun));
        assert_eq!(table.lookup(&["top", "node"]), Some(ResourceKind::Nodes));
        assert_eq!(table.lookup(&["version"]), None);
        assert!(tree.find(&["get"]).unwrap().nouns().iter().any(|n| n == "pods"));
    }

    #[test]
    fn test_logging_flags() {
        let cli = CliInterface::from_args(parse(&[
            "cmdctl",
            "--config",
            "/nonexistent/c.toml",
            "__complete",
            "pods",
            "--",
        ]))
        .unwrap();
        assert_eq!(cli.config().logging.level, LogLevel::Warn);

        let mut config = Config::default();
        CliInterface::apply_logging_args(&mut config, &parse(&["cmdctl", "--debug"]));
        assert_eq!(config.logging.level, LogLevel::Debug);
        CliInterface::apply_logging_args(&mut config, &parse(&["cmdctl", "--vv"]));
        assert_eq!(config.logging.level, LogLevel::Trace);
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let args = parse(&["cmdctl", "--config", "/nonexistent/c.toml", "version"]);
        assert!(CliInterface::from_args(args).is_err());
    }

    #[test]
    fn test_view_config_template() {
        let config = Config::from_toml(
            "[[contexts]]\nname = \"dev\"\n\n[[contexts]]\nname = \"prod\"\n\n[[clusters]]\nname = \"east\"\n",
        )
        .unwrap();
        let cli = interface_with(config, &["cmdctl"]);
        let out = cli
            .view_config(Some("template"), Some("{{ range .contexts }}{{ .name }} {{ end }}"))
            .unwrap();
        assert_eq!(out, "dev prod ");
        let out = cli
            .view_config(Some("template"), Some("{{ range .clusters }}{{ .name }} {{ end }}"))
            .unwrap();
        assert_eq!(out, "east ");
        assert!(cli.view_config(Some("template"), None).is_err());
        assert!(cli.view_config(Some("yaml"), None).is_err());
        assert!(cli.view_config(None, None).unwrap().contains("[completion]"));
    }

    #[tokio::test]
    async fn test_cluster_commands_are_not_available() {
        let cli = interface_with(Config::default(), &["cmdctl", "get", "pods"]);
        assert!(matches!(
            cli.handle_subcommand().await,
            Err(CmdctlError::NotImplemented(_))
        ));
    }

    #[test]
    fn test_toolkit_commands_and_aliases() {
        let args = parse(&["cmdctl", "add", "bob", "secret", "-e", "bob@example.com"]);
        assert!(matches!(
            args.command,
            Some(Commands::Add { ref email, .. }) if email.as_deref() == Some("bob@example.com")
        ));
        assert!(matches!(parse(&["cmdctl", "li"]).command, Some(Commands::List)));
        assert!(matches!(parse(&["cmdctl", "va"]).command, Some(Commands::Validate)));
        assert!(matches!(
            parse(&["cmdctl", "tp", "export", "-a", "-f", "json"]).command,
            Some(Commands::Template {
                command: TemplateCommands::Export { application: true, ref format },
            }) if format == "json"
        ));
        assert!(matches!(
            parse(&["cmdctl", "new", "-g", "-o", "hello", "Hello", "says hello"]).command,
            Some(Commands::New { group: true, option: true, .. })
        ));
    }

    #[tokio::test]
    async fn test_toolkit_commands_are_not_available() {
        for args in [
            &["cmdctl", "init", "-f"][..],
            &["cmdctl", "info", "-d"],
            &["cmdctl", "template", "import"],
        ] {
            let cli = interface_with(Config::default(), args);
            match cli.handle_subcommand().await {
                Err(CmdctlError::NotImplemented(msg)) => {
                    assert!(msg.contains("toolkit server"), "{msg}")
                }
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_options_is_handled() {
        let cli = interface_with(Config::default(), &["cmdctl", "options"]);
        assert!(cli.handle_subcommand().await.unwrap());
    }

    #[tokio::test]
    async fn test_no_subcommand() {
        let cli = interface_with(Config::default(), &["cmdctl"]);
        assert!(!cli.handle_subcommand().await.unwrap());
    }
}
