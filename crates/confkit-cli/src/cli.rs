//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// Environment variables read by the CLI itself rather than as configuration
pub const CLI_ENV_VARS: &[&str] = &["CONFKIT_DIR", "CONFKIT_ENV_PREFIX", "CONFKIT_PLUGINS"];

/// confkit - Layered configuration with schemas and plugins
#[derive(Parser, Debug)]
#[command(name = "confkit")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true, env = "CONFKIT_DIR")]
    pub dir: Option<PathBuf>,

    /// Override a value as PATH=VALUE; VALUE is parsed as JSON when possible
    #[arg(short = 's', long = "set", value_name = "PATH=VALUE", global = true)]
    pub overrides: Vec<String>,

    /// Load an extra plugin (catalog name or manifest path)
    #[arg(
        short = 'p',
        long = "plugin",
        value_name = "SPEC",
        global = true,
        env = "CONFKIT_PLUGINS",
        value_delimiter = ','
    )]
    pub plugins: Vec<String>,

    /// Prefix of environment variable overrides
    #[arg(long, global = true, env = "CONFKIT_ENV_PREFIX")]
    pub env_prefix: Option<String>,

    /// Do not coerce string inputs during validation
    #[arg(long, global = true)]
    pub no_coerce: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show the resolved configuration
    Resolve {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,

        /// Show which source supplied each value
        #[arg(long)]
        provenance: bool,
    },

    /// Print one resolved value
    ///
    /// Examples:
    ///   confkit get vite.server.port
    ///   confkit get 'build.targets[0]'
    Get {
        /// Dotted path such as `server.port`
        path: String,

        /// Print strings as JSON too
        #[arg(long)]
        json: bool,
    },

    /// Write a value into the project configuration file
    ///
    /// TOML files keep their formatting and comments.
    Set {
        /// Dotted path such as `server.port`
        path: String,

        /// Value, parsed as JSON when possible
        value: String,
    },

    /// Validate configuration against a schema
    ///
    /// Without a data file the resolved configuration is validated. Without
    /// --schema the combined plugin schema is used.
    Validate {
        /// Schema document (JSON, YAML or TOML)
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Data file to validate instead of the resolved configuration
        file: Option<PathBuf>,
    },

    /// Write generated files
    ///
    /// By default every plugin writes its own files. With --format or
    /// --output the resolved configuration itself is rendered instead.
    ///
    /// Examples:
    ///   confkit generate
    ///   confkit generate --format ts --output config.ts
    ///   confkit generate --check
    Generate {
        /// Output format: json, yaml, ts or js
        #[arg(short, long)]
        format: Option<String>,

        /// File to write, relative to the project root
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail if files on disk differ instead of writing them
        #[arg(long)]
        check: bool,
    },

    /// List installed and available plugins
    Plugins,

    /// Print the combined schema of all installed plugins
    Schema,

    /// Generate shell completions
    ///
    /// Examples:
    ///   confkit completions bash > ~/.local/share/bash-completion/completions/confkit
    ///   confkit completions zsh > ~/.zfunc/_confkit
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_no_command() {
        let cli = Cli::parse_from(["confkit"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_resolve_flags() {
        let cli = Cli::parse_from(["confkit", "resolve", "--json", "--provenance"]);
        assert_eq!(
            cli.command,
            Some(Commands::Resolve {
                json: true,
                provenance: true
            })
        );
    }

    #[test]
    fn parse_global_overrides_after_command() {
        let cli = Cli::parse_from([
            "confkit",
            "get",
            "server.port",
            "--set",
            "server.port=80",
            "-s",
            "debug=true",
        ]);
        assert_eq!(cli.global.overrides, vec!["server.port=80", "debug=true"]);
    }

    #[test]
    fn set_flag_and_set_command_coexist() {
        let cli = Cli::parse_from(["confkit", "--set", "a=1", "set", "b", "2"]);
        assert_eq!(cli.global.overrides, vec!["a=1"]);
        assert_eq!(
            cli.command,
            Some(Commands::Set {
                path: "b".into(),
                value: "2".into()
            })
        );
    }

    #[test]
    fn parse_plugins_list() {
        let cli = Cli::parse_from(["confkit", "-p", "vite", "--plugin", "./docs.toml", "plugins"]);
        assert_eq!(cli.global.plugins, vec!["vite", "./docs.toml"]);
    }

    #[test]
    fn parse_generate_check() {
        let cli = Cli::parse_from(["confkit", "generate", "--check"]);
        assert_eq!(
            cli.command,
            Some(Commands::Generate {
                format: None,
                output: None,
                check: true
            })
        );
    }

    #[test]
    fn parse_completions_command() {
        let cli = Cli::parse_from(["confkit", "completions", "bash"]);
        assert!(matches!(cli.command, Some(Commands::Completions { .. })));
    }
}
