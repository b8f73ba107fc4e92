//! Clap derive structures for the `lighthouse` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use lighthouse_core::{BackupFormat, RegistryProvider};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// lighthouse -- watch and update the containers behind a Lighthouse server
#[derive(Debug, Parser)]
#[command(
    name = "lighthouse",
    version,
    about = "Check and apply container image updates from the command line",
    long_about = "A command-line dashboard for Lighthouse container update servers.\n\n\
        Lists managed containers, checks for newer images, applies updates\n\
        one at a time or in bulk, and manages server settings and history.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "LIGHTHOUSE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "LIGHTHOUSE_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "LIGHTHOUSE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "LIGHTHOUSE_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "LIGHTHOUSE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List, check, update and exclude containers
    #[command(alias = "ct", alias = "c")]
    Containers(ContainersArgs),

    /// Update every eligible container in one bulk run
    UpdateAll,

    /// View and change server settings
    Settings(SettingsArgs),

    /// View and clear the update history
    #[command(alias = "hist")]
    History(HistoryArgs),

    /// Show the server's automatic check schedule
    Schedule,

    /// Live container view, refreshed by the poll timers
    Watch,

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Containers ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ContainersArgs {
    #[command(subcommand)]
    pub command: ContainersCommand,
}

#[derive(Debug, Subcommand)]
pub enum ContainersCommand {
    /// List managed containers
    #[command(alias = "ls")]
    List,

    /// Ask the server whether a newer image exists
    Check {
        /// Container ID, ID prefix, or name
        container: String,
    },

    /// Pull the latest image and recreate the container
    Update {
        /// Container ID, ID prefix, or name
        container: String,
    },

    /// Exclude a container from checks and updates
    Exclude {
        /// Container ID, ID prefix, or name
        container: String,
    },

    /// Include a previously excluded container again
    Include {
        /// Container ID, ID prefix, or name
        container: String,
    },
}

// ── Settings ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    /// Show the current settings document
    Show,

    /// Change settings and save them
    Set(SettingsSetArgs),

    /// Validate registry credentials (and optionally save them)
    ValidateRegistry {
        /// Registry provider: dockerhub or ghcr
        provider: RegistryProvider,

        /// Username (defaults to the stored one)
        #[arg(long, short = 'u')]
        username: Option<String>,

        /// Access token (prompted when omitted)
        #[arg(long, env = "LIGHTHOUSE_REGISTRY_TOKEN", hide_env = true)]
        token: Option<String>,

        /// Save the credentials after they validate
        #[arg(long)]
        save: bool,
    },

    /// Validate the stored SMTP settings, with optional overrides
    ValidateSmtp(SmtpArgs),

    /// Download an encrypted settings backup
    Export {
        /// Backup format: json or yaml
        #[arg(long, short = 'f', default_value = "json")]
        format: BackupFormat,

        /// Where to write the backup (defaults to the server's filename)
        #[arg(long = "output-file", short = 'O')]
        output_file: Option<PathBuf>,

        /// Encryption password (prompted when omitted)
        #[arg(long, env = "LIGHTHOUSE_BACKUP_PASSWORD", hide_env = true)]
        password: Option<String>,
    },

    /// Decrypt a settings backup for review
    Import {
        /// Backup file produced by `settings export`
        file: PathBuf,

        /// Decryption password (prompted when omitted)
        #[arg(long, env = "LIGHTHOUSE_BACKUP_PASSWORD", hide_env = true)]
        password: Option<String>,

        /// Save the restored settings to the server
        #[arg(long)]
        save: bool,
    },
}

#[derive(Debug, Args)]
pub struct SettingsSetArgs {
    /// Full settings document as JSON
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,

    /// Minutes between automatic checks
    #[arg(long)]
    pub check_interval: Option<u32>,

    /// Apply available updates automatically
    #[arg(long)]
    pub auto_update: Option<bool>,

    /// Remove superseded images after an update
    #[arg(long)]
    pub cleanup: Option<bool>,

    /// Send email notifications
    #[arg(long)]
    pub notifications: Option<bool>,
}

#[derive(Debug, Args)]
pub struct SmtpArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,

    #[arg(long)]
    pub username: Option<String>,

    /// SMTP password (defaults to the stored one)
    #[arg(long, env = "LIGHTHOUSE_SMTP_PASSWORD", hide_env = true)]
    pub password: Option<String>,

    #[arg(long)]
    pub use_tls: Option<bool>,
}

// ── History ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List history entries, newest first
    #[command(alias = "ls")]
    List {
        /// Only entries with this action (check, update, ...)
        #[arg(long)]
        action: Option<String>,

        /// Only entries with this status (success, error, ...)
        #[arg(long)]
        status: Option<String>,

        /// Maximum number of entries
        #[arg(long, short = 'l')]
        limit: Option<u32>,
    },

    /// Delete every history entry on the server
    Clear,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive configuration wizard
    Init,

    /// Show the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Set a value on the active profile
    Set {
        /// Key: server, ca_cert, insecure, timeout, containers_poll_secs,
        /// schedule_poll_secs, history_poll_secs
        key: String,
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
