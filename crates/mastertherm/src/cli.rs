//! Clap derive structures for the `mastertherm` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use clap::{Args, Parser, Subcommand, ValueEnum};

use mastertherm_core::{HeatingCoolingState, PointId, PointKind};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mastertherm -- read and control MasterTherm heat pumps
#[derive(Debug, Parser)]
#[command(
    name = "mastertherm",
    version,
    about = "Read and control MasterTherm heat pumps from the command line",
    long_about = "Talks to the MasterTherm cloud service on behalf of your account.\n\n\
        Lists modules, decodes their data points, drives the heating and hot\n\
        water thermostats, and streams live snapshots.",
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
    /// Account profile to use
    #[arg(long, short = 'p', env = "MASTERTHERM_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service URL (overrides profile)
    #[arg(long, env = "MASTERTHERM_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Account username (overrides profile)
    #[arg(long, short = 'u', env = "MASTERTHERM_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MASTERTHERM_OUTPUT",
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

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "MASTERTHERM_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "MASTERTHERM_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Log line format on stderr
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,
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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the heat-pump modules on the account
    #[command(alias = "ls")]
    Modules,

    /// Dump every decoded point of a fresh snapshot
    Points(PointsArgs),

    /// Read individual points (e.g. A_191 D_3)
    Get(GetArgs),

    /// Write one point
    Set(SetArgs),

    /// Heat-pump thermostat: status, mode, target temperature
    #[command(alias = "hp")]
    Thermostat(ThermostatArgs),

    /// Domestic hot water: status, target temperature
    #[command(alias = "dhw")]
    HotWater(HotWaterArgs),

    /// Indoor and outdoor temperatures
    Sensors(ModuleArg),

    /// Poll continuously and print a line per new snapshot
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  POINTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ModuleArg {
    /// Module id (see `mastertherm modules`)
    pub module: String,
}

#[derive(Debug, Args)]
pub struct PointsArgs {
    /// Module id
    pub module: String,

    /// Only show one kind: D (digital), I (integer), A (analog)
    #[arg(long, short = 'K')]
    pub kind: Option<PointKind>,
}

#[derive(Debug, Args)]
pub struct GetArgs {
    /// Module id
    pub module: String,

    /// Point names, kind prefix + id
    #[arg(required = true)]
    pub points: Vec<PointId>,
}

#[derive(Debug, Args)]
pub struct SetArgs {
    /// Module id
    pub module: String,

    /// Point name, kind prefix + id
    pub point: PointId,

    /// New value: 0/1/true/false, an integer, or a decimal
    pub value: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  THERMOSTATS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ThermostatArgs {
    /// Module id
    pub module: String,

    #[command(subcommand)]
    pub command: Option<ThermostatCommand>,
}

#[derive(Debug, Subcommand)]
pub enum ThermostatCommand {
    /// Show current and target state (default)
    Status,

    /// Switch off, or on in a mode
    Mode {
        /// off, auto, heat, or cool
        state: HeatingCoolingState,
    },

    /// Set the heating setpoint
    Target {
        /// Degrees Celsius
        celsius: f64,
    },
}

#[derive(Debug, Args)]
pub struct HotWaterArgs {
    /// Module id
    pub module: String,

    #[command(subcommand)]
    pub command: Option<HotWaterCommand>,
}

#[derive(Debug, Subcommand)]
pub enum HotWaterCommand {
    /// Show temperatures and accepted range (default)
    Status,

    /// Set the hot water setpoint
    Target {
        /// Degrees Celsius
        celsius: f64,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Seconds between polls (overrides profile)
    #[arg(long, short = 'i')]
    pub interval: Option<u64>,

    /// Only watch these modules
    #[arg(long, short = 'm')]
    pub module: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a configuration value on the active profile
    Set {
        /// Config key (base_url, username, password_env, insecure, timeout, ...)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
