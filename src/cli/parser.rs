//! CLI argument parsing with clap
//!
//! This module defines the command-line interface structure using clap,
//! including all commands, arguments, and their documentation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::build;

/// Read API for warehouse master data with scope-based authorization
#[derive(Parser, Debug)]
#[command(name = "depot-rs")]
#[command(about = "Read API for warehouse master data with scope-based authorization")]
#[command(long_about = "
depot-rs serves paginated, filterable lists of customers, suppliers, products,
warehouses, bins, cycle counts and notifications over HTTP. Every list endpoint
accepts page/pageSize/order/orderBy and per-field filter parameters, and every
resource route is guarded by permission scopes carried in a bearer token.

EXAMPLES:
    # Start the server with default configuration
    depot-rs serve

    # Start server on custom host and port
    depot-rs serve --host 0.0.0.0 --port 8080

    # Use custom configuration file
    depot-rs --config /path/to/config.toml serve

    # Check configuration and route scopes without starting the server
    depot-rs serve --dry-run

    # Run database migrations
    depot-rs migrate

    # Rollback the last migration
    depot-rs migrate --rollback 1

    # Mint a token for an operator
    depot-rs token --subject 7 --scope \"products::list products::get\"
")]
#[command(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file path
    ///
    /// Specify a custom configuration file to use instead of the default.
    /// The file should be in TOML format and must exist and be readable.
    ///
    /// Example: --config /etc/depot-rs/production.toml
    #[arg(short, long, value_name = "FILE", value_parser = super::validation::validate_config_file_path)]
    pub config: Option<PathBuf>,

    /// Override environment detection
    ///
    /// Available values: development (dev), production (prod), test
    #[arg(short, long, value_enum)]
    pub env: Option<Environment>,

    /// Enable verbose logging (debug level)
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the web server (default)
    ///
    /// Examples:
    ///   depot-rs serve                           # Start with defaults
    ///   depot-rs serve --host 0.0.0.0 --port 80 # Bind to all interfaces on port 80
    ///   depot-rs serve --dry-run                 # Validate config and routes, then exit
    Serve {
        /// Host address to bind to
        ///
        /// Default: 127.0.0.1
        #[arg(long, value_name = "ADDRESS", value_parser = super::validation::validate_host_address)]
        host: Option<String>,

        /// Port number to listen on
        ///
        /// Default: 3000
        #[arg(short, long, value_name = "PORT", value_parser = super::validation::validate_port)]
        port: Option<u16>,

        /// Log level override
        ///
        /// Overrides both configuration file settings and global --verbose/--quiet flags.
        #[arg(long, value_enum)]
        log_level: Option<LogLevel>,

        /// Validate configuration and route scopes, then exit
        #[arg(long)]
        dry_run: bool,
    },
    /// Database migration operations
    ///
    /// Examples:
    ///   depot-rs migrate                    # Apply all pending migrations
    ///   depot-rs migrate --dry-run          # Show pending migrations without applying
    ///   depot-rs migrate --rollback 3       # Rollback the last 3 migrations
    Migrate {
        /// Show pending migrations without applying
        #[arg(long, conflicts_with = "rollback")]
        dry_run: bool,

        /// Number of migrations to rollback (1-100)
        #[arg(long, value_name = "STEPS", conflicts_with = "dry_run", value_parser = super::validation::validate_rollback_steps)]
        rollback: Option<u32>,
    },
    /// Mint a signed access token
    ///
    /// Every scope must exist in the permission catalog. The token is signed
    /// with the configured JWT secret and printed to stdout.
    ///
    /// Examples:
    ///   depot-rs token --subject 7 --scope "customers::list customers::get"
    ///   depot-rs token --subject 7 --scope notifications::list --expires-in 1
    Token {
        /// Subject (user ID) the token is issued to
        #[arg(long, value_name = "ID", value_parser = super::validation::validate_subject)]
        subject: String,

        /// Space-delimited scopes to grant
        #[arg(long, value_name = "SCOPES")]
        scope: String,

        /// Lifetime in hours, defaults to `jwt.access_token_expiration`
        #[arg(long, value_name = "HOURS", value_parser = super::validation::validate_expiry_hours)]
        expires_in: Option<i64>,
    },
}

/// Environment options
#[derive(ValueEnum, Clone, Debug)]
pub enum Environment {
    #[value(name = "development", alias = "dev")]
    Development,
    #[value(name = "production", alias = "prod")]
    Production,
    #[value(name = "test")]
    Test,
}

/// Log level options
#[derive(ValueEnum, Clone, Debug)]
pub enum LogLevel {
    #[value(name = "error")]
    Error,
    #[value(name = "warn", alias = "warning")]
    Warn,
    #[value(name = "info")]
    Info,
    #[value(name = "debug")]
    Debug,
    #[value(name = "trace")]
    Trace,
}

impl Cli {
    /// Validate argument combinations clap cannot express.
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Some(Commands::Migrate { dry_run, rollback }) if *dry_run && rollback.is_some() => {
                return Err("Cannot use --dry-run and --rollback together".to_string());
            }
            Some(Commands::Token { scope, .. }) if scope.split_whitespace().next().is_none() => {
                return Err("--scope must name at least one scope".to_string());
            }
            _ => {}
        }

        if self.verbose && self.quiet {
            return Err("Cannot use --verbose and --quiet together".to_string());
        }

        Ok(())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => "error".to_string(),
            LogLevel::Warn => "warn".to_string(),
            LogLevel::Info => "info".to_string(),
            LogLevel::Debug => "debug".to_string(),
            LogLevel::Trace => "trace".to_string(),
        }
    }
}

impl From<Environment> for crate::config::Environment {
    fn from(env: Environment) -> Self {
        match env {
            Environment::Development => crate::config::Environment::Development,
            Environment::Production => crate::config::Environment::Production,
            Environment::Test => crate::config::Environment::Test,
        }
    }
}
