//! Command handlers for CLI operations
//!
//! Each handler owns the merged settings and runs one subcommand.

pub mod migrate;
pub mod serve;
pub mod token;

pub use migrate::MigrateCommandHandler;
pub use serve::ServeCommandHandler;
pub use token::TokenCommandHandler;
