//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "actionkit", about = "actionkit - run registered actions against a GraphQL backend", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (YAML or JSON)
    #[arg(short, long, env = "ACTIONKIT_CONFIG", default_value = "actionkit.yaml")]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one action and print its result
    Execute {
        /// Action key
        action: String,

        /// Parameters as a JSON object
        #[arg(short, long, conflicts_with = "params_file")]
        params: Option<String>,

        /// Read parameters from a JSON or YAML file
        #[arg(long)]
        params_file: Option<PathBuf>,

        /// Caller user ID
        #[arg(short, long, default_value = "cli")]
        user: String,

        /// Caller bearer credential
        #[arg(long, env = "ACTIONKIT_JWT", default_value = "", hide_env_values = true)]
        jwt: String,

        /// Caller language
        #[arg(long, default_value = "en")]
        lang: String,

        /// Pretty-print the result
        #[arg(long)]
        pretty: bool,
    },

    /// List registered actions
    List {
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Load the settings, register every action and resolve catalog operations
    Check,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}
