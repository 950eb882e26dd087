//! CLI module - Command-line interface for query-cache

mod commands;

use clap::{Parser, Subcommand};

/// Cache-aside proxy for search and chat answers
#[derive(Parser)]
#[command(name = "query-cache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server (default)
    #[command(alias = "-d", alias = "--daemon")]
    Serve,

    /// Report whether the cache store is reachable
    #[command(alias = "-c", alias = "--check")]
    Check,

    /// Delete the cached entry for one query
    #[command(alias = "rm")]
    Evict {
        /// Cache namespace (search or chat)
        namespace: String,
        /// Query whose entry should be removed
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
