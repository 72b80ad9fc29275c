//! Catalog configuration
//!
//! Settings groups flattened into CLI commands. Every flag falls back to an
//! environment variable, and the binary loads `.env` before parsing.

use clap::{Args, ValueEnum};

use crate::domain::blobs::DEFAULT_CHUNK_SIZE;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

/// Database settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: String,
}

/// Blob store settings.
#[derive(Debug, Clone, Args)]
pub struct BlobConfig {
    /// Size in bytes of the chunks blob bodies are stored in
    #[arg(
        long,
        env = "BLOB_CHUNK_SIZE",
        default_value_t = DEFAULT_CHUNK_SIZE,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub chunk_size: u32,
}
