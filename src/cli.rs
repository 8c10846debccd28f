//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// orpull - OpenReview venue extraction tool
///
/// Pull accepted-paper lists, review decisions, and author submission
/// histories for a workshop venue into CSV/JSON files.
///
/// Examples:
///   orpull accepted --venue NeurIPS.cc/2025/Workshop/SEA
///   orpull decisions -c orpull.toml
///   orpull authors -o author_ids.json
///   orpull init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for orpull.toml in the current directory.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Venue id to extract from
    ///
    /// Overrides the [venue] id in the config file.
    #[arg(long, global = true, value_name = "VENUE")]
    pub venue: Option<String>,

    /// OpenReview API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// OpenReview account username
    ///
    /// Can also be set via ORPULL_USERNAME or the config file.
    #[arg(long, global = true, env = "ORPULL_USERNAME")]
    pub username: Option<String>,

    /// OpenReview account password
    ///
    /// Can also be set via ORPULL_PASSWORD or the config file.
    #[arg(long, global = true, env = "ORPULL_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// The extraction pipeline to run.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Extract accepted papers with their presentation type
    ///
    /// Fetches all notes tagged with the venue id and writes
    /// (paper_number, title, authors, presentation_type) rows.
    Accepted {
        /// Output CSV path (overrides config)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Extract decisions and flag low-score accepts
    ///
    /// Walks every submission thread, aggregates review scores and the
    /// meta-review decision, and writes a decisions CSV plus a CSV of
    /// accepted papers whose average score falls below the threshold.
    Decisions {
        /// Decisions CSV path (overrides config)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Flagged low-score-accept CSV path (overrides config)
        #[arg(long, value_name = "FILE")]
        flagged: Option<PathBuf>,
    },

    /// Resolve author groups and count prior submissions
    ///
    /// Resolves group members to canonical ~profile ids and writes a JSON
    /// map of profile id to submission count.
    Authors {
        /// Output JSON path (overrides config)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Generate a default orpull.toml configuration file
    InitConfig,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for init-config
        if matches!(self.command, Command::InitConfig) {
            return Ok(());
        }

        // Validate base URL format if provided
        if let Some(ref base_url) = self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err("Base URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
