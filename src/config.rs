//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `orpull.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// OpenReview API settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Venue settings and decision policy.
    #[serde(default)]
    pub venue: VenueConfig,

    /// Author-group settings.
    #[serde(default)]
    pub authors: AuthorsConfig,

    /// Output file paths.
    #[serde(default)]
    pub output: OutputConfig,
}

/// OpenReview API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Account username (usually an email address).
    #[serde(default)]
    pub username: String,

    /// Account password.
    #[serde(default)]
    pub password: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: String::new(),
            password: String::new(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://api2.openreview.net".to_string()
}

fn default_timeout() -> u64 {
    60
}

/// Venue settings and decision policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    /// Venue id, e.g. `NeurIPS.cc/2025/Workshop/SEA`.
    #[serde(default)]
    pub id: String,

    /// Explicit submission invitations to probe before the built-in
    /// candidates. Usually empty.
    #[serde(default)]
    pub submission_invitations: Vec<String>,

    /// Average score below which an accepted paper is flagged.
    #[serde(default = "default_low_score_threshold")]
    pub low_score_threshold: f64,

    /// Decision prefix (matched case-insensitively) that counts as accepted.
    #[serde(default = "default_accept_prefix")]
    pub accept_prefix: String,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            submission_invitations: Vec::new(),
            low_score_threshold: default_low_score_threshold(),
            accept_prefix: default_accept_prefix(),
        }
    }
}

fn default_low_score_threshold() -> f64 {
    4.0
}

fn default_accept_prefix() -> String {
    "accept".to_string()
}

/// Author-group settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorsConfig {
    /// Group ids whose members are resolved to profile ids.
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Output file paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Accepted-papers CSV path.
    #[serde(default = "default_accepted")]
    pub accepted: String,

    /// Decisions CSV path.
    #[serde(default = "default_decisions")]
    pub decisions: String,

    /// Flagged low-score-accept CSV path.
    #[serde(default = "default_flagged")]
    pub flagged: String,

    /// Author submission-counts JSON path.
    #[serde(default = "default_author_counts")]
    pub author_counts: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            accepted: default_accepted(),
            decisions: default_decisions(),
            flagged: default_flagged(),
            author_counts: default_author_counts(),
        }
    }
}

fn default_accepted() -> String {
    "accepted_papers.csv".to_string()
}

fn default_decisions() -> String {
    "decisions.csv".to_string()
}

fn default_flagged() -> String {
    "flagged_low_score_accept.csv".to_string()
}

fn default_author_counts() -> String {
    "author_ids.json".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but
    /// can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new("orpull.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref base_url) = args.base_url {
            self.api.base_url = base_url.clone();
        }
        if let Some(ref username) = args.username {
            self.api.username = username.clone();
        }
        if let Some(ref password) = args.password {
            self.api.password = password.clone();
        }
        if let Some(timeout) = args.timeout {
            self.api.timeout_seconds = timeout;
        }
        if let Some(ref venue) = args.venue {
            self.venue.id = venue.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.base_url, "https://api2.openreview.net");
        assert_eq!(config.api.timeout_seconds, 60);
        assert_eq!(config.venue.low_score_threshold, 4.0);
        assert_eq!(config.venue.accept_prefix, "accept");
        assert_eq!(config.output.accepted, "accepted_papers.csv");
        assert!(config.authors.groups.is_empty());
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[api]
username = "reviewer@example.com"
password = "hunter2"
timeout_seconds = 30

[venue]
id = "NeurIPS.cc/2025/Workshop/SEA"
low_score_threshold = 3.5

[authors]
groups = ["NeurIPS.cc/2025/Workshop/SEA/Authors"]

[output]
decisions = "sea_decisions.csv"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.api.username, "reviewer@example.com");
        assert_eq!(config.api.timeout_seconds, 30);
        assert_eq!(config.venue.id, "NeurIPS.cc/2025/Workshop/SEA");
        assert_eq!(config.venue.low_score_threshold, 3.5);
        // Unset fields keep their defaults.
        assert_eq!(config.venue.accept_prefix, "accept");
        assert_eq!(config.authors.groups.len(), 1);
        assert_eq!(config.output.decisions, "sea_decisions.csv");
        assert_eq!(config.output.flagged, "flagged_low_score_accept.csv");
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[api]"));
        assert!(toml_str.contains("[venue]"));
        assert!(toml_str.contains("[output]"));
    }
}
