//! Configuration management with YAML support

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub congresses: CongressConfig,

    #[serde(default)]
    pub committees: CommitteeConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

/// Import file paths and consistency tolerances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_house_hearings")]
    pub house_hearings: String,

    #[serde(default = "default_senate_hearings")]
    pub senate_hearings: String,

    #[serde(default = "default_house_committees")]
    pub house_committees: String,

    #[serde(default = "default_senate_committees")]
    pub senate_committees: String,

    /// Category-correction CSVs (NAME, DATE, CATEGORY columns)
    #[serde(default)]
    pub category_files: Vec<String>,

    #[serde(default = "default_log_path")]
    pub log_path: String,

    /// Accepted shortfall between imported-event counts and non-blank rows.
    /// The defaults reproduce historically observed multi-row collapses;
    /// re-derive them whenever the source spreadsheets change.
    #[serde(default = "default_house_tolerance")]
    pub house_tolerance: i64,

    #[serde(default = "default_senate_tolerance")]
    pub senate_tolerance: i64,
}

/// Congress seeding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CongressConfig {
    #[serde(default = "default_first_congress")]
    pub first: i64,

    #[serde(default = "default_last_congress")]
    pub last: i64,

    /// Expected non-hearing days in a typical session
    #[serde(default = "default_inactive_days")]
    pub default_inactive_days: i64,

    /// Per-congress overrides, keyed by congress number
    #[serde(default)]
    pub inactive_days: HashMap<i64, i64>,
}

/// Committee seeding and rating allow-list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitteeConfig {
    /// Canonical committee tree CSV (chamber, committee, parent columns)
    #[serde(default = "default_committees_file")]
    pub file: String,

    /// Standing committees eligible for rating
    #[serde(default = "default_permanent_committees")]
    pub permanent: Vec<String>,
}

// Default value functions
fn default_database_path() -> String {
    "~/.local/share/oversight/oversight.db".to_string()
}

fn default_house_hearings() -> String {
    "data/final/house.csv".to_string()
}

fn default_senate_hearings() -> String {
    "data/final/senate.csv".to_string()
}

fn default_house_committees() -> String {
    "data/final/house_committees.csv".to_string()
}

fn default_senate_committees() -> String {
    "data/final/senate_committees.csv".to_string()
}

fn default_committees_file() -> String {
    "data/final/committees.csv".to_string()
}

fn default_log_path() -> String {
    "bad_rows.txt".to_string()
}

fn default_house_tolerance() -> i64 {
    4
}

fn default_senate_tolerance() -> i64 {
    79
}

fn default_first_congress() -> i64 {
    107
}

fn default_last_congress() -> i64 {
    116
}

fn default_inactive_days() -> i64 {
    62
}

fn default_permanent_committees() -> Vec<String> {
    [
        "House Committee on Agriculture",
        "House Committee on Appropriations",
        "House Committee on Armed Services",
        "House Committee on Budget",
        "House Committee on Education and the Workforce",
        "House Committee on Energy and Commerce",
        "House Committee on Financial Services",
        "House Committee on Foreign Affairs",
        "House Committee on Homeland Security",
        "House Committee on House Administration",
        "House Committee on Intelligence (Permanent Select)",
        "House Committee on Judiciary",
        "House Committee on Natural Resources",
        "House Committee on Oversight and Government Reform",
        "House Committee on Rules",
        "House Committee on Science, Space, and Technology",
        "House Committee on Small Business",
        "House Committee on Transportation and Infrastructure",
        "House Committee on Veterans' Affairs",
        "House Committee on Ways and Means",
        "Senate Committee on Aging",
        "Senate Committee on Agriculture, Nutrition, and Forestry",
        "Senate Committee on Appropriations",
        "Senate Committee on Armed Services",
        "Senate Committee on Banking, Housing, and Urban Affairs",
        "Senate Committee on Budget",
        "Senate Committee on Commerce, Science, and Transportation",
        "Senate Committee on Energy and Natural Resources",
        "Senate Committee on Environment and Public Works",
        "Senate Committee on Finance",
        "Senate Committee on Foreign Relations",
        "Senate Committee on Health, Education, Labor, and Pensions",
        "Senate Committee on Homeland Security and Governmental Affairs",
        "Senate Committee on Indian Affairs",
        "Senate Committee on Intelligence",
        "Senate Committee on Judiciary",
        "Senate Committee on Rules and Administration",
        "Senate Committee on Small Business and Entrepreneurship",
        "Senate Committee on Veterans' Affairs",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            house_hearings: default_house_hearings(),
            senate_hearings: default_senate_hearings(),
            house_committees: default_house_committees(),
            senate_committees: default_senate_committees(),
            category_files: vec![],
            log_path: default_log_path(),
            house_tolerance: default_house_tolerance(),
            senate_tolerance: default_senate_tolerance(),
        }
    }
}

impl Default for CongressConfig {
    fn default() -> Self {
        Self {
            first: default_first_congress(),
            last: default_last_congress(),
            default_inactive_days: default_inactive_days(),
            inactive_days: HashMap::new(),
        }
    }
}

impl Default for CommitteeConfig {
    fn default() -> Self {
        Self {
            file: default_committees_file(),
            permanent: default_permanent_committees(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            import: ImportConfig::default(),
            congresses: CongressConfig::default(),
            committees: CommitteeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    /// Searches in order:
    /// 1. Provided path
    /// 2. ./oversight.yaml (current directory)
    /// 3. ~/.config/oversight/oversight.yaml
    pub fn load(path: &str) -> Result<Self> {
        let search_paths = vec![
            shellexpand::tilde(path).to_string(),
            "oversight.yaml".to_string(),
            shellexpand::tilde("~/.config/oversight/oversight.yaml").to_string(),
        ];

        for search_path in &search_paths {
            if std::path::Path::new(search_path).exists() {
                let content = std::fs::read_to_string(search_path)?;
                let config: Config = serde_yaml::from_str(&content)?;
                return Ok(config);
            }
        }

        // No config file found, use defaults
        Ok(Config::default())
    }

    /// Get the database path, expanding ~ to home directory
    pub fn database_path(&self) -> PathBuf {
        let expanded = shellexpand::tilde(&self.database.path).to_string();
        PathBuf::from(expanded)
    }

    /// Inactive days for a congress: override, or the 62-day default
    pub fn inactive_days_for(&self, congress: i64) -> i64 {
        self.congresses
            .inactive_days
            .get(&congress)
            .copied()
            .unwrap_or(self.congresses.default_inactive_days)
    }
}
