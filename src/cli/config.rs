use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::autofill::reconciler::DriftPolicy;
use crate::forms::discovery::DiscoveryOptions;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "form-assist",
    version,
    about = "Form discovery and recommendation-driven autofill"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: form-assist.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the form groups discovered in a page snapshot
    Discover {
        /// Page snapshot JSON file
        #[arg(long)]
        page: String,
    },

    /// Answer startAnalysis / fillForm requests as NDJSON on stdin/stdout
    Serve {
        /// Page snapshot JSON file
        #[arg(long)]
        page: String,

        /// Analysis service endpoint (overrides config)
        #[arg(long)]
        endpoint: Option<String>,

        /// Answer every analysis with this canned service response instead of calling out
        #[arg(long, conflicts_with = "endpoint")]
        canned: Option<String>,

        /// Drift policy for fills: ignore, warn, reject (overrides config)
        #[arg(long)]
        drift_policy: Option<String>,
    },
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `form-assist.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub discovery: DiscoveryOptions,
    #[serde(default)]
    pub fill: FillConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub endpoint: Option<String>,

    pub user_id: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            user_id: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillConfig {
    #[serde(default)]
    pub drift_policy: DriftPolicy,
}

fn default_timeout_secs() -> u64 { 30 }

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("form-assist.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_default(),
        Err(_) => AppConfig::default(),
    }
}

/// Parse a drift policy name as accepted on the command line.
pub fn parse_drift_policy(name: &str) -> Option<DriftPolicy> {
    match name.trim().to_lowercase().as_str() {
        "ignore" => Some(DriftPolicy::Ignore),
        "warn" => Some(DriftPolicy::Warn),
        "reject" => Some(DriftPolicy::Reject),
        _ => None,
    }
}
