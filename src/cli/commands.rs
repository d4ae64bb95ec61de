use std::io::{self, BufReader};
use std::time::Duration;

use tracing::info;

use crate::analysis::service::{AnalysisService, HttpAnalysisService, StaticAnalysisService};
use crate::analysis::session::AnalysisSession;
use crate::cli::config::{AppConfig, parse_drift_policy};
use crate::dom::document::Document;
use crate::forms::discovery::discover_forms_with;
use crate::messaging::host::{MessageHost, serve_ndjson};

// ============================================================================
// discover subcommand
// ============================================================================

pub fn cmd_discover(page: &str, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load(page)?;
    let groups = discover_forms_with(&doc, &config.discovery);

    info!(page, groups = groups.len(), "discovery finished");
    println!("{}", serde_json::to_string_pretty(&groups)?);
    Ok(())
}

// ============================================================================
// serve subcommand
// ============================================================================

pub fn cmd_serve(
    page: &str,
    endpoint: Option<&str>,
    canned: Option<&str>,
    drift_policy: Option<&str>,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = Document::load(page)?;
    let service = build_service(endpoint, canned, config)?;

    let drift_policy = match drift_policy {
        Some(name) => parse_drift_policy(name)
            .ok_or_else(|| format!("Unknown drift policy '{}' (expected ignore, warn or reject)", name))?,
        None => config.fill.drift_policy,
    };

    let session = AnalysisSession::new(service)
        .with_user_id(config.service.user_id.clone())
        .with_discovery(config.discovery.clone())
        .with_drift_policy(drift_policy);

    let mut host = MessageHost::new(doc, session);
    info!(page, ?drift_policy, "serving requests on stdin");

    let stdin = io::stdin();
    serve_ndjson(&mut host, BufReader::new(stdin.lock()), io::stdout().lock())?;
    Ok(())
}

/// Resolve the analysis backend: canned file > CLI endpoint > config endpoint.
pub fn build_service(
    endpoint: Option<&str>,
    canned: Option<&str>,
    config: &AppConfig,
) -> Result<Box<dyn AnalysisService + Send + Sync>, Box<dyn std::error::Error>> {
    if let Some(path) = canned {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read canned response {}: {}", path, e))?;
        return Ok(Box::new(StaticAnalysisService::from_json(&json)?));
    }

    let endpoint = endpoint
        .or(config.service.endpoint.as_deref())
        .ok_or("No analysis endpoint configured (use --endpoint, --canned, or service.endpoint)")?;

    Ok(Box::new(HttpAnalysisService::new(
        endpoint,
        Duration::from_secs(config.service.timeout_secs),
    )?))
}
