use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::debug;

use crate::analysis::analysis_model::{AnalysisRequest, AnalysisResult, ServiceResponse};
use crate::error::{FormAssistError, Result};

// ============================================================================
// AnalysisService trait: the remote recommender
// ============================================================================

pub trait AnalysisService {
    /// Submit the discovered model. Transport problems are errors; a service
    /// that answered at all is returned as-is for the session to judge.
    fn analyze(&self, request: &AnalysisRequest) -> Result<ServiceResponse>;
}

// ============================================================================
// HTTP backend
// ============================================================================

pub struct HttpAnalysisService {
    pub endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpAnalysisService {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FormAssistError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

impl AnalysisService for HttpAnalysisService {
    fn analyze(&self, request: &AnalysisRequest) -> Result<ServiceResponse> {
        debug!(endpoint = %self.endpoint, groups = request.form_data.len(), "posting analysis request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| FormAssistError::Transport(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| FormAssistError::Transport(format!("Failed to read response: {}", e)))?;

        // Error payloads usually still carry {success:false, error}; prefer them.
        match serde_json::from_str::<ServiceResponse>(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(FormAssistError::Transport(format!(
                "Service returned {}",
                status
            ))),
            Err(e) => Err(FormAssistError::Transport(format!(
                "Invalid response from service: {}",
                e
            ))),
        }
    }
}

// ============================================================================
// Static backend (for testing and offline runs)
// ============================================================================

/// Answers every request with the same canned response.
pub struct StaticAnalysisService {
    response: ServiceResponse,
    calls: AtomicUsize,
}

impl StaticAnalysisService {
    pub fn new(response: ServiceResponse) -> Self {
        Self {
            response,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(analysis: AnalysisResult) -> Self {
        Self::new(ServiceResponse::ok(analysis))
    }

    pub fn failing(error: &str) -> Self {
        Self::new(ServiceResponse::failed(error))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let response = serde_json::from_str(json).map_err(|e| FormAssistError::JsonParse {
            context: "canned service response".into(),
            source: e,
        })?;
        Ok(Self::new(response))
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalysisService for StaticAnalysisService {
    fn analyze(&self, _request: &AnalysisRequest) -> Result<ServiceResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}
