use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::analysis::analysis_model::{AnalysisRequest, AnalysisResult};
use crate::analysis::capture::{NoCapture, PageCapture};
use crate::analysis::service::AnalysisService;
use crate::autofill::reconciler::{DriftPolicy, FillReport, Reconciler};
use crate::dom::document::Document;
use crate::error::{FormAssistError, Result};
use crate::forms::discovery::{DiscoveryOptions, discover_forms_with};
use crate::forms::form_model::FormGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Analyzing,
}

/// The last successful analysis plus the model it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct RetainedAnalysis {
    pub result: AnalysisResult,
    pub model: Vec<FormGroup>,
}

struct SessionState {
    phase: Phase,
    retained: Option<Arc<RetainedAnalysis>>,
}

/// Single-flight analysis plus the retained result that fills read from.
///
/// `Idle -> Analyzing -> Idle`. A start while `Analyzing` fails with `Busy`
/// instead of queuing; success or failure both return to `Idle`. The retained
/// result is only replaced by a completed analysis, so a fill never observes
/// one still in flight.
pub struct AnalysisSession {
    service: Box<dyn AnalysisService + Send + Sync>,
    capture: Box<dyn PageCapture + Send + Sync>,
    user_id: Option<String>,
    reconciler: Reconciler,
    state: Mutex<SessionState>,
}

/// Returns the session to `Idle` however the analysis ends.
struct InFlight<'a> {
    session: &'a AnalysisSession,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.session.lock().phase = Phase::Idle;
    }
}

impl AnalysisSession {
    pub fn new(service: Box<dyn AnalysisService + Send + Sync>) -> Self {
        Self {
            service,
            capture: Box::new(NoCapture),
            user_id: None,
            reconciler: Reconciler::default(),
            state: Mutex::new(SessionState {
                phase: Phase::Idle,
                retained: None,
            }),
        }
    }

    pub fn with_capture(mut self, capture: Box<dyn PageCapture + Send + Sync>) -> Self {
        self.capture = capture;
        self
    }

    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_discovery(mut self, discovery: DiscoveryOptions) -> Self {
        self.reconciler.discovery = discovery;
        self
    }

    pub fn with_drift_policy(mut self, policy: DriftPolicy) -> Self {
        self.reconciler.drift_policy = policy;
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        // State stays consistent across a panic; keep using it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn latest(&self) -> Option<Arc<RetainedAnalysis>> {
        self.lock().retained.clone()
    }

    /// Drop the retained result, as when the page session ends.
    pub fn clear(&self) {
        self.lock().retained = None;
    }

    fn begin(&self) -> Result<InFlight<'_>> {
        let mut state = self.lock();
        if state.phase == Phase::Analyzing {
            return Err(FormAssistError::Busy);
        }
        state.phase = Phase::Analyzing;
        Ok(InFlight { session: self })
    }

    /// Discover forms, submit them, and retain the result on success.
    pub fn start_analysis(&self, doc: &Document) -> Result<Arc<RetainedAnalysis>> {
        let _in_flight = self.begin()?;

        let model = discover_forms_with(doc, &self.reconciler.discovery);
        if model.is_empty() {
            return Err(FormAssistError::NoFormsFound);
        }

        let screenshot = match self.capture.capture(doc) {
            Ok(image) => image,
            Err(e) => {
                warn!(error = %e, "page capture failed, continuing without it");
                None
            }
        };

        let request = AnalysisRequest {
            user_id: self.user_id.clone(),
            form_data: model,
            screenshot,
        };
        let response = self.service.analyze(&request)?;

        if !response.success {
            return Err(FormAssistError::Transport(
                response.error.unwrap_or_else(|| "service reported failure".into()),
            ));
        }
        let result = response
            .analysis
            .ok_or_else(|| FormAssistError::Transport("response carried no analysis".into()))?;

        info!(
            groups = request.form_data.len(),
            recommendations = result.fields.len(),
            "analysis complete"
        );

        let retained = Arc::new(RetainedAnalysis {
            result,
            model: request.form_data,
        });
        self.lock().retained = Some(Arc::clone(&retained));
        Ok(retained)
    }

    /// Apply the retained recommendations to `doc`.
    pub fn fill(&self, doc: &mut Document) -> Result<FillReport> {
        let retained = self.latest().ok_or(FormAssistError::NoResultAvailable)?;
        Ok(self
            .reconciler
            .apply(doc, &retained.result.fields, &retained.model))
    }
}
