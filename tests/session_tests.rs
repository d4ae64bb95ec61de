use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use form_assist::analysis::analysis_model::{
    AnalysisRequest, AnalysisResult, FieldRecommendation, ServiceResponse,
};
use form_assist::analysis::capture::PageCapture;
use form_assist::analysis::service::{AnalysisService, StaticAnalysisService};
use form_assist::analysis::session::{AnalysisSession, Phase};
use form_assist::autofill::reconciler::DriftPolicy;
use form_assist::dom::document::Document;
use form_assist::dom::snapshot::el;
use form_assist::error::{FormAssistError, Result};

mod common;
use common::{by_name, email_and_color_page, page, selected_text};

// =========================================================================
// Test services
// =========================================================================

fn email_and_color_result() -> AnalysisResult {
    AnalysisResult::from_fields(vec![
        FieldRecommendation::new("form[0]-input[0]", "a@b.com"),
        FieldRecommendation::new("form[0]-select[0]", "green"),
    ])
}

/// Shares a StaticAnalysisService so the test can inspect call counts after
/// the session has taken ownership.
struct Shared(Arc<StaticAnalysisService>);

impl AnalysisService for Shared {
    fn analyze(&self, request: &AnalysisRequest) -> Result<ServiceResponse> {
        self.0.analyze(request)
    }
}

/// Records every request it sees.
struct Recording {
    requests: Arc<Mutex<Vec<AnalysisRequest>>>,
    response: ServiceResponse,
}

impl AnalysisService for Recording {
    fn analyze(&self, request: &AnalysisRequest) -> Result<ServiceResponse> {
        self.requests.lock().unwrap().push(request.clone());
        Ok(self.response.clone())
    }
}

/// Blocks inside `analyze` until released, signalling when it has entered.
struct Gated {
    entered: Mutex<Sender<()>>,
    release: Mutex<Receiver<()>>,
    response: ServiceResponse,
}

impl AnalysisService for Gated {
    fn analyze(&self, _request: &AnalysisRequest) -> Result<ServiceResponse> {
        self.entered.lock().unwrap().send(()).unwrap();
        self.release.lock().unwrap().recv().unwrap();
        Ok(self.response.clone())
    }
}

fn gated(response: ServiceResponse) -> (Gated, Receiver<()>, Sender<()>) {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let service = Gated {
        entered: Mutex::new(entered_tx),
        release: Mutex::new(release_rx),
        response,
    };
    (service, entered_rx, release_tx)
}

/// Replays responses in order; `None` stands for an unreachable service.
struct Scripted(Mutex<Vec<Option<ServiceResponse>>>);

impl Scripted {
    fn new(mut script: Vec<Option<ServiceResponse>>) -> Self {
        script.reverse();
        Self(Mutex::new(script))
    }
}

impl AnalysisService for Scripted {
    fn analyze(&self, _request: &AnalysisRequest) -> Result<ServiceResponse> {
        match self.0.lock().unwrap().pop().flatten() {
            Some(response) => Ok(response),
            None => Err(FormAssistError::Transport("connection refused".into())),
        }
    }
}

struct BrokenCapture;

impl PageCapture for BrokenCapture {
    fn capture(&self, _doc: &Document) -> Result<Option<String>> {
        Err(FormAssistError::Transport("renderer unavailable".into()))
    }
}

struct FixedCapture;

impl PageCapture for FixedCapture {
    fn capture(&self, _doc: &Document) -> Result<Option<String>> {
        Ok(Some("data:image/jpeg;base64,AAAA".into()))
    }
}

// =========================================================================
// Analysis transitions
// =========================================================================

#[test]
fn successful_analysis_is_retained() {
    let session = AnalysisSession::new(Box::new(StaticAnalysisService::succeeding(email_and_color_result())));
    let doc = email_and_color_page();

    assert_eq!(session.phase(), Phase::Idle);
    let retained = session.start_analysis(&doc).unwrap();

    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(retained.result, email_and_color_result());
    assert_eq!(retained.model.len(), 1);
    assert!(Arc::ptr_eq(&retained, &session.latest().unwrap()));
}

#[test]
fn no_forms_fails_without_calling_the_service() {
    let service = Arc::new(StaticAnalysisService::succeeding(email_and_color_result()));
    let session = AnalysisSession::new(Box::new(Shared(Arc::clone(&service))));
    let doc = page(vec![el("p").text("Nothing to fill")]);

    let err = session.start_analysis(&doc).unwrap_err();

    assert!(matches!(err, FormAssistError::NoFormsFound));
    assert_eq!(err.to_string(), "No forms detected on this page");
    assert_eq!(service.call_count(), 0);
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.latest().is_none());
}

#[test]
fn service_reported_failure_surfaces_its_message() {
    let session = AnalysisSession::new(Box::new(StaticAnalysisService::failing("Not logged in")));
    let err = session.start_analysis(&email_and_color_page()).unwrap_err();

    match err {
        FormAssistError::Transport(msg) => assert_eq!(msg, "Not logged in"),
        other => panic!("expected Transport, got {:?}", other),
    }
    assert_eq!(session.phase(), Phase::Idle);
}

#[test]
fn success_without_analysis_payload_is_a_failure() {
    let response = ServiceResponse {
        success: true,
        analysis: None,
        error: None,
    };
    let session = AnalysisSession::new(Box::new(StaticAnalysisService::new(response)));
    assert!(matches!(
        session.start_analysis(&email_and_color_page()),
        Err(FormAssistError::Transport(_))
    ));
}

#[test]
fn transport_failure_returns_to_idle_and_keeps_previous_result() {
    let doc = email_and_color_page();
    let session = AnalysisSession::new(Box::new(Scripted::new(vec![
        Some(ServiceResponse::ok(email_and_color_result())),
        None,
        None,
    ])));
    let first = session.start_analysis(&doc).unwrap();

    assert!(matches!(session.start_analysis(&doc), Err(FormAssistError::Transport(_))));
    assert_eq!(session.phase(), Phase::Idle);
    assert!(Arc::ptr_eq(&session.latest().unwrap(), &first));

    // A retry after failure is accepted, not rejected as busy.
    assert!(matches!(session.start_analysis(&doc), Err(FormAssistError::Transport(_))));
}

#[test]
fn null_path_in_service_answer_is_skipped_not_fatal() {
    let service = StaticAnalysisService::from_json(
        r#"{"success":true,"analysis":{"fields":[
            {"path":null,"recommendedValue":"x"},
            {"path":"form[0]-input[0]","recommendedValue":"Ada"}
        ]}}"#,
    )
    .unwrap();
    let session = AnalysisSession::new(Box::new(service));
    let mut doc = email_and_color_page();

    let retained = session.start_analysis(&doc).unwrap();
    assert_eq!(retained.result.fields[0].path, "");

    let report = session.fill(&mut doc).unwrap();
    assert_eq!((report.filled, report.errors, report.skipped), (1, 0, 1));
    assert_eq!(doc.value(doc.elements_by_tag("input")[0]), "Ada");
}

#[test]
fn request_carries_model_user_and_capture() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let session = AnalysisSession::new(Box::new(Recording {
        requests: Arc::clone(&requests),
        response: ServiceResponse::ok(email_and_color_result()),
    }))
    .with_user_id(Some("user-42".into()))
    .with_capture(Box::new(FixedCapture));

    session.start_analysis(&email_and_color_page()).unwrap();

    let seen = requests.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].user_id.as_deref(), Some("user-42"));
    assert_eq!(seen[0].form_data.len(), 1);
    assert_eq!(seen[0].screenshot.as_deref(), Some("data:image/jpeg;base64,AAAA"));

    let json = serde_json::to_value(&seen[0]).unwrap();
    assert_eq!(json["userId"], "user-42");
    assert_eq!(json["formData"][0]["elements"][0]["label"], "Email");
}

#[test]
fn capture_failure_does_not_block_analysis() {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let session = AnalysisSession::new(Box::new(Recording {
        requests: Arc::clone(&requests),
        response: ServiceResponse::ok(email_and_color_result()),
    }))
    .with_capture(Box::new(BrokenCapture));

    assert!(session.start_analysis(&email_and_color_page()).is_ok());
    let seen = requests.lock().unwrap();
    assert!(seen[0].screenshot.is_none());
    assert!(serde_json::to_value(&seen[0]).unwrap()["screenshot"].is_null());
}

// =========================================================================
// Single flight
// =========================================================================

#[test]
fn second_start_while_in_flight_is_rejected_immediately() {
    let (service, entered, release) = gated(ServiceResponse::ok(email_and_color_result()));
    let session = AnalysisSession::new(Box::new(service));
    let doc = email_and_color_page();

    thread::scope(|s| {
        let first = s.spawn(|| session.start_analysis(&doc));
        entered.recv().unwrap();
        assert_eq!(session.phase(), Phase::Analyzing);

        let second = session.start_analysis(&doc);
        assert!(matches!(second, Err(FormAssistError::Busy)));
        assert_eq!(session.phase(), Phase::Analyzing, "rejection does not disturb the first");

        release.send(()).unwrap();
        let first = first.join().unwrap();
        assert_eq!(first.unwrap().result, email_and_color_result());
    });

    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.latest().is_some());
}

#[test]
fn fill_during_analysis_uses_last_completed_result() {
    let (service, entered, release) = gated(ServiceResponse::ok(email_and_color_result()));
    let session = AnalysisSession::new(Box::new(service));
    let doc = email_and_color_page();

    release.send(()).unwrap();
    let completed = session.start_analysis(&doc).unwrap();
    entered.recv().unwrap();

    thread::scope(|s| {
        let second = s.spawn(|| session.start_analysis(&doc));
        entered.recv().unwrap();

        let latest = session.latest().unwrap();
        assert!(Arc::ptr_eq(&latest, &completed));
        let mut copy = doc.clone();
        let report = session.fill(&mut copy).unwrap();
        assert_eq!(report.filled, 2);

        release.send(()).unwrap();
        let replaced = second.join().unwrap().unwrap();
        assert!(!Arc::ptr_eq(&replaced, &completed));
    });
}

// =========================================================================
// Fill
// =========================================================================

#[test]
fn fill_without_analysis_fails_and_mutates_nothing() {
    let session = AnalysisSession::new(Box::new(StaticAnalysisService::succeeding(email_and_color_result())));
    let mut doc = email_and_color_page();
    let before = doc.to_snapshot();

    let err = session.fill(&mut doc).unwrap_err();

    assert!(matches!(err, FormAssistError::NoResultAvailable));
    assert_eq!(doc.to_snapshot(), before);
    assert!(doc.events().is_empty());
}

#[test]
fn clear_drops_retained_result() {
    let session = AnalysisSession::new(Box::new(StaticAnalysisService::succeeding(email_and_color_result())));
    let mut doc = email_and_color_page();
    session.start_analysis(&doc).unwrap();

    session.clear();

    assert!(matches!(session.fill(&mut doc), Err(FormAssistError::NoResultAvailable)));
}

#[test]
fn analyze_then_fill_end_to_end() {
    let session = AnalysisSession::new(Box::new(StaticAnalysisService::succeeding(email_and_color_result())));
    let mut doc = email_and_color_page();

    let retained = session.start_analysis(&doc).unwrap();
    let paths: Vec<String> = retained.model[0].elements.iter().map(|f| f.path.to_string()).collect();
    assert_eq!(paths, vec!["form[0]-input[0]", "form[0]-select[0]"]);
    assert_eq!(retained.model[0].elements[0].label, "Email");

    let report = session.fill(&mut doc).unwrap();

    assert_eq!((report.filled, report.errors), (2, 0));
    assert_eq!(doc.value(doc.elements_by_tag("input")[0]), "a@b.com");
    assert_eq!(selected_text(&doc, doc.elements_by_tag("select")[0]), "Green");
}

#[test]
fn session_drift_policy_applies_to_fill() {
    let analysed = page(vec![el("form").children([
        el("input").attr("name", "first").attr("placeholder", "First"),
    ])]);
    let mut changed = page(vec![el("form").children([
        el("input").attr("name", "promo").attr("placeholder", "Promo code"),
        el("input").attr("name", "first").attr("placeholder", "First"),
    ])]);
    let result = AnalysisResult::from_fields(vec![FieldRecommendation::new("form[0]-input[0]", "Ada")]);
    let session = AnalysisSession::new(Box::new(StaticAnalysisService::succeeding(result)))
        .with_drift_policy(DriftPolicy::Reject);

    session.start_analysis(&analysed).unwrap();
    let report = session.fill(&mut changed).unwrap();

    assert_eq!((report.filled, report.errors), (0, 1));
    assert_eq!(changed.value(by_name(&changed, "input", "promo")), "");
}
