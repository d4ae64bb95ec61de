use serde::{Deserialize, Serialize};

use crate::analysis::analysis_model::AnalysisResult;
use crate::autofill::reconciler::FillReport;
use crate::dom::snapshot::SnapshotNode;

/// A request from the orchestrating process: `{"action": "startAnalysis"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    StartAnalysis,
    FillForm,
    /// Current page state, including anything autofill changed.
    Snapshot,
}

/// Exactly one reply per request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalysisResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<SnapshotNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn analyzed(analysis: AnalysisResult) -> Self {
        Self {
            success: true,
            analysis: Some(analysis),
            ..Default::default()
        }
    }

    pub fn filled(report: &FillReport) -> Self {
        Self {
            success: true,
            filled_count: Some(report.filled),
            error_count: Some(report.errors),
            ..Default::default()
        }
    }

    pub fn snapshot(snapshot: Option<SnapshotNode>) -> Self {
        Self {
            success: true,
            snapshot,
            ..Default::default()
        }
    }

    pub fn failure(error: impl ToString) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
            ..Default::default()
        }
    }
}
