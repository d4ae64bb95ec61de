use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::analysis::analysis_model::FieldRecommendation;
use crate::autofill::matching::{is_truthy, match_option};
use crate::dom::document::{Document, EventKind, NodeId};
use crate::forms::discovery::{DiscoveryOptions, describe_field};
use crate::forms::form_model::FormGroup;
use crate::forms::path::ElementPath;

/// What to do when the control at a path no longer looks like the one
/// described during analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriftPolicy {
    /// Positional addressing only.
    Ignore,
    /// Log and fill anyway.
    #[default]
    Warn,
    /// Count the field as an error and leave it untouched.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldFailure {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub filled: usize,
    pub errors: usize,
    /// No value, no matching option, or a non-truthy checkbox value.
    pub skipped: usize,
    pub failures: Vec<FieldFailure>,
}

enum FieldOutcome {
    Filled,
    Skipped(&'static str),
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    pub drift_policy: DriftPolicy,
    /// Must match the options used at discovery so fingerprints line up.
    pub discovery: DiscoveryOptions,
}

impl Reconciler {
    pub fn new(drift_policy: DriftPolicy, discovery: DiscoveryOptions) -> Self {
        Self {
            drift_policy,
            discovery,
        }
    }

    /// Apply every recommendation. Failures are per field and never stop the batch.
    ///
    /// `model` is the discovery output the recommendations were computed from;
    /// it is only consulted for drift checks and may be empty.
    pub fn apply(
        &self,
        doc: &mut Document,
        fields: &[FieldRecommendation],
        model: &[FormGroup],
    ) -> FillReport {
        let mut report = FillReport::default();

        for field in fields {
            let outcome = match field.recommended_value.as_deref() {
                Some(value) if !field.path.is_empty() && !value.is_empty() => {
                    self.apply_field(doc, &field.path, value, model)
                }
                _ => FieldOutcome::Skipped("no path or value"),
            };

            match outcome {
                FieldOutcome::Filled => {
                    debug!(path = %field.path, "filled");
                    report.filled += 1;
                }
                FieldOutcome::Skipped(reason) => {
                    debug!(path = %field.path, reason, "skipped");
                    report.skipped += 1;
                }
                FieldOutcome::Failed(reason) => {
                    debug!(path = %field.path, %reason, "failed");
                    report.errors += 1;
                    report.failures.push(FieldFailure {
                        path: field.path.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            filled = report.filled,
            errors = report.errors,
            skipped = report.skipped,
            "autofill complete"
        );
        report
    }

    fn apply_field(&self, doc: &mut Document, raw_path: &str, value: &str, model: &[FormGroup]) -> FieldOutcome {
        let path: ElementPath = match raw_path.parse() {
            Ok(p) => p,
            Err(e) => return FieldOutcome::Failed(e.to_string()),
        };
        let node = match path.resolve(doc) {
            Ok(n) => n,
            Err(e) => return FieldOutcome::Failed(e.to_string()),
        };
        if let Some(reason) = self.check_drift(doc, node, &path, model) {
            return FieldOutcome::Failed(reason);
        }

        apply_value(doc, node, value)
    }

    /// `Some(reason)` when the field must be rejected.
    fn check_drift(&self, doc: &Document, node: NodeId, path: &ElementPath, model: &[FormGroup]) -> Option<String> {
        if self.drift_policy == DriftPolicy::Ignore {
            return None;
        }
        let expected = model.iter().find_map(|g| g.field(path))?;
        let current = describe_field(doc, node, path.clone(), &self.discovery);
        if current.fingerprint == expected.fingerprint {
            return None;
        }

        match self.drift_policy {
            DriftPolicy::Reject => Some(format!(
                "control at {} changed since analysis (was '{}', now '{}')",
                path, expected.label, current.label
            )),
            _ => {
                warn!(
                    %path,
                    expected = %expected.label,
                    found = %current.label,
                    "control changed since analysis, filling anyway"
                );
                None
            }
        }
    }
}

fn apply_value(doc: &mut Document, node: NodeId, value: &str) -> FieldOutcome {
    if doc.tag(node) == Some("select") {
        let options = doc.options(node);
        let texts: Vec<String> = options.iter().map(|&o| doc.option_text(o)).collect();
        return match match_option(&texts, value) {
            Some(m) => {
                doc.select_option(node, options[m.index()]);
                doc.dispatch_event(node, EventKind::Change);
                FieldOutcome::Filled
            }
            None => FieldOutcome::Skipped("no matching option"),
        };
    }

    let control_type = doc.control_type(node);
    if control_type == "checkbox" || control_type == "radio" {
        if !is_truthy(value) {
            return FieldOutcome::Skipped("value is not truthy");
        }
        doc.set_checked(node, true);
        doc.dispatch_event(node, EventKind::Change);
        return FieldOutcome::Filled;
    }

    // Text-like controls, and any other element a path lands on, take the
    // value as-is.
    if let Err(reason) = doc.set_value(node, value) {
        return FieldOutcome::Failed(reason);
    }
    doc.dispatch_event(node, EventKind::Input);
    doc.dispatch_event(node, EventKind::Change);
    FieldOutcome::Filled
}
