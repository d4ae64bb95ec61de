use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::forms::form_model::FormGroup;

// ============================================================================
// Service output
// ============================================================================

/// One recommendation keyed by the path discovery emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRecommendation {
    #[serde(default, deserialize_with = "nullable_string")]
    pub path: String,
    #[serde(
        rename = "recommendedValue",
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub recommended_value: Option<String>,
}

impl FieldRecommendation {
    pub fn new(path: &str, value: &str) -> Self {
        Self {
            path: path.to_string(),
            recommended_value: Some(value.to_string()),
        }
    }
}

/// Recommendations returned by one successful analysis. Replaced wholesale,
/// never edited.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub fields: Vec<FieldRecommendation>,
    /// Anything else the service returned (summaries, notes), passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    pub fn from_fields(fields: Vec<FieldRecommendation>) -> Self {
        Self {
            fields,
            extra: Map::new(),
        }
    }
}

/// A `null` path is the same as a missing one: the field is skipped at fill time.
fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Services answer checkboxes with `true` and quantities with `3` as often as
/// with strings; all scalars become their string form.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => {
            warn!(value = %other, "ignoring non-scalar recommendedValue");
            None
        }
    })
}

// ============================================================================
// Service wire format
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    #[serde(rename = "userId", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(rename = "formData")]
    pub form_data: Vec<FormGroup>,
    /// Data URL of a page capture, when one was taken.
    pub screenshot: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub analysis: Option<AnalysisResult>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ServiceResponse {
    pub fn ok(analysis: AnalysisResult) -> Self {
        Self {
            success: true,
            analysis: Some(analysis),
            error: None,
        }
    }

    pub fn failed(error: &str) -> Self {
        Self {
            success: false,
            analysis: None,
            error: Some(error.to_string()),
        }
    }
}
