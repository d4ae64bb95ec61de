use serde::{Deserialize, Serialize};

use crate::forms::path::ElementPath;

/// One discovered control, as sent to the analysis service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    #[serde(rename = "type")]
    pub field_type: String,
    pub name: String,
    #[serde(rename = "id")]
    pub dom_id: String,
    pub label: String,
    /// Option labels, only for selects.
    pub options: Option<Vec<String>>,
    pub path: ElementPath,
    pub fingerprint: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupKind {
    Form,
    /// A `<div>` holding enough controls to look like a form.
    FallbackGroup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormGroup {
    pub kind: GroupKind,
    pub action: String,
    pub method: String,
    #[serde(rename = "id")]
    pub container_id: String,
    pub elements: Vec<FieldDescriptor>,
}

impl FormGroup {
    pub fn field(&self, path: &ElementPath) -> Option<&FieldDescriptor> {
        self.elements.iter().find(|f| &f.path == path)
    }
}
