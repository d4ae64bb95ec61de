use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dom::document::{CONTROL_TAGS, Document, NodeId};
use crate::forms::fingerprint::field_fingerprint;
use crate::forms::form_model::{FieldDescriptor, FormGroup, GroupKind};
use crate::forms::label::{PARENT_LABEL_MAX_CHARS, resolve_label};
use crate::forms::path::{ContainerKind, ElementPath};

/// Control types never reported to the service.
pub const EXCLUDED_TYPES: [&str; 3] = ["hidden", "submit", "button"];

/// Minimum control count for a `<div>` to count as a form-like group.
pub const FALLBACK_MIN_CONTROLS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryOptions {
    #[serde(default = "default_fallback_min_controls")]
    pub fallback_min_controls: usize,

    #[serde(default = "default_parent_label_max_chars")]
    pub parent_label_max_chars: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            fallback_min_controls: FALLBACK_MIN_CONTROLS,
            parent_label_max_chars: PARENT_LABEL_MAX_CHARS,
        }
    }
}

fn default_fallback_min_controls() -> usize { FALLBACK_MIN_CONTROLS }
fn default_parent_label_max_chars() -> usize { PARENT_LABEL_MAX_CHARS }

pub fn discover_forms(doc: &Document) -> Vec<FormGroup> {
    discover_forms_with(doc, &DiscoveryOptions::default())
}

/// Scan the page for form groups.
///
/// Every `<form>` with at least one eligible control becomes a group. Only when
/// no form qualifies, every `<div>` holding enough controls is scanned instead.
pub fn discover_forms_with(doc: &Document, options: &DiscoveryOptions) -> Vec<FormGroup> {
    let mut groups = Vec::new();

    for (form_index, form) in doc.elements_by_tag("form").into_iter().enumerate() {
        let elements = describe_controls(doc, ContainerKind::Form, form_index, form, options);
        if elements.is_empty() {
            continue;
        }
        groups.push(FormGroup {
            kind: GroupKind::Form,
            action: doc.attr(form, "action").unwrap_or_default().to_string(),
            method: doc
                .attr(form, "method")
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "get".to_string()),
            container_id: doc.attr(form, "id").unwrap_or_default().to_string(),
            elements,
        });
    }

    if !groups.is_empty() {
        debug!(groups = groups.len(), "discovered form groups");
        return groups;
    }

    for (div_index, div) in doc.elements_by_tag("div").into_iter().enumerate() {
        let control_count = doc.descendants_matching(div, &CONTROL_TAGS).len();
        if control_count < options.fallback_min_controls {
            continue;
        }
        let elements = describe_controls(doc, ContainerKind::Div, div_index, div, options);
        if elements.is_empty() {
            continue;
        }
        groups.push(FormGroup {
            kind: GroupKind::FallbackGroup,
            action: String::new(),
            method: "unknown".to_string(),
            container_id: doc.attr(div, "id").unwrap_or_default().to_string(),
            elements,
        });
    }

    debug!(groups = groups.len(), "discovered fallback groups");
    groups
}

/// Describe eligible controls inside one container.
///
/// Element indices count per tag and include excluded controls, matching the
/// per-tag query `ElementPath::resolve` runs later.
fn describe_controls(
    doc: &Document,
    kind: ContainerKind,
    container_index: usize,
    container: NodeId,
    options: &DiscoveryOptions,
) -> Vec<FieldDescriptor> {
    let mut per_tag: HashMap<String, usize> = HashMap::new();
    let mut fields = Vec::new();

    for control in doc.descendants_matching(container, &CONTROL_TAGS) {
        let tag = doc.tag(control).unwrap_or_default().to_string();
        let counter = per_tag.entry(tag.clone()).or_insert(0);
        let element_index = *counter;
        *counter += 1;

        let field_type = doc.control_type(control);
        if EXCLUDED_TYPES.contains(&field_type.as_str()) {
            continue;
        }

        fields.push(describe_field(
            doc,
            control,
            ElementPath::new(kind, container_index, &tag, element_index),
            options,
        ));
    }

    fields
}

/// Build the descriptor for a single control at a known path.
pub fn describe_field(
    doc: &Document,
    control: NodeId,
    path: ElementPath,
    options: &DiscoveryOptions,
) -> FieldDescriptor {
    let tag = doc.tag(control).unwrap_or_default();
    let field_type = doc.control_type(control);
    let name = doc.attr(control, "name").unwrap_or_default().to_string();
    let dom_id = doc.attr(control, "id").unwrap_or_default().to_string();
    let label = resolve_label(doc, control, options.parent_label_max_chars);

    let select_options = (tag == "select").then(|| {
        doc.options(control)
            .into_iter()
            .map(|o| doc.option_text(o))
            .collect()
    });

    FieldDescriptor {
        fingerprint: field_fingerprint(tag, &field_type, &name, &dom_id, &label),
        field_type,
        name,
        dom_id,
        label,
        options: select_options,
        path,
    }
}
