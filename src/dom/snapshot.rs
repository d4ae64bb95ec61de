use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Serialized page as produced by the DOM extraction side.
///
/// Text nodes are `{"text": "..."}`, elements are
/// `{"tag": "...", "attrs": {...}, "children": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnapshotNode {
    // Element first: untagged matching tries variants in order.
    Element {
        tag: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        attrs: BTreeMap<String, String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        children: Vec<SnapshotNode>,
    },
    Text {
        text: String,
    },
}

// ============================================================================
// Builders
// ============================================================================

/// Start an element node: `el("input").attr("type", "email")`.
pub fn el(tag: &str) -> SnapshotNode {
    SnapshotNode::Element {
        tag: tag.to_lowercase(),
        attrs: BTreeMap::new(),
        children: vec![],
    }
}

/// A bare text node.
pub fn text(content: &str) -> SnapshotNode {
    SnapshotNode::Text {
        text: content.to_string(),
    }
}

impl SnapshotNode {
    /// Set an attribute. No-op on text nodes.
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        if let SnapshotNode::Element { attrs, .. } = &mut self {
            attrs.insert(name.to_lowercase(), value.to_string());
        }
        self
    }

    /// Append a child. No-op on text nodes.
    pub fn child(mut self, node: SnapshotNode) -> Self {
        if let SnapshotNode::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = SnapshotNode>) -> Self {
        if let SnapshotNode::Element { children, .. } = &mut self {
            children.extend(nodes);
        }
        self
    }

    /// Shorthand for a child text node.
    pub fn text(self, content: &str) -> Self {
        self.child(text(content))
    }

    pub fn tag(&self) -> Option<&str> {
        match self {
            SnapshotNode::Element { tag, .. } => Some(tag),
            SnapshotNode::Text { .. } => None,
        }
    }
}

/// `<select>` with one `<option>` per label; option values default to their text.
pub fn select_with_options(options: &[&str]) -> SnapshotNode {
    el("select").children(options.iter().map(|o| el("option").text(o)))
}
