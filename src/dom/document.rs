use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::dom::snapshot::SnapshotNode;
use crate::error::{FormAssistError, Result};

/// Tags discovery collects as controls.
pub const CONTROL_TAGS: [&str; 3] = ["input", "select", "textarea"];

/// Input types a browser recognizes; anything else reads back as "text".
const INPUT_TYPES: [&str; 22] = [
    "text", "search", "tel", "url", "email", "password", "date", "month", "week", "time",
    "datetime-local", "number", "range", "color", "checkbox", "radio", "file", "submit",
    "image", "reset", "button", "hidden",
];

const DOCUMENT_TAG: &str = "#document";

/// Arena index of a node. Nodes are allocated in pre-order, so comparing ids
/// compares document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
}

/// A notification emitted on the page after a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchedEvent {
    pub target: NodeId,
    pub kind: EventKind,
    pub bubbles: bool,
}

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attrs: BTreeMap<String, String>,
    // Live state, seeded from attributes on load.
    dirty_value: Option<String>,
    checked: bool,
    selected: bool,
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

/// In-memory page: structure is fixed after load, control state is mutable.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    events: Vec<DispatchedEvent>,
}

impl Document {
    pub fn from_snapshot(root: &SnapshotNode) -> Self {
        let mut doc = Document {
            nodes: vec![Node {
                parent: None,
                children: vec![],
                data: NodeData::Element(ElementData {
                    tag: DOCUMENT_TAG.to_string(),
                    attrs: BTreeMap::new(),
                    dirty_value: None,
                    checked: false,
                    selected: false,
                }),
            }],
            events: vec![],
        };
        doc.append(NodeId(0), root);
        doc
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let root: SnapshotNode =
            serde_json::from_str(json).map_err(|e| FormAssistError::JsonParse {
                context: "page snapshot".into(),
                source: e,
            })?;
        Ok(Self::from_snapshot(&root))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FormAssistError::Io {
            context: format!("reading {}", path.display()),
            source: e,
        })?;
        Self::from_json(&content)
    }

    fn append(&mut self, parent: NodeId, snapshot: &SnapshotNode) {
        let id = NodeId(self.nodes.len());
        let data = match snapshot {
            SnapshotNode::Text { text } => NodeData::Text(text.clone()),
            SnapshotNode::Element { tag, attrs, .. } => NodeData::Element(ElementData {
                tag: tag.to_lowercase(),
                attrs: attrs.clone(),
                dirty_value: None,
                checked: attrs.contains_key("checked"),
                selected: attrs.contains_key("selected"),
            }),
        };
        self.nodes.push(Node {
            parent: Some(parent),
            children: vec![],
            data,
        });
        self.nodes[parent.0].children.push(id);

        if let SnapshotNode::Element { children, .. } = snapshot {
            for child in children {
                self.append(id, child);
            }
        }
    }

    /// Serialize the page back, writing live control state into attributes.
    pub fn to_snapshot(&self) -> Option<SnapshotNode> {
        self.nodes[0].children.first().map(|&root| self.snapshot_of(root))
    }

    fn snapshot_of(&self, id: NodeId) -> SnapshotNode {
        let node = &self.nodes[id.0];
        match &node.data {
            NodeData::Text(text) => SnapshotNode::Text { text: text.clone() },
            NodeData::Element(data) => {
                let mut attrs = data.attrs.clone();
                let mut children: Vec<SnapshotNode> =
                    node.children.iter().map(|&c| self.snapshot_of(c)).collect();

                match data.tag.as_str() {
                    "input" => {
                        if let Some(value) = &data.dirty_value {
                            attrs.insert("value".into(), value.clone());
                        }
                        toggle_attr(&mut attrs, "checked", data.checked);
                    }
                    "textarea" => {
                        if let Some(value) = &data.dirty_value {
                            children = vec![SnapshotNode::Text {
                                text: value.clone(),
                            }];
                        }
                    }
                    "option" => toggle_attr(&mut attrs, "selected", data.selected),
                    _ => {}
                }

                SnapshotNode::Element {
                    tag: data.tag.clone(),
                    attrs,
                    children,
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Structure
    // ------------------------------------------------------------------

    fn element(&self, id: NodeId) -> Option<&ElementData> {
        match &self.nodes.get(id.0)?.data {
            NodeData::Element(data) => Some(data),
            NodeData::Text(_) => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match &mut self.nodes.get_mut(id.0)?.data {
            NodeData::Element(data) => Some(data),
            NodeData::Text(_) => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id)
            .map(|e| e.tag.as_str())
            .filter(|t| *t != DOCUMENT_TAG)
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id)?.attrs.get(name).map(String::as_str)
    }

    /// Parent element, `None` at the top of the page.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes
            .get(id.0)?
            .parent
            .filter(|p| self.tag(*p).is_some())
    }

    fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[scope.0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    /// All elements of `tag` in the page, document order.
    pub fn elements_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.descendants_by_tag(NodeId(0), tag)
    }

    /// Elements of `tag` strictly inside `scope`, document order.
    pub fn descendants_by_tag(&self, scope: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants_matching(scope, &[tag])
    }

    /// Elements whose tag is any of `tags` strictly inside `scope`, document order.
    pub fn descendants_matching(&self, scope: NodeId, tags: &[&str]) -> Vec<NodeId> {
        if scope.0 >= self.nodes.len() {
            return vec![];
        }
        let tags: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        self.descendants(scope)
            .into_iter()
            .filter(|&id| self.tag(id).is_some_and(|t| tags.iter().any(|q| q == t)))
            .collect()
    }

    /// First `<label for="id">` in the page.
    pub fn label_for(&self, id: &str) -> Option<NodeId> {
        self.elements_by_tag("label")
            .into_iter()
            .find(|&l| self.attr(l, "for") == Some(id))
    }

    /// Concatenated text of all descendant text nodes, untrimmed.
    pub fn text_content(&self, id: NodeId) -> String {
        let Some(node) = self.nodes.get(id.0) else {
            return String::new();
        };
        if let NodeData::Text(text) = &node.data {
            return text.clone();
        }
        self.descendants(id)
            .into_iter()
            .filter_map(|d| match &self.nodes[d.0].data {
                NodeData::Text(text) => Some(text.as_str()),
                NodeData::Element(_) => None,
            })
            .collect()
    }

    // ------------------------------------------------------------------
    // Control state
    // ------------------------------------------------------------------

    /// Semantic control type: the input `type` (missing or unknown types are
    /// "text"), "select", "textarea", or the bare tag for anything else.
    pub fn control_type(&self, id: NodeId) -> String {
        match self.tag(id) {
            Some("input") => self
                .attr(id, "type")
                .map(|t| t.trim().to_lowercase())
                .filter(|t| INPUT_TYPES.contains(&t.as_str()))
                .unwrap_or_else(|| "text".to_string()),
            Some(tag) => tag.to_string(),
            None => String::new(),
        }
    }

    pub fn value(&self, id: NodeId) -> String {
        let Some(data) = self.element(id) else {
            return String::new();
        };
        if let Some(value) = &data.dirty_value {
            return value.clone();
        }
        match data.tag.as_str() {
            "textarea" => self.text_content(id),
            "select" => self
                .selected_option(id)
                .map(|o| self.option_value(o))
                .unwrap_or_default(),
            "option" => self.option_value(id),
            _ => data.attrs.get("value").cloned().unwrap_or_default(),
        }
    }

    /// Assign a control value. File inputs refuse programmatic values.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> std::result::Result<(), String> {
        if self.tag(id) == Some("input") && self.control_type(id) == "file" {
            return Err("file inputs do not accept programmatic values".into());
        }
        match self.element_mut(id) {
            Some(data) => {
                data.dirty_value = Some(value.to_string());
                Ok(())
            }
            None => Err(format!("node {} is not an element", id.0)),
        }
    }

    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.checked)
    }

    /// Set checked state. Checking a radio unchecks the rest of its group
    /// (same `name`, same form owner).
    pub fn set_checked(&mut self, id: NodeId, checked: bool) {
        if checked && self.control_type(id) == "radio" {
            if let Some(name) = self.attr(id, "name").filter(|n| !n.is_empty()) {
                let name = name.to_string();
                let owner = self.form_owner(id);
                let group: Vec<NodeId> = self
                    .elements_by_tag("input")
                    .into_iter()
                    .filter(|&other| {
                        other != id
                            && self.control_type(other) == "radio"
                            && self.attr(other, "name") == Some(name.as_str())
                            && self.form_owner(other) == owner
                    })
                    .collect();
                for other in group {
                    if let Some(data) = self.element_mut(other) {
                        data.checked = false;
                    }
                }
            }
        }
        if let Some(data) = self.element_mut(id) {
            data.checked = checked;
        }
    }

    fn form_owner(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.parent(id);
        while let Some(p) = current {
            if self.tag(p) == Some("form") {
                return Some(p);
            }
            current = self.parent(p);
        }
        None
    }

    /// `<option>` elements of a select, document order.
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants_by_tag(select, "option")
    }

    /// Option label with whitespace collapsed.
    pub fn option_text(&self, option: NodeId) -> String {
        self.text_content(option)
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn option_value(&self, option: NodeId) -> String {
        self.attr(option, "value")
            .map(str::to_string)
            .unwrap_or_else(|| self.option_text(option))
    }

    pub fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let options = self.options(select);
        options
            .iter()
            .copied()
            .find(|&o| self.element(o).is_some_and(|e| e.selected))
            .or_else(|| options.first().copied())
    }

    /// Make `option` the only selected option of `select`, as assigning
    /// `select.value` does, `multiple` or not.
    pub fn select_option(&mut self, select: NodeId, option: NodeId) {
        for o in self.options(select) {
            if let Some(data) = self.element_mut(o) {
                data.selected = false;
            }
        }
        if let Some(data) = self.element_mut(option) {
            data.selected = true;
        }
    }

    // ------------------------------------------------------------------
    // Events
    // ------------------------------------------------------------------

    pub fn dispatch_event(&mut self, target: NodeId, kind: EventKind) {
        self.events.push(DispatchedEvent {
            target,
            kind,
            bubbles: true,
        });
    }

    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<DispatchedEvent> {
        std::mem::take(&mut self.events)
    }
}

fn toggle_attr(attrs: &mut BTreeMap<String, String>, name: &str, on: bool) {
    if on {
        attrs.entry(name.to_string()).or_default();
    } else {
        attrs.remove(name);
    }
}
