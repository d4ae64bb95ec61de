//! Positional addresses for form controls.
//!
//! A path such as `form[0]-input[3]` means "the fourth `<input>` inside the
//! first `<form>` of the page". Both indices count *every* element matching
//! the query in document order, so discovery and fill compute the same
//! numbers as long as the page structure has not changed in between.
//!
//! Paths are positional snapshots, not persistent identifiers: if elements are
//! inserted or removed before the target between analysis and fill, a path can
//! resolve to a different control. Only out-of-range indices are detected here.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::dom::document::{Document, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Form,
    Div,
}

impl ContainerKind {
    pub fn tag(self) -> &'static str {
        match self {
            ContainerKind::Form => "form",
            ContainerKind::Div => "div",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "form" => Some(ContainerKind::Form),
            "div" => Some(ContainerKind::Div),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementPath {
    pub container: ContainerKind,
    pub container_index: usize,
    pub tag: String,
    pub element_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("malformed path '{0}'")]
    Malformed(String),

    #[error("{kind}[{index}] out of range ({count} in document)")]
    ContainerOutOfRange {
        kind: &'static str,
        index: usize,
        count: usize,
    },

    #[error("{tag}[{index}] out of range ({count} in container)")]
    ElementOutOfRange {
        tag: String,
        index: usize,
        count: usize,
    },
}

impl ElementPath {
    pub fn new(container: ContainerKind, container_index: usize, tag: &str, element_index: usize) -> Self {
        Self {
            container,
            container_index,
            tag: tag.to_lowercase(),
            element_index,
        }
    }

    /// Re-run the discovery queries against the current page.
    pub fn resolve(&self, doc: &Document) -> Result<NodeId, PathError> {
        let containers = doc.elements_by_tag(self.container.tag());
        let container = *containers
            .get(self.container_index)
            .ok_or(PathError::ContainerOutOfRange {
                kind: self.container.tag(),
                index: self.container_index,
                count: containers.len(),
            })?;

        let elements = doc.descendants_by_tag(container, &self.tag);
        elements
            .get(self.element_index)
            .copied()
            .ok_or_else(|| PathError::ElementOutOfRange {
                tag: self.tag.clone(),
                index: self.element_index,
                count: elements.len(),
            })
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]-{}[{}]",
            self.container.tag(),
            self.container_index,
            self.tag,
            self.element_index
        )
    }
}

impl FromStr for ElementPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || PathError::Malformed(s.to_string());

        let mut parts = s.split('-');
        let (Some(container), Some(element), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed());
        };

        let (kind, container_index) = parse_segment(container).ok_or_else(malformed)?;
        let container = ContainerKind::from_tag(kind).ok_or_else(malformed)?;
        let (tag, element_index) = parse_segment(element).ok_or_else(malformed)?;

        Ok(ElementPath::new(container, container_index, tag, element_index))
    }
}

/// `name[digits]`, nothing before or after.
fn parse_segment(segment: &str) -> Option<(&str, usize)> {
    let (name, rest) = segment.split_once('[')?;
    let digits = rest.strip_suffix(']')?;

    let name_ok = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    let digits_ok = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit());
    if !name_ok || !digits_ok {
        return None;
    }

    Some((name, digits.parse().ok()?))
}

impl Serialize for ElementPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ElementPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
