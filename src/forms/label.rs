use crate::dom::document::{Document, NodeId};

/// Parent text at or above this length (UTF-16 code units) is treated as unrelated page content.
pub const PARENT_LABEL_MAX_CHARS: usize = 100;

/// Best-effort display label for a control; empty string when nothing fits.
///
/// Order: `<label for=id>` text, then `placeholder`, then the parent's text
/// when the parent is short enough to plausibly be a caption.
pub fn resolve_label(doc: &Document, control: NodeId, parent_max_chars: usize) -> String {
    if let Some(id) = doc.attr(control, "id").filter(|id| !id.is_empty()) {
        if let Some(label) = doc.label_for(id) {
            let text = doc.text_content(label).trim().to_string();
            if !text.is_empty() {
                return text;
            }
        }
    }

    if let Some(placeholder) = doc.attr(control, "placeholder").filter(|p| !p.is_empty()) {
        return placeholder.to_string();
    }

    if let Some(parent) = doc.parent(control) {
        let parent_text = doc.text_content(parent);
        // Measured in UTF-16 code units, like DOM string lengths.
        if parent_text.encode_utf16().count() < parent_max_chars {
            return parent_text.trim().to_string();
        }
    }

    String::new()
}
