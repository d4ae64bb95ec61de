use sha1::{Digest, Sha1};

/// Content hash of a control's identifying attributes.
///
/// Used to notice when a positional path lands on a different control at fill
/// time than the one described during analysis.
pub fn field_fingerprint(tag: &str, field_type: &str, name: &str, dom_id: &str, label: &str) -> String {
    let mut hasher = Sha1::new();
    for part in [tag, field_type, name, dom_id, label] {
        hasher.update(part.as_bytes());
        hasher.update([0x1f]);
    }
    format!("{:x}", hasher.finalize())
}
