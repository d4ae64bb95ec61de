use crate::dom::document::Document;
use crate::error::Result;

/// Optional visual capture attached to an analysis request.
pub trait PageCapture {
    /// An image data URL, or `None` when nothing was captured.
    fn capture(&self, doc: &Document) -> Result<Option<String>>;
}

pub struct NoCapture;

impl PageCapture for NoCapture {
    fn capture(&self, _doc: &Document) -> Result<Option<String>> {
        Ok(None)
    }
}
