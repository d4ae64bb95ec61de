use std::io::{BufRead, Write};

use tracing::{error, info};

use crate::analysis::session::AnalysisSession;
use crate::dom::document::Document;
use crate::error::{FormAssistError, Result};
use crate::messaging::protocol::{Request, Response};

/// Owns one page and its analysis session and answers requests against them.
pub struct MessageHost {
    document: Document,
    session: AnalysisSession,
}

impl MessageHost {
    pub fn new(document: Document, session: AnalysisSession) -> Self {
        Self { document, session }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn session(&self) -> &AnalysisSession {
        &self.session
    }

    /// Every failure becomes `{success: false, error}`.
    pub fn handle(&mut self, request: &Request) -> Response {
        match request {
            Request::StartAnalysis => match self.session.start_analysis(&self.document) {
                Ok(retained) => Response::analyzed(retained.result.clone()),
                Err(e) => {
                    error!(error = %e, "analysis failed");
                    Response::failure(e)
                }
            },
            Request::FillForm => match self.session.fill(&mut self.document) {
                Ok(report) => Response::filled(&report),
                Err(e) => {
                    error!(error = %e, "form fill failed");
                    Response::failure(e)
                }
            },
            Request::Snapshot => Response::snapshot(self.document.to_snapshot()),
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(request) => self.handle(&request),
            Err(e) => Response::failure(format!("Invalid request: {}", e)),
        }
    }
}

/// One JSON request per input line, one JSON response per output line.
/// Blank lines are ignored; runs until the reader is exhausted.
pub fn serve_ndjson<R: BufRead, W: Write>(host: &mut MessageHost, reader: R, mut writer: W) -> Result<()> {
    let io_err = |context: &str| {
        let context = context.to_string();
        move |e: std::io::Error| FormAssistError::Io { context, source: e }
    };

    let mut handled = 0usize;
    for line in reader.lines() {
        let line = line.map_err(io_err("reading request"))?;
        if line.trim().is_empty() {
            continue;
        }

        let response = host.handle_line(line.trim());
        let json = serde_json::to_string(&response).map_err(|e| FormAssistError::JsonSerialize {
            context: "Response".into(),
            source: e,
        })?;
        writeln!(writer, "{}", json).map_err(io_err("writing response"))?;
        writer.flush().map_err(io_err("flushing response"))?;
        handled += 1;
    }

    info!(requests = handled, "message loop finished");
    Ok(())
}
