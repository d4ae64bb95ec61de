//! Discover the forms on a page, send them to a recommendation service, and
//! later apply the returned values back onto the same page.
//!
//! Controls are addressed by positional paths (`form[0]-input[2]`) that both
//! the discovery pass and the fill pass compute from the same queries, so no
//! element handles need to survive between the two.

pub mod analysis;
pub mod autofill;
pub mod cli;
pub mod dom;
pub mod error;
pub mod forms;
pub mod messaging;

pub use analysis::session::AnalysisSession;
pub use autofill::reconciler::{DriftPolicy, FillReport};
pub use dom::document::Document;
pub use error::{FormAssistError, Result};
pub use forms::discovery::discover_forms;
