use thiserror::Error;

pub type Result<T> = std::result::Result<T, FormAssistError>;

#[derive(Debug, Error)]
pub enum FormAssistError {
    /// startAnalysis arrived while another analysis is still in flight
    #[error("Analysis already in progress")]
    Busy,

    /// Discovery produced no form groups; the service is never called
    #[error("No forms detected on this page")]
    NoFormsFound,

    /// fillForm arrived before any analysis succeeded
    #[error("Please analyze the form first")]
    NoResultAvailable,

    /// Service call failed, or the service answered with success != true
    #[error("Analysis failed: {0}")]
    Transport(String),

    #[error("JSON parse error ({context}): {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON serialize error ({context}): {source}")]
    JsonSerialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}
