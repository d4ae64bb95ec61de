pub mod host;
pub mod protocol;
