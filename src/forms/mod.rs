pub mod discovery;
pub mod fingerprint;
pub mod form_model;
pub mod label;
pub mod path;
