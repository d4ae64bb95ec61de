pub mod analysis_model;
pub mod capture;
pub mod service;
pub mod session;
