//! Rejection report output.

pub mod generator;

pub use generator::{build_report, generate_json_report, generate_text_report};
