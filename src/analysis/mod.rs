//! Analysis of captured test output.

pub mod aggregator;
pub mod patterns;

pub use aggregator::*;
