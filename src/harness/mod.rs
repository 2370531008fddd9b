//! Running the end2end test binary.

pub mod launcher;

pub use launcher::{
    default_repo_root, launch, read_captured, save_captured, CapturedOutput, LaunchOptions,
};
