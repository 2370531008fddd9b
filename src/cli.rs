//! Command-line interface argument parsing.
//!
//! Every flag is optional: run with no arguments, the tool launches the
//! end2end test binary from the default build directory with the default
//! backend and adapter.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// alignment-rejections - tally resource alignment rejections
///
/// Runs the end2end test binary, captures its merged stdout/stderr, and
/// reports how often resource alignment was rejected, grouped by resource
/// descriptor, by test and by DXGI format.
///
/// Examples:
///   alignment-rejections
///   alignment-rejections --repo-root ~/src/gpgmm --backend d3d12
///   alignment-rejections --input captured.log --line-ending any
///   alignment-rejections --format json > rejections.json
///   alignment-rejections --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Repository root containing the build directory
    ///
    /// Defaults to the parent of the directory holding this executable.
    #[arg(long, value_name = "DIR")]
    pub repo_root: Option<PathBuf>,

    /// Build directory, relative to the repository root
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Test binary name (".exe" is appended on Windows)
    #[arg(long, value_name = "NAME")]
    pub binary: Option<String>,

    /// Backend passed to the test binary as --backend
    #[arg(long, value_name = "BACKEND", env = "ALIGNMENT_REJECTIONS_BACKEND")]
    pub backend: Option<String>,

    /// Adapter vendor id passed to the test binary as --adapter-vendor-id
    #[arg(long, value_name = "ID", env = "ALIGNMENT_REJECTIONS_VENDOR_ID")]
    pub adapter_vendor_id: Option<String>,

    /// Read previously captured output instead of launching the test binary
    ///
    /// Use "-" to read from standard input.
    #[arg(long, value_name = "FILE", conflicts_with = "save_output")]
    pub input: Option<PathBuf>,

    /// Save the raw captured output of the test binary to a file
    #[arg(long, value_name = "FILE")]
    pub save_output: Option<PathBuf>,

    /// Line terminator used to split the captured output
    #[arg(long, value_name = "ENDING")]
    pub line_ending: Option<LineEnding>,

    /// Report format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .alignment-rejections.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only, no spinner)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .alignment-rejections.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text summary (default)
    #[default]
    Text,
    /// JSON document
    Json,
}

/// How captured output is split into lines.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// Split on "\r\n" only (default)
    #[default]
    Crlf,
    /// Split on "\n" only
    Lf,
    /// Split on "\n" and strip a trailing "\r"
    Any,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref binary) = self.binary {
            if binary.trim().is_empty() {
                return Err("Binary name must not be empty".to_string());
            }
        }

        if let Some(ref root) = self.repo_root {
            if !root.is_dir() {
                return Err(format!(
                    "Repository root is not a directory: {}",
                    root.display()
                ));
            }
        }

        if let Some(ref input) = self.input {
            if input.as_os_str() != "-" && !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
