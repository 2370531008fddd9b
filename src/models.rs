//! Data models for the rejection tally.
//!
//! This module contains the invocation of the test binary, the tallies
//! built from its output, and the serialisable report.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

/// How to run the test binary. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationSpec {
    /// Absolute or repo-relative path to the executable.
    pub program: PathBuf,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
}

impl InvocationSpec {
    /// Build the standard invocation: backend and adapter vendor id, then extras.
    pub fn new(
        program: PathBuf,
        backend: &str,
        adapter_vendor_id: &str,
        extra_args: &[String],
    ) -> Self {
        let mut args = vec![
            format!("--backend={}", backend),
            format!("--adapter-vendor-id={}", adapter_vendor_id),
        ];
        args.extend(extra_args.iter().cloned());

        Self { program, args }
    }

    /// Resolve `<repo_root>/<build_dir>/<binary_name>[.exe]`.
    pub fn binary_path(repo_root: &Path, build_dir: &Path, binary_name: &str) -> PathBuf {
        let mut name = binary_name.to_string();
        if cfg!(windows) {
            name.push_str(".exe");
        }
        repo_root.join(build_dir).join(name)
    }
}

impl fmt::Display for InvocationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Counts accumulated from one pass over captured output.
///
/// Maps keep first-insertion order so ties in count-sorted listings are
/// reported in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionTallies {
    /// Rejections per distinct resource descriptor text.
    pub by_resource: IndexMap<String, usize>,
    /// Rejections per test name.
    pub by_test: IndexMap<String, usize>,
}

impl RejectionTallies {
    /// Record one rejection of `descriptor` while `test_name` was running.
    pub fn record(&mut self, descriptor: &str, test_name: &str) {
        *self.by_resource.entry(descriptor.to_string()).or_insert(0) += 1;
        *self.by_test.entry(test_name.to_string()).or_insert(0) += 1;
    }

    /// Number of distinct descriptors rejected.
    pub fn unique_resources(&self) -> usize {
        self.by_resource.len()
    }

    /// Total rejection lines seen.
    pub fn total_rejections(&self) -> usize {
        self.by_resource.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_resource.is_empty()
    }
}

/// Value of a descriptor's `"Format"` field.
///
/// Identity is the JSON value, so `10` and `"10"` are different formats even
/// though both display as `10`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FormatId {
    json: String,
    label: String,
}

impl FormatId {
    pub fn from_value(value: &Value) -> Self {
        let label = match value {
            Value::String(s) => s.clone(),
            Value::Bool(true) => "True".to_string(),
            Value::Bool(false) => "False".to_string(),
            Value::Null => "None".to_string(),
            other => other.to_string(),
        };

        Self {
            json: value.to_string(),
            label,
        }
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// A name and its count, as listed in a report section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyEntry {
    pub name: String,
    pub count: usize,
}

impl TallyEntry {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Where the analysed text came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OutputSource {
    /// Captured from a fresh run of the test binary.
    Launch { command: String },
    /// Replayed from a file or stdin.
    Replay { path: String },
}

/// Metadata about the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// Backend the test binary was asked to use.
    pub backend: String,
    /// Adapter vendor id the test binary was asked to use.
    pub adapter_vendor_id: String,
    /// Origin of the analysed output.
    pub source: OutputSource,
    /// Number of lines the output split into.
    pub lines_scanned: usize,
}

/// Complete rejection report. Sections are sorted ascending by count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionReport {
    pub metadata: ReportMetadata,
    /// Distinct resource descriptors rejected.
    pub unique_resources: usize,
    /// Total rejection lines.
    pub total_rejections: usize,
    pub by_resource: Vec<TallyEntry>,
    pub by_test: Vec<TallyEntry>,
    /// Distinct descriptors per format id.
    pub by_format: Vec<TallyEntry>,
}
