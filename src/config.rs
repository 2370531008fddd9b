//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.alignment-rejections.toml` files.

use crate::cli::LineEnding;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = ".alignment-rejections.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Test binary settings.
    #[serde(default)]
    pub target: TargetConfig,

    /// Output parsing settings.
    #[serde(default)]
    pub parse: ParseConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

/// Where the test binary lives and how it is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Repository root. Unset means "parent of this executable's directory".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_root: Option<PathBuf>,

    /// Build directory relative to the repository root.
    #[serde(default = "default_build_dir")]
    pub build_dir: PathBuf,

    /// Binary name without platform suffix.
    #[serde(default = "default_binary_name")]
    pub binary_name: String,

    /// Value for `--backend`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Value for `--adapter-vendor-id`.
    #[serde(default = "default_vendor_id")]
    pub adapter_vendor_id: String,

    /// Appended after the backend and vendor arguments.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            repo_root: None,
            build_dir: default_build_dir(),
            binary_name: default_binary_name(),
            backend: default_backend(),
            adapter_vendor_id: default_vendor_id(),
            extra_args: Vec::new(),
        }
    }
}

fn default_build_dir() -> PathBuf {
    Path::new("out").join("debug")
}

fn default_binary_name() -> String {
    "dawn_end2end_tests".to_string()
}

fn default_backend() -> String {
    "d3d12".to_string()
}

fn default_vendor_id() -> String {
    "0x8086".to_string() // Intel
}

/// Settings for splitting captured output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseConfig {
    /// Line terminator; gtest output on Windows uses CRLF.
    #[serde(default)]
    pub line_ending: LineEnding,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence; only explicitly provided values override.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref root) = args.repo_root {
            self.target.repo_root = Some(root.clone());
        }
        if let Some(ref build_dir) = args.build_dir {
            self.target.build_dir = build_dir.clone();
        }
        if let Some(ref binary) = args.binary {
            self.target.binary_name = binary.clone();
        }
        if let Some(ref backend) = args.backend {
            self.target.backend = backend.clone();
        }
        if let Some(ref vendor_id) = args.adapter_vendor_id {
            self.target.adapter_vendor_id = vendor_id.clone();
        }
        if let Some(line_ending) = args.line_ending {
            self.parse.line_ending = line_ending;
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
