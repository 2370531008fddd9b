//! Launching the test binary and capturing its output.
//!
//! stdout and stderr of the child share one pipe so their lines interleave
//! in the order the child wrote them.

use crate::error::{Result, TallyError};
use crate::models::InvocationSpec;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Raw result of one run of the test binary.
#[derive(Debug)]
pub struct CapturedOutput {
    /// Merged stdout/stderr bytes.
    pub bytes: Vec<u8>,
    /// Exit code, if the child exited normally.
    pub exit_code: Option<i32>,
}

impl CapturedOutput {
    /// Decode the captured bytes as UTF-8.
    pub fn into_text(self) -> Result<String> {
        Ok(String::from_utf8(self.bytes)?)
    }
}

/// Options for launching the test binary.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Whether to show a spinner on stderr while waiting.
    pub show_progress: bool,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            show_progress: true,
        }
    }
}

/// Repository root derived from where this tool's executable lives.
///
/// The tool is expected to sit one directory below the root
/// (e.g. `<repo>/scripts/`), so the root is the parent of its directory.
pub fn default_repo_root() -> Result<PathBuf> {
    let exe = std::env::current_exe()?;
    let exe_dir = exe.parent().unwrap_or_else(|| Path::new("."));
    let root = exe_dir.parent().unwrap_or(exe_dir);
    Ok(root.to_path_buf())
}

/// Run the test binary to completion and capture its merged output.
///
/// Blocks until the child closes its output and exits. A non-zero exit
/// status is logged and otherwise ignored.
pub fn launch(spec: &InvocationSpec, options: &LaunchOptions) -> Result<CapturedOutput> {
    info!("Launching: {}", spec);

    let (mut reader, writer) = std::io::pipe()?;
    let stderr_writer = writer.try_clone()?;

    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(writer)
        .stderr(stderr_writer);

    let mut child = command.spawn().map_err(|source| TallyError::Launch {
        program: spec.program.clone(),
        source,
    })?;

    // The parent's copies of the write end must be gone before reading, or
    // the read never sees EOF.
    drop(command);

    let spinner = if options.show_progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Waiting for test binary...");
        pb.enable_steady_tick(Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let mut bytes = Vec::new();
    let read_result = reader.read_to_end(&mut bytes);
    let status = child.wait();

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    read_result?;
    let status = status?;

    debug!("Captured {} bytes, exit status {}", bytes.len(), status);
    if !status.success() {
        warn!("Test binary exited with {}", status);
    }

    Ok(CapturedOutput {
        bytes,
        exit_code: status.code(),
    })
}

/// Read previously captured output from a file, or stdin for `-`.
pub fn read_captured(path: &Path) -> Result<CapturedOutput> {
    let bytes = if path.as_os_str() == "-" {
        info!("Reading captured output from stdin");
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        bytes
    } else {
        info!("Reading captured output from: {}", path.display());
        std::fs::read(path)?
    };

    Ok(CapturedOutput {
        bytes,
        exit_code: None,
    })
}

/// Write the raw captured bytes to `path` so the run can be replayed.
pub fn save_captured(captured: &CapturedOutput, path: &Path) -> Result<()> {
    std::fs::write(path, &captured.bytes)?;
    info!("Saved captured output to: {}", path.display());
    Ok(())
}
