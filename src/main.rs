//! alignment-rejections - resource alignment rejection tally
//!
//! Runs the end2end test binary, captures its merged console output, and
//! counts "Resource alignment ... rejected" log lines by resource
//! descriptor, by test, and by DXGI format.
//!
//! Exit codes:
//!   0 - Success (including when no rejections were found)
//!   1 - Runtime error (launch, decode, descriptor parse, config, etc.)

mod analysis;
mod cli;
mod config;
mod error;
mod harness;
mod models;
mod report;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use harness::{CapturedOutput, LaunchOptions};
use models::{InvocationSpec, OutputSource, ReportMetadata};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    debug!("Arguments: {:?}", args);

    if let Err(e) = run(&args, &config) {
        error!("Tally failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: write a default config to the current directory.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    eprintln!("Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging to stderr so the report on stdout stays clean.
fn init_logging(args: &Args, config: &Config) {
    let mut level = args.log_level();
    if config.general.verbose && !args.quiet {
        level = tracing::Level::DEBUG;
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: tracing subscriber was already set");
    }
}

/// Capture output, tally rejections, print the report.
fn run(args: &Args, config: &Config) -> Result<()> {
    let (captured, source) = capture_output(args, config)?;

    let text = captured
        .into_text()
        .context("Failed to decode test output")?;

    let line_ending = config.parse.line_ending;
    let lines_scanned = analysis::split_lines(&text, line_ending).len();
    let tallies = analysis::aggregate(&text, line_ending);

    info!(
        "Scanned {} lines: {} rejections of {} unique resources",
        lines_scanned,
        tallies.total_rejections(),
        tallies.unique_resources()
    );

    let output = match args.format {
        OutputFormat::Text => report::generate_text_report(&tallies)?,
        OutputFormat::Json => {
            let metadata = ReportMetadata {
                generated_at: Utc::now(),
                backend: config.target.backend.clone(),
                adapter_vendor_id: config.target.adapter_vendor_id.clone(),
                source,
                lines_scanned,
            };
            let report = report::build_report(&tallies, metadata)?;
            let mut json = report::generate_json_report(&report)?;
            json.push('\n');
            json
        }
    };

    print!("{}", output);
    Ok(())
}

/// Launch the test binary, or replay captured output when --input is given.
fn capture_output(args: &Args, config: &Config) -> Result<(CapturedOutput, OutputSource)> {
    if let Some(ref input) = args.input {
        let captured = harness::read_captured(input)
            .with_context(|| format!("Failed to read captured output: {}", input.display()))?;
        let source = OutputSource::Replay {
            path: input.display().to_string(),
        };
        return Ok((captured, source));
    }

    let spec = build_invocation(config)?;
    let options = LaunchOptions {
        show_progress: !args.quiet,
    };

    let captured = harness::launch(&spec, &options)?;
    if let Some(code) = captured.exit_code {
        debug!("Test binary exit code: {}", code);
    }

    if let Some(ref save_path) = args.save_output {
        harness::save_captured(&captured, save_path)
            .with_context(|| format!("Failed to save output to {}", save_path.display()))?;
    }

    let source = OutputSource::Launch {
        command: spec.to_string(),
    };
    Ok((captured, source))
}

/// Build the test binary invocation from the merged configuration.
fn build_invocation(config: &Config) -> Result<InvocationSpec> {
    let target = &config.target;

    let repo_root = match target.repo_root {
        Some(ref root) => root.clone(),
        None => harness::default_repo_root().context("Failed to locate repository root")?,
    };

    let program = InvocationSpec::binary_path(&repo_root, &target.build_dir, &target.binary_name);
    if !program.exists() {
        warn!("Test binary not found at: {}", program.display());
    }

    Ok(InvocationSpec::new(
        program,
        &target.backend,
        &target.adapter_vendor_id,
        &target.extra_args,
    ))
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    match Config::load_default()? {
        Some(config) => Ok(config),
        None => Ok(Config::default()),
    }
}
