use clap::Parser;
use cpdv::cli::ExtractCli;
use cpdv::config::{self, Config};
use cpdv::{display, extract};
use std::path::PathBuf;

struct RuntimeConfig {
    export_json: Option<PathBuf>,
}

fn main() {
    let args = ExtractCli::parse();
    cpdv::init_tracing(args.verbose);

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(1);
        }
    };

    match run(&args, &config) {
        Ok(0) => {}
        Ok(failed) => {
            eprintln!("error: {} of {} captures failed", failed, args.files.len());
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Process every capture, continuing past per-file failures. Returns the
/// number of captures that failed.
fn run(args: &ExtractCli, config: &RuntimeConfig) -> Result<usize, Box<dyn std::error::Error>> {
    let verbose = args.verbose > 0;
    let mut reports = Vec::with_capacity(args.files.len());
    let mut failed = 0;

    for path in &args.files {
        if verbose {
            display::print_progress_start("Reading", path);
        }
        match extract::extract_file(path, args.mode) {
            Ok(report) => {
                if verbose {
                    display::print_progress_done();
                    display::print_flow_listing(&report);
                }
                reports.push(report);
            }
            Err(err) => {
                if verbose {
                    println!("failed.");
                }
                tracing::warn!(path = %path.display(), "capture skipped");
                eprintln!("error: {}", err);
                failed += 1;
            }
        }
    }

    if let Some(path) = &config.export_json {
        extract::write_report_json(path, &reports)?;
        tracing::info!(path = %path.display(), reports = reports.len(), "reports exported");
    }

    Ok(failed)
}

fn load_config(args: &ExtractCli) -> Result<RuntimeConfig, config::ConfigError> {
    let base = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut export_json = base.extract.export_json;
    if let Some(value) = &args.export_json {
        if value.as_os_str().is_empty() {
            export_json = None;
        } else {
            export_json = Some(value.clone());
        }
    }

    Ok(RuntimeConfig { export_json })
}
