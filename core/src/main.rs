use clap::Parser;
use log::{debug, error, info};
use rtcurate_core::cli::report::{ScanReport, SortReport, TextReport};
use rtcurate_core::cli::{Cli, Command, OutputFormat};
use rtcurate_core::diagnostics::Diagnostics;
use rtcurate_core::layout::{sort_export, SortedFolder};
use rtcurate_core::selection::{check_scan_folder, ScanCheck};
use rtcurate_core::{SessionReport, SessionResolver};
use std::path::Path;
use std::process;

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let resolver = SessionResolver::new(cli.resolver.config());
    debug!("Resolver configuration: {:?}", resolver.config());

    match &cli.command {
        Command::Resolve { base, out } => {
            require_dir(base);
            info!("Resolving sessions in {}", base.display());
            let reports = match resolver.process_tree(base, out) {
                Ok(reports) => reports,
                Err(e) => fail("Failed to resolve sessions", e),
            };
            if reports.is_empty() {
                eprintln!("Error: No <patient>/<timepoint> sessions found in {}", base.display());
                process::exit(1);
            }
            output_sessions(&reports, &cli.format);
            let failed = reports.iter().filter(|r| !r.is_written()).count();
            if failed > 0 {
                error!("{} of {} sessions failed", failed, reports.len());
                process::exit(1);
            }
        }
        Command::Check { scan_dir, out } => {
            require_dir(scan_dir);
            let mut diagnostics = Diagnostics::new(scan_dir.display().to_string());
            match check_scan_folder(scan_dir, out, resolver.decompressor(), &mut diagnostics) {
                Ok(check) => output_check(&check, &cli.format),
                Err(e) => fail("Failed to check scan folder", e),
            }
        }
        Command::Sort { input, out } => {
            require_dir(input);
            let mut diagnostics = Diagnostics::new(input.display().to_string());
            match sort_export(input, out, &mut diagnostics) {
                Ok(sorted) => output_sorted(&sorted, &cli.format),
                Err(e) => fail("Failed to sort export", e),
            }
        }
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn require_dir(path: &Path) {
    if !path.is_dir() {
        eprintln!("Error: {} is not a directory", path.display());
        process::exit(1);
    }
}

fn fail(context: &str, e: impl std::fmt::Display) -> ! {
    error!("{}: {}", context, e);
    eprintln!("Error: {}: {}", context, e);
    process::exit(1);
}

fn output_sessions(reports: &[SessionReport], format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            for report in reports {
                println!("{}", TextReport::new(report));
            }
        }
        OutputFormat::Paths => {
            for path in reports.iter().flat_map(|r| r.used_paths()) {
                println!("{}", path.display());
            }
        }
        OutputFormat::Json => output_json(&reports),
    }
}

fn output_check(check: &ScanCheck, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", ScanReport::new(check)),
        OutputFormat::Paths => {
            for path in &check.copied {
                println!("{}", path.display());
            }
        }
        OutputFormat::Json => output_json(check),
    }
}

fn output_sorted(sorted: &[SortedFolder], format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", SortReport::new(sorted)),
        OutputFormat::Paths => {
            for folder in sorted {
                println!("{}", folder.target.display());
            }
        }
        OutputFormat::Json => output_json(&sorted),
    }
}

#[cfg(feature = "json")]
fn output_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail("Failed to serialize to JSON", e),
    }
}

#[cfg(not(feature = "json"))]
fn output_json<T: ?Sized>(_value: &T) {
    eprintln!("Error: JSON output requires the 'json' feature");
    eprintln!("Rebuild with: cargo build --features json");
    process::exit(1);
}
