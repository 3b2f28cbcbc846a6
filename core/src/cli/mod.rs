pub mod report;

use crate::types::ResolverConfig;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Command-line arguments for rtcurate
#[derive(Parser, Debug)]
#[command(name = "rtcurate")]
#[command(about = "Resolve RT treatment records and triage DICOM scan folders")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub resolver: ResolverArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve every <patient>/<timepoint> session below BASE into OUT
    Resolve {
        #[arg(value_name = "BASE")]
        base: PathBuf,
        #[arg(value_name = "OUT")]
        out: PathBuf,
    },
    /// Reduce one diagnostic scan folder to a single series and copy it to OUT
    Check {
        #[arg(value_name = "SCAN_DIR")]
        scan_dir: PathBuf,
        #[arg(value_name = "OUT")]
        out: PathBuf,
    },
    /// Sort a raw <patient>/<timepoint>/<folder> export into the session layout
    Sort {
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        #[arg(value_name = "OUT")]
        out: PathBuf,
    },
}

/// Resolver options shared by all subcommands
#[derive(Args, Debug, Clone)]
pub struct ResolverArgs {
    /// Decompression command, run as `<cmd> <file> <file>`
    #[arg(long, value_name = "CMD", default_value = "gdcmconv --raw", global = true)]
    pub decompressor: String,

    /// Leave ROI names of the selected structure set untouched
    #[arg(long, global = true)]
    pub no_sanitize: bool,

    /// Use doses pointing back at the plan when the plan lists none
    #[arg(long, global = true)]
    pub dose_back_references: bool,

    /// Resolve sessions in parallel
    #[arg(long, global = true)]
    pub parallel: bool,
}

impl ResolverArgs {
    /// Builds the resolver configuration from the flags
    pub fn config(&self) -> ResolverConfig {
        ResolverConfig::default()
            .with_decompress_command(self.decompressor.split_whitespace())
            .sanitize_roi_names(!self.no_sanitize)
            .dose_back_references(self.dose_back_references)
            .parallel(self.parallel)
    }
}

/// Output format options
#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
    /// File paths only (one per line)
    Paths,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::parse_from([
            "rtcurate",
            "resolve",
            "in",
            "out",
            "--decompressor",
            "dcmdjpeg",
            "--no-sanitize",
            "--parallel",
            "-f",
            "paths",
        ]);
        assert!(matches!(cli.command, Command::Resolve { .. }));
        assert!(matches!(cli.format, OutputFormat::Paths));

        let config = cli.resolver.config();
        assert_eq!(config.decompress_command, vec!["dcmdjpeg".to_string()]);
        assert!(!config.sanitize_roi_names);
        assert!(config.parallel);
        assert!(!config.dose_back_references);
    }

    #[test]
    fn test_default_config_matches_library_default() {
        let cli = Cli::parse_from(["rtcurate", "check", "scan", "out"]);
        assert_eq!(cli.resolver.config(), ResolverConfig::default());
    }
}
