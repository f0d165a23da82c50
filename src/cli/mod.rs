//! Command-line parsing for the BET surface-area analyser.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the analysis code. Analysis flags are optional so that a value
//! given on the command line overrides the settings file, and an absent flag
//! leaves the settings file (or the default) in force.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{GasKind, Scope};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bet", version, about = "BET surface area from gas adsorption isotherms")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyse one isotherm and print the summary.
    Analyze(AnalyzeArgs),
    /// Analyse several isotherms in parallel, one summary line each.
    Batch(BatchArgs),
    /// Write a synthetic isotherm file.
    Synth(SynthArgs),
}

/// Settings shared by `analyze` and `batch`.
#[derive(Debug, Args, Clone, Default)]
pub struct AnalysisArgs {
    /// TOML settings file (applied before the flags below).
    #[arg(long, value_name = "TOML")]
    pub settings: Option<PathBuf>,

    /// Adsorbate.
    #[arg(long, value_enum)]
    pub gas: Option<GasKind>,

    /// Saturation pressure in Pa (custom gas).
    #[arg(long)]
    pub p_sat: Option<f64>,

    /// Adsorption temperature in K (custom gas).
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Molecular cross-section in Å² (custom gas).
    #[arg(long)]
    pub cross_section: Option<f64>,

    /// Which analyses to run.
    #[arg(long, value_enum)]
    pub scope: Option<Scope>,

    /// R² above which a fully consistent region ends the search.
    #[arg(long)]
    pub r2_cutoff: Option<f64>,

    /// Minimum R² for a candidate region.
    #[arg(long)]
    pub r2_min: Option<f64>,

    /// Minimum number of points in a region.
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Use this row as the consistency-1 bound instead of searching for it.
    #[arg(long)]
    pub con1_limit: Option<usize>,

    /// Use this row as the ESW minimum instead of searching for it.
    #[arg(long)]
    pub esw_minimum: Option<usize>,
}

#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Isotherm file (`.csv` comma separated, otherwise tab separated).
    pub file: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Export the report (results + fitted grids) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Export the prepared table to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Area-prediction model JSON; adds a predicted area to the summary.
    #[arg(long, value_name = "JSON")]
    pub model: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct BatchArgs {
    /// Isotherm files.
    #[arg(required = true, num_args = 1..)]
    pub files: Vec<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,
}

#[derive(Debug, Parser, Clone)]
pub struct SynthArgs {
    /// Output file (`.csv` comma separated, otherwise tab separated).
    #[arg(long)]
    pub out: PathBuf,

    /// Random seed.
    #[arg(long, default_value_t = 7)]
    pub seed: u64,

    /// Monolayer loading (mol/kg).
    #[arg(long, default_value_t = 10.0)]
    pub qm: f64,

    /// BET constant.
    #[arg(long, default_value_t = 100.0)]
    pub c: f64,

    /// Layers at saturation.
    #[arg(long, default_value_t = 4.0)]
    pub layers: f64,

    /// Number of points.
    #[arg(long, default_value_t = 40)]
    pub points: usize,

    /// Relative standard deviation of the loading noise.
    #[arg(long, default_value_t = 0.002)]
    pub noise: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_flags_parse() {
        let cli = Cli::parse_from([
            "bet",
            "analyze",
            "iso.txt",
            "--gas",
            "nitrogen",
            "--scope",
            "bet-esw",
            "--r2-min",
            "0.99",
            "--export-json",
            "out.json",
        ]);
        let Command::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.file, PathBuf::from("iso.txt"));
        assert_eq!(args.analysis.gas, Some(GasKind::Nitrogen));
        assert_eq!(args.analysis.scope, Some(Scope::BetAndBetEsw));
        assert_eq!(args.analysis.r2_min, Some(0.99));
        assert!(args.analysis.r2_cutoff.is_none());
        assert_eq!(args.export_json, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn batch_requires_files() {
        assert!(Cli::try_parse_from(["bet", "batch"]).is_err());
        let cli = Cli::try_parse_from(["bet", "batch", "a.txt", "b.csv"]).unwrap();
        let Command::Batch(args) = cli.command else {
            panic!("expected batch");
        };
        assert_eq!(args.files.len(), 2);
    }
}
