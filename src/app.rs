//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and initialises logging
//! - resolves settings (defaults, TOML file, flags)
//! - runs the analysis pipeline
//! - prints summaries
//! - writes optional exports

use clap::Parser;
use log::info;
use rayon::prelude::*;

use crate::cli::{AnalysisArgs, AnalyzeArgs, BatchArgs, Command, SynthArgs};
use crate::data::{SynthSpec, generate_isotherm};
use crate::domain::{Adsorbate, AnalysisConfig, GasKind};
use crate::error::AppError;
use crate::io::{build_report, load_settings, read_area_model, write_isotherm, write_prepared_csv, write_report_json};

pub mod pipeline;

/// Å² to m².
const ANGSTROM2_TO_M2: f64 = 1e-20;

/// Entry point for the `bet` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_logging();

    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Batch(args) => handle_batch(args),
        Command::Synth(args) => handle_synth(args),
    }
}

/// `RUST_LOG` controls verbosity; warnings are shown by default.
fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("warn");
    let _ = env_logger::Builder::from_env(env).try_init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.analysis)?;
    let model = args.model.as_deref().map(read_area_model).transpose()?;

    let run = pipeline::run_file(&args.file, &config, model.as_ref())?;
    let source = args.file.display().to_string();

    println!(
        "{}",
        crate::report::format_summary(&source, run.points.len(), &run.report, &config, run.predicted_area)
    );

    if let Some(path) = &args.export_json {
        let report = build_report(
            &run.report,
            &run.prepared.rows,
            &config,
            Some(&args.file),
            run.predicted_area,
        );
        write_report_json(path, &report)?;
        info!("Wrote report to {}.", path.display());
    }
    if let Some(path) = &args.export_csv {
        write_prepared_csv(path, &run.prepared.rows)?;
        info!("Wrote prepared table to {}.", path.display());
    }

    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.analysis)?;

    // One failing file does not stop the others.
    let results: Vec<Result<_, AppError>> = args
        .files
        .par_iter()
        .map(|path| pipeline::run_file(path, &config, None).map(|run| run.report))
        .collect();

    for (path, result) in args.files.iter().zip(&results) {
        println!("{}", crate::report::format_batch_line(path, result));
    }
    Ok(())
}

fn handle_synth(args: SynthArgs) -> Result<(), AppError> {
    let spec = SynthSpec {
        qm: args.qm,
        c: args.c,
        layers: args.layers,
        points: args.points,
        noise: args.noise,
        seed: args.seed,
        ..SynthSpec::default()
    };
    let points = generate_isotherm(&spec)?;
    write_isotherm(&args.out, &points)?;
    println!("Wrote {} points to {}.", points.len(), args.out.display());
    Ok(())
}

/// Resolve the analysis settings: defaults, then the settings file, then flags.
pub fn config_from_args(args: &AnalysisArgs) -> Result<AnalysisConfig, AppError> {
    let mut config = match &args.settings {
        Some(path) => load_settings(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(gas) = args.gas {
        config.adsorbate = adsorbate_from_args(gas, args)?;
    }
    if let Some(scope) = args.scope {
        config.scope = scope;
    }
    if let Some(v) = args.r2_cutoff {
        config.r2_cutoff = v;
    }
    if let Some(v) = args.r2_min {
        config.r2_min = v;
    }
    if let Some(v) = args.min_length {
        config.min_line_length = v;
    }
    if args.con1_limit.is_some() {
        config.manual.con1_limit = args.con1_limit;
    }
    if args.esw_minimum.is_some() {
        config.manual.esw_minimum = args.esw_minimum;
    }

    config.validate()?;
    Ok(config)
}

fn adsorbate_from_args(gas: GasKind, args: &AnalysisArgs) -> Result<Adsorbate, AppError> {
    match gas {
        GasKind::Argon => Ok(Adsorbate::Argon),
        GasKind::Nitrogen => Ok(Adsorbate::Nitrogen),
        GasKind::Custom => {
            let (Some(p_sat), Some(temperature), Some(cross_section)) =
                (args.p_sat, args.temperature, args.cross_section)
            else {
                return Err(AppError::new(
                    2,
                    "--gas custom needs --p-sat, --temperature and --cross-section.",
                ));
            };
            Ok(Adsorbate::Custom {
                p_sat,
                temperature,
                cross_section: cross_section * ANGSTROM2_TO_M2,
            })
        }
    }
}
