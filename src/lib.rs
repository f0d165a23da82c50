//! `bet-area` library crate.
//!
//! BET surface-area analysis of gas adsorption isotherms: isotherm preparation,
//! reference extrema, region fitting with the Rouquerol consistency criteria, and
//! the BET / BET+ESW region search.
//!
//! The binary (`bet`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the engine can be embedded in other front-ends

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;

pub use domain::{AnalysisConfig, AnalysisReport, IsothermPoint};
pub use error::BetError;
pub use fit::analyze;
