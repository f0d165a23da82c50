//! Input/output helpers.
//!
//! - isotherm file ingest + validation (`ingest`)
//! - CSV exports (`export`)
//! - JSON analysis reports (`report`)
//! - TOML settings and model files (`settings`)

pub mod export;
pub mod ingest;
pub mod report;
pub mod settings;

pub use export::*;
pub use ingest::*;
pub use report::*;
pub use settings::*;
