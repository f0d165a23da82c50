//! Isotherm data sources that do not come from files.

pub mod synthetic;

pub use synthetic::*;
