//! BET analysis pipeline.
//!
//! Responsibilities:
//!
//! - prepare isotherms and find their reference extrema
//! - fit and score candidate regions
//! - search for the best region (parallel per region end)
//! - drive the BET and BET+ESW analyses

pub mod analysis;
pub mod extremum;
pub mod prepare;
pub mod region;
pub mod selection;

pub use analysis::*;
pub use extremum::*;
pub use prepare::*;
pub use region::*;
pub use selection::*;
