//! BET model functions and the binned-loading area predictor.
//!
//! Models are implemented as small, pure functions so that fitting/search code can
//! stay generic.

pub mod bet;
pub mod predictor;

pub use bet::*;
pub use predictor::*;
