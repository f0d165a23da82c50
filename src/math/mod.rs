//! Mathematical utilities: straight-line least squares and normality testing.

pub mod ols;
pub mod shapiro;

pub use ols::*;
pub use shapiro::*;
