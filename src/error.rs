//! Error types.
//!
//! Two layers:
//!
//! - [`BetError`]: what the analysis engine can fail with (bad input, degenerate regressions).
//! - [`AppError`]: what the `bet` binary reports, carrying a process exit code.
//!
//! Running out of candidate regions is not an error; see `domain::FailureReason`.

use thiserror::Error;

/// Engine-level failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BetError {
    #[error("Insufficient data: {points} points, at least {required} required.")]
    InsufficientData { points: usize, required: usize },

    #[error("Degenerate region [{start}, {end}): {reason}")]
    DegenerateRegion {
        start: usize,
        end: usize,
        reason: String,
    },

    #[error("Invalid isotherm point at row {index}: {reason}")]
    InvalidPoint { index: usize, reason: String },

    #[error("Manual {name} override {index} is out of range for {len} rows.")]
    InvalidOverride {
        name: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl BetError {
    /// Exit code used when this error reaches the binary.
    pub fn exit_code(&self) -> u8 {
        match self {
            BetError::InsufficientData { .. } => 3,
            BetError::DegenerateRegion { .. } => 4,
            BetError::InvalidPoint { .. }
            | BetError::InvalidOverride { .. }
            | BetError::InvalidConfig(_) => 2,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<BetError> for AppError {
    fn from(err: BetError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
