//! Maps `ccms-core`'s fatal errors plus this crate's own argument-validation
//! failures onto the exit codes spec.md §6/§7 names: 1 for a scan-layer
//! error (bad glob, bad query, bad regex), 2 for a CLI usage error.

use std::fmt;

use ccms_core::CoreError;

#[derive(Debug)]
pub enum AppError {
    Core(CoreError),
    Usage(String),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Core(_) => 1,
            AppError::Usage(_) => 2,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Core(e) => write!(f, "{e}"),
            AppError::Usage(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<CoreError> for AppError {
    fn from(e: CoreError) -> Self {
        AppError::Core(e)
    }
}
