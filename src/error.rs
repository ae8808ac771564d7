use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Harness error taxonomy.
///
/// Every device-API failure is surfaced immediately. Only [`Error::Release`]
/// is non-fatal: it is reported without masking an in-flight primary error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no {0} device available")]
    DeviceNotFound(String),

    #[error("kernel source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("kernel build failed:\n{log}")]
    BuildFailed { log: String },

    #[error("kernel entry point not found: {0}")]
    KernelNotFound(String),

    #[error("device allocation failed: {0}")]
    Allocation(String),

    #[error("kernel argument mismatch: {0}")]
    InvalidArgument(String),

    #[error("dispatch failed: {0}")]
    Execution(String),

    #[error("result readback failed: {0}")]
    Readback(String),

    #[error("resource release failed: {0}")]
    Release(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn device_not_found<S: Into<String>>(class: S) -> Self {
        Error::DeviceNotFound(class.into())
    }

    pub fn build_failed<S: Into<String>>(log: S) -> Self {
        Error::BuildFailed { log: log.into() }
    }

    pub fn allocation<S: Into<String>>(msg: S) -> Self {
        Error::Allocation(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Error::InvalidArgument(msg.into())
    }

    pub fn execution<S: Into<String>>(msg: S) -> Self {
        Error::Execution(msg.into())
    }

    pub fn readback<S: Into<String>>(msg: S) -> Self {
        Error::Readback(msg.into())
    }

    pub fn release<S: Into<String>>(msg: S) -> Self {
        Error::Release(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }
}
