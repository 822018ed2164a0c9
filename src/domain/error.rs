//! Domain error types.

/// Top-level error type for voltrader.
///
/// Only configuration and provider failures are errors. Empty or too-short
/// price history is absorbed by the engine into a neutral result.
#[derive(Debug, thiserror::Error)]
pub enum VoltraderError {
    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data provider error: {reason}")]
    Data { reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl VoltraderError {
    pub(crate) fn invalid(name: &str, reason: impl Into<String>) -> Self {
        VoltraderError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&VoltraderError> for std::process::ExitCode {
    fn from(err: &VoltraderError) -> Self {
        let code: u8 = match err {
            VoltraderError::Io(_) => 1,
            VoltraderError::ConfigParse { .. }
            | VoltraderError::ConfigMissing { .. }
            | VoltraderError::ConfigInvalid { .. } => 2,
            VoltraderError::Data { .. } => 3,
            VoltraderError::UnknownStrategy { .. } | VoltraderError::InvalidParameter { .. } => 4,
            VoltraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
