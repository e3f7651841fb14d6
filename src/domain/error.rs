//! Domain error types.

/// Top-level error type for mtrbands.
#[derive(Debug, thiserror::Error)]
pub enum MtrBandsError {
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

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("{stage} requires {requires} to run first")]
    StageNotReady {
        stage: &'static str,
        requires: &'static str,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MtrBandsError> for std::process::ExitCode {
    fn from(err: &MtrBandsError) -> Self {
        let code: u8 = match err {
            MtrBandsError::Io(_) => 1,
            MtrBandsError::ConfigParse { .. }
            | MtrBandsError::ConfigMissing { .. }
            | MtrBandsError::ConfigInvalid { .. } => 2,
            MtrBandsError::DataSource { .. } | MtrBandsError::NoData { .. } => 3,
            MtrBandsError::StageNotReady { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
