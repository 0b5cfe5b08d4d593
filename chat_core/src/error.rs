use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while bringing the core up.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to find a data directory on this platform")]
    NoDataDir,

    #[error("config file {path} could not be accessed")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config file {path} is not valid json")]
    ConfigFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("data store unavailable")]
    Database(#[from] sea_orm::DbErr),
}
