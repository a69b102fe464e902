use thiserror::Error;

use crate::core::types::{AssetId, CellId, ZoneId};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Zone not found: {0:?}")]
    ZoneNotFound(ZoneId),

    #[error("Cell not found: {0:?}")]
    CellNotFound(CellId),

    #[error("Asset not found: {0:?}")]
    AssetNotFound(AssetId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Corrupt snapshot: {0}")]
    CorruptSnapshot(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
