use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttacheError {
    #[error("note not found: {0}")]
    NoteNotFound(PathBuf),

    #[error("folder not found: {0}")]
    FolderNotFound(String),

    #[error("attachment not found: {0}")]
    AttachmentNotFound(String),

    #[error("illegal character in {field}: {value:?}")]
    IllegalSetting { field: String, value: String },

    #[error("unknown setting: {0}")]
    UnknownSetting(String),

    #[error("invalid value for {key}: {value:?}")]
    InvalidSettingValue { key: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, AttacheError>;
