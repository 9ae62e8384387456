use std::fmt;

use mpq::MpqError;

pub mod chunk;
pub mod config;
pub mod datastore;
pub mod liquid;
pub mod map;
pub mod render;
pub mod selection;
pub mod texture_manager;
pub mod ui;
pub mod wmo;
pub mod world;

#[derive(Debug)]
pub enum EditorError {
    Mpq(MpqError),
    BinRw(binrw::Error),
    Config(::config::ConfigError),
    AssetNotFound(String),
    InvalidAsset(String),
    UniqueIdsExhausted,
}

impl From<MpqError> for EditorError {
    fn from(error: MpqError) -> EditorError {
        match error {
            MpqError::FileNotFound(path) => EditorError::AssetNotFound(path),
            other => EditorError::Mpq(other),
        }
    }
}

impl From<binrw::Error> for EditorError {
    fn from(error: binrw::Error) -> EditorError {
        EditorError::BinRw(error)
    }
}

impl From<::config::ConfigError> for EditorError {
    fn from(error: ::config::ConfigError) -> EditorError {
        EditorError::Config(error)
    }
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::Mpq(e) => write!(f, "archive error: {}", e),
            EditorError::BinRw(e) => write!(f, "parse error: {}", e),
            EditorError::Config(e) => write!(f, "configuration error: {}", e),
            EditorError::AssetNotFound(path) => write!(f, "asset {} not found", path),
            EditorError::InvalidAsset(reason) => write!(f, "invalid asset: {}", reason),
            EditorError::UniqueIdsExhausted => write!(f, "no unique id left for a new instance"),
        }
    }
}

impl std::error::Error for EditorError {}

pub type EditorResult<T> = Result<T, EditorError>;

#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::PathBuf;

    /// A fresh archive path in a per-process temporary directory.
    pub(crate) fn temp_archive_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rustbolt-editor-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = dir.join(name);
        let _ = std::fs::remove_file(&path);
        path
    }
}
