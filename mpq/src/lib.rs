use std::{fmt, path::PathBuf};

pub mod archive;
pub mod archive_manager;
pub mod constants;
pub mod file;
pub mod utils {
    pub mod compression;
    pub mod crypto;
    pub mod mpq;
}

pub use archive::MpqArchive;
pub use archive_manager::ArchiveManager;
pub use file::MpqFile;

#[derive(Debug)]
pub enum MpqError {
    Io(std::io::Error),
    BinRw(binrw::Error),
    InvalidArchive(String),
    FileNotFound(String),
    HashTableFull,
    ArchiveNotOpen(PathBuf),
    Unsupported(String),
}

impl From<std::io::Error> for MpqError {
    fn from(error: std::io::Error) -> MpqError {
        MpqError::Io(error)
    }
}

impl From<binrw::Error> for MpqError {
    fn from(error: binrw::Error) -> MpqError {
        MpqError::BinRw(error)
    }
}

impl fmt::Display for MpqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MpqError::Io(e) => write!(f, "I/O error: {}", e),
            MpqError::BinRw(e) => write!(f, "parse error: {}", e),
            MpqError::InvalidArchive(reason) => write!(f, "invalid archive: {}", reason),
            MpqError::FileNotFound(name) => write!(f, "requested file {} does not exist", name),
            MpqError::HashTableFull => write!(f, "archive hash table is full"),
            MpqError::ArchiveNotOpen(path) => write!(f, "archive {} is not open", path.display()),
            MpqError::Unsupported(what) => write!(f, "unsupported: {}", what),
        }
    }
}

impl std::error::Error for MpqError {}

pub type MpqResult<T> = Result<T, MpqError>;
