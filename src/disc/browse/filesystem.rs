//! Filesystem trait for disc image browsing

use std::path::PathBuf;

use super::entry::FileEntry;
use crate::disc::gdf::GdfError;
use thiserror::Error;

/// Errors that can occur during filesystem operations
#[derive(Debug, Error)]
pub enum FilesystemError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Gdf(#[from] GdfError),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Entry not found: {0}")]
    NotFound(String),
}

/// Abstraction over a browsable disc filesystem
pub trait Filesystem: Send {
    /// Get the root directory entry
    fn root(&mut self) -> Result<FileEntry, FilesystemError>;

    /// List contents of a directory, in on-disc order
    fn list_directory(&mut self, entry: &FileEntry) -> Result<Vec<FileEntry>, FilesystemError>;

    /// Look up a direct child of a directory by name
    fn find_entry(&mut self, directory: &FileEntry, name: &str) -> Result<FileEntry, FilesystemError>;

    /// Read entire file contents
    fn read_file(&mut self, entry: &FileEntry) -> Result<Vec<u8>, FilesystemError>;

    /// Read partial file contents (for large files)
    fn read_file_range(
        &mut self,
        entry: &FileEntry,
        offset: u64,
        length: usize,
    ) -> Result<Vec<u8>, FilesystemError>;
}
