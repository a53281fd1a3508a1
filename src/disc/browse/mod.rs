//! Disc filesystem browsing module
//!
//! Provides functionality for browsing files on GDF disc images stored either
//! as plain sector dumps or inside CHD containers.

pub mod entry;
pub mod filesystem;
pub mod gdf_fs;

pub use entry::{sort_directories_first, EntryType, FileEntry};
pub use filesystem::{Filesystem, FilesystemError};
pub use gdf_fs::GdfFilesystem;

use std::path::Path;

use crate::disc::formats::DiscFormat;
use crate::disc::source::{ChdSource, ImageSource, StreamSource};

/// Open a GDF filesystem from a disc image path, selecting the reader by
/// container format
pub fn open_filesystem(path: &Path) -> Result<GdfFilesystem, FilesystemError> {
    if !path.exists() {
        return Err(FilesystemError::FileNotFound(path.to_path_buf()));
    }

    let format = DiscFormat::from_path(path).ok_or_else(|| {
        FilesystemError::UnsupportedFormat(
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
                .to_string(),
        )
    })?;

    log::info!("Opening {} as {}", path.display(), format.display_name());

    let source: Box<dyn ImageSource> = match format {
        DiscFormat::Iso => Box::new(StreamSource::open(path)?),
        DiscFormat::Chd => Box::new(ChdSource::open(path)?),
    };

    GdfFilesystem::new(source)
}
