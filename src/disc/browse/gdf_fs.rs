//! GDF filesystem implementation for directory listing and file reading

use super::entry::FileEntry;
use super::filesystem::{Filesystem, FilesystemError};
use crate::disc::gdf::{DirectoryTable, GdfVolume, VolumeDescriptor};
use crate::disc::source::ImageSource;

/// GDF filesystem implementation
///
/// Subdirectory tables are decoded each time they are listed; only the root
/// table is kept.
pub struct GdfFilesystem<S = Box<dyn ImageSource>> {
    volume: GdfVolume<S>,
}

impl<S: ImageSource> GdfFilesystem<S> {
    /// Create a new GDF filesystem from an image source
    pub fn new(source: S) -> Result<Self, FilesystemError> {
        Ok(Self {
            volume: GdfVolume::open(source)?,
        })
    }

    /// Volume descriptor of the opened image
    pub fn descriptor(&self) -> &VolumeDescriptor {
        self.volume.descriptor()
    }

    pub fn volume(&self) -> &GdfVolume<S> {
        &self.volume
    }

    /// Decode the directory table behind a directory entry
    fn directory_table(&mut self, entry: &FileEntry) -> Result<DirectoryTable, FilesystemError> {
        if entry.is_root() {
            return Ok(self.volume.root().clone());
        }

        let location = entry
            .directory_location()
            .ok_or_else(|| FilesystemError::NotADirectory(entry.path.clone()))?;
        Ok(self.volume.decode_directory(location)?)
    }

    fn file_sector(entry: &FileEntry) -> Result<u32, FilesystemError> {
        if !entry.is_file() {
            return Err(FilesystemError::NotAFile(entry.path.clone()));
        }
        u32::try_from(entry.location).map_err(|_| FilesystemError::NotAFile(entry.path.clone()))
    }
}

impl<S: ImageSource> Filesystem for GdfFilesystem<S> {
    fn root(&mut self) -> Result<FileEntry, FilesystemError> {
        Ok(FileEntry::root(self.volume.descriptor().root_location()))
    }

    fn list_directory(&mut self, entry: &FileEntry) -> Result<Vec<FileEntry>, FilesystemError> {
        let table = self.directory_table(entry)?;

        Ok(table
            .iter()
            .map(|record| FileEntry::from_directory_entry(record, &entry.path))
            .collect())
    }

    fn find_entry(&mut self, directory: &FileEntry, name: &str) -> Result<FileEntry, FilesystemError> {
        let table = self.directory_table(directory)?;

        table
            .find(name)
            .map(|record| FileEntry::from_directory_entry(record, &directory.path))
            .ok_or_else(|| {
                let path = if directory.is_root() {
                    format!("/{}", name)
                } else {
                    format!("{}/{}", directory.path, name)
                };
                FilesystemError::NotFound(path)
            })
    }

    fn read_file(&mut self, entry: &FileEntry) -> Result<Vec<u8>, FilesystemError> {
        let sector = Self::file_sector(entry)?;
        Ok(self.volume.read_extent(sector, entry.size, 0, entry.size as usize)?)
    }

    fn read_file_range(
        &mut self,
        entry: &FileEntry,
        offset: u64,
        length: usize,
    ) -> Result<Vec<u8>, FilesystemError> {
        let sector = Self::file_sector(entry)?;
        Ok(self.volume.read_extent(sector, entry.size, offset, length)?)
    }
}
