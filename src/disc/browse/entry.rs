//! File entry structures for disc filesystem browsing

use serde::Serialize;

use crate::disc::gdf::{Attributes, DirectoryEntry, DirectoryLocation};

/// Represents a single file or directory entry in a disc filesystem
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    /// File/directory name
    pub name: String,
    /// Full path from root (e.g., "/media/movies/intro.wmv")
    pub path: String,
    /// Entry type (file or directory)
    pub entry_type: EntryType,
    /// Size in bytes; for directories, the size of their directory table
    pub size: u64,
    /// Starting sector, relative to the filesystem start
    pub location: u64,
    pub attributes: Attributes,
}

/// Type of filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryType {
    File,
    Directory,
}

impl FileEntry {
    /// Create an entry from a decoded directory record
    pub fn from_directory_entry(entry: &DirectoryEntry, parent_path: &str) -> Self {
        let path = if parent_path == "/" {
            format!("/{}", entry.name)
        } else {
            format!("{}/{}", parent_path, entry.name)
        };

        Self {
            name: entry.name.clone(),
            path,
            entry_type: if entry.is_directory() {
                EntryType::Directory
            } else {
                EntryType::File
            },
            size: entry.size as u64,
            location: entry.sector as u64,
            attributes: entry.attributes,
        }
    }

    /// Create root directory entry
    pub fn root(location: DirectoryLocation) -> Self {
        Self {
            name: String::new(),
            path: "/".to_string(),
            entry_type: EntryType::Directory,
            size: location.size as u64,
            location: location.sector as u64,
            attributes: Attributes::DIRECTORY,
        }
    }

    /// Check if this is a directory
    pub fn is_directory(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    /// Check if this is a file
    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::File
    }

    /// Check if the entry is flagged hidden or system
    pub fn is_hidden(&self) -> bool {
        self.attributes.intersects(Attributes::HIDDEN | Attributes::SYSTEM)
    }

    /// Check if this is the root directory
    pub fn is_root(&self) -> bool {
        self.path == "/"
    }

    /// Directory table coordinates, for directory entries
    pub fn directory_location(&self) -> Option<DirectoryLocation> {
        if !self.is_directory() {
            return None;
        }
        Some(DirectoryLocation {
            sector: u32::try_from(self.location).ok()?,
            size: u32::try_from(self.size).ok()?,
        })
    }

    /// Get a display-friendly size string
    pub fn size_string(&self) -> String {
        if self.is_directory() {
            return String::new();
        }

        if self.size < 1024 {
            format!("{} B", self.size)
        } else if self.size < 1024 * 1024 {
            format!("{:.1} KB", self.size as f64 / 1024.0)
        } else if self.size < 1024 * 1024 * 1024 {
            format!("{:.1} MB", self.size as f64 / (1024.0 * 1024.0))
        } else {
            format!("{:.2} GB", self.size as f64 / (1024.0 * 1024.0 * 1024.0))
        }
    }
}

/// Sort entries for display: directories first, then by name
pub fn sort_directories_first(entries: &mut [FileEntry]) {
    entries.sort_by(|a, b| match (a.entry_type, b.entry_type) {
        (EntryType::Directory, EntryType::File) => std::cmp::Ordering::Less,
        (EntryType::File, EntryType::Directory) => std::cmp::Ordering::Greater,
        _ => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    });
}
