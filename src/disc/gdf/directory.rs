//! GDF directory table decoding
//!
//! A directory table is a run of records, each padded to a 4-byte boundary:
//!
//! | Field       | Size |
//! |-------------|------|
//! | subtree_l   | 2    |
//! | subtree_r   | 2    |
//! | sector      | 4    |
//! | size        | 4    |
//! | attributes  | 1    |
//! | name_length | 1    |
//! | name        | n    |
//!
//! Unused slots carry the sentinel in both child fields and nothing else.

use bitflags::bitflags;
use serde::Serialize;

use super::{FieldCursor, GdfError};
use crate::disc::source::ImageSource;

/// Child index meaning "no such record"
pub const NO_CHILD: u16 = 0xFFFF;

/// Alignment of every record within a table
const RECORD_ALIGNMENT: u64 = 4;

bitflags! {
    /// Directory entry attribute flags
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize)]
    pub struct Attributes: u8 {
        const READ_ONLY = 0x01;
        const HIDDEN = 0x02;
        const SYSTEM = 0x04;
        /// `sector`/`size` address a subdirectory table rather than file data
        const DIRECTORY = 0x10;
        const ARCHIVE = 0x20;
        const NORMAL = 0x80;
    }
}

/// Sector and byte length of a directory table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DirectoryLocation {
    pub sector: u32,
    pub size: u32,
}

/// One record of a directory table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Index of the left child within the same table, or [`NO_CHILD`]
    pub subtree_l: u16,
    /// Index of the right child within the same table, or [`NO_CHILD`]
    pub subtree_r: u16,
    pub sector: u32,
    pub size: u32,
    pub attributes: Attributes,
    pub name_length: u8,
    pub name: String,
    /// Table this entry was decoded from. Coordinates only, so a parent can
    /// be decoded again without the entry keeping it alive.
    pub parent: DirectoryLocation,
}

impl DirectoryEntry {
    pub fn is_directory(&self) -> bool {
        self.attributes.contains(Attributes::DIRECTORY)
    }

    pub fn is_hidden(&self) -> bool {
        self.attributes.intersects(Attributes::HIDDEN | Attributes::SYSTEM)
    }

    /// Coordinates of this entry's own table (meaningful for directories)
    pub fn location(&self) -> DirectoryLocation {
        DirectoryLocation {
            sector: self.sector,
            size: self.size,
        }
    }

    /// Left child index, if present
    pub fn left(&self) -> Option<usize> {
        child_index(self.subtree_l)
    }

    /// Right child index, if present
    pub fn right(&self) -> Option<usize> {
        child_index(self.subtree_r)
    }
}

fn child_index(link: u16) -> Option<usize> {
    (link != NO_CHILD).then_some(link as usize)
}

/// A decoded directory table, entries in on-disk order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryTable {
    location: DirectoryLocation,
    entries: Vec<DirectoryEntry>,
}

impl DirectoryTable {
    /// Decode the table at `location`
    ///
    /// Covers exactly `location.size` bytes starting at
    /// `location.sector * sector_size + root_offset`. A record that starts
    /// inside that range is read in full even if it runs past the end.
    pub fn decode<S: ImageSource + ?Sized>(
        source: &mut S,
        sector_size: u32,
        root_offset: u64,
        location: DirectoryLocation,
    ) -> Result<Self, GdfError> {
        let base_position = location.sector as u64 * sector_size as u64 + root_offset;
        let end = base_position + location.size as u64;

        let mut cursor = FieldCursor::new(source, base_position);
        let mut entries = Vec::new();
        let mut empty_slots = 0usize;

        while cursor.position() < end {
            let subtree_l = cursor.u16_le("directory entry left subtree")?;
            let subtree_r = cursor.u16_le("directory entry right subtree")?;

            if subtree_l == NO_CHILD && subtree_r == NO_CHILD {
                empty_slots += 1;
                continue;
            }

            let sector = cursor.u32_le("directory entry sector")?;
            let size = cursor.u32_le("directory entry size")?;
            let attributes = Attributes::from_bits_retain(cursor.u8("directory entry attributes")?);
            let name_length = cursor.u8("directory entry name length")?;

            let name_offset = cursor.position();
            let name_bytes = cursor.bytes(name_length as usize, "directory entry name")?;
            let name = ascii_string(name_bytes, "directory entry name", name_offset)?;

            cursor.align(RECORD_ALIGNMENT);

            entries.push(DirectoryEntry {
                subtree_l,
                subtree_r,
                sector,
                size,
                attributes,
                name_length,
                name,
                parent: location,
            });
        }

        log::debug!(
            "Decoded directory table at sector {} ({} bytes): {} entries, {} empty slots",
            location.sector,
            location.size,
            entries.len(),
            empty_slots
        );

        Ok(Self { location, entries })
    }

    /// Coordinates this table was decoded from
    pub fn location(&self) -> DirectoryLocation {
        self.location
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Entry at a child index
    pub fn get(&self, index: usize) -> Option<&DirectoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DirectoryEntry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a DirectoryTable {
    type Item = &'a DirectoryEntry;
    type IntoIter = std::slice::Iter<'a, DirectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn ascii_string(bytes: Vec<u8>, what: &'static str, offset: u64) -> Result<String, GdfError> {
    if !bytes.is_ascii() {
        return Err(GdfError::InvalidEncoding { what, offset });
    }
    Ok(bytes.into_iter().map(char::from).collect())
}
