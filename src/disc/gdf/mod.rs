//! Games Disc Filesystem (GDF) decoding
//!
//! GDF is the filesystem found on Xbox and Xbox 360 optical media. A volume
//! descriptor sits in sector 32 of the filesystem, whose start depends on the
//! disc layout (see [`DiscType`]). Directory tables are arrays of 4-byte
//! aligned records that also form a binary search tree over entry names.

mod directory;
mod tree;
mod volume;

pub use directory::{
    Attributes, DirectoryEntry, DirectoryLocation, DirectoryTable, NO_CHILD,
};
pub use tree::Side;
pub use volume::{DiscType, VolumeDescriptor, DESCRIPTOR_SECTOR, MAGIC, SECTOR_SIZE};

use std::io;

use thiserror::Error;

use crate::disc::source::ImageSource;

/// Errors that can occur while decoding a GDF image
#[derive(Error, Debug)]
pub enum GdfError {
    #[error("Unrecognized disc type: no GDF volume descriptor found. Is this definitely an Xbox/360 image?")]
    UnrecognizedFormat,

    #[error(
        "Unexpected end of data reading {what} at offset {offset}: \
         {requested} bytes were requested, but only {actual} were read"
    )]
    TruncatedRead {
        what: &'static str,
        offset: u64,
        requested: usize,
        actual: usize,
    },

    #[error("Invalid ASCII in {what} at offset {offset}")]
    InvalidEncoding { what: &'static str, offset: u64 },

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Positioned little-endian field reader
///
/// Tracks an absolute byte position within the source and turns short reads
/// into [`GdfError::TruncatedRead`] tagged with the field being read.
pub(crate) struct FieldCursor<'a, S: ?Sized> {
    source: &'a mut S,
    position: u64,
}

impl<'a, S: ImageSource + ?Sized> FieldCursor<'a, S> {
    pub(crate) fn new(source: &'a mut S, position: u64) -> Self {
        Self { source, position }
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn bytes(&mut self, length: usize, what: &'static str) -> Result<Vec<u8>, GdfError> {
        let mut buffer = vec![0u8; length];
        self.fill(&mut buffer, what)?;
        Ok(buffer)
    }

    pub(crate) fn array<const N: usize>(&mut self, what: &'static str) -> Result<[u8; N], GdfError> {
        let mut buffer = [0u8; N];
        self.fill(&mut buffer, what)?;
        Ok(buffer)
    }

    pub(crate) fn u8(&mut self, what: &'static str) -> Result<u8, GdfError> {
        Ok(self.array::<1>(what)?[0])
    }

    pub(crate) fn u16_le(&mut self, what: &'static str) -> Result<u16, GdfError> {
        Ok(u16::from_le_bytes(self.array(what)?))
    }

    pub(crate) fn u32_le(&mut self, what: &'static str) -> Result<u32, GdfError> {
        Ok(u32::from_le_bytes(self.array(what)?))
    }

    /// Move forward to the next multiple of `alignment`
    pub(crate) fn align(&mut self, alignment: u64) {
        let remainder = self.position % alignment;
        if remainder > 0 {
            self.position += alignment - remainder;
        }
    }

    fn fill(&mut self, buffer: &mut [u8], what: &'static str) -> Result<(), GdfError> {
        let actual = self.source.read_at(self.position, buffer)?;
        if actual < buffer.len() {
            return Err(GdfError::TruncatedRead {
                what,
                offset: self.position,
                requested: buffer.len(),
                actual,
            });
        }
        self.position += actual as u64;
        Ok(())
    }
}

/// An opened GDF volume: the image source, its descriptor and root directory
pub struct GdfVolume<S> {
    source: S,
    descriptor: VolumeDescriptor,
    root: DirectoryTable,
}

impl<S: ImageSource> GdfVolume<S> {
    /// Locate the volume descriptor and decode the root directory table
    pub fn open(mut source: S) -> Result<Self, GdfError> {
        let descriptor = VolumeDescriptor::locate(&mut source)?;
        let root = DirectoryTable::decode(
            &mut source,
            descriptor.sector_size,
            descriptor.root_offset,
            descriptor.root_location(),
        )?;

        log::info!(
            "Opened {} volume: root directory has {} entries",
            descriptor.disc_type.display_name(),
            root.len()
        );

        Ok(Self {
            source,
            descriptor,
            root,
        })
    }

    pub fn descriptor(&self) -> &VolumeDescriptor {
        &self.descriptor
    }

    pub fn disc_type(&self) -> DiscType {
        self.descriptor.disc_type
    }

    /// The root directory table, decoded when the volume was opened
    pub fn root(&self) -> &DirectoryTable {
        &self.root
    }

    /// Decode the directory table stored at `location`
    pub fn decode_directory(&mut self, location: DirectoryLocation) -> Result<DirectoryTable, GdfError> {
        DirectoryTable::decode(
            &mut self.source,
            self.descriptor.sector_size,
            self.descriptor.root_offset,
            location,
        )
    }

    /// Decode the table of a subdirectory entry on demand
    pub fn decode_subdirectory(&mut self, entry: &DirectoryEntry) -> Result<DirectoryTable, GdfError> {
        if !entry.is_directory() {
            return Err(GdfError::NotADirectory(entry.name.clone()));
        }
        self.decode_directory(entry.location())
    }

    /// Read up to `length` bytes of an entry's data, starting `offset` bytes in
    pub fn read_entry_data(
        &mut self,
        entry: &DirectoryEntry,
        offset: u64,
        length: usize,
    ) -> Result<Vec<u8>, GdfError> {
        self.read_extent(entry.sector, entry.size as u64, offset, length)
    }

    /// Read from the extent of `size` bytes starting at `sector`
    ///
    /// The read is clamped to the extent, so reading past its end returns
    /// fewer bytes (or none). Bytes missing from the image inside the extent
    /// are a [`GdfError::TruncatedRead`].
    pub fn read_extent(
        &mut self,
        sector: u32,
        size: u64,
        offset: u64,
        length: usize,
    ) -> Result<Vec<u8>, GdfError> {
        let remaining = size.saturating_sub(offset);
        let length = remaining.min(length as u64) as usize;
        if length == 0 {
            return Ok(Vec::new());
        }

        let position = self.descriptor.data_position(sector) + offset;
        FieldCursor::new(&mut self.source, position).bytes(length, "file data")
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

/// Builders for synthetic GDF images used across the test modules
#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// One synthetic directory record
    pub(crate) struct Record<'a> {
        pub(crate) left: u16,
        pub(crate) right: u16,
        pub(crate) sector: u32,
        pub(crate) size: u32,
        pub(crate) attributes: u8,
        pub(crate) name: &'a [u8],
    }

    impl<'a> Record<'a> {
        pub(crate) fn file(name: &'a str, left: u16, right: u16) -> Self {
            Self {
                left,
                right,
                sector: 100,
                size: 1234,
                attributes: Attributes::ARCHIVE.bits(),
                name: name.as_bytes(),
            }
        }

        pub(crate) fn directory(name: &'a str, sector: u32, size: u32) -> Self {
            Self {
                left: NO_CHILD,
                right: 0,
                sector,
                size,
                attributes: Attributes::DIRECTORY.bits(),
                name: name.as_bytes(),
            }
        }
    }

    /// Encode a record, padded to the next 4-byte boundary
    pub(crate) fn encode_record(record: &Record<'_>) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&record.left.to_le_bytes());
        bytes.extend_from_slice(&record.right.to_le_bytes());
        bytes.extend_from_slice(&record.sector.to_le_bytes());
        bytes.extend_from_slice(&record.size.to_le_bytes());
        bytes.push(record.attributes);
        bytes.push(record.name.len() as u8);
        bytes.extend_from_slice(record.name);
        while bytes.len() % 4 != 0 {
            bytes.push(0);
        }
        bytes
    }

    /// Encode a terminator record (both children set to the sentinel)
    pub(crate) fn terminator() -> Vec<u8> {
        [NO_CHILD.to_le_bytes(), NO_CHILD.to_le_bytes()].concat()
    }

    /// Encode a full table from records
    pub(crate) fn encode_table(records: &[Record<'_>]) -> Vec<u8> {
        records.iter().flat_map(encode_record).collect()
    }

    /// Volume descriptor bytes: magic, root sector, root size, timestamp
    pub(crate) fn descriptor_bytes(root_sector: u32, root_size: u32, timestamp: [u8; 8]) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&root_sector.to_le_bytes());
        bytes.extend_from_slice(&root_size.to_le_bytes());
        bytes.extend_from_slice(&timestamp);
        bytes
    }

    /// Build an in-memory XSF image (filesystem at offset 0) with a root table
    pub(crate) fn xsf_image(root_sector: u32, root_table: &[u8], extra_sectors: u32) -> Vec<u8> {
        let sector = SECTOR_SIZE as usize;
        let root_start = root_sector as usize * sector;
        let root_sectors = root_table.len().div_ceil(sector).max(1);
        let total = root_start + (root_sectors + extra_sectors as usize) * sector;

        let mut image = vec![0u8; total.max((DESCRIPTOR_SECTOR as usize + 1) * sector)];
        let descriptor = descriptor_bytes(root_sector, root_table.len() as u32, [1, 2, 3, 4, 5, 6, 7, 8]);
        let descriptor_start = DESCRIPTOR_SECTOR as usize * sector;
        image[descriptor_start..descriptor_start + descriptor.len()].copy_from_slice(&descriptor);
        image[root_start..root_start + root_table.len()].copy_from_slice(root_table);
        image
    }
}
