//! GDF volume descriptor location and parsing
//!
//! The descriptor lives in sector 32 of the filesystem. Where the filesystem
//! starts depends on the disc layout, so each known layout offset is probed
//! in turn for the magic identifier.

use serde::Serialize;

use super::directory::DirectoryLocation;
use super::{FieldCursor, GdfError};
use crate::disc::source::ImageSource;

/// GDF sector size in bytes (all supported layouts)
pub const SECTOR_SIZE: u32 = 2048;

/// Sector number, relative to the filesystem start, of the volume descriptor
pub const DESCRIPTOR_SECTOR: u64 = 32;

/// Identifier that opens every GDF volume descriptor
pub const MAGIC: &[u8; 20] = b"MICROSOFT*XBOX*MEDIA";

/// Known disc layouts, each placing the filesystem at a fixed byte offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiscType {
    /// Extracted/rebuilt image, filesystem at the start of the file
    Xsf,
    /// Original Xbox / XGD2 game partition
    Gdf,
    /// Xbox 360 XGD3 game partition
    Xgd3,
}

impl DiscType {
    /// Probe order used when locating the descriptor. First match wins.
    pub const PROBE_ORDER: [DiscType; 3] = [Self::Xsf, Self::Gdf, Self::Xgd3];

    /// Byte offset of the filesystem within the image
    pub const fn offset(self) -> u64 {
        match self {
            Self::Xsf => 0,
            Self::Gdf => 265_879_552,
            Self::Xgd3 => 34_078_720,
        }
    }

    /// Reverse lookup from a filesystem offset
    pub fn from_offset(offset: u64) -> Option<Self> {
        Self::PROBE_ORDER.into_iter().find(|t| t.offset() == offset)
    }

    /// Get the display name for this disc type
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Xsf => "XSF",
            Self::Gdf => "GDF",
            Self::Xgd3 => "XGD3",
        }
    }

    /// Absolute byte offset of the volume descriptor for this layout
    pub const fn descriptor_position(self) -> u64 {
        DESCRIPTOR_SECTOR * SECTOR_SIZE as u64 + self.offset()
    }
}

impl std::fmt::Display for DiscType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// GDF volume descriptor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeDescriptor {
    /// Magic identifier, always [`MAGIC`] once validated
    pub identifier: String,
    /// Layout the descriptor was found in
    pub disc_type: DiscType,
    /// Filesystem start; added to every sector-relative address
    pub root_offset: u64,
    /// Sector of the root directory table
    pub root_dir_sector: u32,
    /// Size of the root directory table in bytes
    pub root_dir_size: u32,
    /// Raw image creation timestamp, not interpreted
    pub image_creation_time: [u8; 8],
    pub sector_size: u32,
    /// Bytes from `root_offset` to the end of the image
    pub volume_size: u64,
    /// `volume_size / sector_size`, not rounded
    pub volume_sectors: f64,
}

impl VolumeDescriptor {
    /// Scan the known layouts for the descriptor and parse it
    ///
    /// A candidate whose identifier bytes are short, not ASCII, or not the
    /// magic string is skipped. Fails with [`GdfError::UnrecognizedFormat`]
    /// if no layout matches.
    pub fn locate<S: ImageSource + ?Sized>(source: &mut S) -> Result<Self, GdfError> {
        let total_length = source.len();

        for disc_type in DiscType::PROBE_ORDER {
            let position = disc_type.descriptor_position();
            let mut identifier = [0u8; 20];
            let read = source.read_at(position, &mut identifier)?;

            if read < identifier.len() {
                log::debug!(
                    "{}: image ends before descriptor at offset {}",
                    disc_type,
                    position
                );
                continue;
            }

            if !identifier.is_ascii() {
                log::debug!("{}: identifier at offset {} is not ASCII", disc_type, position);
                continue;
            }

            if &identifier != MAGIC {
                log::debug!(
                    "{}: identifier at offset {} is {:?}",
                    disc_type,
                    position,
                    String::from_utf8_lossy(&identifier)
                );
                continue;
            }

            log::info!("Found GDF volume descriptor ({}) at offset {}", disc_type, position);

            let mut cursor = FieldCursor::new(source, position + MAGIC.len() as u64);
            return Self::parse_fields(&mut cursor, disc_type, total_length);
        }

        Err(GdfError::UnrecognizedFormat)
    }

    /// Read the fields that follow a validated identifier
    fn parse_fields<S: ImageSource + ?Sized>(
        cursor: &mut FieldCursor<'_, S>,
        disc_type: DiscType,
        total_length: u64,
    ) -> Result<Self, GdfError> {
        let root_dir_sector = cursor.u32_le("root directory sector")?;
        let root_dir_size = cursor.u32_le("root directory size")?;
        let image_creation_time = cursor.array("image creation time")?;

        let root_offset = disc_type.offset();
        let sector_size = SECTOR_SIZE;
        let volume_size = total_length.saturating_sub(root_offset);

        Ok(Self {
            identifier: String::from_utf8_lossy(MAGIC).into_owned(),
            disc_type,
            root_offset,
            root_dir_sector,
            root_dir_size,
            image_creation_time,
            sector_size,
            volume_size,
            volume_sectors: volume_size as f64 / sector_size as f64,
        })
    }

    /// Coordinates of the root directory table
    pub fn root_location(&self) -> DirectoryLocation {
        DirectoryLocation {
            sector: self.root_dir_sector,
            size: self.root_dir_size,
        }
    }

    /// Absolute byte offset of a sector-relative address
    pub fn data_position(&self, sector: u32) -> u64 {
        sector as u64 * self.sector_size as u64 + self.root_offset
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::descriptor_bytes;
    use super::*;
    use crate::disc::source::{SparseSource, StreamSource};
    use std::io::Cursor;

    const LARGEST_OFFSET: u64 = 265_879_552;

    fn image_with_descriptor_at(disc_type: DiscType) -> SparseSource {
        let mut source = SparseSource::new(LARGEST_OFFSET + 64 * SECTOR_SIZE as u64);
        source.patch(
            disc_type.descriptor_position(),
            &descriptor_bytes(0x1234, 0x800, [9, 8, 7, 6, 5, 4, 3, 2]),
        );
        source
    }

    #[test]
    fn test_offsets() {
        assert_eq!(DiscType::Xsf.offset(), 0);
        assert_eq!(DiscType::Gdf.offset(), 265879552);
        assert_eq!(DiscType::Xgd3.offset(), 34078720);
        assert_eq!(DiscType::Xgd3.descriptor_position(), 65536 + 34078720);
        assert_eq!(DiscType::from_offset(34078720), Some(DiscType::Xgd3));
        assert_eq!(DiscType::from_offset(1), None);
    }

    #[test]
    fn test_locate_each_disc_type() {
        for disc_type in DiscType::PROBE_ORDER {
            let mut source = image_with_descriptor_at(disc_type);

            // Near-miss identifiers at the other candidates must not match
            for other in DiscType::PROBE_ORDER.into_iter().filter(|t| *t != disc_type) {
                source.patch(other.descriptor_position(), b"MICROSOFT*XBOX*MEDIX");
            }

            let descriptor = VolumeDescriptor::locate(&mut source).unwrap();
            assert_eq!(descriptor.disc_type, disc_type);
            assert_eq!(descriptor.root_offset, disc_type.offset());
            assert_eq!(descriptor.identifier, "MICROSOFT*XBOX*MEDIA");
            assert_eq!(descriptor.root_dir_sector, 0x1234);
            assert_eq!(descriptor.root_dir_size, 0x800);
            assert_eq!(descriptor.image_creation_time, [9, 8, 7, 6, 5, 4, 3, 2]);
            assert_eq!(descriptor.sector_size, 2048);
        }
    }

    #[test]
    fn test_first_match_wins_in_probe_order() {
        // GDF precedes XGD3 in probe order even though its offset is larger
        let mut source = image_with_descriptor_at(DiscType::Xgd3);
        source.patch(
            DiscType::Gdf.descriptor_position(),
            &descriptor_bytes(7, 7, [0; 8]),
        );

        let descriptor = VolumeDescriptor::locate(&mut source).unwrap();
        assert_eq!(descriptor.disc_type, DiscType::Gdf);
        assert_eq!(descriptor.root_dir_sector, 7);
    }

    #[test]
    fn test_non_ascii_candidate_is_skipped() {
        let mut source = image_with_descriptor_at(DiscType::Xgd3);
        source.patch(DiscType::Xsf.descriptor_position(), &[0xFF; 20]);
        source.patch(DiscType::Gdf.descriptor_position(), &[0x80, 0x81, 0xC3, 0x28]);

        let descriptor = VolumeDescriptor::locate(&mut source).unwrap();
        assert_eq!(descriptor.disc_type, DiscType::Xgd3);
    }

    #[test]
    fn test_unrecognized_format() {
        let mut source = SparseSource::new(LARGEST_OFFSET + 64 * SECTOR_SIZE as u64);
        source.patch(DiscType::Xsf.descriptor_position(), b"CD001 not an xbox disc");

        let result = VolumeDescriptor::locate(&mut source);
        assert!(matches!(result, Err(GdfError::UnrecognizedFormat)));
    }

    #[test]
    fn test_small_image_is_unrecognized() {
        let mut source = StreamSource::new(Cursor::new(vec![0u8; 100])).unwrap();
        assert!(matches!(
            VolumeDescriptor::locate(&mut source),
            Err(GdfError::UnrecognizedFormat)
        ));
    }

    #[test]
    fn test_descriptor_fields_truncated() {
        let position = DiscType::Xsf.descriptor_position();
        let mut image = vec![0u8; position as usize + 24];
        image[position as usize..position as usize + 20].copy_from_slice(MAGIC);

        let mut source = StreamSource::new(Cursor::new(image)).unwrap();
        let result = VolumeDescriptor::locate(&mut source);
        assert!(matches!(
            result,
            Err(GdfError::TruncatedRead { what: "root directory size", requested: 4, actual: 0, .. })
        ));
    }

    #[test]
    fn test_volume_geometry_not_rounded() {
        // 33 full sectors plus 2 bytes
        let total = 33 * 2048 + 2;
        let mut image = vec![0u8; total];
        let position = DiscType::Xsf.descriptor_position() as usize;
        let descriptor = descriptor_bytes(33, 0, [0; 8]);
        image[position..position + descriptor.len()].copy_from_slice(&descriptor);

        let mut source = StreamSource::new(Cursor::new(image)).unwrap();
        let descriptor = VolumeDescriptor::locate(&mut source).unwrap();

        assert_eq!(descriptor.volume_size, total as u64);
        assert_eq!(descriptor.volume_sectors, 33.0009765625);
    }

    #[test]
    fn test_volume_size_excludes_root_offset() {
        let mut source = image_with_descriptor_at(DiscType::Xgd3);
        let descriptor = VolumeDescriptor::locate(&mut source).unwrap();

        let expected = source.len() - DiscType::Xgd3.offset();
        assert_eq!(descriptor.volume_size, expected);
        assert_eq!(descriptor.volume_sectors, expected as f64 / 2048.0);
    }

    #[test]
    fn test_data_position_uses_root_offset() {
        let mut source = image_with_descriptor_at(DiscType::Gdf);
        let descriptor = VolumeDescriptor::locate(&mut source).unwrap();

        assert_eq!(descriptor.data_position(2), 2 * 2048 + 265_879_552);
        assert_eq!(
            descriptor.root_location(),
            DirectoryLocation { sector: 0x1234, size: 0x800 }
        );
    }
}
