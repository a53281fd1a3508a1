//! Disc image handling module
//!
//! Provides reading of Xbox / Xbox 360 disc images: container access,
//! GDF volume and directory decoding, and a browsable filesystem view.

pub mod browse;
mod formats;
pub mod gdf;
pub mod source;

pub use formats::{supported_extensions, DiscFormat};
pub use gdf::{
    Attributes, DirectoryEntry, DirectoryLocation, DirectoryTable, DiscType, GdfError, GdfVolume,
    VolumeDescriptor,
};
pub use source::{ChdSource, ImageSource, StreamSource};
