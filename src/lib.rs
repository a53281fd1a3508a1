//! GDF Browser Library
//!
//! Core functionality for reading Xbox and Xbox 360 Games Disc Filesystem
//! (GDF) images: locating the volume descriptor and decoding directory tables.

pub mod config;
pub mod disc;
