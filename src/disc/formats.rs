//! Disc image container format definitions

use std::path::Path;

/// Supported disc image containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscFormat {
    /// Raw sector dump (.iso, .xiso)
    Iso,
    /// MAME Compressed Hunks of Data (.chd)
    Chd,
}

impl DiscFormat {
    /// Detect disc format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "iso" | "xiso" => Some(Self::Iso),
            "chd" => Some(Self::Chd),
            _ => None,
        }
    }

    /// Get the display name for this format
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Iso => "ISO",
            Self::Chd => "CHD (Compressed Hunks of Data)",
        }
    }

    /// Get supported file extensions for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Iso => &["iso", "xiso"],
            Self::Chd => &["chd"],
        }
    }
}

/// Get all supported file extensions
pub fn supported_extensions() -> Vec<&'static str> {
    [DiscFormat::Iso, DiscFormat::Chd]
        .iter()
        .flat_map(|format| format.extensions().iter().copied())
        .collect()
}
