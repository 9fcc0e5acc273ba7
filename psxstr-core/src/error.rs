use thiserror::Error;

/// Errors that can occur while reading sectors from a disc image.
#[derive(Debug, Error)]
pub enum SectorError {
    /// I/O error while reading the image
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not recognized or is invalid
    #[error("Invalid image format: {0}")]
    InvalidFormat(String),

    /// The image is too small to contain a single sector
    #[error("Image too small: expected at least {expected} bytes, got {actual}")]
    TooSmall { expected: u64, actual: u64 },

    /// A sector number past the end of the image was requested
    #[error("Sector {sector} is beyond end of image ({count} sectors)")]
    OutOfRange { sector: u64, count: u64 },

    /// CHD container could not be opened or decompressed
    #[error("CHD error: {0}")]
    Chd(String),

    /// Settings file could not be parsed or written
    #[error("Settings error: {0}")]
    Settings(String),
}

impl SectorError {
    pub fn invalid_format(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    pub fn chd(msg: impl Into<String>) -> Self {
        Self::Chd(msg.into())
    }

    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }
}
