use std::path::PathBuf;
use thiserror::Error;

/// The source image could not be turned into a packed bitmap.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot read image {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot decode image data: {0}")]
    Undecodable(#[from] image::ImageError),
    #[error("invalid target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("first chunk body size must be at least 1 byte")]
    ZeroFirstChunkBody,
    #[error("chunk size must be at least 1 byte")]
    ZeroChunkSize,
    #[error("payload too short for a frame header: {0} bytes")]
    TruncatedHeader(usize),
}

#[derive(Debug, Error)]
#[error("no device matching \"{name}\" found after scanning for {scan_ms} ms")]
pub struct DeviceNotFoundError {
    pub name: String,
    pub scan_ms: u64,
}

/// A chunk could not be delivered to the display controller.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("service {0} not found on device")]
    ServiceNotFound(String),
    #[error("characteristic {0} not found on device")]
    CharacteristicNotFound(String),
    #[error("write of chunk {index} rejected: {status}")]
    WriteRejected { index: usize, status: String },
    #[error("device disconnected")]
    Disconnected,
    #[error("invalid UUID \"{0}\"")]
    InvalidUuid(String),
    #[error("invalid device address \"{0}\"")]
    InvalidAddress(String),
    #[error("Bluetooth LE transport is not supported on this platform")]
    Unsupported,
    #[error("platform Bluetooth error: {0}")]
    Platform(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(windows)]
impl From<windows::core::Error> for TransportError {
    fn from(e: windows::core::Error) -> Self {
        TransportError::Platform(e.message().to_string())
    }
}
