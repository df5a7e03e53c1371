/// A 4-bit grayscale bitmap, two pixels per byte, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// Bytes needed for one packed row (`ceil(width / 2)`).
    pub fn row_stride(width: u32) -> usize {
        (width as usize).div_ceil(2)
    }

    pub fn expected_len(width: u32, height: u32) -> usize {
        Self::row_stride(width) * height as usize
    }
}

/// How the source image is fitted onto the target resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizeMode {
    /// Scale both axes independently to exactly the target size.
    #[default]
    Stretch,
    /// Keep aspect ratio and crop the overflow.
    Fill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub width: u32,
    pub height: u32,
    pub resize: ResizeMode,
    pub dither: bool,
}

impl EncodeOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            resize: ResizeMode::Stretch,
            dither: false,
        }
    }
}

/// A BLE device seen during a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDevice {
    pub name: String,
    pub address: u64,
    pub signal_strength: i16,
}

/// Summary of a completed transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransferReport {
    pub chunks_sent: usize,
    pub bytes_sent: usize,
}
