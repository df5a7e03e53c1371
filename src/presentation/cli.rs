use crate::domain::models::{EncodeOptions, ResizeMode};
use crate::domain::settings::Settings;
use clap::Parser;
use std::path::PathBuf;

/// Convert an image to 4-bit grayscale and send it to an e-paper display over BLE
#[derive(Debug, Parser)]
#[command(name = "epaper-image-sender", version)]
pub struct Args {
    /// Input image path
    #[arg(default_value = "img.png")]
    pub image_path: PathBuf,

    /// Advertised name (or part of it) of the display controller
    #[arg(long)]
    pub device: Option<String>,

    /// Target image width
    #[arg(long)]
    pub width: Option<u32>,

    /// Target image height
    #[arg(long)]
    pub height: Option<u32>,

    /// Bluetooth address of the controller, skips scanning
    #[arg(long)]
    pub address: Option<String>,

    /// Settings file to use instead of the per-user one
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    pub save_config: bool,

    /// Apply Floyd-Steinberg dithering before quantizing
    #[arg(long)]
    pub dither: bool,

    /// Crop to fill the target size instead of stretching
    #[arg(long)]
    pub fill: bool,

    /// Save a PNG of the quantized image
    #[arg(long)]
    pub preview: Option<PathBuf>,

    /// Write the wire payload (header + bitmap) to a file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Encode and frame, but do not touch Bluetooth
    #[arg(long)]
    pub dry_run: bool,

    /// Use write-without-response for every chunk
    #[arg(long)]
    pub no_response: bool,

    /// Pause after the first chunk, in milliseconds
    #[arg(long)]
    pub first_chunk_delay_ms: Option<u64>,

    /// Pause after every later chunk, in milliseconds
    #[arg(long)]
    pub chunk_delay_ms: Option<u64>,

    /// How long to scan for the device, in milliseconds
    #[arg(long)]
    pub scan_timeout_ms: Option<u64>,

    /// Log filter, e.g. "debug" (RUST_LOG takes precedence)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Layer command line overrides on top of loaded settings
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(device) = &self.device {
            settings.device_name = device.clone();
        }
        if let Some(width) = self.width {
            settings.target_width = width;
        }
        if let Some(height) = self.height {
            settings.target_height = height;
        }
        if let Some(ms) = self.first_chunk_delay_ms {
            settings.first_chunk_delay_ms = ms;
        }
        if let Some(ms) = self.chunk_delay_ms {
            settings.chunk_delay_ms = ms;
        }
        if let Some(ms) = self.scan_timeout_ms {
            settings.scan_timeout_ms = ms;
        }
        if self.no_response {
            settings.write_with_response = false;
        }
        if let Some(level) = &self.log_level {
            settings.log_settings.level = level.clone();
        }
    }

    pub fn encode_options(&self, settings: &Settings) -> EncodeOptions {
        EncodeOptions {
            width: settings.target_width,
            height: settings.target_height,
            resize: if self.fill {
                ResizeMode::Fill
            } else {
                ResizeMode::Stretch
            },
            dither: self.dither,
        }
    }
}
