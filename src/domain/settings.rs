use crate::domain::framer::{DEFAULT_CHUNK_SIZE, DEFAULT_FIRST_CHUNK_BODY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_false")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_false")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_false")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_false(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_false(),
            show_thread_ids: default_false(),
            show_target: default_false(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "epaper_image_sender".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    // Target device
    #[serde(default = "default_device_name")]
    pub device_name: String,
    #[serde(default = "default_scan_timeout_ms")]
    pub scan_timeout_ms: u64,

    // GATT endpoint
    #[serde(default = "default_service_uuid")]
    pub service_uuid: String,
    #[serde(default = "default_characteristic_uuid")]
    pub characteristic_uuid: String,
    #[serde(default = "default_true")]
    pub write_with_response: bool,

    // Image geometry
    #[serde(default = "default_target_width")]
    pub target_width: u32,
    #[serde(default = "default_target_height")]
    pub target_height: u32,

    // Chunking and pacing
    #[serde(default = "default_first_chunk_body_size")]
    pub first_chunk_body_size: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_first_chunk_delay_ms")]
    pub first_chunk_delay_ms: u64,
    #[serde(default = "default_chunk_delay_ms")]
    pub chunk_delay_ms: u64,

    // Logging Settings
    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            scan_timeout_ms: default_scan_timeout_ms(),
            service_uuid: default_service_uuid(),
            characteristic_uuid: default_characteristic_uuid(),
            write_with_response: default_true(),
            target_width: default_target_width(),
            target_height: default_target_height(),
            first_chunk_body_size: default_first_chunk_body_size(),
            chunk_size: default_chunk_size(),
            first_chunk_delay_ms: default_first_chunk_delay_ms(),
            chunk_delay_ms: default_chunk_delay_ms(),
            log_settings: LogSettings::default(),
        }
    }
}

fn default_device_name() -> String {
    "ESP32-EPaper".to_string()
}
fn default_scan_timeout_ms() -> u64 {
    10_000
}
fn default_service_uuid() -> String {
    "00FF".to_string()
}
fn default_characteristic_uuid() -> String {
    "FF01".to_string()
}
fn default_target_width() -> u32 {
    300
}
fn default_target_height() -> u32 {
    396
}
fn default_first_chunk_body_size() -> usize {
    DEFAULT_FIRST_CHUNK_BODY
}
fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
// Receiver-side write latency, not a protocol requirement
fn default_first_chunk_delay_ms() -> u64 {
    5_000
}
fn default_chunk_delay_ms() -> u64 {
    3_000
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
    // Set when an existing file could not be loaded
    load_error: Option<String>,
}

impl SettingsService {
    /// Load from the per-user config directory
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Ok(Self::open(settings_path))
    }

    /// Load from an explicit path, falling back to defaults.
    ///
    /// Runs before logging exists, so a load failure is kept and surfaced
    /// later through [`SettingsService::report_load`].
    pub fn open(settings_path: PathBuf) -> Self {
        let (settings, load_error) = match Self::load_from_file(&settings_path) {
            Ok(settings) => (settings, None),
            Err(_) if !settings_path.exists() => (Settings::default(), None),
            Err(e) => (Settings::default(), Some(e.to_string())),
        };

        Self {
            settings,
            settings_path,
            load_error,
        }
    }

    /// Why the settings file was ignored, if it was
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// Log where settings came from, warning if the file was unusable
    pub fn report_load(&self) {
        match &self.load_error {
            Some(e) => warn!(
                "Ignoring unreadable settings file {}, using defaults: {}",
                self.settings_path.display(),
                e
            ),
            None if self.settings_path.exists() => {
                info!("Settings: {}", self.settings_path.display())
            }
            None => debug!("No settings file at {}", self.settings_path.display()),
        }
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("EPaperImageSender");
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &Path) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(e) = &self.load_error {
            warn!(
                "Overwriting unreadable settings file {} ({})",
                self.settings_path.display(),
                e
            );
        }
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.settings_path
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }
}
