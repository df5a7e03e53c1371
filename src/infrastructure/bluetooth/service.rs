//! Bluetooth Service Module
//!
//! Entry point for discovery and connection. On targets without a
//! supported BLE backend every operation fails with
//! [`TransportError::Unsupported`].

use crate::domain::error::TransportError;
use crate::domain::models::ScannedDevice;
use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::protocol;
use std::time::Duration;
use tracing::debug;

/// Configuration for connection behavior
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Service UUID to look for
    pub service_uuid: String,
    /// Image characteristic UUID
    pub characteristic_uuid: String,
    /// Wait for the peripheral to acknowledge every write
    pub write_with_response: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            service_uuid: protocol::SERVICE_UUID.to_string(),
            characteristic_uuid: protocol::IMAGE_CHAR_UUID.to_string(),
            write_with_response: true,
        }
    }
}

#[cfg(windows)]
pub type BleLink = crate::infrastructure::bluetooth::connection::GattLink;

/// No link can exist without a BLE backend
#[cfg(not(windows))]
pub enum BleLink {}

#[cfg(not(windows))]
impl crate::infrastructure::link::ChunkWriter for BleLink {
    async fn write_chunk(&mut self, _index: usize, _chunk: &[u8]) -> Result<(), TransportError> {
        match *self {}
    }
}

/// Coordinates scanning and connecting
pub struct BluetoothService {
    config: ConnectionConfig,
    scan_timeout: Duration,
}

impl BluetoothService {
    pub fn new(config: ConnectionConfig, scan_timeout: Duration) -> Self {
        Self {
            config,
            scan_timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ConnectionConfig {
                service_uuid: settings.service_uuid.clone(),
                characteristic_uuid: settings.characteristic_uuid.clone(),
                write_with_response: settings.write_with_response,
            },
            Duration::from_millis(settings.scan_timeout_ms),
        )
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    pub fn scan_timeout(&self) -> Duration {
        self.scan_timeout
    }

    /// Scan for a device whose advertised name contains `name`
    pub async fn find_device(&self, name: &str) -> Result<Option<ScannedDevice>, TransportError> {
        self.validate()?;
        #[cfg(windows)]
        {
            crate::infrastructure::bluetooth::scanner::find_device(name, self.scan_timeout).await
        }
        #[cfg(not(windows))]
        {
            debug!("Cannot scan for {}: no BLE backend", name);
            Err(TransportError::Unsupported)
        }
    }

    /// Connect to `address` and resolve the image characteristic
    pub async fn connect(&self, address: u64) -> Result<BleLink, TransportError> {
        self.validate()?;
        #[cfg(windows)]
        {
            crate::infrastructure::bluetooth::connection::BleConnection::new(self.config.clone())
                .connect(address)
                .await
        }
        #[cfg(not(windows))]
        {
            debug!(
                "Cannot connect to {}: no BLE backend",
                protocol::format_address(address)
            );
            Err(TransportError::Unsupported)
        }
    }

    /// Reject malformed UUIDs before touching the radio
    fn validate(&self) -> Result<(), TransportError> {
        let service = protocol::parse_uuid(&self.config.service_uuid)?;
        let characteristic = protocol::parse_uuid(&self.config.characteristic_uuid)?;
        debug!(
            "Image endpoint: service {}, characteristic {}",
            protocol::format_uuid(service),
            protocol::format_uuid(characteristic)
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.write_with_response = false;
        settings.scan_timeout_ms = 2500;

        let service = BluetoothService::from_settings(&settings);
        assert_eq!(service.config().service_uuid, "00FF");
        assert_eq!(service.config().characteristic_uuid, "FF01");
        assert!(!service.config().write_with_response);
        assert_eq!(service.scan_timeout(), Duration::from_millis(2500));
    }

    #[tokio::test]
    async fn test_bad_uuid_rejected_before_scan() {
        let config = ConnectionConfig {
            service_uuid: "not-a-uuid".to_string(),
            ..Default::default()
        };
        let service = BluetoothService::new(config, Duration::from_millis(10));
        let err = service.find_device("ESP32-EPaper").await.unwrap_err();
        assert!(matches!(err, TransportError::InvalidUuid(_)));
    }

    #[cfg(not(windows))]
    #[tokio::test]
    async fn test_unsupported_without_backend() {
        let service = BluetoothService::new(ConnectionConfig::default(), Duration::ZERO);
        assert!(matches!(
            service.connect(0x24_0A_C4_00_00_01).await,
            Err(TransportError::Unsupported)
        ));
    }
}
