//! BLE Scanner Module
//!
//! Finds the display controller by its advertised local name.

use crate::domain::error::TransportError;
use crate::domain::models::ScannedDevice;
use crate::infrastructure::bluetooth::protocol;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEScanningMode,
};
use windows::Foundation::TypedEventHandler;

/// BLE Scanner reporting every named advertisement it hears
pub struct BleScanner {
    watcher: Option<BluetoothLEAdvertisementWatcher>,
    device_sender: mpsc::UnboundedSender<ScannedDevice>,
}

impl BleScanner {
    pub fn new(device_sender: mpsc::UnboundedSender<ScannedDevice>) -> Self {
        Self {
            watcher: None,
            device_sender,
        }
    }

    /// Start scanning for BLE devices
    pub fn start(&mut self) -> Result<(), TransportError> {
        self.stop()?;

        let watcher = BluetoothLEAdvertisementWatcher::new()?;
        // Active scanning so scan responses carrying the local name arrive
        watcher.SetScanningMode(BluetoothLEScanningMode::Active)?;

        let sender = self.device_sender.clone();
        let handler = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let name = args.Advertisement()?.LocalName()?.to_string();
                    if !name.is_empty() {
                        let device = ScannedDevice {
                            name,
                            address: args.BluetoothAddress()?,
                            signal_strength: args.RawSignalStrengthInDBm()?,
                        };
                        let _ = sender.send(device);
                    }
                }
                Ok(())
            },
        );

        watcher.Received(&handler)?;
        watcher.Start()?;
        self.watcher = Some(watcher);

        Ok(())
    }

    /// Stop scanning
    pub fn stop(&mut self) -> Result<(), TransportError> {
        if let Some(watcher) = self.watcher.take() {
            debug!("Stopping BLE scan...");
            watcher.Stop()?;
        }
        Ok(())
    }
}

impl Drop for BleScanner {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Scan until a device whose name contains `name` is heard, or `timeout` passes.
pub async fn find_device(
    name: &str,
    timeout: Duration,
) -> Result<Option<ScannedDevice>, TransportError> {
    info!("Scanning for device: {}...", name);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut scanner = BleScanner::new(tx);
    scanner.start()?;

    let deadline = tokio::time::Instant::now() + timeout;
    let found = loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(device)) if protocol::name_matches(&device.name, name) => break Some(device),
            Ok(Some(device)) => {
                debug!(
                    "Ignoring {} ({}, {} dBm)",
                    device.name,
                    protocol::format_address(device.address),
                    device.signal_strength
                );
            }
            Ok(None) | Err(_) => break None,
        }
    };

    scanner.stop()?;
    Ok(found)
}
