//! BLE Connection Module
//!
//! Connects to the display controller and resolves the writable image
//! characteristic.

use crate::domain::error::TransportError;
use crate::infrastructure::bluetooth::protocol;
use crate::infrastructure::bluetooth::service::ConnectionConfig;
use crate::infrastructure::link::ChunkWriter;
use tracing::{debug, info, warn};
use windows::core::GUID;
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCommunicationStatus, GattWriteOption,
};
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Storage::Streams::DataWriter;

/// An open connection to the image characteristic
pub struct GattLink {
    device: BluetoothLEDevice,
    characteristic: GattCharacteristic,
    write_option: GattWriteOption,
}

impl GattLink {
    pub fn is_connected(&self) -> bool {
        self.device
            .ConnectionStatus()
            .map(|s| s == BluetoothConnectionStatus::Connected)
            .unwrap_or(false)
    }
}

impl ChunkWriter for GattLink {
    async fn write_chunk(&mut self, index: usize, chunk: &[u8]) -> Result<(), TransportError> {
        let writer = DataWriter::new()?;
        writer.WriteBytes(chunk)?;
        let buffer = writer.DetachBuffer()?;

        let status = self
            .characteristic
            .WriteValueWithOptionAsync(&buffer, self.write_option)?
            .await?;

        match status {
            GattCommunicationStatus::Success => Ok(()),
            GattCommunicationStatus::Unreachable => Err(TransportError::Disconnected),
            other => Err(TransportError::WriteRejected {
                index,
                status: format!("{:?}", other),
            }),
        }
    }
}

impl Drop for GattLink {
    fn drop(&mut self) {
        let _ = self.device.Close();
        debug!("Closed device handle");
    }
}

/// BLE Connection handler
pub struct BleConnection {
    config: ConnectionConfig,
}

impl BleConnection {
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Connect to a device by Bluetooth address
    pub async fn connect(&self, address: u64) -> Result<GattLink, TransportError> {
        info!(
            "Connecting to Bluetooth device: {}",
            protocol::format_address(address)
        );

        let device = BluetoothLEDevice::FromBluetoothAddressAsync(address)?.await?;
        info!("Connected to: {}", device.Name()?);

        let characteristic = self.get_characteristic(&device).await?;

        let write_option = if self.config.write_with_response {
            GattWriteOption::WriteWithResponse
        } else {
            GattWriteOption::WriteWithoutResponse
        };

        let link = GattLink {
            device,
            characteristic,
            write_option,
        };
        if !link.is_connected() {
            warn!("Device reports it is not connected yet; first write will open the link");
        }
        Ok(link)
    }

    /// Locate the image characteristic inside the image service
    async fn get_characteristic(
        &self,
        device: &BluetoothLEDevice,
    ) -> Result<GattCharacteristic, TransportError> {
        let service_uuid = GUID::from_u128(protocol::parse_uuid(&self.config.service_uuid)?);
        let char_uuid = GUID::from_u128(protocol::parse_uuid(&self.config.characteristic_uuid)?);

        let services_result = device.GetGattServicesForUuidAsync(service_uuid)?.await?;
        let status = services_result.Status()?;
        if status == GattCommunicationStatus::Unreachable {
            return Err(TransportError::Disconnected);
        }
        if status != GattCommunicationStatus::Success {
            warn!("Failed to get GATT services: {:?}", status);
            return Err(TransportError::ServiceNotFound(
                self.config.service_uuid.clone(),
            ));
        }

        let services = services_result.Services()?;
        if services.Size()? == 0 {
            return Err(TransportError::ServiceNotFound(
                self.config.service_uuid.clone(),
            ));
        }
        let service = services.GetAt(0)?;
        debug!("Found image service");

        let chars_result = service.GetCharacteristicsForUuidAsync(char_uuid)?.await?;
        if chars_result.Status()? != GattCommunicationStatus::Success {
            return Err(TransportError::CharacteristicNotFound(
                self.config.characteristic_uuid.clone(),
            ));
        }

        let characteristics = chars_result.Characteristics()?;
        if characteristics.Size()? == 0 {
            return Err(TransportError::CharacteristicNotFound(
                self.config.characteristic_uuid.clone(),
            ));
        }
        debug!("Found image characteristic");

        Ok(characteristics.GetAt(0)?)
    }
}
