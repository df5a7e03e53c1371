//! E-Paper Image Service Protocol
//!
//! The display controller exposes a single writable characteristic inside
//! a vendor service. Both are advertised with 16-bit short UUIDs.

use crate::domain::error::TransportError;

/// Image service (16-bit short form)
pub const SERVICE_UUID: &str = "00FF";

/// Image data characteristic (16-bit short form)
pub const IMAGE_CHAR_UUID: &str = "FF01";

/// Bluetooth Base UUID, 0000xxxx-0000-1000-8000-00805F9B34FB
pub const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

/// Parse a 16-bit, 32-bit or full 128-bit UUID string.
///
/// Short forms are placed onto the Bluetooth Base UUID. Dashes are ignored.
pub fn parse_uuid(uuid_str: &str) -> Result<u128, TransportError> {
    let invalid = || TransportError::InvalidUuid(uuid_str.to_string());
    let hex: String = uuid_str.trim().chars().filter(|c| *c != '-').collect();

    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    match hex.len() {
        4 | 8 => {
            let short = u32::from_str_radix(&hex, 16).map_err(|_| invalid())?;
            Ok(BLUETOOTH_BASE_UUID | (u128::from(short) << 96))
        }
        32 => u128::from_str_radix(&hex, 16).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

/// Canonical dashed lowercase form of a 128-bit UUID
pub fn format_uuid(uuid: u128) -> String {
    let hex = format!("{:032x}", uuid);
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}

/// Parse a 48-bit Bluetooth device address.
///
/// Accepts `AA:BB:CC:DD:EE:FF`, `AA-BB-CC-DD-EE-FF`, or plain hex with an
/// optional `0x` prefix.
pub fn parse_address(address: &str) -> Result<u64, TransportError> {
    let invalid = || TransportError::InvalidAddress(address.to_string());
    let trimmed = address.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let value = if trimmed.contains(':') || trimmed.contains('-') {
        let octets: Vec<&str> = trimmed.split([':', '-']).collect();
        if octets.len() != 6 || octets.iter().any(|o| o.len() != 2) {
            return Err(invalid());
        }
        octets.iter().try_fold(0u64, |acc, octet| {
            u8::from_str_radix(octet, 16)
                .map(|b| (acc << 8) | u64::from(b))
                .map_err(|_| invalid())
        })?
    } else {
        if trimmed.is_empty() || trimmed.len() > 12 {
            return Err(invalid());
        }
        u64::from_str_radix(trimmed, 16).map_err(|_| invalid())?
    };

    Ok(value)
}

/// Format a device address as `AA:BB:CC:DD:EE:FF`
pub fn format_address(address: u64) -> String {
    let bytes = address.to_be_bytes();
    bytes[2..]
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

/// Whether an advertised local name matches the configured device name.
///
/// The controller appends a suffix to its name, so this is a substring match.
pub fn name_matches(advertised: &str, wanted: &str) -> bool {
    !advertised.is_empty() && advertised.contains(wanted)
}
