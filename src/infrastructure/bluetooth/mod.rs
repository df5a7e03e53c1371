//! Bluetooth Module
//!
//! Delivers framed image chunks to the e-paper controller over BLE.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BluetoothService                      │
//! │      (find device by name, connect by address)           │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!         ┌─────────────┼─────────────┐
//!         │             │             │
//!         ▼             ▼             ▼
//! ┌───────────┐  ┌────────────┐  ┌──────────┐
//! │  Scanner  │  │ Connection │  │ Protocol │
//! │           │  │            │  │          │
//! │ - BLE     │  │ - GATT     │  │ - UUIDs  │
//! │ discovery │  │   lookup   │  │ - Address│
//! │           │  │ - Writes   │  │   parsing│
//! └───────────┘  └────────────┘  └──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - Service/characteristic UUIDs and address parsing
//! - `scanner` - BLE device discovery (Windows)
//! - `connection` - Device connection and characteristic writes (Windows)
//! - [`service`] - Main service coordinator

#[cfg(windows)]
pub mod connection;
pub mod protocol;
#[cfg(windows)]
pub mod scanner;
pub mod service;

pub use service::{BleLink, BluetoothService};
