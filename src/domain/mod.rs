//! Domain layer: image encoding, transfer framing and settings.
//!
//! Nothing in here performs Bluetooth I/O.

pub mod encoder;
pub mod error;
pub mod framer;
pub mod models;
pub mod settings;
