//! Convert images to packed 4-bit grayscale and push them to an e-paper
//! display controller over Bluetooth LE.

pub mod app;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
