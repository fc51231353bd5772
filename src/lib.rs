//! Cosmodrift library - ambient cosmic visuals with a one-track transport

pub mod audio;
pub mod galaxy;
pub mod params;
pub mod rendering;
pub mod transport;
