//! Provider-specific adapters

pub mod shiprocket;
pub mod ups;

pub use shiprocket::ShiprocketAdapter;
pub use ups::UpsAdapter;
