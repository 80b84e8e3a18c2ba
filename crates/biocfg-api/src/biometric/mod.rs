// Biometric service surface.

mod client;
pub mod models;

pub use client::BiometricClient;
