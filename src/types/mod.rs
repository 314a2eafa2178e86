//! Core types for the converter.

mod config;

pub use config::{ConverterConfig, LogFormat};
