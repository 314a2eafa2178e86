//! Processing module for file discovery and language classification.
//!
//! This module provides:
//! - The language registry and extension lookup
//! - Content heuristics for legacy sources without useful extensions
//! - The combined classifier and per-language statistics
//! - File filtering and directory scanning

pub mod classifier;
pub mod file_processor;
pub mod filter;
pub mod heuristics;
pub mod language;
pub mod scanner;
pub mod stats;

pub use classifier::{
    classify, classify_batch, classify_batch_concurrent, classify_file, Classification,
    ClassificationResult,
};
pub use filter::{FileFilter, FilterConfig};
pub use language::{LanguageDescriptor, LANGUAGES};
pub use scanner::{scan_directory, ScannedFile};
pub use stats::language_statistics;
