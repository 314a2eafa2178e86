//! Legacy Converter Library
//!
//! Scans a source tree, classifies each file's language (extension first,
//! then content heuristics for legacy code) and hands the conversion to an
//! external model service, writing results into a mirrored tree.

pub mod batch;
pub mod error;
pub mod output;
pub mod processing;
pub mod types;

pub use batch::{BatchConfig, ConversionPipeline, ConversionReport};
pub use error::{ConverterError, Result};
pub use output::{CodeConverter, ConversionRequest, HttpConverter, OutputMapper};
pub use processing::{
    classify, classify_batch, classify_batch_concurrent, classify_file, language_statistics,
    Classification, ClassificationResult, LanguageDescriptor,
};
pub use types::ConverterConfig;

/// Default number of files processed concurrently
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Default extra attempts for a failed model call
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Files above this size are skipped during the scan (1MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1024 * 1024;
