//! Output module: the model-service client and the mirrored output tree.

mod llm_client;
mod paths;

pub use llm_client::{CodeConverter, ConversionRequest, HttpConverter};
pub use paths::{nested_output_dir, OutputMapper};
