//! Combined file classifier: extension first, content second.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::processing::heuristics::detect_from_content;
use crate::processing::language::{extension_of, resolve_extension, LanguageDescriptor};

/// Outcome of classifying one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Matched through the registry's extension table.
    ByExtension(&'static LanguageDescriptor),
    /// Matched by sniffing the leading lines.
    ByContent(&'static LanguageDescriptor),
    /// Neither stage recognised the file.
    Unresolved,
}

impl Classification {
    pub fn language(&self) -> Option<&'static LanguageDescriptor> {
        match *self {
            Classification::ByExtension(lang) | Classification::ByContent(lang) => Some(lang),
            Classification::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Classification::Unresolved)
    }
}

/// A file with a resolved language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    /// The path exactly as it was given.
    pub path: PathBuf,
    /// Extension that matched, absent when the content decided.
    pub extension: Option<String>,
    pub language: &'static LanguageDescriptor,
}

/// Classify a single path.
pub fn classify(path: &Path) -> Classification {
    if let Some(lang) = resolve_extension(path) {
        return Classification::ByExtension(lang);
    }

    match detect_from_content(path) {
        Some(lang) => Classification::ByContent(lang),
        None => Classification::Unresolved,
    }
}

/// Classify a single path, keeping only a resolved outcome.
pub fn classify_file(path: &Path) -> Option<ClassificationResult> {
    let classification = classify(path);
    if !classification.is_resolved() {
        debug!(path = %path.display(), "No language detected");
    }
    to_result(path, classification)
}

fn to_result(path: &Path, classification: Classification) -> Option<ClassificationResult> {
    match classification {
        Classification::ByExtension(language) => Some(ClassificationResult {
            path: path.to_path_buf(),
            extension: extension_of(path),
            language,
        }),
        Classification::ByContent(language) => Some(ClassificationResult {
            path: path.to_path_buf(),
            extension: None,
            language,
        }),
        Classification::Unresolved => None,
    }
}

/// Classify every path in order, dropping the ones with no language.
pub fn classify_batch<P: AsRef<Path>>(paths: &[P]) -> Vec<ClassificationResult> {
    paths
        .iter()
        .filter_map(|p| classify_file(p.as_ref()))
        .collect()
}

/// Same contract as [`classify_batch`], with file reads spread over a bounded
/// pool of blocking workers. Output keeps input order.
pub async fn classify_batch_concurrent(
    paths: Vec<PathBuf>,
    concurrency: usize,
) -> Vec<ClassificationResult> {
    let concurrency = concurrency.max(1);

    let outcomes: Vec<Option<ClassificationResult>> = stream::iter(paths)
        .map(|path| async move {
            let task_path = path.clone();
            match tokio::task::spawn_blocking(move || classify_file(&task_path)).await {
                Ok(result) => result,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Classification task failed");
                    None
                }
            }
        })
        .buffered(concurrency)
        .collect()
        .await;

    outcomes.into_iter().flatten().collect()
}
