//! Per-language file counts for reporting.

use std::collections::HashMap;

use crate::processing::classifier::ClassificationResult;

/// Count classified files per canonical language name.
pub fn language_statistics(results: &[ClassificationResult]) -> HashMap<String, usize> {
    let mut stats = HashMap::new();
    for result in results {
        *stats.entry(result.language.name.to_string()).or_insert(0) += 1;
    }
    stats
}
