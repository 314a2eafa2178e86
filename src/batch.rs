//! Conversion pipeline: scan, classify, convert, write.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ConverterError, Result};
use crate::output::{nested_output_dir, CodeConverter, ConversionRequest, OutputMapper};
use crate::processing::file_processor::decode_source;
use crate::processing::{
    classify_batch_concurrent, language_statistics, scan_directory, ClassificationResult,
    FileFilter,
};
use crate::types::ConverterConfig;

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Files classified and converted concurrently
    pub concurrency: usize,
    /// Whether to continue on individual file failures
    pub continue_on_error: bool,
    /// Classify and report without converting
    pub dry_run: bool,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: crate::DEFAULT_CONCURRENCY,
            continue_on_error: true,
            dry_run: false,
        }
    }
}

/// A file that failed to convert.
#[derive(Debug, Clone, Serialize)]
pub struct FileError {
    pub path: PathBuf,
    pub error: String,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub target_language: &'static str,
    pub dry_run: bool,
    pub scanned: usize,
    pub classified: usize,
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Classified files per canonical language name.
    pub statistics: BTreeMap<String, usize>,
    pub errors: Vec<FileError>,
}

/// Drives a whole conversion run.
pub struct ConversionPipeline {
    source_root: PathBuf,
    filter: FileFilter,
    mapper: OutputMapper,
    converter: Arc<dyn CodeConverter>,
    config: BatchConfig,
}

impl ConversionPipeline {
    /// Create a new pipeline.
    pub fn new(
        source_root: impl Into<PathBuf>,
        filter: FileFilter,
        mapper: OutputMapper,
        converter: Arc<dyn CodeConverter>,
        config: BatchConfig,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            filter,
            mapper,
            converter,
            config,
        }
    }

    /// Assemble a pipeline from the run configuration.
    ///
    /// An output directory inside the source tree is left out of the scan.
    pub fn from_config(
        config: &ConverterConfig,
        converter: Arc<dyn CodeConverter>,
    ) -> Result<Self> {
        config.validate()?;
        let target = config.target()?;

        let mut filter_config = config.filter_config();
        if let Some(nested) = nested_output_dir(&config.source_dir, &config.output_dir) {
            debug!(path = %nested.display(), "Excluding output directory from scan");
            filter_config.excluded_paths.push(nested);
        }
        let filter = FileFilter::new(filter_config)?;
        let mapper = OutputMapper::new(&config.source_dir, &config.output_dir, target);

        Ok(Self::new(
            &config.source_dir,
            filter,
            mapper,
            converter,
            BatchConfig {
                concurrency: config.concurrency,
                continue_on_error: config.continue_on_error,
                dry_run: config.dry_run,
            },
        ))
    }

    /// Run the pipeline end to end.
    pub async fn run(&self) -> Result<ConversionReport> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4();
        let target = self.mapper.target();

        info!(
            %run_id,
            source = %self.source_root.display(),
            target = target.name,
            "Starting conversion run"
        );

        let scanned = scan_directory(&self.source_root, &self.filter)?;
        let paths: Vec<PathBuf> = scanned.iter().map(|f| f.path.clone()).collect();
        let classified = classify_batch_concurrent(paths, self.config.concurrency).await;

        let statistics: BTreeMap<String, usize> =
            language_statistics(&classified).into_iter().collect();
        for (language, count) in &statistics {
            info!(language = %language, count, "Classified files");
        }

        let mut report = ConversionReport {
            run_id,
            started_at,
            finished_at: started_at,
            target_language: target.name,
            dry_run: self.config.dry_run,
            scanned: scanned.len(),
            classified: classified.len(),
            converted: 0,
            skipped: 0,
            failed: 0,
            statistics,
            errors: Vec::new(),
        };

        if self.config.dry_run {
            info!("Dry run, skipping conversion");
            report.finished_at = Utc::now();
            return Ok(report);
        }

        // Claim every output path up front; later sources that map onto an
        // already claimed path would overwrite it
        let mut claimed: HashMap<PathBuf, &Path> = HashMap::new();
        let mut jobs = Vec::new();
        for result in &classified {
            if result.language == target {
                debug!(path = %result.path.display(), "Already in target language");
                report.skipped += 1;
                continue;
            }

            let output = self.mapper.map(&result.path);
            if let Some(claimed_by) = claimed.get(&output) {
                let e = ConverterError::OutputCollision {
                    output,
                    claimed_by: claimed_by.to_path_buf(),
                };
                self.record_failure(&mut report, &result.path, e)?;
                continue;
            }
            claimed.insert(output.clone(), &result.path);
            jobs.push((result, output));
        }

        let mut outcomes = stream::iter(jobs)
            .map(|(result, output)| async move {
                let outcome = self.convert_one(result, &output).await;
                (result, output, outcome)
            })
            .buffer_unordered(self.config.concurrency.max(1));

        while let Some((result, output, outcome)) = outcomes.next().await {
            match outcome {
                Ok(()) => {
                    debug!(
                        source = %result.path.display(),
                        output = %output.display(),
                        "Converted"
                    );
                    report.converted += 1;
                }
                Err(e) => self.record_failure(&mut report, &result.path, e)?,
            }
        }

        report.finished_at = Utc::now();
        info!(
            %run_id,
            converted = report.converted,
            skipped = report.skipped,
            failed = report.failed,
            "Conversion run complete"
        );

        Ok(report)
    }

    /// Count a failed file, or abort the run when failures are fatal.
    fn record_failure(
        &self,
        report: &mut ConversionReport,
        path: &Path,
        error: ConverterError,
    ) -> Result<()> {
        warn!(path = %path.display(), error = %error, "Failed to convert file");
        report.failed += 1;
        report.errors.push(FileError {
            path: path.to_path_buf(),
            error: error.to_string(),
        });

        if self.config.continue_on_error {
            Ok(())
        } else {
            Err(error)
        }
    }

    /// Convert a single classified file and write it to `output`.
    async fn convert_one(&self, result: &ClassificationResult, output: &Path) -> Result<()> {
        let source = read_source(&result.path).await?;
        let request = ConversionRequest {
            path: result
                .path
                .strip_prefix(&self.source_root)
                .unwrap_or(&result.path)
                .to_path_buf(),
            source_language: result.language,
            target_language: self.mapper.target(),
            source,
        };

        let converted = self.converter.convert(&request).await?;

        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ConverterError::io(parent, e))?;
        }
        tokio::fs::write(output, converted)
            .await
            .map_err(|e| ConverterError::io(output, e))?;

        Ok(())
    }
}

async fn read_source(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ConverterError::io(path, e))?;
    decode_source(path, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::language::RUST;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Echoes a header naming both languages, fails for files named FAIL*.
    struct StubConverter {
        calls: AtomicUsize,
    }

    impl StubConverter {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CodeConverter for StubConverter {
        async fn convert(&self, request: &ConversionRequest) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = request.path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with("FAIL") {
                return Err(ConverterError::Status {
                    status: 400,
                    body: "rejected".to_string(),
                });
            }
            Ok(format!(
                "// {} -> {}\n",
                request.source_language.name, request.target_language.name
            ))
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn source_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "batch/PAYROLL.CBL", "       IDENTIFICATION DIVISION.\n");
        write(temp.path(), "batch/REPORT", "       PROCEDURE DIVISION.\n");
        write(temp.path(), "math/solve.f", "      SUBROUTINE SOLVE\n");
        write(temp.path(), "ported/lib.rs", "pub fn done() {}\n");
        write(temp.path(), "docs/notes.txt", "Some random text\n");
        temp
    }

    fn pipeline(
        source: &Path,
        output: &Path,
        converter: Arc<dyn CodeConverter>,
        config: BatchConfig,
    ) -> ConversionPipeline {
        ConversionPipeline::new(
            source,
            FileFilter::with_defaults(),
            OutputMapper::new(source, output, &RUST),
            converter,
            config,
        )
    }

    #[tokio::test]
    async fn test_dry_run_reports_without_writing() {
        let source = source_tree();
        let output = TempDir::new().unwrap();
        let converter = StubConverter::new();

        let report = pipeline(
            source.path(),
            &output.path().join("out"),
            converter.clone(),
            BatchConfig {
                dry_run: true,
                ..Default::default()
            },
        )
        .run()
        .await
        .unwrap();

        assert_eq!(report.scanned, 5);
        assert_eq!(report.classified, 4);
        assert_eq!(report.converted, 0);
        let expected: BTreeMap<String, usize> = [
            ("cobol".to_string(), 2),
            ("fortran".to_string(), 1),
            ("rust".to_string(), 1),
        ]
        .into_iter()
        .collect();
        assert_eq!(report.statistics, expected);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
        assert!(!output.path().join("out").exists());
    }

    #[tokio::test]
    async fn test_converts_into_mirrored_tree() {
        let source = source_tree();
        let output = TempDir::new().unwrap();
        let converter = StubConverter::new();

        let report = pipeline(
            source.path(),
            output.path(),
            converter.clone(),
            BatchConfig::default(),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(report.converted, 3);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.failed, 0);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 3);

        let payroll = fs::read_to_string(output.path().join("batch/PAYROLL.rs")).unwrap();
        assert_eq!(payroll, "// cobol -> rust\n");
        assert!(output.path().join("batch/REPORT.rs").exists());
        assert!(output.path().join("math/solve.rs").exists());
        assert!(!output.path().join("ported/lib.rs").exists());
        assert!(!output.path().join("docs").exists());
    }

    #[tokio::test]
    async fn test_failures_are_collected() {
        let source = source_tree();
        write(source.path(), "batch/FAIL1.cbl", "       DATA DIVISION.\n");
        let output = TempDir::new().unwrap();

        let report = pipeline(
            source.path(),
            output.path(),
            StubConverter::new(),
            BatchConfig::default(),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(report.converted, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, source.path().join("batch/FAIL1.cbl"));
    }

    #[tokio::test]
    async fn test_stop_on_error() {
        let source = TempDir::new().unwrap();
        write(source.path(), "FAIL.cbl", "       DATA DIVISION.\n");
        let output = TempDir::new().unwrap();

        let result = pipeline(
            source.path(),
            output.path(),
            StubConverter::new(),
            BatchConfig {
                continue_on_error: false,
                ..Default::default()
            },
        )
        .run()
        .await;

        assert!(matches!(result, Err(ConverterError::Status { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_sources_sharing_an_output_path() {
        let source = TempDir::new().unwrap();
        write(source.path(), "PAYROLL.cbl", "       IDENTIFICATION DIVISION.\n");
        write(source.path(), "PAYROLL.cob", "       DATA DIVISION.\n");
        let output = TempDir::new().unwrap();
        let converter = StubConverter::new();

        let report = pipeline(
            source.path(),
            output.path(),
            converter.clone(),
            BatchConfig::default(),
        )
        .run()
        .await
        .unwrap();

        assert_eq!(report.classified, 2);
        assert_eq!(report.converted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(converter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, source.path().join("PAYROLL.cob"));
        assert!(report.errors[0].error.contains("PAYROLL.cbl"));
        assert!(output.path().join("PAYROLL.rs").exists());
    }

    #[tokio::test]
    async fn test_output_collision_stops_run_when_errors_are_fatal() {
        let source = TempDir::new().unwrap();
        write(source.path(), "PAYROLL.cbl", "       IDENTIFICATION DIVISION.\n");
        write(source.path(), "PAYROLL.cob", "       DATA DIVISION.\n");
        let output = TempDir::new().unwrap();
        let converter = StubConverter::new();

        let result = pipeline(
            source.path(),
            output.path(),
            converter.clone(),
            BatchConfig {
                continue_on_error: false,
                ..Default::default()
            },
        )
        .run()
        .await;

        assert!(matches!(result, Err(ConverterError::OutputCollision { .. })));
        assert_eq!(converter.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_rerun_skips_nested_output_directory() {
        let source = source_tree();
        let config = ConverterConfig {
            source_dir: source.path().to_path_buf(),
            output_dir: source.path().join("converted"),
            ..Default::default()
        };

        let first = ConversionPipeline::from_config(&config, StubConverter::new())
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(first.converted, 3);
        assert!(source.path().join("converted/batch/PAYROLL.rs").exists());

        // A second run with another target must not pick up the first run's outputs
        let config = ConverterConfig {
            target_language: "java".to_string(),
            ..config
        };
        let second = ConversionPipeline::from_config(&config, StubConverter::new())
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(second.scanned, first.scanned);
        assert_eq!(second.converted, 4);
        assert!(!source.path().join("converted/converted").exists());
        assert!(source.path().join("converted/ported/lib.java").exists());
    }

    #[tokio::test]
    async fn test_from_config_rejects_unknown_target() {
        let config = ConverterConfig {
            target_language: "klingon".to_string(),
            ..Default::default()
        };

        let result = ConversionPipeline::from_config(&config, StubConverter::new());

        assert!(matches!(result, Err(ConverterError::UnknownLanguage(_))));
    }
}
