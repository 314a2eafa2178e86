//! File filtering configuration and rules.
//!
//! Decides which discovered files are handed to the classifier: excluded
//! directories, binary extensions, size limits and user ignore patterns.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{ConverterError, Result};
use crate::DEFAULT_MAX_FILE_SIZE;

/// Configuration for file filtering.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Directory names to skip entirely.
    pub excluded_directories: HashSet<String>,
    /// File extensions to exclude (e.g., ".exe").
    pub excluded_extensions: HashSet<String>,
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Minimum file size in bytes (default: 1).
    pub min_file_size: u64,
    /// Whether to include hidden files and directories.
    pub include_hidden: bool,
    /// Regexes matched against the path relative to the scan root.
    pub ignore_patterns: Vec<String>,
    /// Subtrees to skip, relative to the scan root.
    pub excluded_paths: Vec<PathBuf>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            excluded_directories: default_excluded_directories(),
            excluded_extensions: default_excluded_extensions(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            min_file_size: 1,
            include_hidden: false,
            ignore_patterns: Vec::new(),
            excluded_paths: Vec::new(),
        }
    }
}

fn default_excluded_directories() -> HashSet<String> {
    [
        // Version control
        ".git",
        ".svn",
        ".hg",
        "CVS",
        // Dependencies and build output
        "node_modules",
        "vendor",
        ".venv",
        "venv",
        "__pycache__",
        "target",
        "build",
        "dist",
        "bin",
        "obj",
        // IDE
        ".idea",
        ".vscode",
        ".vs",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_excluded_extensions() -> HashSet<String> {
    [
        // Compiled
        ".pyc", ".so", ".dll", ".dylib", ".class", ".o", ".obj", ".exe", ".a", ".lib",
        // Archives
        ".zip", ".tar", ".gz", ".bz2", ".xz", ".rar", ".7z",
        // Images
        ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".ico", ".svg",
        // Documents
        ".pdf", ".doc", ".docx", ".xls", ".xlsx",
        // Data
        ".db", ".sqlite", ".mdb",
        // Lock files
        ".lock",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// File filter for determining which files to process.
#[derive(Debug)]
pub struct FileFilter {
    config: FilterConfig,
    ignore_regexes: Vec<Regex>,
}

impl FileFilter {
    /// Create a new file filter, compiling the ignore patterns.
    pub fn new(config: FilterConfig) -> Result<Self> {
        let ignore_regexes = config
            .ignore_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ConverterError::Config(format!("invalid ignore pattern {:?}: {}", p, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            ignore_regexes,
        })
    }

    /// Create a filter with default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: FilterConfig::default(),
            ignore_regexes: Vec::new(),
        }
    }

    /// Whether a directory should be descended into.
    pub fn should_descend(&self, dir_name: &str) -> bool {
        if self.config.excluded_directories.contains(dir_name) {
            return false;
        }
        self.config.include_hidden || !dir_name.starts_with('.') || dir_name == "."
    }

    /// Whether `relative` lies inside one of the excluded subtrees.
    pub fn is_excluded_path(&self, relative: &Path) -> bool {
        self.config
            .excluded_paths
            .iter()
            .any(|excluded| relative.starts_with(excluded))
    }

    /// Check if a file should be processed.
    ///
    /// `path` is relative to the scan root. Returns `Ok(())` if the file should
    /// be processed, or `Err(reason)` if it should be skipped.
    pub fn should_process(&self, path: &str, size: u64) -> std::result::Result<(), String> {
        let path_obj = Path::new(path);

        if size < self.config.min_file_size {
            return Err("File is empty".to_string());
        }

        if size > self.config.max_file_size {
            return Err(format!(
                "File too large: {} bytes (max: {})",
                size, self.config.max_file_size
            ));
        }

        if self.is_excluded_path(path_obj) {
            return Err(format!("In excluded path: {}", path));
        }

        if let Some(parent) = path_obj.parent() {
            for component in parent.components() {
                if let Some(name) = component.as_os_str().to_str() {
                    if !self.should_descend(name) {
                        return Err(format!("In excluded directory: {}", name));
                    }
                }
            }
        }

        if let Some(ext) = path_obj.extension().and_then(|e| e.to_str()) {
            let ext_with_dot = format!(".{}", ext.to_lowercase());
            if self.config.excluded_extensions.contains(&ext_with_dot) {
                return Err(format!("Excluded extension: {}", ext_with_dot));
            }
        }

        if let Some(filename) = path_obj.file_name().and_then(|n| n.to_str()) {
            if !self.config.include_hidden && filename.starts_with('.') {
                return Err("Hidden file".to_string());
            }
        }

        for regex in &self.ignore_regexes {
            if regex.is_match(path) {
                return Err(format!("Matches ignore pattern: {}", regex.as_str()));
            }
        }

        Ok(())
    }
}
