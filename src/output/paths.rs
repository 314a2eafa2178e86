//! Mapping source files onto the mirrored output tree.

use std::path::{Component, Path, PathBuf};

use crate::processing::language::LanguageDescriptor;

/// Maps paths under the source root to paths under the output root.
#[derive(Debug, Clone)]
pub struct OutputMapper {
    source_root: PathBuf,
    output_root: PathBuf,
    target: &'static LanguageDescriptor,
}

impl OutputMapper {
    pub fn new(
        source_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        target: &'static LanguageDescriptor,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            target,
        }
    }

    pub fn target(&self) -> &'static LanguageDescriptor {
        self.target
    }

    /// Output path for `path`, with the target language's extension.
    ///
    /// Paths outside the source root keep only their file name.
    pub fn map(&self, path: &Path) -> PathBuf {
        let relative = match path.strip_prefix(&self.source_root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => path
                .file_name()
                .map(PathBuf::from)
                .unwrap_or_else(|| path.to_path_buf()),
        };

        let mut mapped = self.output_root.join(relative);
        let new_name = match mapped.file_name().and_then(|n| n.to_str()) {
            Some(name) => {
                let stem = match name.rfind('.') {
                    Some(idx) if idx > 0 => &name[..idx],
                    _ => name,
                };
                format!("{}{}", stem, self.target.primary_extension())
            }
            None => return mapped,
        };
        mapped.set_file_name(new_name);
        mapped
    }
}

/// Where `output_root` sits inside `source_root`, relative to the source root.
///
/// `None` when the output tree is outside the source tree or is the source
/// root itself. Neither path has to exist.
pub fn nested_output_dir(source_root: &Path, output_root: &Path) -> Option<PathBuf> {
    let source = normalize_path(source_root);
    let output = normalize_path(output_root);
    match output.strip_prefix(&source) {
        Ok(relative) if !relative.as_os_str().is_empty() => Some(relative.to_path_buf()),
        _ => None,
    }
}

/// Absolute form of `path` with symlinks resolved as far as the path exists.
fn normalize_path(path: &Path) -> PathBuf {
    let cleaned = clean_path(path);

    // Canonicalize the deepest existing ancestor, then re-append the rest
    let mut existing = cleaned.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            return missing
                .iter()
                .rev()
                .fold(canonical, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => return cleaned,
        }
    }
}

/// Make `path` absolute and drop `.` and `..` components without touching the disk.
fn clean_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    let mut result = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                result.pop();
            }
            other => result.push(other),
        }
    }
    result
}
