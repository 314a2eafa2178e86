//! Language registry and extension-based detection.
//!
//! The registry is a fixed, ordered table. Lookups scan it in order, so if two
//! descriptors ever claimed the same extension the earlier one would win.

use std::path::Path;

use serde::Serialize;

/// A language the converter knows about.
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
pub struct LanguageDescriptor {
    /// Stable lowercase identifier, e.g. "cobol".
    pub name: &'static str,
    /// Human-readable form, e.g. "COBOL".
    pub display_name: &'static str,
    /// Lowercase extensions including the leading dot. The first one is the
    /// extension used when writing files in this language.
    pub extensions: &'static [&'static str],
}

impl LanguageDescriptor {
    /// Extension used for files produced in this language.
    pub fn primary_extension(&self) -> &'static str {
        self.extensions.first().copied().unwrap_or("")
    }

    pub fn has_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| *e == ext)
    }
}

impl std::fmt::Display for LanguageDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name)
    }
}

pub static COBOL: LanguageDescriptor = LanguageDescriptor {
    name: "cobol",
    display_name: "COBOL",
    extensions: &[".cbl", ".cob", ".cpy", ".cobol"],
};

pub static FORTRAN: LanguageDescriptor = LanguageDescriptor {
    name: "fortran",
    display_name: "Fortran",
    extensions: &[".f90", ".f", ".for", ".f77", ".f95", ".f03", ".ftn"],
};

pub static PASCAL: LanguageDescriptor = LanguageDescriptor {
    name: "pascal",
    display_name: "Pascal",
    extensions: &[".pas", ".pp", ".dpr", ".lpr"],
};

pub static VB6: LanguageDescriptor = LanguageDescriptor {
    name: "vb6",
    display_name: "Visual Basic 6",
    extensions: &[".bas", ".cls", ".frm", ".vbp", ".ctl"],
};

pub static PERL: LanguageDescriptor = LanguageDescriptor {
    name: "perl",
    display_name: "Perl",
    extensions: &[".pl", ".pm", ".t"],
};

pub static C: LanguageDescriptor = LanguageDescriptor {
    name: "c",
    display_name: "C",
    extensions: &[".c", ".h"],
};

pub static CPP: LanguageDescriptor = LanguageDescriptor {
    name: "cpp",
    display_name: "C++",
    extensions: &[".cpp", ".cc", ".cxx", ".hpp", ".hxx", ".hh"],
};

pub static CSHARP: LanguageDescriptor = LanguageDescriptor {
    name: "csharp",
    display_name: "C#",
    extensions: &[".cs"],
};

pub static JAVA: LanguageDescriptor = LanguageDescriptor {
    name: "java",
    display_name: "Java",
    extensions: &[".java"],
};

pub static PYTHON: LanguageDescriptor = LanguageDescriptor {
    name: "python",
    display_name: "Python",
    extensions: &[".py", ".pyw"],
};

pub static JAVASCRIPT: LanguageDescriptor = LanguageDescriptor {
    name: "javascript",
    display_name: "JavaScript",
    extensions: &[".js", ".mjs", ".cjs", ".jsx"],
};

pub static TYPESCRIPT: LanguageDescriptor = LanguageDescriptor {
    name: "typescript",
    display_name: "TypeScript",
    extensions: &[".ts", ".tsx"],
};

pub static GO: LanguageDescriptor = LanguageDescriptor {
    name: "go",
    display_name: "Go",
    extensions: &[".go"],
};

pub static RUST: LanguageDescriptor = LanguageDescriptor {
    name: "rust",
    display_name: "Rust",
    extensions: &[".rs"],
};

pub static PHP: LanguageDescriptor = LanguageDescriptor {
    name: "php",
    display_name: "PHP",
    extensions: &[".php"],
};

pub static RUBY: LanguageDescriptor = LanguageDescriptor {
    name: "ruby",
    display_name: "Ruby",
    extensions: &[".rb"],
};

pub static SHELL: LanguageDescriptor = LanguageDescriptor {
    name: "shell",
    display_name: "Shell",
    extensions: &[".sh", ".bash", ".ksh"],
};

/// Every registered language, in lookup order.
pub static LANGUAGES: &[&LanguageDescriptor] = &[
    &COBOL,
    &FORTRAN,
    &PASCAL,
    &VB6,
    &PERL,
    &C,
    &CPP,
    &CSHARP,
    &JAVA,
    &PYTHON,
    &JAVASCRIPT,
    &TYPESCRIPT,
    &GO,
    &RUST,
    &PHP,
    &RUBY,
    &SHELL,
];

/// Look up a language by canonical name (case-insensitive).
pub fn by_name(name: &str) -> Option<&'static LanguageDescriptor> {
    let name = name.trim();
    LANGUAGES
        .iter()
        .copied()
        .find(|lang| lang.name.eq_ignore_ascii_case(name))
}

/// Lowercased extension of the final path segment, including the dot.
///
/// Only the last dot counts, so `archive.tar.gz` gives `.gz`. A segment with
/// no further dot after a leading one (`.gitignore`) has no extension.
pub fn extension_of(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    let idx = file_name.rfind('.')?;
    if idx == 0 {
        return None;
    }
    Some(file_name[idx..].to_lowercase())
}

/// First registered language whose extension set contains the path's extension.
pub fn resolve_extension(path: &Path) -> Option<&'static LanguageDescriptor> {
    let ext = extension_of(path)?;
    LANGUAGES.iter().copied().find(|lang| lang.has_extension(&ext))
}
