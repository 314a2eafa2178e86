//! Content-based detection for files whose extension says nothing.
//!
//! Legacy sources often arrive with generic or missing extensions. The first
//! [`CONTENT_WINDOW_LINES`] lines are lowercased and run through an ordered
//! decision list; the first rule that matches decides the language.
//!
//! Known ambiguity: both Fortran and Pascal programs may open with
//! `program `. The Fortran rule runs first, so such a Pascal file is reported
//! as Fortran. Which order is right depends on the corpus being migrated.

use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::processing::file_processor::read_leading_lines;
use crate::processing::language::{LanguageDescriptor, COBOL, FORTRAN, PASCAL, PERL, VB6};

/// Number of leading lines inspected.
pub const CONTENT_WINDOW_LINES: usize = 20;

lazy_static! {
    /// Fixed-format statement label: indentation followed by a number.
    static ref FIXED_FORM_LABEL: Regex = Regex::new(r"^\s+\d+\s").unwrap();
}

/// A single entry in the decision list.
pub struct ContentRule {
    pub language: &'static LanguageDescriptor,
    matches: fn(&[String]) -> bool,
}

impl ContentRule {
    pub fn matches(&self, lines: &[String]) -> bool {
        (self.matches)(lines)
    }
}

/// Rules in evaluation order.
pub static CONTENT_RULES: &[ContentRule] = &[
    ContentRule {
        language: &COBOL,
        matches: is_cobol,
    },
    ContentRule {
        language: &FORTRAN,
        matches: is_fortran,
    },
    ContentRule {
        language: &VB6,
        matches: is_vb6,
    },
    ContentRule {
        language: &PASCAL,
        matches: is_pascal,
    },
    ContentRule {
        language: &PERL,
        matches: is_perl,
    },
];

fn any_contains(lines: &[String], needles: &[&str]) -> bool {
    lines
        .iter()
        .any(|line| needles.iter().any(|needle| line.contains(needle)))
}

fn any_starts_with(lines: &[String], tokens: &[&str]) -> bool {
    lines.iter().any(|line| {
        let line = line.trim_start();
        tokens.iter().any(|token| line.starts_with(token))
    })
}

fn is_cobol(lines: &[String]) -> bool {
    any_contains(
        lines,
        &["identification division", "data division", "procedure division"],
    )
}

fn is_fortran(lines: &[String]) -> bool {
    any_starts_with(lines, &["program ", "subroutine ", "function "])
        || lines.iter().any(|line| FIXED_FORM_LABEL.is_match(line))
}

fn is_vb6(lines: &[String]) -> bool {
    any_contains(
        lines,
        &["option explicit", "private sub ", "private function "],
    )
}

fn is_pascal(lines: &[String]) -> bool {
    any_starts_with(lines, &["program ", "unit ", "uses "])
}

fn is_perl(lines: &[String]) -> bool {
    let shebang = lines
        .first()
        .map(|line| line.starts_with("#!") && line.contains("perl"))
        .unwrap_or(false);
    shebang || any_contains(lines, &["use strict"])
}

/// Classify already-read text. Only the leading window is considered.
pub fn detect_from_text(content: &str) -> Option<&'static LanguageDescriptor> {
    detect_from_lines(&lowercase_window(content.lines()))
}

/// The first [`CONTENT_WINDOW_LINES`] lines, lowercased for the rules.
fn lowercase_window<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    lines
        .take(CONTENT_WINDOW_LINES)
        .map(str::to_lowercase)
        .collect()
}

/// Run the decision list over lowercased lines.
fn detect_from_lines(lines: &[String]) -> Option<&'static LanguageDescriptor> {
    CONTENT_RULES
        .iter()
        .find(|rule| rule.matches(lines))
        .map(|rule| rule.language)
}

/// Classify a file by its leading content.
///
/// Never fails: unreadable, binary or non-UTF-8 files yield `None`.
pub fn detect_from_content(path: &Path) -> Option<&'static LanguageDescriptor> {
    let lines = match read_leading_lines(path, CONTENT_WINDOW_LINES) {
        Ok(lines) => lines,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Content sniffing skipped");
            return None;
        }
    };

    detect_from_lines(&lowercase_window(lines.iter().map(String::as_str)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cobol_division_markers() {
        assert_eq!(
            detect_from_text("       IDENTIFICATION DIVISION.\n       PROGRAM-ID. PAYROLL."),
            Some(&COBOL)
        );
        assert_eq!(
            detect_from_text("      * header\n       DATA DIVISION."),
            Some(&COBOL)
        );
        assert_eq!(
            detect_from_text("PROCEDURE DIVISION.\n    DISPLAY 'HI'."),
            Some(&COBOL)
        );
    }

    #[test]
    fn test_fortran_leading_tokens() {
        assert_eq!(
            detect_from_text("      SUBROUTINE SOLVE(A, N)\n      END"),
            Some(&FORTRAN)
        );
        assert_eq!(
            detect_from_text("function area(r)\n  real :: r\nend function"),
            Some(&FORTRAN)
        );
        assert_eq!(
            detect_from_text("PROGRAM HELLO\n  PRINT *, 'Hello'\nEND PROGRAM"),
            Some(&FORTRAN)
        );
    }

    #[test]
    fn test_fortran_fixed_form_labels() {
        let src = "C     COMPUTE TOTALS\n      DO 10 I = 1, N\n   10 CONTINUE\n";
        assert_eq!(detect_from_text(src), Some(&FORTRAN));
    }

    #[test]
    fn test_vb6() {
        let src = "Option Explicit\n\nPrivate Sub Button1_Click()\n    MsgBox \"Hi\"\nEnd Sub";
        assert_eq!(detect_from_text(src), Some(&VB6));
        assert_eq!(
            detect_from_text("Private Function Total() As Long\nEnd Function"),
            Some(&VB6)
        );
    }

    #[test]
    fn test_pascal() {
        assert_eq!(
            detect_from_text("unit Geometry;\n\ninterface\n"),
            Some(&PASCAL)
        );
        assert_eq!(
            detect_from_text("uses crt, sysutils;\nbegin\nend."),
            Some(&PASCAL)
        );
    }

    #[test]
    fn test_pascal_program_header_is_claimed_by_fortran() {
        let src = "program Hello;\nbegin\n  writeln('Hello');\nend.";
        assert_eq!(detect_from_text(src), Some(&FORTRAN));
    }

    #[test]
    fn test_perl() {
        assert_eq!(
            detect_from_text("#!/usr/bin/perl -w\nprint \"hi\";"),
            Some(&PERL)
        );
        assert_eq!(
            detect_from_text("# report generator\nuse strict;\nuse warnings;"),
            Some(&PERL)
        );
    }

    #[test]
    fn test_first_match_wins() {
        // COBOL outranks the Fortran-style label on the second line
        let src = "       IDENTIFICATION DIVISION.\n   100 MOVE A TO B.";
        assert_eq!(detect_from_text(src), Some(&COBOL));
    }

    #[test]
    fn test_only_leading_window_is_inspected() {
        let mut src = "plain text\n".repeat(CONTENT_WINDOW_LINES);
        src.push_str("IDENTIFICATION DIVISION.\n");
        assert_eq!(detect_from_text(&src), None);
    }

    #[test]
    fn test_no_match() {
        assert_eq!(detect_from_text("Some random text"), None);
        assert_eq!(detect_from_text(""), None);
    }

    #[test]
    fn test_detect_from_content_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("PAYROLL");
        fs::write(&path, "       IDENTIFICATION DIVISION.\n       PROGRAM-ID. PAYROLL.\n").unwrap();

        assert_eq!(detect_from_content(&path), Some(&COBOL));
    }

    #[test]
    fn test_detect_from_content_dos_file_with_eof_marker() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("PAYROLL");
        fs::write(
            &path,
            "       IDENTIFICATION DIVISION.\r\n       PROGRAM-ID. PAYROLL.\r\n\x1a",
        )
        .unwrap();

        assert_eq!(detect_from_content(&path), Some(&COBOL));
    }

    #[test]
    fn test_file_and_text_agree_on_window() {
        let temp = TempDir::new().unwrap();
        let mut src = "plain text\r\n".repeat(CONTENT_WINDOW_LINES - 1);
        src.push_str("USE STRICT;\r\nIDENTIFICATION DIVISION.\r\n");
        let path = temp.path().join("report");
        fs::write(&path, &src).unwrap();

        assert_eq!(detect_from_text(&src), Some(&PERL));
        assert_eq!(detect_from_content(&path), detect_from_text(&src));
    }

    #[test]
    fn test_detect_from_content_failures_are_none() {
        let temp = TempDir::new().unwrap();
        let binary = temp.path().join("blob");
        fs::write(&binary, b"\x00IDENTIFICATION DIVISION.\x00").unwrap();

        assert_eq!(detect_from_content(&binary), None);
        assert_eq!(detect_from_content(&temp.path().join("missing")), None);
        assert_eq!(detect_from_content(temp.path()), None);
    }
}
