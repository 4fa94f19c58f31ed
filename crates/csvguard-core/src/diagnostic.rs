// Dweve CSVGuard - Schema-Driven CSV Validation
//
// Copyright (c) 2025 Dweve IP B.V. and individual contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Validation diagnostic types.
//!
//! A [`Diagnostic`] is one reported validation outcome: severity, message,
//! 1-based source line, zero-based column index (`None` for row-level
//! findings), and the identifier of the rule that produced it. The validator
//! emits diagnostics in ascending `(line, column)` order, with row-level
//! findings sorting before column 0 within a row.

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    /// Might be an issue; never aborts a fail-fast run.
    Warning,
    /// Definitely an issue.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One reported validation outcome with source position.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Diagnostic {
    severity: Severity,
    message: String,
    /// 1-based line number in the CSV input.
    line: u64,
    /// Zero-based column index; `None` marks a row-level finding.
    column: Option<usize>,
    /// Identifier of the rule that produced this diagnostic.
    rule: String,
}

impl Diagnostic {
    /// Creates an Error-severity diagnostic.
    pub fn error(message: impl Into<String>, line: u64, rule: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            line,
            column: None,
            rule: rule.into(),
        }
    }

    /// Creates a Warning-severity diagnostic.
    pub fn warning(message: impl Into<String>, line: u64, rule: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            line,
            column: None,
            rule: rule.into(),
        }
    }

    /// Attaches a zero-based column index.
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    /// Downgrades an Error to a Warning (used for `@warning` columns).
    pub fn demote_to_warning(mut self) -> Self {
        self.severity = Severity::Warning;
        self
    }

    // Public getters

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn column(&self) -> Option<usize> {
        self.column
    }

    pub fn rule(&self) -> &str {
        &self.rule
    }

    /// `true` for row-level diagnostics (no single offending column).
    pub fn is_row_level(&self) -> bool {
        self.column.is_none()
    }

    /// Ordering key: row-level findings sort before column 0 of their row.
    pub fn sort_key(&self) -> (u64, usize) {
        (self.line, self.column.map_or(0, |c| c + 1))
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column {
            Some(col) => write!(
                f,
                "line {}, column {}: [{}] {}: {}",
                self.line, col, self.rule, self.severity, self.message
            ),
            None => write!(
                f,
                "line {}: [{}] {}: {}",
                self.line, self.rule, self.severity, self.message
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Severity tests ====================

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(format!("{}", Severity::Warning), "warning");
        assert_eq!(format!("{}", Severity::Error), "error");
    }

    // ==================== Constructor tests ====================

    #[test]
    fn test_error_constructor() {
        let diag = Diagnostic::error("bad cell", 7, "regex");
        assert_eq!(diag.severity(), Severity::Error);
        assert_eq!(diag.message(), "bad cell");
        assert_eq!(diag.line(), 7);
        assert_eq!(diag.rule(), "regex");
        assert!(diag.is_row_level());
    }

    #[test]
    fn test_warning_constructor() {
        let diag = Diagnostic::warning("suspicious", 3, "is");
        assert_eq!(diag.severity(), Severity::Warning);
    }

    #[test]
    fn test_with_column() {
        let diag = Diagnostic::error("bad", 1, "is").with_column(2);
        assert_eq!(diag.column(), Some(2));
        assert!(!diag.is_row_level());
    }

    #[test]
    fn test_demote_to_warning() {
        let diag = Diagnostic::error("bad", 1, "is").demote_to_warning();
        assert_eq!(diag.severity(), Severity::Warning);
    }

    // ==================== Ordering tests ====================

    #[test]
    fn test_row_level_sorts_before_column_zero() {
        let row = Diagnostic::error("row issue", 5, "columnCount");
        let col = Diagnostic::error("cell issue", 5, "is").with_column(0);
        assert!(row.sort_key() < col.sort_key());
    }

    #[test]
    fn test_sort_key_by_line_then_column() {
        let a = Diagnostic::error("a", 2, "r").with_column(3);
        let b = Diagnostic::error("b", 3, "r").with_column(0);
        assert!(a.sort_key() < b.sort_key());
    }

    // ==================== Display tests ====================

    #[test]
    fn test_display_with_column() {
        let diag = Diagnostic::error("value out of range", 12, "range").with_column(4);
        let text = format!("{}", diag);
        assert!(text.contains("line 12, column 4"));
        assert!(text.contains("[range]"));
        assert!(text.contains("error"));
        assert!(text.contains("value out of range"));
    }

    #[test]
    fn test_display_row_level() {
        let diag = Diagnostic::error("expected 3 columns, got 2", 9, "columnCount");
        let text = format!("{}", diag);
        assert!(text.contains("line 9:"));
        assert!(!text.contains(", column"));
    }
}
