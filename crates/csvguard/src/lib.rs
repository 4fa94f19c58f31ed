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

//! CSVGuard - schema-driven CSV validation.
//!
//! The one-stop entry point is [`ValidatorBuilder`]: point it at a CSV file
//! and a schema file (or in-memory text), tune the run, and call
//! [`validate`](ValidatorBuilder::validate):
//!
//! ```no_run
//! use csvguard::ValidatorBuilder;
//!
//! # fn main() -> Result<(), csvguard::RunError> {
//! let report = ValidatorBuilder::from_files("batch.csv", "batch.csvs")
//!     .fail_fast(true)
//!     .path_substitution("/dropzone", "/mnt/transfer")
//!     .validate()?;
//!
//! for diagnostic in report.diagnostics() {
//!     eprintln!("{}", diagnostic);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Everything the core engine exposes is re-exported here, so depending on
//! `csvguard` alone is enough for programmatic use.

use std::fs;
use std::path::PathBuf;

pub use csvguard_core::{
    parse_schema, parse_schema_traced, ColumnCountPolicy, ColumnDefinition, ColumnFlags,
    CsvValidator, Diagnostic, Directives, Encoding, ParseProblem, ParseTrace, ProgressReporter,
    RowRule, RuleExpr, RunConfig, RunConfigBuilder, RunError, RunResult, RunState, Schema,
    SchemaParseFailure, Severity, Substitution, TraceEvent, ValidationReport, ValueType,
    DEFAULT_MAX_CHARS_PER_CELL,
};

enum Input {
    Files { csv: PathBuf, schema: PathBuf },
    Text { csv: String, schema: String },
}

/// Configures and runs one validation from start to finish.
///
/// Wraps schema loading, parsing, configuration and the run itself; the
/// individual pieces remain available through [`CsvValidator`] for callers
/// that reuse a parsed [`Schema`] across many inputs.
pub struct ValidatorBuilder {
    input: Input,
    fail_fast: bool,
    path_substitutions: Vec<Substitution>,
    enforce_case_sensitive_path_checks: bool,
    skip_file_checks: bool,
    trace: bool,
    max_chars_per_cell: usize,
    encoding: Encoding,
    strict_utf8: bool,
    progress: Option<Box<dyn ProgressReporter>>,
}

impl ValidatorBuilder {
    /// Validates the CSV file at `csv` against the schema file at `schema`.
    pub fn from_files(csv: impl Into<PathBuf>, schema: impl Into<PathBuf>) -> Self {
        Self::new(Input::Files {
            csv: csv.into(),
            schema: schema.into(),
        })
    }

    /// Validates in-memory CSV text against in-memory schema text.
    pub fn from_text(csv: impl Into<String>, schema: impl Into<String>) -> Self {
        Self::new(Input::Text {
            csv: csv.into(),
            schema: schema.into(),
        })
    }

    fn new(input: Input) -> Self {
        Self {
            input,
            fail_fast: false,
            path_substitutions: Vec::new(),
            enforce_case_sensitive_path_checks: false,
            skip_file_checks: false,
            trace: false,
            max_chars_per_cell: DEFAULT_MAX_CHARS_PER_CELL,
            encoding: Encoding::default(),
            strict_utf8: false,
            progress: None,
        }
    }

    /// Stop at the first Error-severity diagnostic.
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Adds a `from → to` prefix substitution for `fileExists` checks.
    /// Repeatable; the first matching prefix wins.
    pub fn path_substitution(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.path_substitutions.push(Substitution::new(from, to));
        self
    }

    /// Adds a batch of prefix substitutions, keeping any added before.
    pub fn path_substitutions(mut self, subs: Vec<Substitution>) -> Self {
        self.path_substitutions.extend(subs);
        self
    }

    /// Rejects `fileExists` paths that resolve only under different casing.
    pub fn enforce_case_sensitive_path_checks(mut self, enforce: bool) -> Self {
        self.enforce_case_sensitive_path_checks = enforce;
        self
    }

    /// Makes every `fileExists` check succeed without touching the disk.
    pub fn skip_file_checks(mut self, skip: bool) -> Self {
        self.skip_file_checks = skip;
        self
    }

    /// Records the schema parser's derivation trace in the report.
    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Caps cell size; longer cells are truncated and reported.
    pub fn max_chars_per_cell(mut self, max: usize) -> Self {
        self.max_chars_per_cell = max;
        self
    }

    /// Input byte encoding. Defaults to UTF-8.
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Validates the whole input as UTF-8 before the first row.
    pub fn strict_utf8(mut self, strict: bool) -> Self {
        self.strict_utf8 = strict;
        self
    }

    /// Attaches a progress sink, called synchronously after every row.
    pub fn progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Loads the inputs, parses the schema and runs the validation.
    ///
    /// # Errors
    ///
    /// [`RunError::Configuration`] for contradictory settings (for example
    /// strict UTF-8 with a non-UTF-8 encoding), [`RunError::SchemaParse`]
    /// with every schema problem found, [`RunError::Encoding`] under strict
    /// UTF-8 validation, and [`RunError::Io`] for unreadable inputs.
    pub fn validate(self) -> RunResult<ValidationReport> {
        let config = RunConfig::builder()
            .fail_fast(self.fail_fast)
            .path_substitutions(self.path_substitutions)
            .enforce_case_sensitive_path_checks(self.enforce_case_sensitive_path_checks)
            .skip_file_checks(self.skip_file_checks)
            .trace(self.trace)
            .max_chars_per_cell(self.max_chars_per_cell)
            .encoding(self.encoding)
            .strict_utf8(self.strict_utf8)
            .build()?;

        let (csv_bytes, schema_text) = match self.input {
            Input::Files { csv, schema } => (fs::read(csv)?, fs::read_to_string(schema)?),
            Input::Text { csv, schema } => (csv.into_bytes(), schema),
        };

        let (schema, trace) = if self.trace {
            let (result, trace) = parse_schema_traced(&schema_text);
            match result {
                Ok(schema) => (schema, Some(trace)),
                // A failed parse still carries the trace recorded so far.
                Err(failure) => return Err(RunError::SchemaParse(failure.with_trace(trace))),
            }
        } else {
            (parse_schema(&schema_text)?, None)
        };

        let mut validator = CsvValidator::new(schema, config);
        if let Some(progress) = self.progress {
            validator = validator.with_progress(progress);
        }
        let report = validator.validate_bytes(&csv_bytes)?;
        Ok(match trace {
            Some(trace) => report.with_trace(trace),
            None => report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_text_round_trip() {
        let report = ValidatorBuilder::from_text(
            "1,alpha\n",
            "version 1.0\n@noHeader\nid: regex(\"[0-9]+\")\nname: notEmpty\n",
        )
        .validate()
        .unwrap();
        assert!(report.is_valid());
    }

    #[test]
    fn test_schema_problems_surface_as_run_error() {
        let err = ValidatorBuilder::from_text("a\n", "version 1.0\nid: frobnicate\n")
            .validate()
            .unwrap_err();
        assert!(matches!(err, RunError::SchemaParse(_)));
    }

    #[test]
    fn test_contradictory_configuration_rejected_before_reading() {
        let err = ValidatorBuilder::from_text("a\n", "version 1.0\n@noHeader\nid: notEmpty\n")
            .encoding(Encoding::Iso8859_1)
            .strict_utf8(true)
            .validate()
            .unwrap_err();
        assert!(matches!(err, RunError::Configuration(_)));
    }

    #[test]
    fn test_trace_attached_when_requested() {
        let report = ValidatorBuilder::from_text(
            "1\n",
            "version 1.0\n@noHeader\nid: notEmpty\n",
        )
        .trace(true)
        .validate()
        .unwrap();
        assert!(report.trace().is_some());
        assert!(!report.trace().unwrap().is_empty());
    }

    #[test]
    fn test_traced_parse_failure_keeps_the_trace() {
        let err = ValidatorBuilder::from_text("1\n", "version 1.0\nid: frobnicate\n")
            .trace(true)
            .validate()
            .unwrap_err();
        let RunError::SchemaParse(failure) = err else {
            panic!("expected a schema parse failure");
        };
        let trace = failure.trace().expect("trace requested but missing");
        let productions: Vec<&str> = trace
            .events()
            .iter()
            .map(|e| e.production.as_str())
            .collect();
        assert!(productions.contains(&"version"));
        assert!(productions.contains(&"atom:frobnicate"));
    }

    #[test]
    fn test_untraced_parse_failure_has_no_trace() {
        let err = ValidatorBuilder::from_text("1\n", "version 1.0\nid: frobnicate\n")
            .validate()
            .unwrap_err();
        let RunError::SchemaParse(failure) = err else {
            panic!("expected a schema parse failure");
        };
        assert!(failure.trace().is_none());
    }

    #[test]
    fn test_trace_absent_by_default() {
        let report = ValidatorBuilder::from_text("1\n", "version 1.0\n@noHeader\nid: notEmpty\n")
            .validate()
            .unwrap();
        assert!(report.trace().is_none());
    }
}
