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

//! The validation run: orchestrates decoding, header handling, row scanning
//! and rule evaluation into an ordered diagnostic report.
//!
//! Per row, checks run in a fixed order: cell-count policy first (a
//! mismatched row cannot be aligned with the schema, so its rules are
//! skipped), then oversized-cell reports, then whole-row rules, then
//! per-column rule chains in declaration order. The final report is sorted
//! by (line, position), with row-level diagnostics ahead of any column.
//!
//! In fail-fast mode the run collects exactly the earliest Error and stops
//! reading; Warnings never abort a run and are not collected in that mode.

use crate::config::RunConfig;
use crate::diagnostic::{Diagnostic, Severity};
use crate::error::RunResult;
use crate::parser::ParseTrace;
use crate::reader::{Row, RowReader};
use crate::rules::{evaluate, EvalContext, RuleOutcome, SeenValues};
use crate::schema::{ColumnCountPolicy, Schema};
use std::io::Read;

/// Lifecycle of one validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Created, nothing read yet.
    Initializing,
    /// Rows are being consumed.
    Streaming,
    /// The input was read to the end.
    Completed,
    /// Fail-fast stopped the run early.
    Aborted,
}

/// Receives a synchronous callback after every processed data row.
pub trait ProgressReporter {
    /// Called with the cumulative number of data rows processed so far.
    fn rows_processed(&mut self, rows: u64);
}

/// The outcome of a validation run.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
    rows_processed: u64,
    state: RunState,
    trace: Option<ParseTrace>,
}

impl ValidationReport {
    /// All findings, ordered by (line, position).
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of data rows consumed (the header row is not counted).
    pub fn rows_processed(&self) -> u64 {
        self.rows_processed
    }

    /// Terminal state of the run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The schema parse trace, when tracing was requested.
    pub fn trace(&self) -> Option<&ParseTrace> {
        self.trace.as_ref()
    }

    /// `true` when the run produced no diagnostics at all.
    pub fn is_valid(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// `true` when at least one Error-severity diagnostic was collected.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity() == Severity::Error)
    }

    /// Attaches a parse trace to the report.
    pub fn with_trace(mut self, trace: ParseTrace) -> Self {
        self.trace = Some(trace);
        self
    }
}

/// Validates CSV input against a parsed [`Schema`].
///
/// Holds only per-run state; two independent validators may run
/// concurrently. Uniqueness state is reset on entry to every run.
pub struct CsvValidator {
    schema: Schema,
    config: RunConfig,
    progress: Option<Box<dyn ProgressReporter>>,
}

impl CsvValidator {
    /// Creates a validator for a schema under the given configuration.
    pub fn new(schema: Schema, config: RunConfig) -> Self {
        Self {
            schema,
            config,
            progress: None,
        }
    }

    /// Attaches a progress sink, invoked synchronously after every row.
    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// The schema this validator runs.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validates raw bytes, honoring the configured encoding.
    ///
    /// # Errors
    ///
    /// Under strict UTF-8 validation the whole byte stream is checked before
    /// the first row; an invalid sequence fails the run with
    /// [`RunError::Encoding`](crate::error::RunError::Encoding). An invalid
    /// option combination fails with
    /// [`RunError::Configuration`](crate::error::RunError::Configuration)
    /// before any byte is read.
    pub fn validate_bytes(&mut self, bytes: &[u8]) -> RunResult<ValidationReport> {
        self.config.ensure_valid()?;
        if self.config.strict_utf8 {
            crate::config::validate_strict_utf8(bytes)?;
        }
        let text = self.config.encoding.decode(bytes);
        self.run(&text)
    }

    /// Validates already-decoded text.
    pub fn validate_str(&mut self, text: &str) -> RunResult<ValidationReport> {
        self.config.ensure_valid()?;
        if self.config.strict_utf8 {
            // Already a str, so the scan can only pass; kept for the state
            // contract that strict validation precedes the first row.
            crate::config::validate_strict_utf8(text.as_bytes())?;
        }
        self.run(text)
    }

    /// Reads a collaborator to the end, then validates its bytes.
    pub fn validate_reader<R: Read>(&mut self, mut reader: R) -> RunResult<ValidationReport> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.validate_bytes(&bytes)
    }

    fn run(&mut self, text: &str) -> RunResult<ValidationReport> {
        let mut seen = SeenValues::new();
        let mut diagnostics = Vec::new();
        let mut rows_processed = 0u64;
        let mut reader = RowReader::new(text, &self.schema.directives, &self.config);
        let mut aborted = false;

        if self.schema.directives.has_header {
            match reader.next_row()? {
                Some(header) => {
                    aborted = self.check_header(&header, &mut diagnostics);
                }
                None => {
                    let diag = Diagnostic::error(
                        "input is empty but the schema declares a header row",
                        1,
                        "header",
                    );
                    aborted = self.emit(diag, &mut diagnostics);
                }
            }
        }

        while !aborted {
            let Some(row) = reader.next_row()? else {
                break;
            };
            aborted = self.process_row(&row, &mut seen, &mut diagnostics);
            rows_processed += 1;
            if let Some(progress) = self.progress.as_mut() {
                progress.rows_processed(rows_processed);
            }
        }

        diagnostics.sort_by_key(Diagnostic::sort_key);
        Ok(ValidationReport {
            diagnostics,
            rows_processed,
            state: if aborted {
                RunState::Aborted
            } else {
                RunState::Completed
            },
            trace: None,
        })
    }

    /// Collects a diagnostic, returning `true` when the run must abort.
    ///
    /// Fail-fast keeps only the earliest Error; Warnings are dropped in
    /// that mode and never abort.
    fn emit(&self, diag: Diagnostic, diagnostics: &mut Vec<Diagnostic>) -> bool {
        if self.config.fail_fast {
            if diag.severity() == Severity::Error {
                diagnostics.push(diag);
                return true;
            }
            false
        } else {
            diagnostics.push(diag);
            false
        }
    }

    /// Header row: count checked against the policy, names compared
    /// case-insensitively; a mismatched name is a Warning.
    fn check_header(&self, header: &Row, diagnostics: &mut Vec<Diagnostic>) -> bool {
        if let ColumnCountPolicy::Fixed(expected) = self.schema.directives.column_count {
            if header.cells.len() != expected {
                let diag = Diagnostic::error(
                    format!(
                        "header has {} cell(s), schema expects {}",
                        header.cells.len(),
                        expected
                    ),
                    header.line,
                    "header",
                );
                return self.emit(diag, diagnostics);
            }
        }
        for definition in &self.schema.columns {
            let Some(cell) = header.cells.get(definition.position) else {
                continue;
            };
            if cell.to_lowercase() != definition.name.to_lowercase() {
                let diag = Diagnostic::warning(
                    format!(
                        "header cell \"{}\" does not match column \"{}\"",
                        cell, definition.name
                    ),
                    header.line,
                    "header",
                )
                .with_column(definition.position);
                if self.emit(diag, diagnostics) {
                    return true;
                }
            }
        }
        false
    }

    fn process_row(
        &self,
        row: &Row,
        seen: &mut SeenValues,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> bool {
        if let ColumnCountPolicy::Fixed(expected) = self.schema.directives.column_count {
            if row.cells.len() != expected {
                // Cells cannot be aligned with the schema; skip the rules.
                let diag = Diagnostic::error(
                    format!(
                        "expected {} cell(s), found {}",
                        expected,
                        row.cells.len()
                    ),
                    row.line,
                    "columnCount",
                );
                return self.emit(diag, diagnostics);
            }
        }

        for &index in &row.oversized {
            let diag = Diagnostic::error(
                format!(
                    "cell {} exceeds the limit of {} characters",
                    index + 1,
                    self.config.max_chars_per_cell
                ),
                row.line,
                "cellLength",
            );
            if self.emit(diag, diagnostics) {
                return true;
            }
        }

        for row_rule in &self.schema.row_rules {
            // Truncated subjects would evaluate against partial data.
            if row.oversized.contains(&row_rule.subject) {
                continue;
            }
            let value = row
                .cells
                .get(row_rule.subject)
                .map(String::as_str)
                .unwrap_or("");
            let mut ctx = EvalContext {
                row: &row.cells,
                config: &self.config,
                seen,
                ignore_case: false,
                subject_column: row_rule.subject,
            };
            if let RuleOutcome::Fail { rule, message } = evaluate(&row_rule.rule, value, &mut ctx)
            {
                let diag = Diagnostic::error(
                    format!("row rule on ${}: {}", row_rule.subject_name, message),
                    row.line,
                    rule,
                );
                if self.emit(diag, diagnostics) {
                    return true;
                }
            }
        }

        for definition in &self.schema.columns {
            let Some(expr) = &definition.rule else {
                continue;
            };
            if row.oversized.contains(&definition.position) {
                continue;
            }
            let Some(value) = row.cells.get(definition.position) else {
                // Only reachable under an open column policy.
                if !definition.flags.optional {
                    let diag = Diagnostic::error(
                        format!("missing value for column \"{}\"", definition.name),
                        row.line,
                        "missing",
                    )
                    .with_column(definition.position);
                    if self.emit(diag, diagnostics) {
                        return true;
                    }
                }
                continue;
            };
            if definition.flags.optional && value.is_empty() {
                continue;
            }
            let mut ctx = EvalContext {
                row: &row.cells,
                config: &self.config,
                seen,
                ignore_case: definition.flags.ignore_case,
                subject_column: definition.position,
            };
            if let RuleOutcome::Fail { rule, message } = evaluate(expr, value, &mut ctx) {
                let mut diag = Diagnostic::error(
                    format!("column \"{}\": {}", definition.name, message),
                    row.line,
                    rule,
                )
                .with_column(definition.position);
                if definition.flags.warning {
                    diag = diag.demote_to_warning();
                }
                if self.emit(diag, diagnostics) {
                    return true;
                }
            }
        }

        false
    }
}
