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

//! CSVGuard command line interface.
//!
//! ```bash
//! # Validate a CSV file against its schema
//! csvguard batch.csv batch.csvs
//!
//! # Machine-readable report, stopping at the first error
//! csvguard batch.csv batch.csvs --fail-fast --json
//!
//! # Remap dropzone paths for fileExists checks
//! csvguard batch.csv batch.csvs --path-substitution /dropzone=/mnt/transfer
//! ```
//!
//! Exit codes: 0 when the input is valid, 1 when diagnostics were reported,
//! 2 on a fatal error (configuration, schema, encoding or I/O).

use clap::{Parser, ValueEnum};
use colored::Colorize;
use csvguard::{
    Diagnostic, Encoding, RunError, RunState, Severity, Substitution, ValidationReport,
    ValidatorBuilder, DEFAULT_MAX_CHARS_PER_CELL,
};
use std::path::PathBuf;
use std::process::ExitCode;

/// Validate a CSV file against a CSVGuard schema.
#[derive(Parser)]
#[command(name = "csvguard")]
#[command(author, version, about = "Schema-driven CSV validation", long_about = None)]
struct Cli {
    /// CSV file to validate.
    csv: PathBuf,

    /// Schema file describing the expected layout.
    schema: PathBuf,

    /// Stop at the first Error-severity finding.
    #[arg(long)]
    fail_fast: bool,

    /// Remap a path prefix for fileExists checks, as FROM=TO. Repeatable;
    /// the first matching prefix wins.
    #[arg(long, value_name = "FROM=TO", value_parser = parse_substitution)]
    path_substitution: Vec<Substitution>,

    /// Reject fileExists paths that resolve only under different casing.
    #[arg(long)]
    case_sensitive_paths: bool,

    /// Let every fileExists check pass without touching the disk.
    #[arg(long)]
    skip_file_checks: bool,

    /// Print the schema parser's derivation trace to stderr.
    #[arg(long)]
    trace: bool,

    /// Maximum characters per cell; longer cells are truncated and reported.
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_CHARS_PER_CELL)]
    max_cell_chars: usize,

    /// Input byte encoding.
    #[arg(long, value_enum, default_value_t = EncodingArg::Utf8)]
    encoding: EncodingArg,

    /// Validate the whole input as UTF-8 before the first row.
    #[arg(long)]
    strict_utf8: bool,

    /// Emit the report as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Suppress per-diagnostic output; the exit code still reports the
    /// outcome.
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EncodingArg {
    #[value(name = "utf-8")]
    Utf8,
    #[value(name = "iso-8859-1")]
    Iso8859_1,
    #[value(name = "windows-1252")]
    Windows1252,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Utf8 => Encoding::Utf8,
            EncodingArg::Iso8859_1 => Encoding::Iso8859_1,
            EncodingArg::Windows1252 => Encoding::Windows1252,
        }
    }
}

fn parse_substitution(raw: &str) -> Result<Substitution, String> {
    match raw.split_once('=') {
        Some((from, to)) if !from.is_empty() => Ok(Substitution::new(from, to)),
        _ => Err(format!(
            "expected FROM=TO with a non-empty FROM, got \"{}\"",
            raw
        )),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let report = match run(&cli) {
        Ok(report) => report,
        Err(err) => {
            if let RunError::SchemaParse(ref failure) = err {
                if let Some(trace) = failure.trace() {
                    eprint!("{}", trace);
                }
            }
            eprintln!("{} {}", "error:".red().bold(), err);
            return ExitCode::from(2);
        }
    };

    if let Some(trace) = report.trace() {
        eprint!("{}", trace);
    }
    if cli.json {
        println!("{}", render_json(&report));
    } else if !cli.quiet {
        render_human(&cli, &report);
    }

    if report.diagnostics().is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn run(cli: &Cli) -> Result<ValidationReport, RunError> {
    ValidatorBuilder::from_files(&cli.csv, &cli.schema)
        .fail_fast(cli.fail_fast)
        .enforce_case_sensitive_path_checks(cli.case_sensitive_paths)
        .skip_file_checks(cli.skip_file_checks)
        .trace(cli.trace)
        .max_chars_per_cell(cli.max_cell_chars)
        .encoding(cli.encoding.into())
        .strict_utf8(cli.strict_utf8)
        .path_substitutions(cli.path_substitution.clone())
        .validate()
}

fn render_human(cli: &Cli, report: &ValidationReport) {
    for diagnostic in report.diagnostics() {
        println!("{}", render_diagnostic(diagnostic));
    }
    let errors = count(report, Severity::Error);
    let warnings = count(report, Severity::Warning);
    let file = cli.csv.display();
    if report.diagnostics().is_empty() {
        println!(
            "{} {} - {} row(s), no problems",
            "✓".green().bold(),
            file,
            report.rows_processed()
        );
    } else {
        let aborted = if report.state() == RunState::Aborted {
            ", stopped early"
        } else {
            ""
        };
        println!(
            "{} {} - {} error(s), {} warning(s) in {} row(s){}",
            "✗".red().bold(),
            file,
            errors,
            warnings,
            report.rows_processed(),
            aborted
        );
    }
}

fn render_diagnostic(diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity() {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow().bold(),
    };
    let position = match diagnostic.column() {
        Some(column) => format!("line {}, column {}", diagnostic.line(), column + 1),
        None => format!("line {}", diagnostic.line()),
    };
    format!("{}: {}: {}", position, severity, diagnostic.message())
}

fn render_json(report: &ValidationReport) -> String {
    let state = match report.state() {
        RunState::Initializing => "initializing",
        RunState::Streaming => "streaming",
        RunState::Completed => "completed",
        RunState::Aborted => "aborted",
    };
    let value = serde_json::json!({
        "valid": report.diagnostics().is_empty(),
        "state": state,
        "rows_processed": report.rows_processed(),
        "diagnostics": report.diagnostics(),
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
}

fn count(report: &ValidationReport, severity: Severity) -> usize {
    report
        .diagnostics()
        .iter()
        .filter(|d| d.severity() == severity)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_substitution_accepts_from_to() {
        let sub = parse_substitution("/old=/new").unwrap();
        assert_eq!(sub.from(), "/old");
        assert_eq!(sub.to(), "/new");
    }

    #[test]
    fn test_parse_substitution_rejects_missing_equals() {
        assert!(parse_substitution("/old").is_err());
        assert!(parse_substitution("=/new").is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
