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

//! Error taxonomy for validation runs.
//!
//! Only conditions that are fatal to a whole run live here. Row-level
//! findings are [`Diagnostic`](crate::Diagnostic) values, never errors: the
//! engine never panics on malformed input and never discards diagnostics it
//! has already collected.
//!
//! # Error Categories
//!
//! - **Configuration**: invalid option combination, raised eagerly at
//!   [`RunConfigBuilder::build`](crate::RunConfigBuilder::build) time.
//! - **SchemaParse**: the schema source is malformed; carries every problem
//!   the parser could collect in one pass, not just the first.
//! - **Encoding**: the CSV byte stream violates the strict encoding policy;
//!   raised before the first row is emitted.
//! - **Io**: the input streams could not be read.

use crate::lex::SourcePos;
use crate::parser::ParseTrace;
use std::fmt;
use thiserror::Error;

/// A single positioned problem found while parsing schema source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseProblem {
    /// Human-readable description.
    pub message: String,
    /// Where in the schema source the problem was found.
    pub pos: SourcePos,
}

impl ParseProblem {
    /// Creates a parse problem.
    pub fn new(message: impl Into<String>, pos: SourcePos) -> Self {
        Self {
            message: message.into(),
            pos,
        }
    }
}

impl fmt::Display for ParseProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.pos, self.message)
    }
}

/// Schema parse failure carrying one or more positioned problems.
///
/// The parser recovers at declaration boundaries, so a single pass reports
/// as many structural problems as it can find.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct SchemaParseFailure {
    /// All problems found, in source order.
    pub problems: Vec<ParseProblem>,
    trace: Option<ParseTrace>,
}

impl SchemaParseFailure {
    /// Wraps a list of problems. Callers must pass at least one.
    pub fn new(problems: Vec<ParseProblem>) -> Self {
        debug_assert!(!problems.is_empty());
        Self {
            problems,
            trace: None,
        }
    }

    /// Attaches the derivation trace recorded up to the failure, showing
    /// which productions matched before the parse fell over.
    pub fn with_trace(mut self, trace: ParseTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    /// The derivation trace, when tracing was requested.
    pub fn trace(&self) -> Option<&ParseTrace> {
        self.trace.as_ref()
    }
}

impl fmt::Display for SchemaParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "schema parse failed with {} problem(s):", self.problems.len())?;
        for problem in &self.problems {
            writeln!(f, "  {}", problem)?;
        }
        Ok(())
    }
}

/// Fatal errors for a validation run.
#[derive(Debug, Error)]
pub enum RunError {
    /// Invalid option combination, detected before any parsing or streaming.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The schema source could not be parsed.
    #[error("{0}")]
    SchemaParse(#[from] SchemaParseFailure),

    /// The CSV byte stream violates the strict encoding policy.
    #[error("encoding error at line {line} (byte offset {offset}): {message}")]
    Encoding {
        /// Byte offset of the first invalid sequence.
        offset: usize,
        /// 1-based line reached at that offset.
        line: u64,
        /// Description of the invalid sequence.
        message: String,
    },

    /// An input stream could not be read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RunError {
    /// Create a configuration error.
    #[inline]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an encoding error.
    #[inline]
    pub fn encoding(offset: usize, line: u64, message: impl Into<String>) -> Self {
        Self::Encoding {
            offset,
            line,
            message: message.into(),
        }
    }
}

/// Result type for validation runs.
pub type RunResult<T> = Result<T, RunError>;
