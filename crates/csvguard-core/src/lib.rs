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

//! Core schema parsing and validation engine for CSVGuard.
//!
//! This crate provides the schema-language frontend and the streaming CSV
//! validator: parse a schema with [`parse_schema`], then run a
//! [`CsvValidator`] over CSV input to collect positioned [`Diagnostic`]
//! findings.
//!
//! # Lexical Analysis
//!
//! The [`lex`] module holds the hand-rolled scanner for the schema
//! language, with [`lex::SourcePos`] line/column tracking used by parse
//! problems and the derivation trace.
//!
//! # Validation
//!
//! Validation is a single forward pass: input bytes are decoded per the
//! configured [`Encoding`] (optionally strict-UTF-8 checked up front), rows
//! are scanned through the `csv` crate, and every declared rule chain is
//! evaluated per cell. Row findings are [`Diagnostic`] values; only
//! configuration, schema, encoding and I/O failures surface as [`RunError`].

mod config;
mod diagnostic;
mod error;
pub mod lex;
mod parser;
mod pathcheck;
mod reader;
pub mod rules;
mod schema;
mod validator;

pub use config::{
    validate_strict_utf8, Encoding, RunConfig, RunConfigBuilder, Substitution,
    DEFAULT_MAX_CHARS_PER_CELL,
};
pub use diagnostic::{Diagnostic, Severity};
pub use error::{ParseProblem, RunError, RunResult, SchemaParseFailure};
pub use parser::{parse_schema, parse_schema_traced, ParseTrace, TraceEvent};
pub use reader::{Row, RowReader};
pub use schema::{ColumnCountPolicy, ColumnDefinition, ColumnFlags, Directives, RowRule, Schema};
pub use validator::{CsvValidator, ProgressReporter, RunState, ValidationReport};

// Re-export the rule model for programmatic schema construction.
pub use rules::{RuleExpr, RuleOutcome, ValueRef, ValueType};
