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

//! The parsed, executable schema model.
//!
//! A [`Schema`] is immutable once the parser has produced it. Column
//! positions are unique and contiguous from 0, in declaration order; the
//! parser enforces this by construction and rejects duplicate names.

use crate::rules::RuleExpr;

/// Global options parsed from the schema prologue directives.
#[derive(Debug, Clone)]
pub struct Directives {
    /// Cell separator byte (default `,`). Single ASCII character.
    pub separator: u8,
    /// Quote byte (default `"`). Single ASCII character.
    pub quote: u8,
    /// Whether the CSV input starts with a header row (default true;
    /// disabled by `@noHeader`).
    pub has_header: bool,
    /// Expected width of each row.
    pub column_count: ColumnCountPolicy,
}

impl Default for Directives {
    fn default() -> Self {
        Self {
            separator: b',',
            quote: b'"',
            has_header: true,
            column_count: ColumnCountPolicy::Fixed(0),
        }
    }
}

/// Total column count policy: fixed width or open (variable) width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCountPolicy {
    /// Every row must have exactly this many cells.
    Fixed(usize),
    /// Rows may carry extra trailing cells beyond the declared columns
    /// (`@totalColumns *`); fewer cells than declared is still an error.
    Open,
}

/// Per-column modifier flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnFlags {
    /// `@optional`: an empty cell bypasses the column's rules.
    pub optional: bool,
    /// `@warning`: diagnostics from this column are Warning severity.
    pub warning: bool,
    /// `@ignoreCase`: string comparisons and regexes are case-insensitive.
    pub ignore_case: bool,
}

/// One column declaration: name, position, rule tree, flags.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    /// Column name as written in the schema.
    pub name: String,
    /// Zero-based position; contiguous in declaration order.
    pub position: usize,
    /// The column's rule expression; `None` means unconstrained.
    pub rule: Option<RuleExpr>,
    /// Modifier flags.
    pub flags: ColumnFlags,
}

/// A whole-row rule: a subject column plus an expression evaluated against
/// the subject's cell with full cross-column lookup.
#[derive(Debug, Clone)]
pub struct RowRule {
    /// Zero-based index of the subject column.
    pub subject: usize,
    /// Display name of the subject column.
    pub subject_name: String,
    /// The rule expression.
    pub rule: RuleExpr,
}

/// Parsed, executable representation of the expected CSV structure.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Ordered column definitions; positions are contiguous from 0.
    pub columns: Vec<ColumnDefinition>,
    /// Whole-row rules, in declaration order.
    pub row_rules: Vec<RowRule>,
    /// Global options.
    pub directives: Directives,
}

impl Schema {
    /// Number of cells each row is expected to carry.
    ///
    /// Under the open policy this is the minimum width (the declared
    /// columns); extra trailing cells are permitted.
    pub fn expected_columns(&self) -> usize {
        match self.directives.column_count {
            ColumnCountPolicy::Fixed(n) => n,
            ColumnCountPolicy::Open => self.columns.len(),
        }
    }

    /// Looks up a column index by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
