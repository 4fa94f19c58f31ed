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

//! Source position tracking for schema-language lexical analysis.
//!
//! Positions are attached to every token and carried into parse problems so
//! that malformed schemas are reported with precise line/column numbers.
//!
//! # Examples
//!
//! ```
//! use csvguard_core::lex::SourcePos;
//!
//! let pos = SourcePos::new(10, 25);
//! assert_eq!(pos.line(), 10);
//! assert_eq!(pos.column(), 25);
//! ```

use std::fmt;

/// A position in schema source (line and column, 1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourcePos {
    line: usize,
    column: usize,
}

impl SourcePos {
    /// Creates a new source position.
    #[inline]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Creates a position at the start of the source (line 1, column 1).
    #[inline]
    pub const fn start() -> Self {
        Self { line: 1, column: 1 }
    }

    /// Returns the line number.
    #[inline]
    pub const fn line(&self) -> usize {
        self.line
    }

    /// Returns the column number.
    #[inline]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Advances the position by one column.
    #[inline]
    pub fn advance_col(&mut self) {
        self.column += 1;
    }

    /// Moves the position to the first column of the next line.
    #[inline]
    pub fn next_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_position() {
        let pos = SourcePos::new(3, 7);
        assert_eq!(pos.line(), 3);
        assert_eq!(pos.column(), 7);
    }

    #[test]
    fn test_start_position() {
        let pos = SourcePos::start();
        assert_eq!(pos.line(), 1);
        assert_eq!(pos.column(), 1);
    }

    #[test]
    fn test_advance_col() {
        let mut pos = SourcePos::new(2, 5);
        pos.advance_col();
        assert_eq!(pos.line(), 2);
        assert_eq!(pos.column(), 6);
    }

    #[test]
    fn test_next_line_resets_column() {
        let mut pos = SourcePos::new(2, 40);
        pos.next_line();
        assert_eq!(pos.line(), 3);
        assert_eq!(pos.column(), 1);
    }

    #[test]
    fn test_display() {
        let pos = SourcePos::new(4, 9);
        assert_eq!(format!("{}", pos), "line 4, column 9");
    }

    #[test]
    fn test_default_is_zero() {
        let pos = SourcePos::default();
        assert_eq!(pos.line(), 0);
        assert_eq!(pos.column(), 0);
    }
}
