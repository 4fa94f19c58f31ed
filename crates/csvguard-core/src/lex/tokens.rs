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

//! Token model for the schema language.
//!
//! The lexer produces a flat stream of these tokens. Keywords (`and`, `or`,
//! `not`, `version`, `row`, rule names) are plain identifiers; the parser
//! gives them meaning. Newlines are significant because declarations are
//! line-oriented and parse recovery resynchronizes on them.

use super::span::SourcePos;
use std::fmt;

/// The kind of a schema-language token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword, e.g. `notEmpty`, `and`, `version`.
    Ident(String),
    /// Double-quoted string literal (escapes resolved).
    StringLit(String),
    /// Single-quoted character literal, e.g. `','`.
    CharLit(char),
    /// Numeric literal. The raw lexeme is preserved so the parser can
    /// distinguish integers from floats.
    Number { value: f64, raw: String },
    /// Column reference, e.g. `$name` or `$2` (without the `$`).
    ColumnRef(String),
    /// Directive name, e.g. `@separator` (without the `@`).
    Directive(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `*` (open bound in `range`/`length`/`totalColumns`)
    Star,
    /// End of a source line.
    Newline,
    /// End of input.
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(s) => write!(f, "'{}'", s),
            Self::StringLit(_) => write!(f, "string literal"),
            Self::CharLit(c) => write!(f, "'{}'", c),
            Self::Number { raw, .. } => write!(f, "number '{}'", raw),
            Self::ColumnRef(s) => write!(f, "'${}'", s),
            Self::Directive(s) => write!(f, "'@{}'", s),
            Self::LParen => write!(f, "'('"),
            Self::RParen => write!(f, "')'"),
            Self::Comma => write!(f, "','"),
            Self::Colon => write!(f, "':'"),
            Self::Star => write!(f, "'*'"),
            Self::Newline => write!(f, "end of line"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What the token is.
    pub kind: TokenKind,
    /// Where it starts in the schema source.
    pub pos: SourcePos,
}

impl Token {
    /// Creates a token at a position.
    #[inline]
    pub fn new(kind: TokenKind, pos: SourcePos) -> Self {
        Self { kind, pos }
    }

    /// Returns `true` if this token is the given identifier.
    pub fn is_ident(&self, name: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(s) if s == name)
    }
}
