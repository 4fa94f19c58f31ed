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

//! Lexical error type for the schema language.

use super::span::SourcePos;
use thiserror::Error;

/// An error produced while tokenizing schema source.
///
/// Lexing is side-effect free; an error describes exactly one illegal
/// construct and carries its source position. The parser recovers by
/// resuming at the next line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    /// A string literal with no closing quote before end of line.
    #[error("unterminated string literal at {pos}")]
    UnterminatedString { pos: SourcePos },

    /// A character literal with no closing quote, or more than one char.
    #[error("malformed character literal at {pos}")]
    MalformedCharLiteral { pos: SourcePos },

    /// A character that cannot start any token.
    #[error("illegal character '{ch}' at {pos}")]
    IllegalCharacter { ch: char, pos: SourcePos },

    /// A numeric literal that does not parse.
    #[error("malformed number '{text}' at {pos}")]
    MalformedNumber { text: String, pos: SourcePos },

    /// A `$` with no column name or position after it.
    #[error("expected column name or position after '$' at {pos}")]
    EmptyColumnRef { pos: SourcePos },

    /// A `@` with no directive name after it.
    #[error("expected directive name after '@' at {pos}")]
    EmptyDirective { pos: SourcePos },
}

impl LexError {
    /// The source position where the error occurred.
    pub fn pos(&self) -> SourcePos {
        match self {
            Self::UnterminatedString { pos }
            | Self::MalformedCharLiteral { pos }
            | Self::IllegalCharacter { pos, .. }
            | Self::MalformedNumber { pos, .. }
            | Self::EmptyColumnRef { pos }
            | Self::EmptyDirective { pos } => *pos,
        }
    }
}
