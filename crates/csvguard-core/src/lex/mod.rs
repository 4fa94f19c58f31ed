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

//! Lexical analysis for the schema language.
//!
//! The lexer is a hand-rolled character scanner producing a lazy token
//! stream. It is side-effect free and restartable after an error: the
//! parser calls [`Lexer::skip_to_next_line`] to resynchronize, which is what
//! allows one malformed declaration to be reported without hiding the rest
//! of the schema.
//!
//! # Examples
//!
//! ```
//! use csvguard_core::lex::{Lexer, TokenKind};
//!
//! let mut lexer = Lexer::new("age: range(0, 150)");
//! let tok = lexer.next_token().unwrap();
//! assert_eq!(tok.kind, TokenKind::Ident("age".to_string()));
//! ```

mod error;
mod span;
mod tokens;

pub use error::LexError;
pub use span::SourcePos;
pub use tokens::{Token, TokenKind};

/// Streaming tokenizer over schema source text.
#[derive(Debug)]
pub struct Lexer {
    chars: Vec<char>,
    index: usize,
    pos: SourcePos,
}

impl Lexer {
    /// Creates a lexer over the given schema source.
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            index: 0,
            pos: SourcePos::start(),
        }
    }

    /// Produces the next token, skipping whitespace and `--` comments.
    ///
    /// Returns [`TokenKind::Newline`] at each line break and
    /// [`TokenKind::Eof`] (repeatedly) at end of input.
    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_blanks_and_comments();

        let start = self.pos;
        let ch = match self.peek() {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::Eof, start)),
        };

        match ch {
            '\n' => {
                self.bump();
                Ok(Token::new(TokenKind::Newline, start))
            }
            '(' => self.punct(TokenKind::LParen),
            ')' => self.punct(TokenKind::RParen),
            ',' => self.punct(TokenKind::Comma),
            ':' => self.punct(TokenKind::Colon),
            '*' => self.punct(TokenKind::Star),
            '"' => self.string_literal(start),
            '\'' => self.char_literal(start),
            '$' => self.column_ref(start),
            '@' => self.directive(start),
            '-' => self.number(start),
            c if c.is_ascii_digit() => self.number(start),
            c if c.is_alphabetic() || c == '_' => Ok(self.ident(start)),
            c => {
                self.bump();
                Err(LexError::IllegalCharacter { ch: c, pos: start })
            }
        }
    }

    /// Discards everything up to and including the next line break.
    ///
    /// Used by the parser to recover after a lex or parse error so that the
    /// following declarations can still be checked.
    pub fn skip_to_next_line(&mut self) {
        while let Some(c) = self.peek() {
            self.bump();
            if c == '\n' {
                break;
            }
        }
    }

    /// The position of the next character to be scanned.
    pub fn position(&self) -> SourcePos {
        self.pos
    }

    // ---- scanning helpers ----

    fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.index += 1;
        if c == '\n' {
            self.pos.next_line();
        } else {
            self.pos.advance_col();
        }
        Some(c)
    }

    fn skip_blanks_and_comments(&mut self) {
        loop {
            match self.peek() {
                Some(' ') | Some('\t') | Some('\r') => {
                    self.bump();
                }
                // `--` comment runs to end of line; the newline itself is
                // still emitted as a token.
                Some('-') if self.peek_at(1) == Some('-') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
    }

    fn punct(&mut self, kind: TokenKind) -> Result<Token, LexError> {
        let start = self.pos;
        self.bump();
        Ok(Token::new(kind, start))
    }

    fn ident(&mut self, start: SourcePos) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Ident(text), start)
    }

    fn string_literal(&mut self, start: SourcePos) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None | Some('\n') => {
                    return Err(LexError::UnterminatedString { pos: start });
                }
                Some('"') => {
                    self.bump();
                    return Ok(Token::new(TokenKind::StringLit(value), start));
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('\\') => value.push('\\'),
                        Some('"') => value.push('"'),
                        // Unknown escapes are kept verbatim.
                        Some(other) => {
                            value.push('\\');
                            value.push(other);
                        }
                        None => return Err(LexError::UnterminatedString { pos: start }),
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
    }

    fn char_literal(&mut self, start: SourcePos) -> Result<Token, LexError> {
        self.bump(); // opening quote
        let ch = match self.bump() {
            Some('\\') => match self.bump() {
                Some('n') => '\n',
                Some('t') => '\t',
                Some('\\') => '\\',
                Some('\'') => '\'',
                _ => return Err(LexError::MalformedCharLiteral { pos: start }),
            },
            Some(c) if c != '\'' && c != '\n' => c,
            _ => return Err(LexError::MalformedCharLiteral { pos: start }),
        };
        match self.bump() {
            Some('\'') => Ok(Token::new(TokenKind::CharLit(ch), start)),
            _ => Err(LexError::MalformedCharLiteral { pos: start }),
        }
    }

    fn column_ref(&mut self, start: SourcePos) -> Result<Token, LexError> {
        self.bump(); // '$'
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if text.is_empty() {
            return Err(LexError::EmptyColumnRef { pos: start });
        }
        Ok(Token::new(TokenKind::ColumnRef(text), start))
    }

    fn directive(&mut self, start: SourcePos) -> Result<Token, LexError> {
        self.bump(); // '@'
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if text.is_empty() {
            return Err(LexError::EmptyDirective { pos: start });
        }
        Ok(Token::new(TokenKind::Directive(text), start))
    }

    fn number(&mut self, start: SourcePos) -> Result<Token, LexError> {
        let mut raw = String::new();
        if self.peek() == Some('-') {
            raw.push('-');
            self.bump();
        }
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                raw.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            raw.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    raw.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        match raw.parse::<f64>() {
            Ok(value) => Ok(Token::new(TokenKind::Number { value, raw }, start)),
            Err(_) => Err(LexError::MalformedNumber { text: raw, pos: start }),
        }
    }
}
