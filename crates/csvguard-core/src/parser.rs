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

//! Recursive-descent parser for the schema language.
//!
//! The grammar is line-oriented:
//!
//! ```text
//! schema      := version directive* declaration*
//! version     := 'version' NUMBER NEWLINE
//! directive   := '@separator' (CHAR | 'TAB')
//!              | '@quote' CHAR
//!              | '@noHeader'
//!              | '@totalColumns' (NUMBER | '*')
//! declaration := column | rowrule
//! column      := (IDENT | STRING) ':' expr? flag* NEWLINE
//! rowrule     := 'row' ':' COLREF expr NEWLINE
//! flag        := '@optional' | '@warning' | '@ignoreCase'
//! expr        := and_expr ('or' and_expr)*
//! and_expr    := unary ('and' unary)*
//! unary       := 'not' unary | '(' expr ')' | atom
//! atom        := 'empty' | 'notEmpty' | 'unique' | 'fileExists'
//!              | ('is'|'isNot'|'starts'|'ends'|'contains') '(' arg ')'
//!              | 'regex' '(' STRING ')'
//!              | 'range' '(' bound ',' bound ')'
//!              | 'length' '(' bound (',' bound)? ')'
//!              | 'type' '(' IDENT ')'
//! arg         := STRING | COLREF
//! bound       := NUMBER | '*'
//! ```
//!
//! `row` is a reserved declaration name. Cross-column references (`$name` or
//! `$position`) are resolved after all columns are known, so forward
//! references are allowed.
//!
//! A malformed declaration is recorded as a [`ParseProblem`] and the parser
//! resynchronizes at the next line, collecting as many structural problems
//! as it can in one pass. When tracing is enabled, every matched production
//! is recorded with its source line; the trace never alters the schema.

use crate::error::{ParseProblem, SchemaParseFailure};
use crate::lex::{Lexer, SourcePos, Token, TokenKind};
use crate::rules::{RegexRule, RuleExpr, ValueRef, ValueType};
use crate::schema::{
    ColumnCountPolicy, ColumnDefinition, ColumnFlags, Directives, RowRule, Schema,
};
use std::fmt;

/// One matched grammar production, for schema debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// Name of the production, e.g. `column 'age'` or `atom:range`.
    pub production: String,
    /// Schema source line where it matched.
    pub line: usize,
}

/// Human-readable derivation trace of a schema parse.
///
/// Produced by [`parse_schema_traced`]; purely diagnostic output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseTrace {
    events: Vec<TraceEvent>,
}

impl ParseTrace {
    /// All recorded events in match order.
    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    /// `true` when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn record(&mut self, production: impl Into<String>, line: usize) {
        self.events.push(TraceEvent {
            production: production.into(),
            line,
        });
    }
}

impl fmt::Display for ParseTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "line {:>4}  {}", event.line, event.production)?;
        }
        Ok(())
    }
}

/// Parses schema source into an executable [`Schema`].
///
/// # Errors
///
/// Returns a [`SchemaParseFailure`] carrying every problem found in one
/// pass, not just the first.
pub fn parse_schema(source: &str) -> Result<Schema, SchemaParseFailure> {
    Parser::new(source, false).parse().0
}

/// Like [`parse_schema`], additionally returning the derivation trace.
///
/// The trace is returned even when parsing fails, since it is most useful
/// for debugging malformed schemas.
pub fn parse_schema_traced(source: &str) -> (Result<Schema, SchemaParseFailure>, ParseTrace) {
    Parser::new(source, true).parse()
}

type DeclResult<T> = Result<T, ParseProblem>;

/// Internal state for one parse pass.
struct Parser {
    lexer: Lexer,
    current: Token,
    problems: Vec<ParseProblem>,
    trace: ParseTrace,
    tracing: bool,
}

/// A column declaration before reference resolution.
struct PendingColumn {
    definition: ColumnDefinition,
    line: usize,
}

/// A row rule before reference resolution.
struct PendingRowRule {
    subject: String,
    rule: RuleExpr,
    line: usize,
}

impl Parser {
    fn new(source: &str, tracing: bool) -> Self {
        let mut parser = Self {
            lexer: Lexer::new(source),
            // Placeholder; skipped as a blank line by the first parse step.
            current: Token::new(TokenKind::Newline, SourcePos::start()),
            problems: Vec::new(),
            trace: ParseTrace::default(),
            tracing,
        };
        parser.bump();
        parser
    }

    /// Pulls the next token; a lex error is recorded and the lexer is
    /// restarted at the next line, surfacing as a synthetic newline so the
    /// declaration loop resynchronizes.
    fn pump(lexer: &mut Lexer, problems: &mut Vec<ParseProblem>) -> Token {
        match lexer.next_token() {
            Ok(token) => token,
            Err(err) => {
                let pos = err.pos();
                problems.push(ParseProblem::new(err.to_string(), pos));
                lexer.skip_to_next_line();
                Token::new(TokenKind::Newline, pos)
            }
        }
    }

    fn bump(&mut self) {
        self.current = Self::pump(&mut self.lexer, &mut self.problems);
    }

    fn record(&mut self, production: impl Into<String>) {
        if self.tracing {
            let line = self.current.pos.line();
            self.trace.record(production, line);
        }
    }

    fn skip_newlines(&mut self) {
        while self.current.kind == TokenKind::Newline {
            self.bump();
        }
    }

    /// Abandons the current declaration and resynchronizes at the next line.
    fn sync(&mut self) {
        loop {
            match self.current.kind {
                TokenKind::Newline => {
                    self.bump();
                    return;
                }
                TokenKind::Eof => return,
                _ => self.bump(),
            }
        }
    }

    fn problem(&self, message: impl Into<String>) -> ParseProblem {
        ParseProblem::new(message, self.current.pos)
    }

    fn parse(mut self) -> (Result<Schema, SchemaParseFailure>, ParseTrace) {
        let mut directives = Directives::default();
        let mut total_columns: Option<ColumnCountPolicy> = None;
        let mut columns: Vec<PendingColumn> = Vec::new();
        let mut row_rules: Vec<PendingRowRule> = Vec::new();

        self.skip_newlines();
        if let Err(problem) = self.parse_version() {
            self.problems.push(problem);
            self.sync();
        }

        // Prologue directives.
        loop {
            self.skip_newlines();
            let TokenKind::Directive(name) = self.current.kind.clone() else {
                break;
            };
            match self.parse_directive(&name, &mut directives, &mut total_columns) {
                Ok(()) => {}
                Err(problem) => {
                    self.problems.push(problem);
                    self.sync();
                }
            }
        }

        // Declarations.
        loop {
            self.skip_newlines();
            if self.current.kind == TokenKind::Eof {
                break;
            }
            let result = match self.current.kind.clone() {
                TokenKind::Ident(name) if name == "row" => {
                    self.parse_row_rule().map(|rule| row_rules.push(rule))
                }
                TokenKind::Ident(name) => self
                    .parse_column(name, columns.len(), &columns)
                    .map(|col| columns.push(col)),
                TokenKind::StringLit(name) => self
                    .parse_column(name, columns.len(), &columns)
                    .map(|col| columns.push(col)),
                TokenKind::Directive(_) => {
                    Err(self.problem("directives must precede column declarations"))
                }
                ref other => Err(self.problem(format!(
                    "expected a column declaration, found {}",
                    other
                ))),
            };
            if let Err(problem) = result {
                self.problems.push(problem);
                self.sync();
            }
        }

        if columns.is_empty() {
            self.problems.push(ParseProblem::new(
                "schema declares no columns",
                self.current.pos,
            ));
        }

        // Column count policy.
        directives.column_count = match total_columns {
            Some(ColumnCountPolicy::Fixed(n)) => {
                if n != columns.len() {
                    self.problems.push(ParseProblem::new(
                        format!(
                            "@totalColumns {} does not match the {} declared column(s)",
                            n,
                            columns.len()
                        ),
                        SourcePos::new(1, 1),
                    ));
                }
                ColumnCountPolicy::Fixed(n)
            }
            Some(ColumnCountPolicy::Open) => ColumnCountPolicy::Open,
            None => ColumnCountPolicy::Fixed(columns.len()),
        };

        // Resolve cross-column references now that all columns are known.
        let names: Vec<String> = columns
            .iter()
            .map(|c| c.definition.name.clone())
            .collect();
        for pending in &mut columns {
            let line = pending.line;
            if let Some(rule) = pending.definition.rule.as_mut() {
                resolve_refs(rule, &names, line, &mut self.problems);
            }
        }
        let mut resolved_rules = Vec::new();
        for mut pending in row_rules {
            let line = pending.line;
            resolve_refs(&mut pending.rule, &names, line, &mut self.problems);
            match resolve_column(&pending.subject, &names) {
                Some(subject) => resolved_rules.push(RowRule {
                    subject,
                    subject_name: pending.subject,
                    rule: pending.rule,
                }),
                None => self.problems.push(ParseProblem::new(
                    format!("row rule subject ${} is not a declared column", pending.subject),
                    SourcePos::new(line, 1),
                )),
            }
        }

        let result = if self.problems.is_empty() {
            Ok(Schema {
                columns: columns.into_iter().map(|c| c.definition).collect(),
                row_rules: resolved_rules,
                directives,
            })
        } else {
            Err(SchemaParseFailure::new(self.problems))
        };
        (result, self.trace)
    }

    fn parse_version(&mut self) -> DeclResult<()> {
        if !self.current.is_ident("version") {
            return Err(self.problem(format!(
                "schema must begin with 'version 1.0', found {}",
                self.current.kind
            )));
        }
        self.record("version");
        self.bump();
        match &self.current.kind {
            TokenKind::Number { raw, .. } if raw == "1.0" => {
                self.bump();
                self.expect_end_of_line()
            }
            other => Err(self.problem(format!("unsupported schema version {}", other))),
        }
    }

    fn parse_directive(
        &mut self,
        name: &str,
        directives: &mut Directives,
        total_columns: &mut Option<ColumnCountPolicy>,
    ) -> DeclResult<()> {
        self.record(format!("directive:@{}", name));
        self.bump();
        match name {
            "separator" => {
                directives.separator = self.parse_separator_char()?;
                self.expect_end_of_line()
            }
            "quote" => {
                match self.current.kind {
                    TokenKind::CharLit(c) if c.is_ascii() => {
                        directives.quote = c as u8;
                        self.bump();
                    }
                    _ => {
                        return Err(self.problem(
                            "@quote expects a single ASCII character literal",
                        ))
                    }
                }
                self.expect_end_of_line()
            }
            "noHeader" => {
                directives.has_header = false;
                self.expect_end_of_line()
            }
            "totalColumns" => {
                match self.current.kind.clone() {
                    TokenKind::Star => {
                        *total_columns = Some(ColumnCountPolicy::Open);
                        self.bump();
                    }
                    TokenKind::Number { value, .. } if value >= 1.0 && value.fract() == 0.0 => {
                        *total_columns = Some(ColumnCountPolicy::Fixed(value as usize));
                        self.bump();
                    }
                    _ => {
                        return Err(
                            self.problem("@totalColumns expects a positive integer or '*'")
                        )
                    }
                }
                self.expect_end_of_line()
            }
            other => Err(self.problem(format!("unknown directive '@{}'", other))),
        }
    }

    fn parse_separator_char(&mut self) -> DeclResult<u8> {
        match self.current.kind.clone() {
            TokenKind::CharLit(c) if c.is_ascii() => {
                self.bump();
                Ok(c as u8)
            }
            TokenKind::Ident(word) if word == "TAB" => {
                self.bump();
                Ok(b'\t')
            }
            _ => Err(self.problem(
                "@separator expects a single ASCII character literal or TAB",
            )),
        }
    }

    fn parse_column(
        &mut self,
        name: String,
        position: usize,
        existing: &[PendingColumn],
    ) -> DeclResult<PendingColumn> {
        let line = self.current.pos.line();
        if existing.iter().any(|c| c.definition.name == name) {
            return Err(self.problem(format!("duplicate column name '{}'", name)));
        }
        self.record(format!("column '{}'", name));
        self.bump();
        self.expect(TokenKind::Colon, "':' after column name")?;

        let rule = if self.at_declaration_end() || matches!(self.current.kind, TokenKind::Directive(_))
        {
            None
        } else {
            Some(self.parse_expr()?)
        };
        let flags = self.parse_flags()?;
        self.expect_end_of_line()?;
        let mut rule = rule;
        if flags.ignore_case {
            // Atoms compile regexes case-sensitive; the flag is only known
            // once the whole declaration has been read.
            if let Some(expr) = rule.as_mut() {
                make_regexes_case_insensitive(expr);
            }
        }
        Ok(PendingColumn {
            definition: ColumnDefinition {
                name,
                position,
                rule,
                flags,
            },
            line,
        })
    }

    fn parse_row_rule(&mut self) -> DeclResult<PendingRowRule> {
        let line = self.current.pos.line();
        self.record("row-rule");
        self.bump();
        self.expect(TokenKind::Colon, "':' after 'row'")?;
        let subject = match self.current.kind.clone() {
            TokenKind::ColumnRef(name) => {
                self.bump();
                name
            }
            ref other => {
                return Err(self.problem(format!(
                    "row rule expects a $column subject, found {}",
                    other
                )))
            }
        };
        let rule = self.parse_expr()?;
        self.expect_end_of_line()?;
        Ok(PendingRowRule {
            subject,
            rule,
            line,
        })
    }

    fn parse_flags(&mut self) -> DeclResult<ColumnFlags> {
        let mut flags = ColumnFlags::default();
        while let TokenKind::Directive(name) = self.current.kind.clone() {
            match name.as_str() {
                "optional" => flags.optional = true,
                "warning" => flags.warning = true,
                "ignoreCase" => flags.ignore_case = true,
                other => {
                    return Err(self.problem(format!("unknown column flag '@{}'", other)))
                }
            }
            self.record(format!("flag:@{}", name));
            self.bump();
        }
        Ok(flags)
    }

    // ---- expression grammar ----

    fn parse_expr(&mut self) -> DeclResult<RuleExpr> {
        let mut left = self.parse_and_expr()?;
        while self.current.is_ident("or") {
            self.bump();
            let right = self.parse_and_expr()?;
            left = RuleExpr::Or(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> DeclResult<RuleExpr> {
        let mut left = self.parse_unary()?;
        while self.current.is_ident("and") {
            self.bump();
            let right = self.parse_unary()?;
            left = RuleExpr::And(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> DeclResult<RuleExpr> {
        if self.current.is_ident("not") {
            self.bump();
            return Ok(RuleExpr::Not(Box::new(self.parse_unary()?)));
        }
        if self.current.kind == TokenKind::LParen {
            self.bump();
            let inner = self.parse_expr()?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(inner);
        }
        self.parse_atom()
    }

    fn parse_atom(&mut self) -> DeclResult<RuleExpr> {
        let TokenKind::Ident(name) = self.current.kind.clone() else {
            return Err(self.problem(format!(
                "expected a rule, found {}",
                self.current.kind
            )));
        };
        self.record(format!("atom:{}", name));
        self.bump();
        match name.as_str() {
            "empty" => Ok(RuleExpr::Empty),
            "notEmpty" => Ok(RuleExpr::NotEmpty),
            "unique" => Ok(RuleExpr::Unique),
            "fileExists" => Ok(RuleExpr::FileExists),
            "is" => Ok(RuleExpr::Is(self.parse_single_arg(&name)?)),
            "isNot" => Ok(RuleExpr::IsNot(self.parse_single_arg(&name)?)),
            "starts" => Ok(RuleExpr::Starts(self.parse_single_arg(&name)?)),
            "ends" => Ok(RuleExpr::Ends(self.parse_single_arg(&name)?)),
            "contains" => Ok(RuleExpr::Contains(self.parse_single_arg(&name)?)),
            "regex" => self.parse_regex(),
            "range" => self.parse_range(),
            "length" => self.parse_length(),
            "type" => self.parse_type(),
            other => Err(self.problem(format!("unknown rule '{}'", other))),
        }
    }

    fn parse_single_arg(&mut self, rule: &str) -> DeclResult<ValueRef> {
        self.expect(TokenKind::LParen, "'('")?;
        let arg = match self.current.kind.clone() {
            TokenKind::StringLit(s) => {
                self.bump();
                ValueRef::Literal(s)
            }
            TokenKind::ColumnRef(name) => {
                self.bump();
                // Resolved against declared columns after the full pass.
                ValueRef::Column {
                    index: usize::MAX,
                    name,
                }
            }
            ref other => {
                return Err(self.problem(format!(
                    "{} expects a string literal or $column argument, found {}",
                    rule, other
                )))
            }
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(arg)
    }

    fn parse_regex(&mut self) -> DeclResult<RuleExpr> {
        self.expect(TokenKind::LParen, "'('")?;
        let pattern = match self.current.kind.clone() {
            TokenKind::StringLit(s) => {
                self.bump();
                s
            }
            ref other => {
                return Err(self.problem(format!(
                    "regex expects a string literal pattern, found {}",
                    other
                )))
            }
        };
        self.expect(TokenKind::RParen, "')'")?;
        match RegexRule::compile(&pattern, false) {
            Ok(rule) => Ok(RuleExpr::Regex(rule)),
            Err(err) => Err(self.problem(format!("invalid regex \"{}\": {}", pattern, err))),
        }
    }

    fn parse_range(&mut self) -> DeclResult<RuleExpr> {
        self.expect(TokenKind::LParen, "'('")?;
        let min = self.parse_numeric_bound()?;
        self.expect(TokenKind::Comma, "','")?;
        let max = self.parse_numeric_bound()?;
        self.expect(TokenKind::RParen, "')'")?;
        if min.is_none() && max.is_none() {
            return Err(self.problem("range(*, *) constrains nothing"));
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(self.problem(format!(
                    "range minimum {} exceeds maximum {}",
                    lo, hi
                )));
            }
        }
        Ok(RuleExpr::Range { min, max })
    }

    fn parse_length(&mut self) -> DeclResult<RuleExpr> {
        self.expect(TokenKind::LParen, "'('")?;
        let first = self.parse_length_bound()?;
        let (min, max) = if self.current.kind == TokenKind::Comma {
            self.bump();
            let second = self.parse_length_bound()?;
            (first, second)
        } else {
            // Single argument means exact length.
            (first, first)
        };
        self.expect(TokenKind::RParen, "')'")?;
        if min.is_none() && max.is_none() {
            return Err(self.problem("length(*, *) constrains nothing"));
        }
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                return Err(self.problem(format!(
                    "length minimum {} exceeds maximum {}",
                    lo, hi
                )));
            }
        }
        Ok(RuleExpr::Length { min, max })
    }

    fn parse_type(&mut self) -> DeclResult<RuleExpr> {
        self.expect(TokenKind::LParen, "'('")?;
        let value_type = match self.current.kind.clone() {
            TokenKind::Ident(name) => match ValueType::from_name(&name) {
                Some(t) => {
                    self.bump();
                    t
                }
                None => {
                    return Err(self.problem(format!(
                        "unknown type '{}' (expected integer, float, boolean, date or datetime)",
                        name
                    )))
                }
            },
            ref other => {
                return Err(self.problem(format!("type expects a type name, found {}", other)))
            }
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(RuleExpr::Type(value_type))
    }

    fn parse_numeric_bound(&mut self) -> DeclResult<Option<f64>> {
        match self.current.kind.clone() {
            TokenKind::Star => {
                self.bump();
                Ok(None)
            }
            TokenKind::Number { value, .. } => {
                self.bump();
                Ok(Some(value))
            }
            ref other => {
                Err(self.problem(format!("expected a number or '*', found {}", other)))
            }
        }
    }

    fn parse_length_bound(&mut self) -> DeclResult<Option<usize>> {
        match self.current.kind.clone() {
            TokenKind::Star => {
                self.bump();
                Ok(None)
            }
            TokenKind::Number { value, .. } if value >= 0.0 && value.fract() == 0.0 => {
                self.bump();
                Ok(Some(value as usize))
            }
            ref other => Err(self.problem(format!(
                "expected a non-negative integer or '*', found {}",
                other
            ))),
        }
    }

    // ---- token helpers ----

    fn expect(&mut self, kind: TokenKind, what: &str) -> DeclResult<()> {
        if self.current.kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(self.problem(format!("expected {}, found {}", what, self.current.kind)))
        }
    }

    fn at_declaration_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Newline | TokenKind::Eof)
    }

    fn expect_end_of_line(&mut self) -> DeclResult<()> {
        match self.current.kind {
            TokenKind::Newline => {
                self.bump();
                Ok(())
            }
            TokenKind::Eof => Ok(()),
            ref other => Err(self.problem(format!(
                "unexpected {} at end of declaration",
                other
            ))),
        }
    }
}

/// Resolves a `$name` or `$position` reference to a column index.
fn resolve_column(reference: &str, names: &[String]) -> Option<usize> {
    if reference.chars().all(|c| c.is_ascii_digit()) {
        let index: usize = reference.parse().ok()?;
        (index < names.len()).then_some(index)
    } else {
        names.iter().position(|n| n == reference)
    }
}

/// Walks a rule tree, resolving column references left unresolved during
/// atom parsing. Unknown names and out-of-range positions become problems.
fn resolve_refs(
    expr: &mut RuleExpr,
    names: &[String],
    line: usize,
    problems: &mut Vec<ParseProblem>,
) {
    match expr {
        RuleExpr::Is(r)
        | RuleExpr::IsNot(r)
        | RuleExpr::Starts(r)
        | RuleExpr::Ends(r)
        | RuleExpr::Contains(r) => {
            if let ValueRef::Column { index, name } = r {
                if *index == usize::MAX {
                    match resolve_column(name, names) {
                        Some(resolved) => *index = resolved,
                        None => problems.push(ParseProblem::new(
                            format!("reference ${} is not a declared column", name),
                            SourcePos::new(line, 1),
                        )),
                    }
                }
            }
        }
        RuleExpr::And(a, b) | RuleExpr::Or(a, b) => {
            resolve_refs(a, names, line, problems);
            resolve_refs(b, names, line, problems);
        }
        RuleExpr::Not(inner) => resolve_refs(inner, names, line, problems),
        RuleExpr::Empty
        | RuleExpr::NotEmpty
        | RuleExpr::Regex(_)
        | RuleExpr::Range { .. }
        | RuleExpr::Length { .. }
        | RuleExpr::Type(_)
        | RuleExpr::Unique
        | RuleExpr::FileExists => {}
    }
}

/// Recompiles every regex in a tree as case-insensitive (`@ignoreCase`).
pub(crate) fn make_regexes_case_insensitive(expr: &mut RuleExpr) {
    match expr {
        RuleExpr::Regex(rule) => {
            if let Ok(recompiled) = RegexRule::compile(rule.pattern(), true) {
                *rule = recompiled;
            }
        }
        RuleExpr::And(a, b) | RuleExpr::Or(a, b) => {
            make_regexes_case_insensitive(a);
            make_regexes_case_insensitive(b);
        }
        RuleExpr::Not(inner) => make_regexes_case_insensitive(inner),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = "\
version 1.0
@noHeader
name: notEmpty
age: type(integer) and range(0, 150)
";

    // ==================== Happy path ====================

    #[test]
    fn test_parse_basic_schema() {
        let schema = parse_schema(BASIC).unwrap();
        assert_eq!(schema.columns.len(), 2);
        assert_eq!(schema.columns[0].name, "name");
        assert_eq!(schema.columns[0].position, 0);
        assert_eq!(schema.columns[1].position, 1);
        assert!(!schema.directives.has_header);
        assert_eq!(schema.directives.column_count, ColumnCountPolicy::Fixed(2));
    }

    #[test]
    fn test_parse_directives() {
        let schema = parse_schema(
            "version 1.0\n@separator ';'\n@quote '\\''\n@totalColumns 1\na: notEmpty\n",
        )
        .unwrap();
        assert_eq!(schema.directives.separator, b';');
        assert_eq!(schema.directives.quote, b'\'');
        assert_eq!(schema.directives.column_count, ColumnCountPolicy::Fixed(1));
    }

    #[test]
    fn test_parse_tab_separator() {
        let schema = parse_schema("version 1.0\n@separator TAB\na: notEmpty\n").unwrap();
        assert_eq!(schema.directives.separator, b'\t');
    }

    #[test]
    fn test_parse_open_column_policy() {
        let schema = parse_schema("version 1.0\n@totalColumns *\na: notEmpty\n").unwrap();
        assert_eq!(schema.directives.column_count, ColumnCountPolicy::Open);
    }

    #[test]
    fn test_parse_quoted_column_name() {
        let schema = parse_schema("version 1.0\n\"file name\": notEmpty\n").unwrap();
        assert_eq!(schema.columns[0].name, "file name");
    }

    #[test]
    fn test_parse_unconstrained_column() {
        let schema = parse_schema("version 1.0\nfree:\nother: notEmpty\n").unwrap();
        assert!(schema.columns[0].rule.is_none());
        assert!(schema.columns[1].rule.is_some());
    }

    #[test]
    fn test_parse_flags() {
        let schema =
            parse_schema("version 1.0\nscan: fileExists @optional @warning @ignoreCase\n")
                .unwrap();
        let flags = schema.columns[0].flags;
        assert!(flags.optional);
        assert!(flags.warning);
        assert!(flags.ignore_case);
    }

    #[test]
    fn test_parse_flags_without_rule() {
        let schema = parse_schema("version 1.0\nmaybe: @optional\n").unwrap();
        assert!(schema.columns[0].rule.is_none());
        assert!(schema.columns[0].flags.optional);
    }

    #[test]
    fn test_ignore_case_recompiles_regex() {
        let schema = parse_schema("version 1.0\na: regex(\"ab+c\") @ignoreCase\n").unwrap();
        match schema.columns[0].rule.as_ref().unwrap() {
            RuleExpr::Regex(rule) => {
                assert!(rule.is_match("ABBC"));
                assert_eq!(rule.pattern(), "ab+c");
            }
            other => panic!("expected regex rule, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_combinators_precedence() {
        // a or b and c parses as a or (b and c)
        let schema =
            parse_schema("version 1.0\nx: empty or notEmpty and length(1, 5)\n").unwrap();
        match schema.columns[0].rule.as_ref().unwrap() {
            RuleExpr::Or(left, right) => {
                assert!(matches!(**left, RuleExpr::Empty));
                assert!(matches!(**right, RuleExpr::And(_, _)));
            }
            other => panic!("expected Or at top level, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_parenthesized_grouping() {
        let schema =
            parse_schema("version 1.0\nx: (empty or notEmpty) and length(1, 5)\n").unwrap();
        assert!(matches!(
            schema.columns[0].rule.as_ref().unwrap(),
            RuleExpr::And(_, _)
        ));
    }

    #[test]
    fn test_parse_not_combinator() {
        let schema = parse_schema("version 1.0\nx: not empty\n").unwrap();
        assert!(matches!(
            schema.columns[0].rule.as_ref().unwrap(),
            RuleExpr::Not(_)
        ));
    }

    #[test]
    fn test_parse_cross_column_forward_reference() {
        let schema = parse_schema("version 1.0\na: is($b)\nb: notEmpty\n").unwrap();
        match schema.columns[0].rule.as_ref().unwrap() {
            RuleExpr::Is(ValueRef::Column { index, name }) => {
                assert_eq!(*index, 1);
                assert_eq!(name, "b");
            }
            other => panic!("expected cross-column is, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_row_rule() {
        let schema =
            parse_schema("version 1.0\ntotal: notEmpty\nsubtotal: notEmpty\nrow: $total is($subtotal)\n")
                .unwrap();
        assert_eq!(schema.row_rules.len(), 1);
        assert_eq!(schema.row_rules[0].subject, 0);
        assert_eq!(schema.row_rules[0].subject_name, "total");
    }

    #[test]
    fn test_parse_row_rule_positional_subject() {
        let schema =
            parse_schema("version 1.0\na: notEmpty\nb: notEmpty\nrow: $1 is($a)\n").unwrap();
        assert_eq!(schema.row_rules[0].subject, 1);
    }

    #[test]
    fn test_parse_comments_ignored() {
        let schema = parse_schema(
            "version 1.0 -- schema for catalogue files\n-- a comment line\na: notEmpty -- trailing\n",
        )
        .unwrap();
        assert_eq!(schema.columns.len(), 1);
    }

    // ==================== Error collection ====================

    #[test]
    fn test_missing_version() {
        let err = parse_schema("a: notEmpty\n").unwrap_err();
        assert!(err.problems[0].message.contains("version"));
    }

    #[test]
    fn test_unknown_rule_is_parse_error() {
        let err = parse_schema("version 1.0\na: frobnicate\n").unwrap_err();
        assert!(err.problems.iter().any(|p| p.message.contains("frobnicate")));
    }

    #[test]
    fn test_collects_multiple_problems() {
        let err = parse_schema("version 1.0\na: frobnicate\nb: regex(\n c: notEmpty\n").unwrap_err();
        assert!(err.problems.len() >= 2);
    }

    #[test]
    fn test_recovery_keeps_later_declarations() {
        // The bad declaration on line 2 must not hide the duplicate on line 4.
        let err =
            parse_schema("version 1.0\na: frobnicate\nb: notEmpty\nb: empty\n").unwrap_err();
        assert!(err.problems.iter().any(|p| p.message.contains("frobnicate")));
        assert!(err.problems.iter().any(|p| p.message.contains("duplicate")));
    }

    #[test]
    fn test_problem_positions_are_reported() {
        let err = parse_schema("version 1.0\na: frobnicate\n").unwrap_err();
        let problem = err
            .problems
            .iter()
            .find(|p| p.message.contains("frobnicate"))
            .unwrap();
        assert_eq!(problem.pos.line(), 2);
    }

    #[test]
    fn test_duplicate_column_name() {
        let err = parse_schema("version 1.0\na: notEmpty\na: empty\n").unwrap_err();
        assert!(err.problems[0].message.contains("duplicate"));
    }

    #[test]
    fn test_unknown_cross_column_reference() {
        let err = parse_schema("version 1.0\na: is($missing)\n").unwrap_err();
        assert!(err.problems[0].message.contains("$missing"));
    }

    #[test]
    fn test_row_rule_unknown_subject() {
        let err = parse_schema("version 1.0\na: notEmpty\nrow: $ghost notEmpty\n").unwrap_err();
        assert!(err.problems[0].message.contains("$ghost"));
    }

    #[test]
    fn test_invalid_regex_is_parse_error() {
        let err = parse_schema("version 1.0\na: regex(\"[unclosed\")\n").unwrap_err();
        assert!(err.problems[0].message.contains("invalid regex"));
    }

    #[test]
    fn test_inverted_range_is_parse_error() {
        let err = parse_schema("version 1.0\na: range(10, 1)\n").unwrap_err();
        assert!(err.problems[0].message.contains("exceeds"));
    }

    #[test]
    fn test_unbounded_range_is_parse_error() {
        let err = parse_schema("version 1.0\na: range(*, *)\n").unwrap_err();
        assert!(err.problems[0].message.contains("constrains nothing"));
    }

    #[test]
    fn test_total_columns_mismatch() {
        let err = parse_schema("version 1.0\n@totalColumns 3\na: notEmpty\n").unwrap_err();
        assert!(err.problems[0].message.contains("@totalColumns"));
    }

    #[test]
    fn test_empty_schema() {
        let err = parse_schema("version 1.0\n").unwrap_err();
        assert!(err.problems[0].message.contains("no columns"));
    }

    #[test]
    fn test_unknown_type_name() {
        let err = parse_schema("version 1.0\na: type(decimal)\n").unwrap_err();
        assert!(err.problems[0].message.contains("decimal"));
    }

    #[test]
    fn test_lex_error_is_collected_and_recovered() {
        let err = parse_schema("version 1.0\na: is(\"unterminated\nb: notEmpty\nb: empty\n")
            .unwrap_err();
        assert!(err.problems.iter().any(|p| p.message.contains("unterminated")));
        // Recovery reached line 4 and found the duplicate.
        assert!(err.problems.iter().any(|p| p.message.contains("duplicate")));
    }

    // ==================== Trace ====================

    #[test]
    fn test_trace_records_productions() {
        let (result, trace) = parse_schema_traced(BASIC);
        assert!(result.is_ok());
        assert!(!trace.is_empty());
        let productions: Vec<&str> = trace.events().iter().map(|e| e.production.as_str()).collect();
        assert!(productions.contains(&"version"));
        assert!(productions.contains(&"directive:@noHeader"));
        assert!(productions.contains(&"column 'age'"));
        assert!(productions.contains(&"atom:range"));
    }

    #[test]
    fn test_trace_does_not_affect_schema() {
        let plain = parse_schema(BASIC).unwrap();
        let (traced, _) = parse_schema_traced(BASIC);
        let traced = traced.unwrap();
        assert_eq!(plain.columns.len(), traced.columns.len());
        assert_eq!(plain.directives.has_header, traced.directives.has_header);
    }

    #[test]
    fn test_trace_display_format() {
        let (_, trace) = parse_schema_traced(BASIC);
        let rendered = format!("{}", trace);
        assert!(rendered.contains("version"));
        assert!(rendered.contains("line"));
    }

    #[test]
    fn test_untraced_parse_has_empty_trace() {
        let schema = parse_schema(BASIC);
        assert!(schema.is_ok());
    }
}
