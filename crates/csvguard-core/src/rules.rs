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

//! Rule expressions and their evaluation.
//!
//! [`RuleExpr`] is a closed enumeration over every rule kind the schema
//! language knows; evaluation is one exhaustive `match`, so adding a kind
//! without handling it is a compile error rather than a silent fall-through.
//!
//! Every rule is pure except [`RuleExpr::Unique`], which records the values
//! it has seen in the run-scoped [`SeenValues`] as a side effect of
//! evaluation. That state is owned by the validator for one run and is never
//! shared across runs.

use crate::config::RunConfig;
use crate::pathcheck;
use regex::Regex;
use std::collections::{HashMap, HashSet};

/// Typed-value kinds checked by the `type(...)` rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    /// A 64-bit signed integer.
    Integer,
    /// A 64-bit float.
    Float,
    /// Exactly `true` or `false`.
    Boolean,
    /// ISO date, `YYYY-MM-DD`.
    Date,
    /// ISO date-time, `YYYY-MM-DDTHH:MM:SS`.
    DateTime,
}

impl ValueType {
    /// The name used in schema source.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "datetime",
        }
    }

    /// Parses a type name from schema source.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "datetime" => Some(Self::DateTime),
            _ => None,
        }
    }

    /// Returns `true` when `value` conforms to this type.
    pub fn check(&self, value: &str) -> bool {
        match self {
            Self::Integer => value.parse::<i64>().is_ok(),
            Self::Float => value.parse::<f64>().is_ok(),
            Self::Boolean => value == "true" || value == "false",
            Self::Date => chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
            Self::DateTime => {
                chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").is_ok()
            }
        }
    }
}

/// Argument of a comparison atom: a literal or a cross-column reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueRef {
    /// A string literal from the schema.
    Literal(String),
    /// Another column's value in the same row, resolved by position.
    Column {
        /// Zero-based column index.
        index: usize,
        /// Display name, kept for diagnostics.
        name: String,
    },
}

impl ValueRef {
    /// Resolves this reference against a row.
    ///
    /// Returns `None` when a column reference points past the end of the
    /// row (possible under the open column-count policy).
    pub fn resolve<'a>(&'a self, row: &'a [String]) -> Option<&'a str> {
        match self {
            Self::Literal(s) => Some(s.as_str()),
            Self::Column { index, .. } => row.get(*index).map(|s| s.as_str()),
        }
    }

    /// How the reference reads in a diagnostic message.
    pub fn describe(&self) -> String {
        match self {
            Self::Literal(s) => format!("\"{}\"", s),
            Self::Column { name, .. } => format!("${}", name),
        }
    }
}

/// A compiled regex rule, keeping the source pattern for diagnostics.
#[derive(Debug, Clone)]
pub struct RegexRule {
    pattern: String,
    regex: Regex,
}

impl RegexRule {
    /// Compiles a pattern. Case-insensitivity is baked in at compile time
    /// for `@ignoreCase` columns.
    pub fn compile(pattern: &str, ignore_case: bool) -> Result<Self, regex::Error> {
        let regex = regex::RegexBuilder::new(pattern)
            .case_insensitive(ignore_case)
            .build()?;
        Ok(Self {
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// The original pattern text.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the value matches.
    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }
}

/// A rule expression tree.
///
/// Comparison atoms (`is`, `isNot`, `starts`, `ends`, `contains`) accept a
/// [`ValueRef`], which is how cross-column rules are expressed.
#[derive(Debug, Clone)]
pub enum RuleExpr {
    /// Cell must be empty.
    Empty,
    /// Cell must be non-empty.
    NotEmpty,
    /// Cell equals the referenced value.
    Is(ValueRef),
    /// Cell differs from the referenced value.
    IsNot(ValueRef),
    /// Cell starts with the referenced value.
    Starts(ValueRef),
    /// Cell ends with the referenced value.
    Ends(ValueRef),
    /// Cell contains the referenced value.
    Contains(ValueRef),
    /// Cell matches a regular expression.
    Regex(RegexRule),
    /// Cell is numeric and within the inclusive range. `None` = open bound.
    Range {
        min: Option<f64>,
        max: Option<f64>,
    },
    /// Cell character count is within the inclusive range. `None` = open bound.
    Length {
        min: Option<usize>,
        max: Option<usize>,
    },
    /// Cell conforms to a value type.
    Type(ValueType),
    /// Cell value is unique within its column for this run.
    Unique,
    /// Cell names a file that exists (after path substitution).
    FileExists,
    /// Both sub-rules hold.
    And(Box<RuleExpr>, Box<RuleExpr>),
    /// At least one sub-rule holds; stops at the first success.
    Or(Box<RuleExpr>, Box<RuleExpr>),
    /// The sub-rule does not hold.
    Not(Box<RuleExpr>),
}

impl RuleExpr {
    /// Identifier of this rule kind, used to tag diagnostics.
    pub fn rule_id(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::NotEmpty => "notEmpty",
            Self::Is(_) => "is",
            Self::IsNot(_) => "isNot",
            Self::Starts(_) => "starts",
            Self::Ends(_) => "ends",
            Self::Contains(_) => "contains",
            Self::Regex(_) => "regex",
            Self::Range { .. } => "range",
            Self::Length { .. } => "length",
            Self::Type(_) => "type",
            Self::Unique => "unique",
            Self::FileExists => "fileExists",
            Self::And(_, _) => "and",
            Self::Or(_, _) => "or",
            Self::Not(_) => "not",
        }
    }
}

/// Outcome of evaluating one rule expression against one cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The rule holds.
    Pass,
    /// The rule does not hold.
    Fail {
        /// Identifier of the failing rule kind.
        rule: &'static str,
        /// Human-readable description of the failure.
        message: String,
    },
}

impl RuleOutcome {
    fn fail(rule: &'static str, message: String) -> Self {
        Self::Fail { rule, message }
    }

    /// `true` when the rule held.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }
}

/// Run-scoped uniqueness state: previously seen values per subject column.
///
/// Owned by the validator for exactly one run; `reset` is called on entry so
/// state can never leak across runs.
#[derive(Debug, Default)]
pub struct SeenValues {
    seen: HashMap<usize, HashSet<String>>,
}

impl SeenValues {
    /// Creates empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears all recorded values.
    pub fn reset(&mut self) {
        self.seen.clear();
    }

    /// Records `value` for `column`; returns `true` on first occurrence.
    pub fn observe(&mut self, column: usize, value: String) -> bool {
        self.seen.entry(column).or_default().insert(value)
    }
}

/// Everything a rule needs to evaluate one cell.
pub struct EvalContext<'a> {
    /// All cells of the current row, for cross-column references.
    pub row: &'a [String],
    /// The run configuration (path substitutions, skip flags).
    pub config: &'a RunConfig,
    /// Run-scoped uniqueness state.
    pub seen: &'a mut SeenValues,
    /// Case-insensitive comparisons for this column (`@ignoreCase`).
    pub ignore_case: bool,
    /// Zero-based index of the column the subject cell belongs to.
    pub subject_column: usize,
}

/// Evaluates a rule expression against a cell value.
///
/// Combinator short-circuiting is internal to the expression: `or` stops at
/// the first success, `and` at the first failure. `unique` mutates the
/// run-scoped seen-set whenever it is evaluated, so its interaction with
/// combinators is order-dependent.
pub fn evaluate(expr: &RuleExpr, value: &str, ctx: &mut EvalContext<'_>) -> RuleOutcome {
    match expr {
        RuleExpr::Empty => {
            if value.is_empty() {
                RuleOutcome::Pass
            } else {
                RuleOutcome::fail("empty", format!("value \"{}\" is not empty", value))
            }
        }
        RuleExpr::NotEmpty => {
            if value.is_empty() {
                RuleOutcome::fail("notEmpty", "value is empty".to_string())
            } else {
                RuleOutcome::Pass
            }
        }
        RuleExpr::Is(target) => compare(value, target, ctx, "is", "equal", |v, t| v == t),
        RuleExpr::IsNot(target) => {
            compare(value, target, ctx, "isNot", "differ from", |v, t| v != t)
        }
        RuleExpr::Starts(target) => {
            compare(value, target, ctx, "starts", "start with", |v, t| {
                v.starts_with(t)
            })
        }
        RuleExpr::Ends(target) => compare(value, target, ctx, "ends", "end with", |v, t| {
            v.ends_with(t)
        }),
        RuleExpr::Contains(target) => {
            compare(value, target, ctx, "contains", "contain", |v, t| {
                v.contains(t)
            })
        }
        RuleExpr::Regex(rule) => {
            if rule.is_match(value) {
                RuleOutcome::Pass
            } else {
                RuleOutcome::fail(
                    "regex",
                    format!(
                        "value \"{}\" does not match pattern \"{}\"",
                        value,
                        rule.pattern()
                    ),
                )
            }
        }
        RuleExpr::Range { min, max } => {
            let number: f64 = match value.parse() {
                Ok(n) => n,
                Err(_) => {
                    return RuleOutcome::fail(
                        "range",
                        format!("value \"{}\" is not numeric", value),
                    )
                }
            };
            let below = min.is_some_and(|lo| number < lo);
            let above = max.is_some_and(|hi| number > hi);
            if below || above {
                RuleOutcome::fail(
                    "range",
                    format!(
                        "value {} is outside range [{}, {}]",
                        number,
                        bound(min),
                        bound(max)
                    ),
                )
            } else {
                RuleOutcome::Pass
            }
        }
        RuleExpr::Length { min, max } => {
            let len = value.chars().count();
            let below = min.is_some_and(|lo| len < lo);
            let above = max.is_some_and(|hi| len > hi);
            if below || above {
                RuleOutcome::fail(
                    "length",
                    format!(
                        "value length {} is outside range [{}, {}]",
                        len,
                        min.map_or("*".to_string(), |v| v.to_string()),
                        max.map_or("*".to_string(), |v| v.to_string())
                    ),
                )
            } else {
                RuleOutcome::Pass
            }
        }
        RuleExpr::Type(value_type) => {
            if value_type.check(value) {
                RuleOutcome::Pass
            } else {
                RuleOutcome::fail(
                    "type",
                    format!("value \"{}\" is not a valid {}", value, value_type.name()),
                )
            }
        }
        RuleExpr::Unique => {
            let key = if ctx.ignore_case {
                value.to_lowercase()
            } else {
                value.to_string()
            };
            if ctx.seen.observe(ctx.subject_column, key) {
                RuleOutcome::Pass
            } else {
                RuleOutcome::fail("unique", format!("duplicate value \"{}\"", value))
            }
        }
        RuleExpr::FileExists => {
            if ctx.config.skip_file_checks {
                return RuleOutcome::Pass;
            }
            let path = pathcheck::substitute(value, ctx.config);
            match pathcheck::check_exists(&path, ctx.config) {
                Ok(()) => RuleOutcome::Pass,
                Err(message) => RuleOutcome::fail("fileExists", message),
            }
        }
        RuleExpr::And(left, right) => match evaluate(left, value, ctx) {
            RuleOutcome::Pass => evaluate(right, value, ctx),
            fail => fail,
        },
        RuleExpr::Or(left, right) => match evaluate(left, value, ctx) {
            RuleOutcome::Pass => RuleOutcome::Pass,
            RuleOutcome::Fail {
                message: left_message,
                ..
            } => match evaluate(right, value, ctx) {
                RuleOutcome::Pass => RuleOutcome::Pass,
                RuleOutcome::Fail {
                    message: right_message,
                    ..
                } => RuleOutcome::fail(
                    "or",
                    format!("no alternative matched: {}; {}", left_message, right_message),
                ),
            },
        },
        RuleExpr::Not(inner) => match evaluate(inner, value, ctx) {
            RuleOutcome::Pass => RuleOutcome::fail(
                "not",
                format!("value \"{}\" satisfies negated rule '{}'", value, inner.rule_id()),
            ),
            RuleOutcome::Fail { .. } => RuleOutcome::Pass,
        },
    }
}

fn bound(b: &Option<f64>) -> String {
    b.map_or("*".to_string(), |v| v.to_string())
}

/// Shared comparison logic for `is`/`isNot`/`starts`/`ends`/`contains`.
fn compare(
    value: &str,
    target: &ValueRef,
    ctx: &EvalContext<'_>,
    rule: &'static str,
    verb: &str,
    predicate: impl Fn(&str, &str) -> bool,
) -> RuleOutcome {
    let Some(target_value) = target.resolve(ctx.row) else {
        return RuleOutcome::fail(
            rule,
            format!("referenced column {} is missing from this row", target.describe()),
        );
    };
    let matched = if ctx.ignore_case {
        predicate(&value.to_lowercase(), &target_value.to_lowercase())
    } else {
        predicate(value, target_value)
    };
    if matched {
        RuleOutcome::Pass
    } else {
        RuleOutcome::fail(
            rule,
            format!(
                "value \"{}\" does not {} {}",
                value,
                verb,
                target.describe()
            ),
        )
    }
}
