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

//! Run configuration: a single immutable value constructed once per run.
//!
//! [`RunConfig`] is built through [`RunConfigBuilder`], which validates
//! option combinations eagerly so that an invalid configuration surfaces as
//! a [`RunError::Configuration`] before any parsing or streaming begins.
//!
//! # Examples
//!
//! ```
//! use csvguard_core::{RunConfig, Substitution};
//!
//! let config = RunConfig::builder()
//!     .fail_fast(true)
//!     .path_substitutions(vec![Substitution::new("/old", "/new")])
//!     .max_chars_per_cell(8096)
//!     .build()
//!     .unwrap();
//! assert!(config.fail_fast);
//! ```

use crate::error::{RunError, RunResult};

/// Default maximum number of characters permitted in one CSV cell.
pub const DEFAULT_MAX_CHARS_PER_CELL: usize = 4096;

/// Declared character encoding of the CSV input.
///
/// The schema source itself is always UTF-8. Strict validation only makes
/// sense for [`Encoding::Utf8`]; requesting it with any other declared
/// encoding is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8 (the default).
    #[default]
    Utf8,
    /// ISO-8859-1 (Latin-1): every byte maps to the same code point.
    Iso8859_1,
    /// Windows-1252: Latin-1 with printable characters in 0x80..=0x9F.
    Windows1252,
}

impl Encoding {
    /// Canonical name, as accepted on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Iso8859_1 => "iso-8859-1",
            Self::Windows1252 => "windows-1252",
        }
    }

    /// Decodes a byte stream according to this encoding.
    ///
    /// UTF-8 decoding is lossy here; strict validation is a separate
    /// up-front pass (see [`validate_strict_utf8`]).
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Iso8859_1 => bytes.iter().map(|&b| b as char).collect(),
            Self::Windows1252 => bytes.iter().map(|&b| windows_1252_char(b)).collect(),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps one Windows-1252 byte to its Unicode code point.
///
/// The five undefined bytes (0x81, 0x8D, 0x8F, 0x90, 0x9D) decode to
/// U+FFFD REPLACEMENT CHARACTER.
fn windows_1252_char(byte: u8) -> char {
    const HIGH: [char; 32] = [
        '\u{20AC}', '\u{FFFD}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}',
        '\u{2021}', '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{FFFD}',
        '\u{017D}', '\u{FFFD}', '\u{FFFD}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}',
        '\u{2022}', '\u{2013}', '\u{2014}', '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}',
        '\u{0153}', '\u{FFFD}', '\u{017E}', '\u{0178}',
    ];
    match byte {
        0x80..=0x9F => HIGH[(byte - 0x80) as usize],
        b => b as char,
    }
}

/// Validates that a byte stream is well-formed UTF-8.
///
/// On failure, returns [`RunError::Encoding`] carrying the byte offset of
/// the first invalid sequence and the 1-based line reached at that offset.
/// This runs before any row is emitted, so a strict-mode failure can never
/// discard already-collected diagnostics.
pub fn validate_strict_utf8(bytes: &[u8]) -> RunResult<()> {
    match std::str::from_utf8(bytes) {
        Ok(_) => Ok(()),
        Err(e) => {
            let offset = e.valid_up_to();
            let line = bytes[..offset].iter().filter(|&&b| b == b'\n').count() as u64 + 1;
            Err(RunError::encoding(
                offset,
                line,
                "invalid UTF-8 byte sequence",
            ))
        }
    }
}

/// A path-prefix substitution applied to file-reference cell values before
/// existence checks.
///
/// Many substitutions may apply to one path; the first matching prefix in
/// list order wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    from: String,
    to: String,
}

impl Substitution {
    /// Creates a substitution rewriting prefix `from` to `to`.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// The prefix to match.
    pub fn from(&self) -> &str {
        &self.from
    }

    /// The replacement prefix.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Applies this substitution if `path` starts with the `from` prefix.
    pub fn apply(&self, path: &str) -> Option<String> {
        path.strip_prefix(self.from.as_str())
            .map(|rest| format!("{}{}", self.to, rest))
    }
}

/// Immutable configuration for one validation run.
///
/// Constructed through [`RunConfig::builder`]; see module docs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Abort at the first Error-severity diagnostic.
    pub fail_fast: bool,
    /// Prefix rewrites for file-reference cells, in priority order.
    pub path_substitutions: Vec<Substitution>,
    /// Reject paths that exist only under different casing.
    pub enforce_case_sensitive_path_checks: bool,
    /// Skip file-existence checks entirely.
    pub skip_file_checks: bool,
    /// Record a grammar derivation trace while parsing the schema.
    pub trace: bool,
    /// Maximum characters permitted in one cell.
    pub max_chars_per_cell: usize,
    /// Declared encoding of the CSV input.
    pub encoding: Encoding,
    /// Validate the CSV byte stream as strict UTF-8 before streaming.
    pub strict_utf8: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            path_substitutions: Vec::new(),
            enforce_case_sensitive_path_checks: false,
            skip_file_checks: false,
            trace: false,
            max_chars_per_cell: DEFAULT_MAX_CHARS_PER_CELL,
            encoding: Encoding::Utf8,
            strict_utf8: false,
        }
    }
}

impl RunConfig {
    /// Creates a builder with the documented defaults.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new()
    }

    /// Checks the option combination.
    ///
    /// [`RunConfigBuilder::build`] runs this eagerly; the validator re-runs
    /// it on entry so a config assembled with struct-literal syntax cannot
    /// smuggle an invalid combination into a run.
    ///
    /// # Errors
    ///
    /// - strict UTF-8 validation with a non-UTF-8 declared encoding
    /// - a zero cell-length limit
    pub fn ensure_valid(&self) -> RunResult<()> {
        if self.strict_utf8 && self.encoding != Encoding::Utf8 {
            return Err(RunError::configuration(format!(
                "strict UTF-8 validation requires the utf-8 encoding, but '{}' was declared",
                self.encoding
            )));
        }
        if self.max_chars_per_cell == 0 {
            return Err(RunError::configuration(
                "max_chars_per_cell must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Builder for [`RunConfig`] with eager validation.
#[derive(Debug, Clone, Default)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    /// Creates a builder with default options.
    pub fn new() -> Self {
        Self {
            config: RunConfig::default(),
        }
    }

    /// Abort at the first Error-severity diagnostic (default: `false`).
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.config.fail_fast = fail_fast;
        self
    }

    /// Prefix rewrites for file-reference cells (default: empty).
    pub fn path_substitutions(mut self, subs: Vec<Substitution>) -> Self {
        self.config.path_substitutions = subs;
        self
    }

    /// Reject paths that exist only under different casing (default: `false`).
    pub fn enforce_case_sensitive_path_checks(mut self, enforce: bool) -> Self {
        self.config.enforce_case_sensitive_path_checks = enforce;
        self
    }

    /// Skip file-existence checks entirely (default: `false`).
    pub fn skip_file_checks(mut self, skip: bool) -> Self {
        self.config.skip_file_checks = skip;
        self
    }

    /// Record a grammar derivation trace while parsing (default: `false`).
    pub fn trace(mut self, trace: bool) -> Self {
        self.config.trace = trace;
        self
    }

    /// Maximum characters permitted in one cell (default: 4096).
    pub fn max_chars_per_cell(mut self, max: usize) -> Self {
        self.config.max_chars_per_cell = max;
        self
    }

    /// Declared encoding of the CSV input (default: UTF-8).
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.config.encoding = encoding;
        self
    }

    /// Validate the CSV byte stream as strict UTF-8 (default: `false`).
    pub fn strict_utf8(mut self, strict: bool) -> Self {
        self.config.strict_utf8 = strict;
        self
    }

    /// Validates the option combination and produces the immutable config.
    ///
    /// # Errors
    ///
    /// - strict UTF-8 validation with a non-UTF-8 declared encoding
    /// - a zero cell-length limit
    pub fn build(self) -> RunResult<RunConfig> {
        self.config.ensure_valid()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Builder tests ====================

    #[test]
    fn test_defaults() {
        let config = RunConfig::builder().build().unwrap();
        assert!(!config.fail_fast);
        assert!(config.path_substitutions.is_empty());
        assert!(!config.enforce_case_sensitive_path_checks);
        assert!(!config.skip_file_checks);
        assert!(!config.trace);
        assert_eq!(config.max_chars_per_cell, 4096);
        assert_eq!(config.encoding, Encoding::Utf8);
        assert!(!config.strict_utf8);
    }

    #[test]
    fn test_builder_sets_all_fields() {
        let config = RunConfig::builder()
            .fail_fast(true)
            .path_substitutions(vec![Substitution::new("/a", "/b")])
            .enforce_case_sensitive_path_checks(true)
            .skip_file_checks(true)
            .trace(true)
            .max_chars_per_cell(100)
            .strict_utf8(true)
            .build()
            .unwrap();
        assert!(config.fail_fast);
        assert_eq!(config.path_substitutions.len(), 1);
        assert!(config.enforce_case_sensitive_path_checks);
        assert!(config.skip_file_checks);
        assert!(config.trace);
        assert_eq!(config.max_chars_per_cell, 100);
        assert!(config.strict_utf8);
    }

    #[test]
    fn test_strict_utf8_with_latin1_is_rejected() {
        let err = RunConfig::builder()
            .encoding(Encoding::Iso8859_1)
            .strict_utf8(true)
            .build()
            .unwrap_err();
        assert!(matches!(err, RunError::Configuration(_)));
    }

    #[test]
    fn test_strict_utf8_with_utf8_is_accepted() {
        assert!(RunConfig::builder().strict_utf8(true).build().is_ok());
    }

    #[test]
    fn test_zero_cell_limit_is_rejected() {
        let err = RunConfig::builder().max_chars_per_cell(0).build().unwrap_err();
        assert!(matches!(err, RunError::Configuration(_)));
    }

    #[test]
    fn test_ensure_valid_catches_literal_construction() {
        let config = RunConfig {
            strict_utf8: true,
            encoding: Encoding::Windows1252,
            ..RunConfig::default()
        };
        assert!(matches!(
            config.ensure_valid(),
            Err(RunError::Configuration(_))
        ));
        assert!(RunConfig::default().ensure_valid().is_ok());
    }

    // ==================== Substitution tests ====================

    #[test]
    fn test_substitution_applies_to_matching_prefix() {
        let sub = Substitution::new("/old", "/new");
        assert_eq!(sub.apply("/old/file.txt"), Some("/new/file.txt".into()));
    }

    #[test]
    fn test_substitution_skips_non_matching_prefix() {
        let sub = Substitution::new("/old", "/new");
        assert_eq!(sub.apply("/other/file.txt"), None);
    }

    #[test]
    fn test_substitution_accessors() {
        let sub = Substitution::new("file://x", "/mnt/x");
        assert_eq!(sub.from(), "file://x");
        assert_eq!(sub.to(), "/mnt/x");
    }

    // ==================== Encoding tests ====================

    #[test]
    fn test_encoding_names() {
        assert_eq!(Encoding::Utf8.name(), "utf-8");
        assert_eq!(Encoding::Iso8859_1.name(), "iso-8859-1");
        assert_eq!(Encoding::Windows1252.name(), "windows-1252");
    }

    #[test]
    fn test_latin1_decode() {
        let decoded = Encoding::Iso8859_1.decode(&[0x63, 0x61, 0x66, 0xE9]);
        assert_eq!(decoded, "café");
    }

    #[test]
    fn test_windows_1252_decode_high_range() {
        // 0x93/0x94 are curly quotes, 0x80 is the euro sign.
        let decoded = Encoding::Windows1252.decode(&[0x93, 0x61, 0x94, 0x80]);
        assert_eq!(decoded, "\u{201C}a\u{201D}\u{20AC}");
    }

    #[test]
    fn test_windows_1252_undefined_bytes() {
        let decoded = Encoding::Windows1252.decode(&[0x81]);
        assert_eq!(decoded, "\u{FFFD}");
    }

    #[test]
    fn test_utf8_lossy_decode() {
        let decoded = Encoding::Utf8.decode(&[0x61, 0xFF, 0x62]);
        assert_eq!(decoded, "a\u{FFFD}b");
    }

    // ==================== Strict validation tests ====================

    #[test]
    fn test_strict_utf8_accepts_valid_input() {
        assert!(validate_strict_utf8("héllo,wörld\n".as_bytes()).is_ok());
    }

    #[test]
    fn test_strict_utf8_reports_offset_and_line() {
        let bytes = b"ok,line\nbad,\xFF\n";
        let err = validate_strict_utf8(bytes).unwrap_err();
        match err {
            RunError::Encoding { offset, line, .. } => {
                assert_eq!(offset, 12);
                assert_eq!(line, 2);
            }
            other => panic!("expected encoding error, got {:?}", other),
        }
    }
}
