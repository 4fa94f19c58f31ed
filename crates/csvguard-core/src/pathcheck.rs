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

//! Path resolution for the `fileExists` rule.
//!
//! A file-reference cell value goes through prefix substitution first (the
//! first matching prefix in list order wins), then an existence check. With
//! case-sensitive checking enabled, a path that exists only under different
//! casing is rejected, which catches false positives produced by
//! case-insensitive filesystems.

use crate::config::RunConfig;
use std::path::Path;

/// Applies the configured path substitutions to a cell value.
///
/// Returns the rewritten path, or the original value when no prefix matches.
pub fn substitute(value: &str, config: &RunConfig) -> String {
    for sub in &config.path_substitutions {
        if let Some(rewritten) = sub.apply(value) {
            return rewritten;
        }
    }
    value.to_string()
}

/// Checks that the (already substituted) path exists.
///
/// Returns `Err` with a message naming the checked path on failure. When
/// `enforce_case_sensitive_path_checks` is set, the final path component must
/// match an actual directory entry byte-for-byte.
pub fn check_exists(path: &str, config: &RunConfig) -> Result<(), String> {
    let p = Path::new(path);
    if !p.exists() {
        return Err(format!("file \"{}\" does not exist", path));
    }
    if config.enforce_case_sensitive_path_checks && !casing_matches(p) {
        return Err(format!(
            "file \"{}\" exists only under different casing",
            path
        ));
    }
    Ok(())
}

/// Verifies the last path component against the parent's directory entries.
///
/// On a case-insensitive filesystem `Path::exists` answers true for
/// `/data/File.txt` when only `/data/file.txt` is present; this closes that
/// gap. A path whose parent cannot be listed is treated as matching, since
/// existence was already established.
fn casing_matches(path: &Path) -> bool {
    let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
        return true;
    };
    let dir = if parent.as_os_str().is_empty() {
        Path::new(".")
    } else {
        parent
    };
    let Ok(entries) = std::fs::read_dir(dir) else {
        return true;
    };
    for entry in entries.flatten() {
        if entry.file_name() == name {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RunConfig, Substitution};

    fn config_with_subs(subs: Vec<Substitution>) -> RunConfig {
        RunConfig {
            path_substitutions: subs,
            ..RunConfig::default()
        }
    }

    // ==================== Substitution tests ====================

    #[test]
    fn test_substitute_first_matching_prefix_wins() {
        let config = config_with_subs(vec![
            Substitution::new("/old", "/first"),
            Substitution::new("/old", "/second"),
        ]);
        assert_eq!(substitute("/old/f.txt", &config), "/first/f.txt");
    }

    #[test]
    fn test_substitute_no_match_returns_original() {
        let config = config_with_subs(vec![Substitution::new("/old", "/new")]);
        assert_eq!(substitute("/data/f.txt", &config), "/data/f.txt");
    }

    #[test]
    fn test_substitute_empty_list() {
        let config = RunConfig::default();
        assert_eq!(substitute("/data/f.txt", &config), "/data/f.txt");
    }

    // ==================== Existence tests ====================

    #[test]
    fn test_check_exists_missing_file() {
        let config = RunConfig::default();
        let err = check_exists("/definitely/not/here.txt", &config).unwrap_err();
        assert!(err.contains("does not exist"));
    }

    #[test]
    fn test_check_exists_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("present.txt");
        std::fs::write(&file, b"x").unwrap();
        let config = RunConfig::default();
        assert!(check_exists(file.to_str().unwrap(), &config).is_ok());
    }

    #[test]
    fn test_case_sensitive_check_rejects_wrong_casing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), b"x").unwrap();
        let config = RunConfig {
            enforce_case_sensitive_path_checks: true,
            ..RunConfig::default()
        };
        let wrong = dir.path().join("File.txt");
        let result = check_exists(wrong.to_str().unwrap(), &config);
        // On a case-sensitive filesystem the existence check already fails;
        // on a case-insensitive one the casing check must catch it.
        assert!(result.is_err());
    }

    #[test]
    fn test_case_sensitive_check_accepts_exact_casing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("Exact.txt");
        std::fs::write(&file, b"x").unwrap();
        let config = RunConfig {
            enforce_case_sensitive_path_checks: true,
            ..RunConfig::default()
        };
        assert!(check_exists(file.to_str().unwrap(), &config).is_ok());
    }
}
