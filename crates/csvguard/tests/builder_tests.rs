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

//! Builder-driven validation against files on disk.

use csvguard::{Encoding, RunError, RunState, Severity, ValidatorBuilder};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

const SCHEMA: &str = "\
version 1.0
id: regex(\"[0-9]+\")
name: notEmpty
";

fn write_pair(dir: &tempfile::TempDir, csv: &str) -> (PathBuf, PathBuf) {
    let csv_path = dir.path().join("input.csv");
    let schema_path = dir.path().join("input.csvs");
    fs::write(&csv_path, csv).unwrap();
    fs::write(&schema_path, SCHEMA).unwrap();
    (csv_path, schema_path)
}

#[test]
fn test_validate_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let (csv, schema) = write_pair(&dir, "id,name\n1,alice\n2,bob\n");
    let report = ValidatorBuilder::from_files(csv, schema).validate().unwrap();
    assert!(report.is_valid());
    assert_eq!(report.rows_processed(), 2);
}

#[test]
fn test_missing_csv_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let (_, schema) = write_pair(&dir, "unused\n");
    let err = ValidatorBuilder::from_files(dir.path().join("nope.csv"), schema)
        .validate()
        .unwrap_err();
    assert!(matches!(err, RunError::Io(_)));
}

#[test]
fn test_missing_schema_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let (csv, _) = write_pair(&dir, "id,name\n1,a\n");
    let err = ValidatorBuilder::from_files(csv, dir.path().join("nope.csvs"))
        .validate()
        .unwrap_err();
    assert!(matches!(err, RunError::Io(_)));
}

#[test]
fn test_fail_fast_from_builder() {
    let dir = tempfile::tempdir().unwrap();
    let (csv, schema) = write_pair(&dir, "id,name\nx,a\ny,b\n");
    let report = ValidatorBuilder::from_files(csv, schema)
        .fail_fast(true)
        .validate()
        .unwrap();
    assert_eq!(report.diagnostics().len(), 1);
    assert_eq!(report.state(), RunState::Aborted);
}

#[test]
fn test_file_exists_with_substitution_through_builder() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("attached.pdf");
    fs::write(&data, b"x").unwrap();

    let csv_path = dir.path().join("input.csv");
    let schema_path = dir.path().join("input.csvs");
    fs::write(&csv_path, "/incoming/attached.pdf\n/incoming/lost.pdf\n").unwrap();
    fs::write(
        &schema_path,
        "version 1.0\n@noHeader\nattachment: fileExists\n",
    )
    .unwrap();

    let report = ValidatorBuilder::from_files(csv_path, schema_path)
        .path_substitution("/incoming", dir.path().to_str().unwrap())
        .validate()
        .unwrap();
    assert_eq!(report.diagnostics().len(), 1);
    assert_eq!(report.diagnostics()[0].line(), 2);
    assert_eq!(report.diagnostics()[0].severity(), Severity::Error);
}

#[test]
fn test_latin1_file_via_builder() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("input.csv");
    let schema_path = dir.path().join("input.csvs");
    fs::write(&csv_path, b"caf\xE9\n").unwrap();
    fs::write(&schema_path, "version 1.0\n@noHeader\nname: length(4, 4)\n").unwrap();

    let report = ValidatorBuilder::from_files(csv_path, schema_path)
        .encoding(Encoding::Iso8859_1)
        .validate()
        .unwrap();
    assert!(report.is_valid());
}

#[test]
fn test_strict_utf8_file_via_builder() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("input.csv");
    let schema_path = dir.path().join("input.csvs");
    fs::write(&csv_path, b"ok\n\xFFbad\n").unwrap();
    fs::write(&schema_path, "version 1.0\n@noHeader\nname: notEmpty\n").unwrap();

    let err = ValidatorBuilder::from_files(csv_path, schema_path)
        .strict_utf8(true)
        .validate()
        .unwrap_err();
    match err {
        RunError::Encoding { offset, line, .. } => {
            assert_eq!(offset, 3);
            assert_eq!(line, 2);
        }
        other => panic!("expected encoding error, got {:?}", other),
    }
}

struct Recorder(Rc<RefCell<u64>>);

impl csvguard::ProgressReporter for Recorder {
    fn rows_processed(&mut self, rows: u64) {
        *self.0.borrow_mut() = rows;
    }
}

#[test]
fn test_progress_through_builder() {
    let dir = tempfile::tempdir().unwrap();
    let (csv, schema) = write_pair(&dir, "id,name\n1,a\n2,b\n3,c\n");
    let last = Rc::new(RefCell::new(0));
    let report = ValidatorBuilder::from_files(csv, schema)
        .progress(Box::new(Recorder(Rc::clone(&last))))
        .validate()
        .unwrap();
    assert!(report.is_valid());
    assert_eq!(*last.borrow(), 3);
}
