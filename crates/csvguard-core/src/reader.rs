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

//! Row-at-a-time CSV scanning on top of the `csv` crate.
//!
//! The reader is configured from the schema's directives (separator and
//! quote character) and hands back one [`Row`] per call, tagged with the
//! 1-based line number where the record started. Quoted multi-line cells
//! therefore keep the line number of their opening line.
//!
//! Cells longer than the configured maximum are truncated at a character
//! boundary and flagged, so a pathological input cannot balloon memory;
//! downstream validation reports them without evaluating their rules.

use crate::config::RunConfig;
use crate::error::{RunError, RunResult};
use crate::schema::Directives;
use std::io;

/// One record from the input, positioned and size-capped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// 1-based line number where the record starts.
    pub line: u64,
    /// Cell values in column order. Oversized cells are truncated.
    pub cells: Vec<String>,
    /// Indices of cells that exceeded the per-cell character cap.
    pub oversized: Vec<usize>,
}

impl Row {
    /// `true` when no cell was truncated.
    pub fn is_within_limits(&self) -> bool {
        self.oversized.is_empty()
    }
}

/// Streams rows from already-decoded input text.
pub struct RowReader<'a> {
    reader: csv::Reader<&'a [u8]>,
    record: csv::StringRecord,
    max_chars: usize,
}

impl<'a> RowReader<'a> {
    /// Builds a reader over `text` using the schema's separator and quote.
    pub fn new(text: &'a str, directives: &Directives, config: &RunConfig) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(directives.separator)
            .quote(directives.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());
        Self {
            reader,
            record: csv::StringRecord::new(),
            max_chars: config.max_chars_per_cell,
        }
    }

    /// Reads the next record, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// A malformed record (for example an unclosed quote) surfaces as
    /// [`RunError::Io`].
    pub fn next_row(&mut self) -> RunResult<Option<Row>> {
        let line = self.reader.position().line();
        let more = self
            .reader
            .read_record(&mut self.record)
            .map_err(|e| RunError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))?;
        if !more {
            return Ok(None);
        }
        let mut cells = Vec::with_capacity(self.record.len());
        let mut oversized = Vec::new();
        for (index, cell) in self.record.iter().enumerate() {
            cells.push(self.cap_cell(cell, index, &mut oversized));
        }
        Ok(Some(Row {
            line,
            cells,
            oversized,
        }))
    }

    /// Truncates a cell at a character boundary when it exceeds the cap.
    fn cap_cell(&self, cell: &str, index: usize, oversized: &mut Vec<usize>) -> String {
        match cell.char_indices().nth(self.max_chars) {
            Some((byte_offset, _)) => {
                oversized.push(index);
                cell[..byte_offset].to_string()
            }
            None => cell.to_string(),
        }
    }
}
