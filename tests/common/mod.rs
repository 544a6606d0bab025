//! In-memory stand-in for a Google spreadsheet
//!
//! Applies the subset of `batchUpdate` the renderer emits: row insertion,
//! cell values, merges. Merge rules follow the live API: a merge or unmerge
//! may not cut through an existing merged range.

#![allow(dead_code)]

use runbun::geometry::GridRange;
use runbun::requests::{ExtendedValue, Request};
use runbun::{Error, Result, SheetsApi};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct DocState {
    /// (row, column) -> string or formula text
    pub cells: HashMap<(usize, usize), String>,
    pub merges: Vec<GridRange>,
    pub calls: usize,
    /// Fail the n-th `batchUpdate` call (1-based)
    pub fail_on_call: Option<usize>,
}

#[derive(Debug, Default, Clone)]
pub struct FakeDocument {
    state: Arc<Mutex<DocState>>,
}

fn overlaps(a: &GridRange, b: &GridRange) -> bool {
    a.start_row_index < b.end_row_index
        && b.start_row_index < a.end_row_index
        && a.start_column_index < b.end_column_index
        && b.start_column_index < a.end_column_index
}

fn inside(inner: &GridRange, outer: &GridRange) -> bool {
    outer.start_row_index <= inner.start_row_index
        && inner.end_row_index <= outer.end_row_index
        && outer.start_column_index <= inner.start_column_index
        && inner.end_column_index <= outer.end_column_index
}

fn value_text(value: &ExtendedValue) -> String {
    match value {
        ExtendedValue::StringValue(s) | ExtendedValue::FormulaValue(s) => s.clone(),
    }
}

impl DocState {
    fn cut_through(&self, range: &GridRange) -> bool {
        self.merges
            .iter()
            .any(|m| overlaps(m, range) && !inside(m, range))
    }

    fn apply(&mut self, request: &Request) -> Result<()> {
        match request {
            Request::InsertDimension(r) => {
                let start = r.range.start_index;
                let count = r.range.end_index - r.range.start_index;
                self.cells = self
                    .cells
                    .drain()
                    .map(|((row, col), v)| {
                        let row = if row >= start { row + count } else { row };
                        ((row, col), v)
                    })
                    .collect();
                for m in &mut self.merges {
                    if m.start_row_index >= start {
                        m.start_row_index += count;
                        m.end_row_index += count;
                    }
                }
            }
            Request::RepeatCell(r) => {
                let value = r.cell.user_entered_value.as_ref().map(value_text);
                let clears = r.fields.starts_with("userEnteredValue");
                for row in r.range.rows() {
                    for col in r.range.columns() {
                        match &value {
                            Some(text) => {
                                self.cells.insert((row, col), text.clone());
                            }
                            None if clears => {
                                self.cells.remove(&(row, col));
                            }
                            None => {}
                        }
                    }
                }
            }
            Request::UpdateCells(r) => {
                let text = r
                    .rows
                    .first()
                    .and_then(|row| row.values.first())
                    .and_then(|cell| cell.user_entered_value.as_ref())
                    .map(value_text)
                    .unwrap_or_default();
                self.cells
                    .insert((r.range.start_row_index, r.range.start_column_index), text);
            }
            Request::MergeCells(r) => {
                if self.cut_through(&r.range) {
                    return Err(Error::RemoteApi(format!(
                        "merge would cut through an existing merge: {:?}",
                        r.range
                    )));
                }
                self.merges.retain(|m| !inside(m, &r.range));
                self.merges.push(r.range);
            }
            Request::UnmergeCells(r) => {
                if self.cut_through(&r.range) {
                    return Err(Error::RemoteApi(format!(
                        "unmerge would cut through an existing merge: {:?}",
                        r.range
                    )));
                }
                self.merges.retain(|m| !inside(m, &r.range));
            }
            Request::UpdateBorders(_) | Request::UpdateDimensionProperties(_) => {}
        }
        Ok(())
    }
}

impl FakeDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_call(call: usize) -> Self {
        let doc = Self::default();
        doc.state.lock().unwrap().fail_on_call = Some(call);
        doc
    }

    pub fn snapshot(&self) -> DocState {
        self.state.lock().unwrap().clone()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<String> {
        self.state.lock().unwrap().cells.get(&(row, col)).cloned()
    }

    pub fn calls(&self) -> usize {
        self.state.lock().unwrap().calls
    }

    pub fn is_merged(&self, range: &GridRange) -> bool {
        self.state.lock().unwrap().merges.contains(range)
    }
}

/// Parse "B:B" or "3:3" style ranges.
enum A1 {
    Column(usize),
    Row(usize),
}

fn parse_a1(range: &str) -> A1 {
    let (first, _) = range.split_once(':').unwrap();
    match first.parse::<usize>() {
        Ok(row) => A1::Row(row - 1),
        Err(_) => {
            let letter = first.bytes().next().unwrap();
            A1::Column(usize::from(letter - b'A'))
        }
    }
}

impl SheetsApi for FakeDocument {
    fn batch_update(&self, _spreadsheet_id: &str, requests: &[Request]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls += 1;
        if state.fail_on_call == Some(state.calls) {
            return Err(Error::RemoteApi("quota exceeded".to_string()));
        }
        // batchUpdate is atomic: apply to a copy, commit only on success
        let mut next = state.clone();
        for request in requests {
            next.apply(request)?;
        }
        *state = next;
        Ok(())
    }

    fn read_values(&self, _spreadsheet_id: &str, range: &str) -> Result<Vec<Vec<String>>> {
        let state = self.state.lock().unwrap();
        match parse_a1(range) {
            A1::Column(col) => {
                let last = state
                    .cells
                    .keys()
                    .filter(|(_, c)| *c == col)
                    .map(|(r, _)| *r + 1)
                    .max()
                    .unwrap_or(0);
                Ok((0..last)
                    .map(|row| state.cells.get(&(row, col)).cloned().into_iter().collect())
                    .collect())
            }
            A1::Row(row) => {
                let last = state
                    .cells
                    .keys()
                    .filter(|(r, _)| *r == row)
                    .map(|(_, c)| *c + 1)
                    .max()
                    .unwrap_or(0);
                if last == 0 {
                    return Ok(Vec::new());
                }
                Ok(vec![(0..last)
                    .map(|col| state.cells.get(&(row, col)).cloned().unwrap_or_default())
                    .collect()])
            }
        }
    }
}

pub fn update_body(updated: serde_json::Value, full: serde_json::Value) -> String {
    serde_json::json!({
        "keys": {"spreadsheetId": "doc-1", "sheetId": 0},
        "updatedData": {"runs": updated},
        "fullData": {"runs": full},
        "lang": "EN"
    })
    .to_string()
}

pub fn mudkip() -> serde_json::Value {
    serde_json::json!({
        "pokedexId": 258,
        "pokemonName": "Mudkip",
        "nickname": "Bubbles",
        "alive": true,
        "ability": "Torrent",
        "level": 14,
        "pid": 123456789,
        "moves": ["Tackle", "Growl", "Water Gun"],
        "nature": "Adamant",
        "IVs": [31, 20, 15, 0, 7, 31]
    })
}
