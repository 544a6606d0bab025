//! Finding the block that already holds a run
//!
//! Two strategies share the [`CardLocator`] trait. [`MarkerScanLocator`]
//! reads the hidden marker column back from the live document;
//! [`CreationOrderLocator`] relies on the newest run always sitting at slot 0.

use crate::catalog::ZONES;
use crate::error::Result;
use crate::geometry::{block_origin_row, slot_for_marker_row, zone_slot_for_column, POKEMON_CARD_TOP};
use crate::renderer::RUN_ID_MARKER_PREFIX;
use crate::sheets::SheetsApi;
use std::collections::HashMap;

/// Column holding the run card text, including the marker.
pub const MARKER_COLUMN_RANGE: &str = "B:B";

/// Marker prefix written by early deployments of the service.
const LEGACY_MARKER_PREFIX: &str = "RundId : ";

/// Resolve a run id to the slot of its block.
pub trait CardLocator {
    /// `Ok(None)` when the run has no block yet.
    fn locate(&self, spreadsheet_id: &str, run_id: &str) -> Result<Option<usize>>;
}

/// Run id encoded in a marker cell, if the text is one.
pub fn parse_marker(text: &str) -> Option<&str> {
    text.strip_prefix(RUN_ID_MARKER_PREFIX)
        .or_else(|| text.strip_prefix(LEGACY_MARKER_PREFIX))
        .map(str::trim)
}

/// Scan marker column rows (0-based, top to bottom) for a run id.
pub fn find_slot_in_column(column: &[Vec<String>], run_id: &str) -> Option<usize> {
    column.iter().enumerate().find_map(|(row, cells)| {
        let text = cells.first()?;
        if parse_marker(text)? != run_id {
            return None;
        }
        let slot = slot_for_marker_row(row);
        if slot.is_none() {
            tracing::warn!(row, run_id, "run marker found off the block grid");
        }
        slot
    })
}

/// Linear scan of the marker column on every lookup.
pub struct MarkerScanLocator<'a, S: SheetsApi + ?Sized> {
    sheets: &'a S,
}

impl<'a, S: SheetsApi + ?Sized> MarkerScanLocator<'a, S> {
    pub fn new(sheets: &'a S) -> Self {
        Self { sheets }
    }
}

impl<S: SheetsApi + ?Sized> CardLocator for MarkerScanLocator<'_, S> {
    fn locate(&self, spreadsheet_id: &str, run_id: &str) -> Result<Option<usize>> {
        let column = self.sheets.read_values(spreadsheet_id, MARKER_COLUMN_RANGE)?;
        let slot = find_slot_in_column(&column, run_id);
        tracing::debug!(run_id, rows = column.len(), ?slot, "marker scan finished");
        Ok(slot)
    }
}

/// Blocks are only ever created at the top, so the newest run is slot 0.
#[derive(Debug, Default, Clone, Copy)]
pub struct CreationOrderLocator;

impl CardLocator for CreationOrderLocator {
    fn locate(&self, _spreadsheet_id: &str, _run_id: &str) -> Result<Option<usize>> {
        Ok(Some(0))
    }
}

/// Answers the same slot for every run. `FixedSlotLocator(None)` treats every
/// run as new, which is what offline previews want.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixedSlotLocator(pub Option<usize>);

impl CardLocator for FixedSlotLocator {
    fn locate(&self, _spreadsheet_id: &str, _run_id: &str) -> Result<Option<usize>> {
        Ok(self.0)
    }
}

/// A1 range of the zone-name row of a block (the first Pokémon card row).
pub fn zone_header_range(run_slot: usize) -> Result<String> {
    let row = block_origin_row(run_slot)? + POKEMON_CARD_TOP + 1;
    Ok(format!("{}:{}", row, row))
}

/// Map zone names found in a zone-name row to their card slot.
pub fn zone_slots_from_header(row: &[String]) -> HashMap<String, usize> {
    row.iter()
        .enumerate()
        .filter(|(_, text)| ZONES.contains(&text.as_str()))
        .filter_map(|(column, text)| Some((text.clone(), zone_slot_for_column(column)?)))
        .collect()
}
