//! Card block geometry
//!
//! A run block is [`RUN_BLOCK_HEIGHT`] rows tall. Its run card covers columns
//! `0..RUN_CARD_WIDTH`, then one Pokémon card of [`POKEMON_CARD_WIDTH`]
//! columns per zone follows, in catalog order. Pokémon cards start
//! [`POKEMON_CARD_TOP`] rows below the block origin, under the header bands.
//!
//! All ranges are half-open on both axes, like the Sheets `GridRange`.

use crate::catalog::ZONES;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const RUN_BLOCK_HEIGHT: usize = 18;
pub const RUN_CARD_WIDTH: usize = 10;
pub const POKEMON_CARD_WIDTH: usize = 5;
pub const POKEMON_CARD_TOP: usize = 2;
pub const POKEMON_CARD_HEIGHT: usize = 15;

/// Rows a single sheet can hold.
pub const MAX_SHEET_ROWS: usize = 10_000_000;

/// Last run slot whose block, closing band included, fits in a sheet.
pub const MAX_RUN_SLOT: usize = (MAX_SHEET_ROWS - RUN_CARD_MAX_ROWS) / RUN_BLOCK_HEIGHT;

/// Full-width bands are drawn across this many columns.
pub const BAND_WIDTH: usize = 500;

/// Row of the hidden run id marker, relative to the block origin.
pub const MARKER_ROW: usize = 7;

/// The run card may draw one row into the next block (its closing grey band
/// is that block's opening band).
const RUN_CARD_MAX_ROWS: usize = RUN_BLOCK_HEIGHT + 1;

/// Absolute rectangle of cells in one sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: usize,
    pub end_row_index: usize,
    pub start_column_index: usize,
    pub end_column_index: usize,
}

impl GridRange {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.start_row_index..self.end_row_index
    }

    pub fn columns(&self) -> std::ops::Range<usize> {
        self.start_column_index..self.end_column_index
    }

    pub fn contains(&self, row: usize, column: usize) -> bool {
        self.rows().contains(&row) && self.columns().contains(&column)
    }
}

/// First row of a run block. Slots past [`MAX_RUN_SLOT`] are
/// `InvalidGeometry`.
pub fn block_origin_row(run_slot: usize) -> Result<usize> {
    if run_slot > MAX_RUN_SLOT {
        return Err(Error::InvalidGeometry(format!(
            "run slot {} past the last block of a sheet ({})",
            run_slot, MAX_RUN_SLOT
        )));
    }
    RUN_BLOCK_HEIGHT
        .checked_mul(run_slot)
        .ok_or_else(|| Error::InvalidGeometry(format!("run slot {} overflows", run_slot)))
}

/// First column of a Pokémon card.
pub fn pokemon_card_origin_column(zone_slot: usize) -> usize {
    RUN_CARD_WIDTH + POKEMON_CARD_WIDTH * zone_slot
}

/// Absolute row of the run id marker of a block.
pub fn marker_row(run_slot: usize) -> Result<usize> {
    Ok(block_origin_row(run_slot)? + MARKER_ROW)
}

/// Inverse of [`marker_row`]. `None` for rows that cannot hold a marker.
pub fn slot_for_marker_row(row: usize) -> Option<usize> {
    let offset = row.checked_sub(MARKER_ROW)?;
    let remainder = offset % RUN_BLOCK_HEIGHT;
    (remainder == 0).then_some(offset / RUN_BLOCK_HEIGHT)
}

/// Pokémon-card slot owning an absolute column.
pub fn zone_slot_for_column(column: usize) -> Option<usize> {
    let offset = column.checked_sub(RUN_CARD_WIDTH)?;
    let slot = offset / POKEMON_CARD_WIDTH;
    (slot < ZONES.len()).then_some(slot)
}

/// Turn a rectangle relative to a card into an absolute range.
///
/// With `pokemon_slot = None` the rectangle is relative to the run card at
/// the top-left of the block; otherwise to the Pokémon card of that zone.
pub fn card_range(
    sheet_id: i64,
    run_slot: usize,
    pokemon_slot: Option<usize>,
    top: usize,
    bottom: usize,
    left: usize,
    right: usize,
) -> Result<GridRange> {
    if top >= bottom || left >= right {
        return Err(Error::InvalidGeometry(format!(
            "empty rectangle rows {}..{} columns {}..{}",
            top, bottom, left, right
        )));
    }

    let (row_origin, column_origin, max_rows, max_columns) = match pokemon_slot {
        None => (block_origin_row(run_slot)?, 0, RUN_CARD_MAX_ROWS, BAND_WIDTH),
        Some(slot) if slot < ZONES.len() => (
            block_origin_row(run_slot)? + POKEMON_CARD_TOP,
            pokemon_card_origin_column(slot),
            POKEMON_CARD_HEIGHT,
            POKEMON_CARD_WIDTH,
        ),
        Some(slot) => {
            return Err(Error::InvalidGeometry(format!(
                "pokemon slot {} outside the {} zone catalog",
                slot,
                ZONES.len()
            )))
        }
    };

    if bottom > max_rows || right > max_columns {
        return Err(Error::InvalidGeometry(format!(
            "rectangle rows {}..{} columns {}..{} exceeds card of {}x{}",
            top, bottom, left, right, max_rows, max_columns
        )));
    }

    Ok(GridRange {
        sheet_id,
        start_row_index: row_origin + top,
        end_row_index: row_origin + bottom,
        start_column_index: column_origin + left,
        end_column_index: column_origin + right,
    })
}

/// A card bound to one block and optional zone, so renderers can address
/// cells by relative coordinates only.
#[derive(Debug, Clone, Copy)]
pub struct Card {
    pub sheet_id: i64,
    pub run_slot: usize,
    pub pokemon_slot: Option<usize>,
}

impl Card {
    pub fn run(sheet_id: i64, run_slot: usize) -> Self {
        Self {
            sheet_id,
            run_slot,
            pokemon_slot: None,
        }
    }

    pub fn pokemon(sheet_id: i64, run_slot: usize, zone_slot: usize) -> Self {
        Self {
            sheet_id,
            run_slot,
            pokemon_slot: Some(zone_slot),
        }
    }

    pub fn range(&self, top: usize, bottom: usize, left: usize, right: usize) -> Result<GridRange> {
        card_range(
            self.sheet_id,
            self.run_slot,
            self.pokemon_slot,
            top,
            bottom,
            left,
            right,
        )
    }

    /// First absolute column of the card.
    pub fn origin_column(&self) -> usize {
        self.pokemon_slot.map_or(0, pokemon_card_origin_column)
    }
}
