//! Request handling core: locate, render, dispatch
//!
//! Rendering is kept separate from dispatch ([`render_update`]) so a payload
//! can be previewed without touching the remote document.

use crate::catalog::{zone_index, Lang};
use crate::dispatcher::BatchDispatcher;
use crate::error::{Error, Result};
use crate::locator::{
    zone_header_range, zone_slots_from_header, CardLocator, MarkerScanLocator,
};
use crate::model::{InitRunRequest, PokemonData, UpdatePokemonCardsRequest, UpdateRunRequest};
use crate::renderer::{generate_pokemon_card, generate_run_block, update_run_card};
use crate::requests::RequestBatch;
use crate::sheets::SheetsApi;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// What one request did to the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    /// New run blocks prepended
    pub created: usize,
    /// Existing run blocks patched
    pub patched: usize,
    /// Pokémon cards rendered in existing blocks
    pub pokemon_cards: usize,
    pub requests: usize,
    pub chunks: usize,
}

/// One lock per spreadsheet.
///
/// Prepending a block moves every other block of the document, so updates
/// to different runs of the same document must not interleave either.
/// Entries nobody holds are dropped on the next [`DocumentLocks::lock_for`],
/// so the map only grows with the documents being updated concurrently.
#[derive(Debug, Default)]
pub struct DocumentLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DocumentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock guarding `spreadsheet_id`. Hold its guard for the whole
    /// locate-render-dispatch sequence.
    pub fn lock_for(&self, spreadsheet_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Every holder cloned its Arc under this mutex, so a count of 1 is idle
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(spreadsheet_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

fn zone_slot(zone: &str) -> Result<usize> {
    zone_index(zone).ok_or_else(|| Error::Validation(format!("Unknown zone : {}", zone)))
}

/// Turn an `/updateRun` payload into one ordered batch.
///
/// Unknown runs get a full block at slot 0 from `fullData`; known runs get
/// a sparse patch. Nothing is dispatched until every run is rendered, so a
/// known run's scanned slot is shifted by the blocks prepended before it.
pub fn render_update(
    request: &UpdateRunRequest,
    locator: &dyn CardLocator,
) -> Result<(RequestBatch, UpdateSummary)> {
    let spreadsheet_id = &request.keys.spreadsheet_id;
    let sheet_id = request.keys.sheet_id;
    let mut batch = RequestBatch::new();
    let mut summary = UpdateSummary::default();

    for (run_id, update) in &request.updated_data.runs {
        match locator.locate(spreadsheet_id, run_id)? {
            None => {
                let entry = request.full_data.runs.get(run_id).ok_or_else(|| {
                    Error::Validation(format!("Missing required fields : fullData.runs.{}", run_id))
                })?;
                generate_run_block(
                    &mut batch,
                    sheet_id,
                    run_id,
                    &entry.run_data,
                    &entry.pokemon_data,
                    request.lang,
                )?;
                summary.created += 1;
                tracing::info!(run_id = %run_id, "new run block");
            }
            Some(scanned) => {
                let run_slot = scanned + summary.created;
                if !update.run_data.is_empty() {
                    update_run_card(&mut batch, sheet_id, run_slot, &update.run_data)?;
                }
                for (zone, pokemon) in &update.pokemon_data {
                    generate_pokemon_card(
                        &mut batch,
                        sheet_id,
                        pokemon.as_ref(),
                        zone,
                        run_slot,
                        zone_slot(zone)?,
                        request.lang,
                    )?;
                    summary.pokemon_cards += 1;
                }
                summary.patched += 1;
                tracing::info!(run_id = %run_id, run_slot, "run block patched");
            }
        }
    }

    summary.requests = batch.len();
    Ok((batch, summary))
}

/// Runs requests against one remote document store.
pub struct RunService<'a, S: SheetsApi + ?Sized> {
    sheets: &'a S,
    dispatcher: BatchDispatcher,
    locks: &'a DocumentLocks,
}

impl<'a, S: SheetsApi + ?Sized> RunService<'a, S> {
    pub fn new(sheets: &'a S, dispatcher: BatchDispatcher, locks: &'a DocumentLocks) -> Self {
        Self {
            sheets,
            dispatcher,
            locks,
        }
    }

    fn dispatch(&self, spreadsheet_id: &str, batch: &RequestBatch) -> Result<usize> {
        self.dispatcher.dispatch(self.sheets, spreadsheet_id, batch)
    }

    /// `/updateRun`: create or patch every run of the payload.
    pub fn update_run(&self, request: &UpdateRunRequest) -> Result<UpdateSummary> {
        let spreadsheet_id = &request.keys.spreadsheet_id;
        let lock = self.locks.lock_for(spreadsheet_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let locator = MarkerScanLocator::new(self.sheets);
        let (batch, mut summary) = render_update(request, &locator)?;
        summary.chunks = self.dispatch(spreadsheet_id, &batch)?;
        Ok(summary)
    }

    /// `/initRun`: prepend a complete block for a new run.
    pub fn init_run(&self, request: &InitRunRequest) -> Result<UpdateSummary> {
        let spreadsheet_id = &request.keys.spreadsheet_id;
        let lock = self.locks.lock_for(spreadsheet_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut batch = RequestBatch::new();
        generate_run_block(
            &mut batch,
            request.keys.sheet_id,
            &request.run_id,
            &request.run_data,
            &request.pokemon_data,
            request.lang,
        )?;
        tracing::info!(run_id = %request.run_id, "new run block");

        let chunks = self.dispatch(spreadsheet_id, &batch)?;
        Ok(UpdateSummary {
            created: 1,
            requests: batch.len(),
            chunks,
            ..UpdateSummary::default()
        })
    }

    /// `/updatePokemonCards`: re-render some zone cards of one block. Zone
    /// columns are read back from the block's zone-name row.
    ///
    /// The body names no run, so an explicit `runSlot` wins and `locator`
    /// picks the block otherwise.
    pub fn update_pokemon_cards(
        &self,
        request: &UpdatePokemonCardsRequest,
        locator: &dyn CardLocator,
    ) -> Result<UpdateSummary> {
        let spreadsheet_id = &request.keys.spreadsheet_id;
        let lock = self.locks.lock_for(spreadsheet_id);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let run_slot = match request.run_slot {
            Some(slot) => slot,
            None => locator.locate(spreadsheet_id, "")?.ok_or_else(|| {
                Error::Validation("No run block to update : send runSlot".to_string())
            })?,
        };
        let header = self
            .sheets
            .read_values(spreadsheet_id, &zone_header_range(run_slot)?)?
            .into_iter()
            .next()
            .unwrap_or_default();

        let batch = render_pokemon_cards(
            request.keys.sheet_id,
            run_slot,
            &request.pokemon_data,
            &zone_slots_from_header(&header),
            request.lang,
        )?;
        let chunks = self.dispatch(spreadsheet_id, &batch)?;
        Ok(UpdateSummary {
            patched: 1,
            pokemon_cards: request.pokemon_data.len(),
            requests: batch.len(),
            chunks,
            ..UpdateSummary::default()
        })
    }
}

/// Render zone cards using slots read from the sheet, falling back to the
/// catalog for zones the header row does not show.
pub fn render_pokemon_cards(
    sheet_id: i64,
    run_slot: usize,
    pokemon_data: &PokemonData,
    header_slots: &HashMap<String, usize>,
    lang: Lang,
) -> Result<RequestBatch> {
    let mut batch = RequestBatch::new();
    for (zone, pokemon) in pokemon_data {
        let slot = match header_slots.get(zone) {
            Some(slot) => *slot,
            None => {
                tracing::warn!(zone = %zone, run_slot, "zone missing from header row, using catalog order");
                zone_slot(zone)?
            }
        };
        generate_pokemon_card(
            &mut batch,
            sheet_id,
            pokemon.as_ref(),
            zone,
            run_slot,
            slot,
            lang,
        )?;
    }
    Ok(batch)
}
