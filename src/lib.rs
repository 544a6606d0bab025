//! Run & Bun stats - nuzlocke run telemetry rendered into a spreadsheet
//!
//! The companion app posts run snapshots over HTTP; each run becomes an
//! 18-row block at the top of a Google spreadsheet: a run card on the left
//! and one Pokémon card per zone to the right.
//!
//! # Flow
//!
//! | Step | Module |
//! |------|--------|
//! | Validate the payload | [`model`] |
//! | Find the run's block | [`locator`] |
//! | Build cell requests | [`renderer`] over [`requests`] and [`geometry`] |
//! | Send them in chunks | [`dispatcher`] through [`sheets`] |
//!
//! [`service`] ties the steps together under a per-document lock and
//! [`server`] exposes them over HTTP.
//!
//! # Quick Start
//!
//! ```no_run
//! use runbun::{render_update, validate_update_request, FixedSlotLocator};
//!
//! let body = std::fs::read_to_string("run.payload.json").unwrap();
//! let request = validate_update_request(&body).unwrap();
//!
//! // Treat every run as new and look at the requests it would send
//! let (batch, summary) = render_update(&request, &FixedSlotLocator(None)).unwrap();
//! println!("{} requests for {} new runs", batch.len(), summary.created);
//! ```

pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod geometry;
pub mod locator;
pub mod logging;
pub mod model;
pub mod renderer;
pub mod requests;
pub mod server;
pub mod service;
pub mod sheets;

pub use catalog::{Lang, Nature};
pub use config::{Config, Variant};
pub use dispatcher::BatchDispatcher;
pub use error::{Error, Result};
pub use locator::{CardLocator, CreationOrderLocator, FixedSlotLocator, MarkerScanLocator};
pub use model::{
    validate_init_request, validate_pokemon_cards_request, validate_update_request, Pokemon,
    RunData, UpdateRunRequest,
};
pub use requests::{Request, RequestBatch};
pub use service::{render_update, DocumentLocks, RunService, UpdateSummary};
pub use sheets::{HttpSheetsClient, SheetsApi};
