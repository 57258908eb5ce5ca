//! Multi-source NBA statistics crawler: Hupu leaderboards, rosters and
//! standings, ESPN rosters with salary figures, and the official player
//! directory, reconciled across languages by fuzzy name identity and
//! persisted as spreadsheet-friendly CSV.

pub mod clean;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod logging;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod record;
pub mod sources;
pub mod store;

pub use config::Config;
pub use error::{Result, ScraperError};
pub use pipeline::Pipeline;
pub use record::{Field, Record, RecordSet};
