//! Unified record store for financial-inclusion observations, events and the
//! impact links between them.
//!
//! Load with [`process::load_unified_data`], append with the [`enrich`]
//! functions, read through [`query`] and [`report`], and persist with
//! [`process::save_enriched_data`].

pub mod config;
pub mod enrich;
pub mod error;
pub mod guide;
pub mod process;
pub mod query;
pub mod report;
pub mod schema;

pub use enrich::{add_event, add_impact_link, add_observation, Metadata};
pub use error::SchemaError;
pub use process::{load_optional_table, load_reference_codes, load_unified_data, save_enriched_data};
pub use query::{
    get_events_by_year, get_events_with_impacts, get_impact_links_for_event,
    get_observations_by_pillar,
};
pub use report::quantify_dataset_composition;
pub use schema::{UnifiedSchemaValidator, UnifiedTable};
