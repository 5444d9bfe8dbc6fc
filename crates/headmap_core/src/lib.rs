//! Head-map core
//!
//! Turns the tabular results of an external statistical engine into typed
//! per-site values grouped by condition (symptoms, networks, lobes), and
//! synthesizes the composite "user symptom" from all loaded symptoms.
//!
//! Data flow:
//! - [`source::TableSource`] produces one [`source::RawTable`] per request
//! - [`table::Table`] validates and indexes it by column and row
//! - [`aggregation::SurfacePowerProcessor`] parses the cells into
//!   [`head_cell::HeadCell`]s inside the [`head_data::HeadData`] of each
//!   symptom, then folds every symptom into the user symptom
//! - [`conditions::ConditionsMaps`] owns the four condition categories and
//!   drives the two-phase (structure, then data) lifecycle

pub mod aggregation;
pub mod conditions;
pub mod config;
pub mod error;
pub mod head_cell;
pub mod head_data;
pub mod source;
pub mod table;

pub use aggregation::{FoldRule, ProcessorChain, SurfacePowerProcessor};
pub use conditions::{
    CategoryMaps, ConditionCategory, ConditionMap, ConditionsMaps, ConditionsProcessor,
    RegistryState, StaticMapsInitializer,
};
pub use config::{AggregationRules, ConditionNames, ScriptRequests, TableRequest};
pub use error::{Axis, EngineError, HeadmapError, Result};
pub use head_cell::HeadCell;
pub use head_data::{HeadData, HeadDataStrategy, HeadType, SiteListStrategy, SiteMap};
pub use source::{CsvTableSource, MemoryTableSource, RawTable, RawVector, TableSource};
pub use table::{StringTable, Table};
