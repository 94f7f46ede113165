pub mod derive;
pub mod table;
pub mod types;
pub mod validate;

pub use derive::{derive_types, Column, ColumnType};
pub use table::{Record, UnifiedTable};
pub use types::*;
pub use validate::{LinkReport, UnifiedSchemaValidator};
