//! pdbcurate-common: Shared types, errors, and the dataset schema descriptor
//! used across all pdbcurate crates.

pub mod error;
pub mod prediction;
pub mod record;
pub mod schema;
pub mod status;

// Re-export commonly used types
pub use error::{CurateError, Result};
pub use prediction::Prediction;
pub use record::Record;
pub use schema::{
    AnnotationTable, ColumnSource, CoreColumns, ExportColumn, ExportOrder, ExportScope,
    ExportSpec, FieldKind, FieldSpec, PredictionChannel, Schema, Summary,
};
pub use status::{StatusFilter, FILTER_ALL, FILTER_BLANK};
