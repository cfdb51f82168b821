//! Data module - CSV and boundary loading, joins

pub mod boundaries;
pub mod columns;
mod loader;
mod processor;

pub use boundaries::{load_boundaries, Boundary, BoundaryError};
pub use loader::{DataLoader, LoaderError, RawTables};
pub use processor::{
    normalize_leading_department_codes, DataProcessor, ProcessorError, PADDED_DEPARTMENT_ROWS,
};
