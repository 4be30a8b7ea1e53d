pub mod config;
pub mod export;
pub mod fetch;
pub mod ingest;
pub mod pipeline;
pub mod standardize;
pub mod table;
pub mod transform;

pub use standardize::{standardize, Standardizer};
pub use table::{CanonicalRow, CanonicalTable, Cell, RawTable};
