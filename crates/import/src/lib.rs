//! `contactgrid-import`: contact import validation and reconciliation pipeline.
//!
//! Pure engine crate: receives pre-loaded workbook grids, returns preview
//! sessions and reconciliation reports. No file decoding or network IO.

pub mod commit;
pub mod config;
pub mod duplicate;
pub mod error;
pub mod extract;
pub mod header;
pub mod model;
pub mod normalize;
pub mod preview;
pub mod reconcile;
pub mod validate;

pub use commit::{CommitReport, CommitSink, Importer};
pub use config::ImportConfig;
pub use error::ImportError;
pub use model::{CanonicalField, CellValue, Provenance, Record, ServerOutcomeItem, SheetGrid, Workbook};
pub use preview::PreviewSession;
