//! Acceptance records: the stored outcome of a visitor agreeing to the
//! service terms for a package before checkout.
//!
//! Each record is a flat hash at `acceptance:<id>`; ids are appended to
//! the `acceptances:all` list in submission order. Records are written
//! once and never modified.

pub mod export;
pub mod model;
pub mod reader;
pub mod recorder;

pub use export::{export_filename, to_csv};
pub use model::{AcceptanceRecord, NewAcceptance, RequestContext};
pub use reader::AcceptanceReader;
pub use recorder::AcceptanceRecorder;
