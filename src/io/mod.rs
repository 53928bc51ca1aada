//! Input/output helpers.
//!
//! - date inference over file text and filenames (`dates`)
//! - directory ingest + per-file CSV parsing (`ingest`)
//! - memoized loading keyed by a directory fingerprint (`cache`)
//! - report/series exports (CSV/JSON) (`export`)

pub mod cache;
pub mod dates;
pub mod export;
pub mod ingest;

pub use cache::*;
pub use dates::*;
pub use export::*;
pub use ingest::*;
