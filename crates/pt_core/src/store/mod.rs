//! Snapshot persistence for the tournament working set.
//!
//! The store reads and writes the full snapshot (roster, tournament state,
//! history, brackets) as one record — no partial updates, last write wins.

pub mod error;
pub mod format;
pub mod manager;

pub use error::StoreError;
pub use format::{
    current_timestamp, decompress_and_deserialize, serialize_and_compress, TournamentSave,
};
pub use manager::StoreManager;

/// Snapshot format version, checked on load.
pub const SAVE_VERSION: u32 = 1;
