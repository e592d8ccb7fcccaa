use serde::{Deserialize, Serialize};

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use super::error::StoreError;
use super::SAVE_VERSION;
use crate::models::{RegisteredTeam, MAX_TEAMS};
use crate::tournament::Tournament;

/// Full engine snapshot: the registered roster plus the working tournament
/// state. The store always reads and writes the whole thing.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TournamentSave {
    /// Snapshot format version for the load-time gate.
    pub version: u32,

    /// Snapshot timestamp (unix milliseconds).
    pub timestamp: u64,

    /// Registered teams as imported from the roster source.
    pub roster: Vec<RegisteredTeam>,

    /// Working tournament state; `None` before Swiss initialization.
    pub tournament: Option<Tournament>,
}

impl Default for TournamentSave {
    fn default() -> Self {
        Self::new()
    }
}

impl TournamentSave {
    pub fn new() -> Self {
        Self {
            version: SAVE_VERSION,
            timestamp: current_timestamp(),
            roster: Vec::new(),
            tournament: None,
        }
    }

    pub fn update_timestamp(&mut self) {
        self.timestamp = current_timestamp();
    }

    pub fn validate(&self) -> Result<(), StoreError> {
        if self.roster.len() > MAX_TEAMS {
            return Err(StoreError::Corrupted);
        }

        // Duplicate team ids mean the snapshot was tampered with or merged badly.
        let mut ids = std::collections::HashSet::new();
        for team in &self.roster {
            if !ids.insert(team.id) {
                return Err(StoreError::Corrupted);
            }
        }

        Ok(())
    }
}

/// Serialize and compress a snapshot.
pub fn serialize_and_compress(save: &TournamentSave) -> Result<Vec<u8>, StoreError> {
    save.validate()?;

    // 1. Serialize to MessagePack with field names
    let msgpack = to_vec_named(save).map_err(StoreError::Serialization)?;

    // 2. Compress with LZ4 (size prepended for easy decompression)
    let compressed = compress_prepend_size(&msgpack);

    // 3. Add SHA256 checksum at the end
    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hasher.finalize();

    let mut result = compressed;
    result.extend_from_slice(&checksum);

    Ok(result)
}

/// Decompress and deserialize a snapshot.
pub fn decompress_and_deserialize(bytes: &[u8]) -> Result<TournamentSave, StoreError> {
    // Minimum size: LZ4 size header + checksum trailer
    if bytes.len() < 4 + 32 {
        return Err(StoreError::Corrupted);
    }

    let (payload, checksum_bytes) = bytes.split_at(bytes.len() - 32);

    let mut hasher = Sha256::new();
    hasher.update(payload);
    let calculated_checksum = hasher.finalize();

    if &calculated_checksum[..] != checksum_bytes {
        return Err(StoreError::ChecksumMismatch);
    }

    let msgpack = decompress_size_prepended(payload).map_err(|_| StoreError::Decompression)?;

    let save: TournamentSave = from_slice(&msgpack).map_err(StoreError::Deserialization)?;

    if save.version > SAVE_VERSION {
        return Err(StoreError::VersionMismatch { found: save.version, expected: SAVE_VERSION });
    }

    Ok(save)
}

pub fn current_timestamp() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as u64
}
