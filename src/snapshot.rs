use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deck::{DeckSet, ImportanceMap, NoteRef, ReviewDeck};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("reading queue snapshot {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing queue snapshot")]
    Parse(#[from] serde_json::Error),
    #[error("deck entry {index} has an empty name")]
    UnnamedDeck { index: usize },
}

/// Already-resolved scheduling facts handed over by the upstream scanners:
/// deck populations, importance scores and the note currently open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    #[serde(default)]
    pub decks: Vec<ReviewDeck>,
    #[serde(default)]
    pub importance: ImportanceMap,
    #[serde(default)]
    pub active_note: Option<NoteRef>,
    /// Pins "now" in milliseconds since the epoch; the system clock is used when absent.
    #[serde(default)]
    pub now_ms: Option<i64>,
}

impl QueueSnapshot {
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let raw = fs::read_to_string(path).map_err(|source| SnapshotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: QueueSnapshot = serde_json::from_str(raw)?;
        if let Some(index) = snapshot
            .decks
            .iter()
            .position(|deck| deck.name.trim().is_empty())
        {
            return Err(SnapshotError::UnnamedDeck { index });
        }
        Ok(snapshot)
    }

    /// Collects decks by name and sorts every pool with the snapshot's scores.
    pub fn sorted_decks(&self) -> DeckSet {
        let mut decks: DeckSet = self.decks.iter().cloned().collect();
        decks.sort_all(&self.importance);
        decks
    }
}
