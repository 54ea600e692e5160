use std::collections::HashMap;
use std::fmt;

use indexmap::map::Entry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Stable identity of a note, usually its vault-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteRef(String);

impl NoteRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    /// File name without directories or extension, used as the display label.
    pub fn basename(&self) -> &str {
        let name = self.0.rsplit('/').next().unwrap_or(self.0.as_str());
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }
}

impl fmt::Display for NoteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NoteRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NoteRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEntry {
    pub note: NoteRef,
    /// Milliseconds since the Unix epoch at which the note becomes due.
    pub due_unix: i64,
}

impl ScheduledEntry {
    pub fn new(note: impl Into<NoteRef>, due_unix: i64) -> Self {
        Self {
            note: note.into(),
            due_unix,
        }
    }
}

/// Graph-importance scores keyed by note. Notes without an entry score 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImportanceMap(HashMap<NoteRef, f64>);

impl ImportanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, note: impl Into<NoteRef>, score: f64) {
        self.0.insert(note.into(), score);
    }

    pub fn score(&self, note: &NoteRef) -> f64 {
        self.0.get(note).copied().unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<NoteRef>> FromIterator<(N, f64)> for ImportanceMap {
    fn from_iter<T: IntoIterator<Item = (N, f64)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(note, score)| (note.into(), score))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewDeck {
    pub name: String,
    #[serde(default)]
    pub new_notes: Vec<NoteRef>,
    #[serde(default)]
    pub scheduled_notes: Vec<ScheduledEntry>,
    #[serde(default)]
    pub due_notes_count: usize,
}

impl ReviewDeck {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Orders new notes by ascending importance and scheduled notes by due
    /// time, breaking ties on ascending importance. Least central notes come
    /// first in both pools.
    pub fn sort_notes(&mut self, importance: &ImportanceMap) {
        self.new_notes
            .sort_by(|a, b| importance.score(a).total_cmp(&importance.score(b)));
        self.scheduled_notes.sort_by(|a, b| {
            a.due_unix.cmp(&b.due_unix).then_with(|| {
                importance
                    .score(&a.note)
                    .total_cmp(&importance.score(&b.note))
            })
        });
    }

    pub fn is_empty(&self) -> bool {
        self.new_notes.is_empty() && self.scheduled_notes.is_empty()
    }

    /// Absorbs another population for the same deck key.
    pub fn merge(&mut self, other: ReviewDeck) {
        self.new_notes.extend(other.new_notes);
        self.scheduled_notes.extend(other.scheduled_notes);
        self.due_notes_count += other.due_notes_count;
    }
}

/// Review decks keyed by name, iterated in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeckSet {
    decks: IndexMap<String, ReviewDeck>,
}

impl DeckSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the deck for `name`, creating it on first sight.
    pub fn deck_mut(&mut self, name: &str) -> &mut ReviewDeck {
        self.decks
            .entry(name.to_string())
            .or_insert_with(|| ReviewDeck::new(name))
    }

    pub fn insert(&mut self, deck: ReviewDeck) {
        match self.decks.entry(deck.name.clone()) {
            Entry::Occupied(mut existing) => existing.get_mut().merge(deck),
            Entry::Vacant(slot) => {
                slot.insert(deck);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ReviewDeck> {
        self.decks.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReviewDeck> {
        self.decks.values()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.decks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.decks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decks.is_empty()
    }

    pub fn sort_all(&mut self, importance: &ImportanceMap) {
        for deck in self.decks.values_mut() {
            deck.sort_notes(importance);
        }
    }

    pub fn total_due(&self) -> usize {
        self.decks.values().map(|deck| deck.due_notes_count).sum()
    }

    /// Deck keys whose characters contain `query` as a case-insensitive
    /// subsequence, in insertion order. An empty query matches every deck.
    pub fn matching_keys(&self, query: &str) -> Vec<&str> {
        let needle: Vec<char> = query.trim().to_lowercase().chars().collect();
        self.keys()
            .filter(|key| is_subsequence(&needle, key))
            .collect()
    }
}

impl FromIterator<ReviewDeck> for DeckSet {
    fn from_iter<T: IntoIterator<Item = ReviewDeck>>(iter: T) -> Self {
        let mut set = DeckSet::new();
        for deck in iter {
            set.insert(deck);
        }
        set
    }
}

fn is_subsequence(needle: &[char], haystack: &str) -> bool {
    let mut pending = needle.iter().peekable();
    for ch in haystack.chars().flat_map(char::to_lowercase) {
        match pending.peek() {
            Some(&&want) if want == ch => {
                pending.next();
            }
            Some(_) => {}
            None => break,
        }
    }
    pending.peek().is_none()
}
