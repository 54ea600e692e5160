//! Presentation tree for the review pane: deck → day bucket → note.
//!
//! The tree is rebuilt from scratch on every redraw. Deck pools must already
//! be sorted with [`ReviewDeck::sort_notes`](crate::deck::ReviewDeck::sort_notes);
//! the day bucketing walks scheduled notes once and stops at the first entry
//! beyond the lookahead window.

use strum::Display;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::deck::{DeckSet, NoteRef, ReviewDeck};

pub mod collapse;

pub use collapse::{CollapseState, SeedPolicy};

pub const DAY_MS: i64 = 86_400_000;

pub const NEW_BUCKET: &str = "New";
pub const YESTERDAY_BUCKET: &str = "Yesterday";
pub const TODAY_BUCKET: &str = "Today";
pub const TOMORROW_BUCKET: &str = "Tomorrow";

/// Reference instant and display offset used to label day buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueClock {
    now_ms: i64,
    offset: UtcOffset,
}

impl QueueClock {
    pub fn system() -> Self {
        let now = OffsetDateTime::now_utc();
        let now_ms = (now.unix_timestamp_nanos() / 1_000_000) as i64;
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        Self { now_ms, offset }
    }

    pub fn fixed(now_ms: i64, offset: UtcOffset) -> Self {
        Self { now_ms, offset }
    }

    pub fn now_ms(&self) -> i64 {
        self.now_ms
    }

    pub fn offset(&self) -> UtcOffset {
        self.offset
    }

    /// Whole days until `due_unix`, rounded up.
    pub fn days_until(&self, due_unix: i64) -> i64 {
        let delta = due_unix.saturating_sub(self.now_ms);
        let days = delta / DAY_MS;
        if delta % DAY_MS > 0 {
            days + 1
        } else {
            days
        }
    }

    pub fn bucket_title(&self, due_unix: i64, days_from_now: i64) -> String {
        match days_from_now {
            -1 => YESTERDAY_BUCKET.to_string(),
            0 => TODAY_BUCKET.to_string(),
            1 => TOMORROW_BUCKET.to_string(),
            _ => self.format_date(due_unix),
        }
    }

    fn format_date(&self, due_unix: i64) -> String {
        let format = format_description!("[weekday repr:short] [month repr:short] [day] [year]");
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(due_unix) * 1_000_000)
            .ok()
            .and_then(|dt| dt.checked_to_offset(self.offset))
            .and_then(|dt| dt.format(&format).ok())
            .unwrap_or_else(|| due_unix.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteNode {
    pub note: NoteRef,
    pub active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    New,
    Day { due_unix: i64, days_from_now: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketNode {
    pub title: String,
    pub kind: BucketKind,
    pub active: bool,
    pub notes: Vec<NoteNode>,
}

impl BucketNode {
    fn new(title: impl Into<String>, kind: BucketKind) -> Self {
        Self {
            title: title.into(),
            kind,
            active: false,
            notes: Vec::new(),
        }
    }

    fn push_note(&mut self, note: &NoteRef, active_note: Option<&NoteRef>) {
        let active = active_note == Some(note);
        if active && !self.active {
            self.active = true;
        }
        self.notes.push(NoteNode {
            note: note.clone(),
            active,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckNode {
    pub title: String,
    pub active: bool,
    pub buckets: Vec<BucketNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueTree {
    pub decks: Vec<DeckNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum NodeKind {
    Deck,
    Bucket,
    Note,
}

/// Borrowed view of any node in a [`QueueTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeNode<'a> {
    Deck(&'a DeckNode),
    Bucket(&'a BucketNode),
    Note(&'a NoteNode),
}

impl<'a> TreeNode<'a> {
    pub fn kind(&self) -> NodeKind {
        match self {
            TreeNode::Deck(_) => NodeKind::Deck,
            TreeNode::Bucket(_) => NodeKind::Bucket,
            TreeNode::Note(_) => NodeKind::Note,
        }
    }

    pub fn title(&self) -> &'a str {
        match *self {
            TreeNode::Deck(deck) => &deck.title,
            TreeNode::Bucket(bucket) => &bucket.title,
            TreeNode::Note(note) => note.note.basename(),
        }
    }

    pub fn is_active(&self) -> bool {
        match self {
            TreeNode::Deck(deck) => deck.active,
            TreeNode::Bucket(bucket) => bucket.active,
            TreeNode::Note(note) => note.active,
        }
    }
}

impl QueueTree {
    pub fn deck(&self, title: &str) -> Option<&DeckNode> {
        self.decks.iter().find(|deck| deck.title == title)
    }

    /// Depth-first walk yielding `(depth, node)` pairs.
    pub fn walk(&self) -> Vec<(usize, TreeNode<'_>)> {
        let mut out = Vec::new();
        for deck in &self.decks {
            out.push((0, TreeNode::Deck(deck)));
            for bucket in &deck.buckets {
                out.push((1, TreeNode::Bucket(bucket)));
                for note in &bucket.notes {
                    out.push((2, TreeNode::Note(note)));
                }
            }
        }
        out
    }

    pub fn note_count(&self) -> usize {
        self.decks
            .iter()
            .flat_map(|deck| &deck.buckets)
            .map(|bucket| bucket.notes.len())
            .sum()
    }
}

/// Builds the presentation tree for `decks` in their insertion order.
pub fn build_tree(
    decks: &DeckSet,
    active_note: Option<&NoteRef>,
    lookahead_days: u32,
    clock: &QueueClock,
) -> QueueTree {
    let decks: Vec<DeckNode> = decks
        .iter()
        .map(|deck| build_deck(deck, active_note, lookahead_days, clock))
        .collect();
    let tree = QueueTree { decks };
    tracing::debug!(
        decks = tree.decks.len(),
        notes = tree.note_count(),
        lookahead_days,
        "rebuilt review queue tree"
    );
    tree
}

fn build_deck(
    deck: &ReviewDeck,
    active_note: Option<&NoteRef>,
    lookahead_days: u32,
    clock: &QueueClock,
) -> DeckNode {
    let mut buckets = Vec::new();

    if !deck.new_notes.is_empty() {
        let mut bucket = BucketNode::new(NEW_BUCKET, BucketKind::New);
        for note in &deck.new_notes {
            bucket.push_note(note, active_note);
        }
        buckets.push(bucket);
    }

    let window = i64::from(lookahead_days);
    let mut current_due: Option<i64> = None;
    for entry in &deck.scheduled_notes {
        if current_due != Some(entry.due_unix) {
            let days_from_now = clock.days_until(entry.due_unix);
            if days_from_now > window {
                tracing::trace!(
                    deck = %deck.name,
                    days_from_now,
                    "scheduled notes beyond lookahead window"
                );
                break;
            }
            buckets.push(BucketNode::new(
                clock.bucket_title(entry.due_unix, days_from_now),
                BucketKind::Day {
                    due_unix: entry.due_unix,
                    days_from_now,
                },
            ));
            current_due = Some(entry.due_unix);
        }
        if let Some(bucket) = buckets.last_mut() {
            bucket.push_note(&entry.note, active_note);
        }
    }

    let active = buckets.iter().any(|bucket| bucket.active);
    DeckNode {
        title: deck.name.clone(),
        active,
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::deck::{ImportanceMap, ScheduledEntry};

    const NOW: i64 = 1_792_411_200_000; // Mon Oct 19 2026 12:00 UTC

    fn clock() -> QueueClock {
        QueueClock::fixed(NOW, UtcOffset::UTC)
    }

    fn titles(deck: &DeckNode) -> Vec<&str> {
        deck.buckets.iter().map(|bucket| bucket.title.as_str()).collect()
    }

    fn deck_with_days(name: &str, days: &[i64]) -> ReviewDeck {
        let mut deck = ReviewDeck::new(name);
        deck.scheduled_notes = days
            .iter()
            .map(|day| ScheduledEntry::new(format!("{name}/due-{day}.md"), NOW + day * DAY_MS))
            .collect();
        deck
    }

    #[test]
    fn days_until_rounds_up_partial_days() {
        let clock = clock();
        assert_eq!(clock.days_until(NOW), 0);
        assert_eq!(clock.days_until(NOW + 1), 1);
        assert_eq!(clock.days_until(NOW - 1), 0);
        assert_eq!(clock.days_until(NOW - DAY_MS / 2), 0);
        assert_eq!(clock.days_until(NOW - DAY_MS), -1);
        assert_eq!(clock.days_until(NOW - DAY_MS - 1), -1);
        assert_eq!(clock.days_until(NOW + 2 * DAY_MS), 2);
    }

    #[test]
    fn labels_relative_days_and_formats_the_rest() {
        let mut decks = DeckSet::new();
        decks.insert(deck_with_days("Default", &[-1, 0, 1, 2]));

        let tree = build_tree(&decks, None, 365, &clock());

        assert_eq!(
            titles(&tree.decks[0]),
            vec!["Yesterday", "Today", "Tomorrow", "Wed Oct 21 2026"]
        );
    }

    #[test]
    fn date_labels_follow_clock_offset() {
        let clock = QueueClock::fixed(NOW, UtcOffset::from_hms(-14, 0, 0).expect("offset"));
        // 2026-10-22 12:00 UTC is still Oct 21 at UTC-14.
        assert_eq!(clock.bucket_title(NOW + 3 * DAY_MS, 3), "Wed Oct 21 2026");
    }

    #[test]
    fn lookahead_stops_at_first_entry_past_window() {
        let mut decks = DeckSet::new();
        decks.insert(deck_with_days("Default", &[0, 2, 6, 10]));

        let tree = build_tree(&decks, None, 5, &clock());

        assert_eq!(titles(&tree.decks[0]), vec!["Today", "Wed Oct 21 2026"]);
    }

    #[test]
    fn lookahead_window_includes_its_last_day() {
        let mut decks = DeckSet::new();
        decks.insert(deck_with_days("Default", &[0, 2, 3]));

        let tree = build_tree(&decks, None, 2, &clock());

        assert_eq!(titles(&tree.decks[0]), vec!["Today", "Wed Oct 21 2026"]);
    }

    #[test]
    fn lookahead_trusts_sorted_input() {
        let mut decks = DeckSet::new();
        decks.insert(deck_with_days("Default", &[0, 6, 2]));

        let tree = build_tree(&decks, None, 5, &clock());

        assert_eq!(titles(&tree.decks[0]), vec!["Today"]);
    }

    #[test]
    fn new_bucket_precedes_day_buckets() {
        let mut deck = deck_with_days("Default", &[0, 1]);
        deck.new_notes = vec!["fresh.md".into()];
        let mut decks = DeckSet::new();
        decks.insert(deck);

        let tree = build_tree(&decks, None, 365, &clock());

        assert_eq!(titles(&tree.decks[0]), vec!["New", "Today", "Tomorrow"]);
        assert_matches!(tree.decks[0].buckets[0].kind, BucketKind::New);
        assert_matches!(
            tree.decks[0].buckets[1].kind,
            BucketKind::Day { days_from_now: 0, .. }
        );
    }

    #[test]
    fn notes_sharing_a_due_time_share_a_bucket() {
        let mut deck = ReviewDeck::new("Default");
        deck.scheduled_notes = vec![
            ScheduledEntry::new("a.md", NOW),
            ScheduledEntry::new("b.md", NOW),
            ScheduledEntry::new("c.md", NOW + DAY_MS),
        ];
        let decks: DeckSet = vec![deck].into_iter().collect();

        let tree = build_tree(&decks, None, 365, &clock());

        let deck = &tree.decks[0];
        assert_eq!(deck.buckets.len(), 2);
        assert_eq!(deck.buckets[0].notes.len(), 2);
        assert_eq!(deck.buckets[1].notes.len(), 1);
    }

    #[test]
    fn decks_keep_insertion_order_and_empty_decks_have_no_buckets() {
        let decks: DeckSet = vec![
            ReviewDeck::new("zeta"),
            deck_with_days("alpha", &[0]),
        ]
        .into_iter()
        .collect();

        let tree = build_tree(&decks, None, 365, &clock());

        let order: Vec<&str> = tree.decks.iter().map(|deck| deck.title.as_str()).collect();
        assert_eq!(order, vec!["zeta", "alpha"]);
        assert!(tree.decks[0].buckets.is_empty());
    }

    #[test]
    fn active_note_marks_its_bucket_and_deck_only() {
        let decks: DeckSet = vec![
            deck_with_days("Default", &[0, 1]),
            deck_with_days("Other", &[0]),
        ]
        .into_iter()
        .collect();
        let active = NoteRef::new("Default/due-0.md");

        let tree = build_tree(&decks, Some(&active), 365, &clock());

        let default = tree.deck("Default").expect("deck");
        assert!(default.active);
        assert!(default.buckets[0].active);
        assert!(default.buckets[0].notes[0].active);
        assert!(!default.buckets[1].active);
        assert!(!tree.deck("Other").expect("deck").active);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let mut deck = deck_with_days("Default", &[-1, 0, 3]);
        deck.new_notes = vec!["n1.md".into(), "n2.md".into()];
        deck.sort_notes(&ImportanceMap::new());
        let decks: DeckSet = vec![deck].into_iter().collect();
        let active = NoteRef::new("n2.md");

        let first = build_tree(&decks, Some(&active), 365, &clock());
        let second = build_tree(&decks, Some(&active), 365, &clock());

        assert_eq!(first, second);
    }

    #[test]
    fn walk_flattens_depth_first() {
        let mut deck = deck_with_days("Default", &[0]);
        deck.new_notes = vec!["fresh.md".into()];
        let decks: DeckSet = vec![deck].into_iter().collect();

        let tree = build_tree(&decks, None, 365, &clock());
        let walked: Vec<(usize, NodeKind, &str)> = tree
            .walk()
            .into_iter()
            .map(|(depth, node)| (depth, node.kind(), node.title()))
            .collect();

        assert_eq!(
            walked,
            vec![
                (0, NodeKind::Deck, "Default"),
                (1, NodeKind::Bucket, "New"),
                (2, NodeKind::Note, "fresh"),
                (1, NodeKind::Bucket, "Today"),
                (2, NodeKind::Note, "due-0"),
            ]
        );
        assert_eq!(NodeKind::Bucket.to_string(), "bucket");
    }

    #[test]
    fn out_of_range_timestamps_degrade_to_raw_labels() {
        let clock = clock();
        assert_eq!(clock.bucket_title(i64::MAX, 99), i64::MAX.to_string());
    }

    #[test]
    fn offset_past_the_last_representable_date_degrades_to_raw_label() {
        let clock = QueueClock::fixed(0, UtcOffset::from_hms(1, 0, 0).expect("offset"));
        // 9999-12-31 23:59:59 UTC rolls into year 10000 at UTC+1.
        let due = 253_402_300_799_000;
        assert_eq!(clock.bucket_title(due, 99), due.to_string());
    }
}
