//! Review pane controller: rebuilds the queue tree on every host event,
//! applies the remembered expand/collapse state and answers clicks.

use crate::config::AppConfig;
use crate::deck::{DeckSet, NoteRef};
use crate::queue::{build_tree, CollapseState, QueueClock, QueueTree, SeedPolicy};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    FileOpened(Option<NoteRef>),
    FileRenamed { from: NoteRef, to: NoteRef },
}

/// Requests the view hands back to its host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCommand {
    Redraw,
    OpenNote { note: NoteRef, deck: String },
    ShowFileMenu { note: NoteRef },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Deck,
    Bucket,
    Note(NoteRef),
}

/// One line of the flattened pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    pub depth: usize,
    pub kind: RowKind,
    pub deck: String,
    pub title: String,
    pub active: bool,
    /// Deck and bucket rows only: children are folded away.
    pub collapsed: bool,
    pub hidden: bool,
}

impl QueueRow {
    pub fn note(&self) -> Option<&NoteRef> {
        match &self.kind {
            RowKind::Note(note) => Some(note),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReviewQueueView {
    lookahead_days: u32,
    collapse: CollapseState,
    last_selected_deck: Option<String>,
    tree: QueueTree,
    rows: Vec<QueueRow>,
}

impl ReviewQueueView {
    pub fn new(lookahead_days: u32, policy: SeedPolicy) -> Self {
        Self {
            lookahead_days,
            collapse: CollapseState::new(policy),
            last_selected_deck: None,
            tree: QueueTree::default(),
            rows: Vec::new(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.lookahead_days(), config.seed_policy())
    }

    pub fn set_lookahead_days(&mut self, days: u32) {
        self.lookahead_days = days;
    }

    pub fn lookahead_days(&self) -> u32 {
        self.lookahead_days
    }

    pub fn tree(&self) -> &QueueTree {
        &self.tree
    }

    pub fn rows(&self) -> &[QueueRow] {
        &self.rows
    }

    pub fn visible_rows(&self) -> impl Iterator<Item = (usize, &QueueRow)> {
        self.rows.iter().enumerate().filter(|(_, row)| !row.hidden)
    }

    pub fn last_selected_deck(&self) -> Option<&str> {
        self.last_selected_deck.as_deref()
    }

    pub fn collapse_state(&self) -> &CollapseState {
        &self.collapse
    }

    /// Discards the previous tree and rebuilds it from the current decks.
    pub fn redraw(
        &mut self,
        decks: &DeckSet,
        active_note: Option<&NoteRef>,
        clock: &QueueClock,
    ) -> &[QueueRow] {
        self.tree = build_tree(decks, active_note, self.lookahead_days, clock);
        self.rows = flatten(&self.tree, &mut self.collapse);
        &self.rows
    }

    /// File opens and renames always invalidate the pane.
    pub fn handle_event(&self, event: &HostEvent) -> ViewCommand {
        match event {
            HostEvent::FileOpened(note) => {
                tracing::trace!(note = ?note, "file opened");
            }
            HostEvent::FileRenamed { from, to } => {
                tracing::trace!(%from, %to, "file renamed");
            }
        }
        ViewCommand::Redraw
    }

    /// Note rows open the note and remember their deck; deck and bucket
    /// titles flip their collapse state.
    pub fn click(&mut self, row_index: usize) -> Option<ViewCommand> {
        let row = self.rows.get(row_index)?;
        match &row.kind {
            RowKind::Note(note) => {
                let deck = row.deck.clone();
                let note = note.clone();
                self.last_selected_deck = Some(deck.clone());
                Some(ViewCommand::OpenNote { note, deck })
            }
            RowKind::Deck | RowKind::Bucket => {
                let (deck, title) = (row.deck.clone(), row.title.clone());
                self.collapse.toggle(&deck, &title);
                Some(ViewCommand::Redraw)
            }
        }
    }

    pub fn context_menu(&self, row_index: usize) -> Option<ViewCommand> {
        self.rows
            .get(row_index)
            .and_then(QueueRow::note)
            .map(|note| ViewCommand::ShowFileMenu { note: note.clone() })
    }
}

fn flatten(tree: &QueueTree, collapse: &mut CollapseState) -> Vec<QueueRow> {
    let mut rows = Vec::new();
    for deck in &tree.decks {
        let deck_collapsed = !collapse.is_expanded(&deck.title, &deck.title);
        rows.push(QueueRow {
            depth: 0,
            kind: RowKind::Deck,
            deck: deck.title.clone(),
            title: deck.title.clone(),
            active: deck.active,
            collapsed: deck_collapsed,
            hidden: false,
        });
        for bucket in &deck.buckets {
            let bucket_collapsed = !collapse.is_expanded(&deck.title, &bucket.title);
            rows.push(QueueRow {
                depth: 1,
                kind: RowKind::Bucket,
                deck: deck.title.clone(),
                title: bucket.title.clone(),
                active: bucket.active,
                collapsed: bucket_collapsed,
                hidden: deck_collapsed && !bucket.active,
            });
            let notes_folded = deck_collapsed || bucket_collapsed;
            for note in &bucket.notes {
                rows.push(QueueRow {
                    depth: 2,
                    kind: RowKind::Note(note.note.clone()),
                    deck: deck.title.clone(),
                    title: note.note.basename().to_string(),
                    active: note.active,
                    collapsed: false,
                    hidden: notes_folded && !note.active,
                });
            }
        }
    }
    rows
}

/// Plain-text rendering of the visible rows, one per line.
pub fn render_plain<'a>(rows: impl IntoIterator<Item = &'a QueueRow>) -> String {
    rows.into_iter()
        .filter(|row| !row.hidden)
        .map(|row| {
            let indent = "  ".repeat(row.depth);
            let marker = if row.active { " *" } else { "" };
            match row.kind {
                RowKind::Note(_) => format!("{indent}- {}{marker}", row.title),
                RowKind::Deck | RowKind::Bucket => {
                    let arrow = if row.collapsed { '▸' } else { '▾' };
                    format!("{indent}{arrow} {}{marker}", row.title)
                }
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use time::UtcOffset;

    use super::*;
    use crate::deck::{ImportanceMap, ReviewDeck, ScheduledEntry};
    use crate::queue::DAY_MS;

    const NOW: i64 = 1_792_411_200_000; // Mon Oct 19 2026 12:00 UTC

    fn clock() -> QueueClock {
        QueueClock::fixed(NOW, UtcOffset::UTC)
    }

    fn sample_decks() -> DeckSet {
        let mut default = ReviewDeck::new("Default");
        default.new_notes = vec!["inbox/idea.md".into()];
        default.scheduled_notes = vec![
            ScheduledEntry::new("today-a.md", NOW),
            ScheduledEntry::new("today-b.md", NOW),
            ScheduledEntry::new("tomorrow.md", NOW + DAY_MS),
            ScheduledEntry::new("later.md", NOW + 3 * DAY_MS),
        ];
        let mut math = ReviewDeck::new("#math");
        math.scheduled_notes = vec![ScheduledEntry::new("algebra.md", NOW)];
        let mut decks: DeckSet = vec![default, math].into_iter().collect();
        decks.sort_all(&ImportanceMap::new());
        decks
    }

    fn row_index(view: &ReviewQueueView, deck: &str, title: &str) -> usize {
        view.rows()
            .iter()
            .position(|row| row.deck == deck && row.title == title)
            .expect("row present")
    }

    #[test]
    fn initial_render_expands_deck_and_today() {
        let mut view = ReviewQueueView::new(365, SeedPolicy::DeckAndToday);
        view.redraw(&sample_decks(), None, &clock());

        insta::assert_snapshot!(render_plain(view.rows()), @r###"
        ▾ Default
          ▸ New
          ▾ Today
            - today-a
            - today-b
          ▸ Tomorrow
          ▸ Thu Oct 22 2026
        ▾ #math
          ▾ Today
            - algebra
        "###);
    }

    #[test]
    fn active_note_stays_visible_inside_collapsed_bucket() {
        let mut view = ReviewQueueView::new(365, SeedPolicy::DeckAndToday);
        let active = NoteRef::new("tomorrow.md");
        view.redraw(&sample_decks(), Some(&active), &clock());

        let row = &view.rows()[row_index(&view, "Default", "tomorrow")];
        assert!(row.active);
        assert!(!row.hidden);
        let bucket = &view.rows()[row_index(&view, "Default", "Tomorrow")];
        assert!(bucket.active);
        assert!(bucket.collapsed);
    }

    #[test]
    fn collapsing_a_deck_hides_inactive_buckets() {
        let mut view = ReviewQueueView::new(365, SeedPolicy::DeckAndToday);
        let active = NoteRef::new("today-a.md");
        let decks = sample_decks();
        view.redraw(&decks, Some(&active), &clock());

        let deck_row = row_index(&view, "Default", "Default");
        assert_eq!(view.click(deck_row), Some(ViewCommand::Redraw));
        view.redraw(&decks, Some(&active), &clock());

        let visible: Vec<&str> = view
            .visible_rows()
            .filter(|(_, row)| row.deck == "Default")
            .map(|(_, row)| row.title.as_str())
            .collect();
        assert_eq!(visible, vec!["Default", "Today", "today-a"]);
    }

    #[test]
    fn collapse_state_survives_rebuilds_with_new_data() {
        let mut view = ReviewQueueView::new(365, SeedPolicy::DeckAndToday);
        let mut decks = sample_decks();
        view.redraw(&decks, None, &clock());
        let today = row_index(&view, "Default", "Today");
        view.click(today);

        decks
            .deck_mut("Default")
            .scheduled_notes
            .insert(0, ScheduledEntry::new("overdue.md", NOW - DAY_MS));
        view.redraw(&decks, None, &clock());

        let today = &view.rows()[row_index(&view, "Default", "Today")];
        assert!(today.collapsed);
        let yesterday = &view.rows()[row_index(&view, "Default", "Yesterday")];
        assert!(yesterday.collapsed);
        let math_today = &view.rows()[row_index(&view, "#math", "Today")];
        assert!(!math_today.collapsed);
    }

    #[test]
    fn clicking_a_note_opens_it_and_remembers_the_deck() {
        let mut view = ReviewQueueView::new(365, SeedPolicy::DeckAndToday);
        view.redraw(&sample_decks(), None, &clock());

        let idx = row_index(&view, "#math", "algebra");
        let command = view.click(idx);

        assert_matches!(
            command,
            Some(ViewCommand::OpenNote { ref note, ref deck })
                if note.path() == "algebra.md" && deck == "#math"
        );
        assert_eq!(view.last_selected_deck(), Some("#math"));
        assert_eq!(view.click(usize::MAX), None);
    }

    #[test]
    fn context_menu_only_for_notes() {
        let mut view = ReviewQueueView::new(365, SeedPolicy::DeckAndToday);
        view.redraw(&sample_decks(), None, &clock());

        let note_row = row_index(&view, "Default", "today-b");
        assert_eq!(
            view.context_menu(note_row),
            Some(ViewCommand::ShowFileMenu {
                note: NoteRef::new("today-b.md")
            })
        );
        assert_eq!(view.context_menu(0), None);
    }

    #[test]
    fn host_events_request_redraw() {
        let view = ReviewQueueView::new(365, SeedPolicy::DeckAndToday);
        assert_eq!(
            view.handle_event(&HostEvent::FileOpened(None)),
            ViewCommand::Redraw
        );
        assert_eq!(
            view.handle_event(&HostEvent::FileRenamed {
                from: "a.md".into(),
                to: "b.md".into()
            }),
            ViewCommand::Redraw
        );
    }

    #[test]
    fn lookahead_comes_from_config() {
        let mut config = AppConfig::default();
        config.notes.max_n_days_review_queue = 1;
        let mut view = ReviewQueueView::from_config(&config);
        view.redraw(&sample_decks(), None, &clock());

        assert!(view.rows().iter().all(|row| row.title != "Thu Oct 22 2026"));
        assert_eq!(view.lookahead_days(), 1);
    }
}
