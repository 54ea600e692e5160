use std::collections::{HashMap, HashSet};

use super::TODAY_BUCKET;

/// How a deck's expansion set is seeded the first time the deck is seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Only the deck itself and its "Today" bucket start expanded.
    #[default]
    DeckAndToday,
    /// Every node starts expanded the first time its title is seen.
    ExpandAll,
}

#[derive(Debug, Clone, Default)]
struct DeckExpansion {
    expanded: HashSet<String>,
    seen: HashSet<String>,
}

/// Expand/collapse memory for the review pane, keyed by deck title and then
/// node title. Outlives individual tree rebuilds; owned by a single view.
#[derive(Debug, Clone, Default)]
pub struct CollapseState {
    policy: SeedPolicy,
    decks: HashMap<String, DeckExpansion>,
}

impl CollapseState {
    pub fn new(policy: SeedPolicy) -> Self {
        Self {
            policy,
            decks: HashMap::new(),
        }
    }

    pub fn policy(&self) -> SeedPolicy {
        self.policy
    }

    pub fn is_expanded(&mut self, deck_title: &str, node_title: &str) -> bool {
        let policy = self.policy;
        let deck = self.deck_entry(deck_title);
        if policy == SeedPolicy::ExpandAll && deck.seen.insert(node_title.to_string()) {
            deck.expanded.insert(node_title.to_string());
        }
        deck.expanded.contains(node_title)
    }

    pub fn toggle(&mut self, deck_title: &str, node_title: &str) {
        let expanded = self.is_expanded(deck_title, node_title);
        let deck = self.deck_entry(deck_title);
        if expanded {
            deck.expanded.remove(node_title);
        } else {
            deck.expanded.insert(node_title.to_string());
        }
        tracing::debug!(
            deck = deck_title,
            node = node_title,
            expanded = !expanded,
            "toggled review queue node"
        );
    }

    pub fn tracked_decks(&self) -> usize {
        self.decks.len()
    }

    fn deck_entry(&mut self, deck_title: &str) -> &mut DeckExpansion {
        self.decks
            .entry(deck_title.to_string())
            .or_insert_with(|| {
                let mut deck = DeckExpansion::default();
                deck.expanded.insert(deck_title.to_string());
                deck.expanded.insert(TODAY_BUCKET.to_string());
                deck.seen = deck.expanded.clone();
                deck
            })
    }
}
