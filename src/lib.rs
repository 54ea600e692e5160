pub mod app;
pub mod cli;
pub mod config;
pub mod deck;
pub mod queue;
pub mod snapshot;
pub mod ui;
pub mod view;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use deck::{DeckSet, ImportanceMap, NoteRef, ReviewDeck, ScheduledEntry};
pub use queue::{build_tree, CollapseState, QueueClock, QueueTree, TreeNode};
pub use view::{ReviewQueueView, ViewCommand};
