use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use time::UtcOffset;

use crate::app::App;
use crate::config::AppConfig;
use crate::deck::NoteRef;
use crate::queue::QueueClock;
use crate::snapshot::QueueSnapshot;
use crate::view::{render_plain, ReviewQueueView};

#[derive(Args, Debug, Clone)]
pub struct TuiArgs {
    /// JSON snapshot with decks, importance scores and the active note
    pub snapshot: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct QueueArgs {
    /// JSON snapshot with decks, importance scores and the active note
    pub snapshot: PathBuf,
    /// Treat this note as the currently open file (overrides the snapshot)
    #[arg(long)]
    pub active: Option<String>,
    /// Days ahead to list scheduled notes (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub lookahead: Option<u32>,
    /// Render every row, including those inside collapsed nodes
    #[arg(long)]
    pub all: bool,
    /// Label dates in UTC instead of the local offset
    #[arg(long)]
    pub utc: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DecksArgs {
    /// JSON snapshot with decks
    pub snapshot: PathBuf,
    /// Fuzzy filter applied to deck names
    #[arg()]
    pub query: Option<String>,
}

pub fn run_tui(config: Arc<AppConfig>, args: TuiArgs) -> Result<()> {
    let mut app = App::new(config, args.snapshot)?;
    app.run()
}

pub fn render_queue(config: &AppConfig, args: &QueueArgs) -> Result<String> {
    let snapshot = QueueSnapshot::load(&args.snapshot)
        .with_context(|| format!("loading queue snapshot {}", args.snapshot.display()))?;
    Ok(render_snapshot(config, args, &snapshot))
}

fn render_snapshot(config: &AppConfig, args: &QueueArgs, snapshot: &QueueSnapshot) -> String {
    let decks = snapshot.sorted_decks();
    let active = args
        .active
        .as_deref()
        .map(NoteRef::from)
        .or_else(|| snapshot.active_note.clone());

    let system = QueueClock::system();
    let offset = if args.utc {
        UtcOffset::UTC
    } else {
        system.offset()
    };
    let clock = QueueClock::fixed(snapshot.now_ms.unwrap_or(system.now_ms()), offset);

    let mut view = ReviewQueueView::from_config(config);
    if let Some(days) = args.lookahead {
        view.set_lookahead_days(days);
    }
    let rows = view.redraw(&decks, active.as_ref(), &clock);

    let mut out = if args.all {
        let unhidden: Vec<_> = rows
            .iter()
            .cloned()
            .map(|mut row| {
                row.hidden = false;
                row
            })
            .collect();
        render_plain(&unhidden)
    } else {
        render_plain(rows)
    };
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

pub fn list_decks(args: &DecksArgs) -> Result<String> {
    let snapshot = QueueSnapshot::load(&args.snapshot)
        .with_context(|| format!("loading queue snapshot {}", args.snapshot.display()))?;
    let decks = snapshot.sorted_decks();
    let query = args.query.as_deref().unwrap_or("");
    let mut out = String::new();
    for key in decks.matching_keys(query) {
        let Some(deck) = decks.get(key) else {
            continue;
        };
        let _ = writeln!(
            &mut out,
            "{key}\tnew={} scheduled={} due={}",
            deck.new_notes.len(),
            deck.scheduled_notes.len(),
            deck.due_notes_count
        );
    }
    Ok(out)
}
