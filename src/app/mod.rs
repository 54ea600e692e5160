use std::io::Stdout;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::queue::QueueClock;
use crate::snapshot::QueueSnapshot;
use crate::ui;
use crate::view::ReviewQueueView;

mod actions;
pub mod state;

pub use state::QueueScreen;

enum Action {
    Quit,
    SelectNext,
    SelectPrevious,
    Activate,
    FileMenu,
    Reload,
}

pub struct App {
    pub config: Arc<AppConfig>,
    snapshot_path: PathBuf,
    pinned_now: Option<i64>,
    state: QueueScreen,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, snapshot_path: PathBuf) -> Result<Self> {
        let snapshot = QueueSnapshot::load(&snapshot_path)
            .with_context(|| format!("loading queue snapshot {}", snapshot_path.display()))?;
        let view = ReviewQueueView::from_config(&config);
        let mut state = QueueScreen::new(snapshot.sorted_decks(), view, snapshot.active_note.clone());
        let pinned_now = snapshot.now_ms;
        state.redraw(&clock_for(pinned_now));
        Ok(Self {
            config,
            snapshot_path,
            pinned_now,
            state,
            list_state: ListState::default(),
            should_quit: false,
            tick_rate: Duration::from_millis(250),
        })
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        restore_terminal(&mut terminal)?;
        result
    }

    pub fn state(&self) -> &QueueScreen {
        &self.state
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal
                .draw(|frame| {
                    if self.state.visible_len() > 0 {
                        self.list_state.select(Some(self.state.selected));
                    } else {
                        self.list_state.select(None);
                    }
                    ui::draw_queue(frame, &self.state, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            if event::poll(self.tick_rate).context("polling for terminal events")? {
                match event::read().context("reading terminal event")? {
                    Event::Key(key) => self.handle_key(key),
                    Event::Resize(_, _) => {
                        // next draw picks up the new size
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        let action = match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Quit)
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::Reload)
            }
            KeyCode::Char('j') | KeyCode::Down => Some(Action::SelectNext),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::SelectPrevious),
            KeyCode::Enter | KeyCode::Char(' ') => Some(Action::Activate),
            KeyCode::Char('m') => Some(Action::FileMenu),
            _ => None,
        };

        if let Some(action) = action {
            self.handle_action(action);
        }
    }

    fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::Activate => {
                if let Some(command) = self.state.activate_selected() {
                    actions::apply(&mut self.state, command, &clock_for(self.pinned_now));
                }
            }
            Action::FileMenu => {
                if let Some(command) = self.state.context_menu_for_selected() {
                    actions::apply(&mut self.state, command, &clock_for(self.pinned_now));
                }
            }
            Action::Reload => {
                if let Err(err) = self.reload() {
                    tracing::error!(?err, "failed to reload queue snapshot");
                    self.state
                        .set_status_message(Some("Reload failed; keeping previous queue"));
                }
            }
        }
    }

    fn reload(&mut self) -> Result<()> {
        let snapshot = QueueSnapshot::load(&self.snapshot_path)
            .with_context(|| format!("reloading {}", self.snapshot_path.display()))?;
        self.state.decks = snapshot.sorted_decks();
        self.pinned_now = snapshot.now_ms;
        self.state.redraw(&clock_for(self.pinned_now));
        self.state.set_status_message(Some(format!(
            "Reloaded {} deck(s)",
            self.state.decks.len()
        )));
        Ok(())
    }
}

fn clock_for(pinned_now: Option<i64>) -> QueueClock {
    let system = QueueClock::system();
    match pinned_now {
        Some(now_ms) => QueueClock::fixed(now_ms, system.offset()),
        None => system,
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
