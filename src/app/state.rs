use crate::deck::{DeckSet, NoteRef};
use crate::queue::QueueClock;
use crate::view::{HostEvent, QueueRow, ReviewQueueView, ViewCommand};

/// Everything the terminal pane needs between frames.
#[derive(Debug, Clone)]
pub struct QueueScreen {
    pub decks: DeckSet,
    pub view: ReviewQueueView,
    pub active_note: Option<NoteRef>,
    /// Index into the visible rows.
    pub selected: usize,
    pub status_message: Option<String>,
}

impl QueueScreen {
    pub fn new(decks: DeckSet, view: ReviewQueueView, active_note: Option<NoteRef>) -> Self {
        Self {
            decks,
            view,
            active_note,
            selected: 0,
            status_message: None,
        }
    }

    pub fn redraw(&mut self, clock: &QueueClock) {
        self.view
            .redraw(&self.decks, self.active_note.as_ref(), clock);
        self.normalize_selection();
    }

    pub fn visible_rows(&self) -> Vec<&QueueRow> {
        self.view.visible_rows().map(|(_, row)| row).collect()
    }

    pub fn visible_len(&self) -> usize {
        self.view.visible_rows().count()
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let next = (self.selected as isize + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    pub fn selected_row_index(&self) -> Option<usize> {
        self.view
            .visible_rows()
            .nth(self.selected)
            .map(|(idx, _)| idx)
    }

    pub fn activate_selected(&mut self) -> Option<ViewCommand> {
        let idx = self.selected_row_index()?;
        self.view.click(idx)
    }

    pub fn context_menu_for_selected(&self) -> Option<ViewCommand> {
        let idx = self.selected_row_index()?;
        self.view.context_menu(idx)
    }

    /// Opening a note makes it the active file, which the host reports back
    /// as a file-open event.
    pub fn open_note(&mut self, note: NoteRef) -> ViewCommand {
        self.active_note = Some(note.clone());
        self.view.handle_event(&HostEvent::FileOpened(Some(note)))
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    fn normalize_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}
