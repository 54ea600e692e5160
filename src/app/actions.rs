use crate::app::state::QueueScreen;
use crate::queue::QueueClock;
use crate::view::ViewCommand;

/// Carries out a request raised by the review pane.
pub fn apply(state: &mut QueueScreen, command: ViewCommand, clock: &QueueClock) {
    match command {
        ViewCommand::Redraw => state.redraw(clock),
        ViewCommand::OpenNote { note, deck } => {
            tracing::info!(%note, %deck, "opening note for review");
            state.set_status_message(Some(format!("Opened {}", note.basename())));
            let follow_up = state.open_note(note);
            apply(state, follow_up, clock);
        }
        ViewCommand::ShowFileMenu { note } => {
            state.set_status_message(Some(format!("File menu: {}", note.path())));
        }
    }
}
