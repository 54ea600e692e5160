use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::state::QueueScreen;
use crate::view::{QueueRow, RowKind};

pub fn draw_queue(frame: &mut Frame, state: &QueueScreen, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(frame.size());

    let width = vertical[0].width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = state
        .visible_rows()
        .into_iter()
        .map(|row| ListItem::new(row_line(row, width)))
        .collect();

    let title = format!(
        "Notes Review Queue ({} due, next {} days)",
        state.decks.total_due(),
        state.view.lookahead_days()
    );
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(list, vertical[0], list_state);

    let status = Paragraph::new(build_status_line(state))
        .block(Block::default().borders(Borders::TOP))
        .wrap(Wrap { trim: true });
    frame.render_widget(status, vertical[1]);
}

fn row_line(row: &QueueRow, width: usize) -> Line<'static> {
    let indent = "  ".repeat(row.depth);
    let (prefix, base) = match row.kind {
        RowKind::Deck => (
            if row.collapsed { "▸ " } else { "▾ " },
            Style::default().add_modifier(Modifier::BOLD),
        ),
        RowKind::Bucket => (
            if row.collapsed { "▸ " } else { "▾ " },
            Style::default().fg(Color::Gray),
        ),
        RowKind::Note(_) => ("", Style::default()),
    };
    let style = if row.active {
        base.fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        base
    };
    let budget = width.saturating_sub(indent.width() + prefix.width());
    Line::from(vec![
        Span::raw(indent),
        Span::styled(prefix, Style::default().fg(Color::DarkGray)),
        Span::styled(truncate_to_width(&row.title, budget), style),
    ])
}

fn build_status_line(state: &QueueScreen) -> Text<'static> {
    let mut spans = vec![Span::styled(
        "Keys: ",
        Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::BOLD),
    )];
    spans.push(Span::styled(
        "j/k move • Enter open/toggle • m file menu • Ctrl-r refresh • q quit",
        Style::default().fg(Color::DarkGray),
    ));
    if let Some(deck) = state.view.last_selected_deck() {
        spans.push(Span::raw(" | Deck: "));
        spans.push(Span::styled(
            deck.to_string(),
            Style::default().fg(Color::Yellow),
        ));
    }
    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }
    Text::from(Line::from(spans))
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}
