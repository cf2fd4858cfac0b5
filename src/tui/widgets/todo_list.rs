use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::Frame;
use ratatui::layout::Rect;
use crate::models::Todo;
use crate::todo_list::Filter;
use crate::tui::widgets::color::Palette;

/// One display line per todo: status marker, text, and a short creation date
pub fn todo_line(todo: &Todo, max_width: usize) -> String {
    let status_indicator = if todo.completed { "✓" } else { "○" };
    let date = todo.created_at.get(..10).unwrap_or(&todo.created_at);
    let mut line = format!("{} {}", status_indicator, todo.text);
    let suffix = format!("  {}", date);

    // Drop the date first, then truncate the text
    if line.chars().count() + suffix.chars().count() <= max_width {
        line.push_str(&suffix);
    } else if line.chars().count() > max_width {
        line = line.chars().take(max_width.saturating_sub(3)).collect::<String>() + "...";
    }
    line
}

pub fn render_todo_list(
    f: &mut Frame,
    area: Rect,
    rows: &[Todo],
    filter: Filter,
    list_state: &mut ListState,
    palette: &Palette,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Todos - {}", filter.label()))
        .style(Style::default().fg(palette.fg).bg(palette.bg));

    if rows.is_empty() {
        let message = match filter {
            Filter::All => "Nothing to do. Press the add key to create a todo.",
            Filter::Active => "No active todos.",
            Filter::Completed => "No completed todos.",
        };
        let paragraph = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(palette.fg).bg(palette.bg));
        f.render_widget(paragraph, area);
        return;
    }

    // 2 for borders, 2 for padding
    let max_width = area.width.saturating_sub(4) as usize;

    let items: Vec<ListItem> = rows
        .iter()
        .map(|todo| {
            let style = if todo.completed {
                Style::default()
                    .fg(palette.completed_fg)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(palette.fg)
            };
            ListItem::new(Line::from(Span::styled(todo_line(todo, max_width), style)))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(palette.highlight_fg)
                .bg(palette.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, list_state);
}
