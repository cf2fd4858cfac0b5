use ratatui::widgets::{Block, Borders, Paragraph, Clear};
use ratatui::style::Style;
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment};
use ratatui::text::{Line, Span};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::popup_area;

pub const CONFIRM_OPTIONS: [&str; 2] = ["Clear", "Cancel"];

pub fn render_confirm_clear(f: &mut Frame, area: Rect, completed: usize, selection: usize, palette: &Palette) {
    let popup_area = popup_area(area, 50, 35);
    f.render_widget(Clear, popup_area);

    let base = Style::default().fg(palette.fg).bg(palette.bg);
    let noun = if completed == 1 { "todo" } else { "todos" };

    let mut lines = vec![
        Line::from(Span::styled(format!("Remove {} completed {}?", completed, noun), base)),
        Line::from(""),
    ];

    for (index, option) in CONFIRM_OPTIONS.iter().enumerate() {
        let (prefix, style) = if index == selection {
            ("> ", Style::default().fg(palette.highlight_fg).bg(palette.highlight_bg))
        } else {
            ("  ", base)
        };
        lines.push(Line::from(Span::styled(format!("{}{}", prefix, option), style)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Use ↑↓ to choose, Enter to confirm, Esc to cancel", base)));

    let paragraph = Paragraph::new(lines)
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Clear Completed")
            .title_alignment(Alignment::Center)
            .style(base))
        .style(base)
        .wrap(ratatui::widgets::Wrap { trim: true })
        .alignment(Alignment::Center);

    f.render_widget(paragraph, popup_area);
}
