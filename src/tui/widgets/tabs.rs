use ratatui::widgets::Tabs;
use ratatui::style::{Style, Modifier};
use ratatui::text::{Line, Span};
use ratatui::Frame;
use ratatui::layout::Rect;
use crate::todo_list::Filter;
use crate::tui::widgets::color::{Palette, get_contrast_text_color};

/// Filter selector: All / Active / Completed, each with its item count
pub fn render_filter_tabs(f: &mut Frame, area: Rect, current: Filter, counts: [usize; 3], palette: &Palette) {
    let tab_fg = get_contrast_text_color(palette.tab_bg);

    // Each tab is padded with tab_bg so it reads as a box
    let titles: Vec<Line> = Filter::ALL
        .iter()
        .zip(counts)
        .map(|(filter, count)| {
            Line::from(vec![
                Span::styled("  ", Style::default().bg(palette.tab_bg)),
                Span::styled(
                    format!("{} ({})", filter.label(), count),
                    Style::default().fg(tab_fg).bg(palette.tab_bg),
                ),
                Span::styled("  ", Style::default().bg(palette.tab_bg)),
            ])
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(current.index())
        .style(Style::default().fg(palette.fg).bg(palette.bg))
        .highlight_style(
            Style::default()
                .fg(palette.highlight_fg)
                .bg(palette.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .divider("  ")
        .padding("", "");

    f.render_widget(tabs, area);
}
