use ratatui::widgets::{Block, Borders, Paragraph, Clear};
use ratatui::style::Style;
use ratatui::Frame;
use ratatui::layout::{Rect, Alignment};
use crate::Config;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as key;

pub fn render_help(f: &mut Frame, area: Rect, config: &Config, palette: &Palette) {
    let popup_area = popup_area(area, 60, 70);

    // Clear the background first so the list doesn't show through
    f.render_widget(Clear, popup_area);

    let paragraph = Paragraph::new(build_help_text(config))
        .block(Block::default()
            .borders(Borders::ALL)
            .title("Help - Key Bindings")
            .title_alignment(Alignment::Center)
            .style(Style::default().fg(palette.fg).bg(palette.bg)))
        .style(Style::default().fg(palette.fg).bg(palette.bg))
        .wrap(ratatui::widgets::Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
}

pub fn build_help_text(config: &Config) -> String {
    let kb = &config.key_bindings;
    let mut text = String::new();

    text.push_str("Navigation:\n");
    text.push_str(&format!("  {} / {}: Move up/down\n", key(&kb.list_up), key(&kb.list_down)));
    text.push_str(&format!("  {} / {} / {}: Show all / active / completed\n",
        key(&kb.filter_all), key(&kb.filter_active), key(&kb.filter_completed)));
    text.push_str(&format!("  {}: Next filter\n", key(&kb.next_filter)));
    text.push('\n');

    text.push_str("Actions:\n");
    text.push_str(&format!("  {}: Add todo\n", key(&kb.add)));
    text.push_str(&format!("  {}: Edit selected todo\n", key(&kb.edit)));
    text.push_str(&format!("  {}: Toggle completed\n", key(&kb.toggle)));
    text.push_str(&format!("  {}: Delete selected todo\n", key(&kb.delete)));
    text.push_str(&format!("  {}: Clear completed todos\n", key(&kb.clear_completed)));
    text.push('\n');

    text.push_str("Input line:\n");
    text.push_str("  Enter: Save\n");
    text.push_str("  Esc: Cancel\n");
    text.push_str("  Up/Down while editing: Save and move\n");
    text.push('\n');

    text.push_str("General:\n");
    text.push_str(&format!("  {}: Next theme\n", key(&kb.toggle_theme)));
    text.push_str(&format!("  {}: Show/hide help\n", key(&kb.help)));
    text.push_str(&format!("  {}: Quit\n", key(&kb.quit)));

    text
}
