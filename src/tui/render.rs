use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::style::Style;
use crate::tui::{App, Layout, Mode};
use crate::tui::widgets::{
    color::Palette,
    confirm_clear::render_confirm_clear,
    editor::render_editor,
    help::render_help,
    status_bar::{render_footer, render_status_bar},
    tabs::render_filter_tabs,
    todo_list::render_todo_list,
};
use crate::utils::format_key_binding_for_display;

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let palette = Palette::from_theme(&app.active_theme());

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("Todos")
        .title_alignment(Alignment::Center)
        .style(Style::default().fg(palette.fg).bg(palette.bg));
    f.render_widget(outer_block, f.area());

    render_filter_tabs(f, layout.tabs_area, app.list.filter(), app.filter_counts(), &palette);

    let rows = app.visible_todos();
    render_todo_list(f, layout.list_area, &rows, app.list.filter(), &mut app.list_state, &palette);

    match app.mode {
        Mode::Add => render_editor(f, layout.input_area, &mut app.input, "New todo (Enter to add, Esc to cancel)", &palette),
        Mode::Edit => render_editor(f, layout.input_area, &mut app.input, "Edit todo (Enter to save, Esc to cancel)", &palette),
        _ => {
            let hint = format!(
                "What needs to be done? Press {} to add",
                format_key_binding_for_display(&app.config.key_bindings.add)
            );
            let idle = Paragraph::new(hint)
                .block(Block::default().borders(Borders::ALL))
                .style(Style::default().fg(palette.completed_fg).bg(palette.bg));
            f.render_widget(idle, layout.input_area);
        }
    }

    let clear_key = format_key_binding_for_display(&app.config.key_bindings.clear_completed);
    render_footer(f, layout.footer_area, &app.list.footer(), &clear_key, &palette);

    let hints = key_hints(app);
    render_status_bar(f, layout.status_area, app.status.message.as_ref(), &hints, &palette);

    match app.mode {
        Mode::Help => render_help(f, layout.inner_area, &app.config, &palette),
        Mode::ConfirmClear => render_confirm_clear(
            f,
            layout.inner_area,
            app.list.completed_count(),
            app.confirm_selection,
            &palette,
        ),
        _ => {}
    }
}

/// Hints for the status line, tailored to the current mode
pub fn key_hints(app: &App) -> Vec<String> {
    let kb = &app.config.key_bindings;
    let key = format_key_binding_for_display;
    match app.mode {
        Mode::Add | Mode::Edit => vec![
            "Enter: Save".to_string(),
            "Esc: Cancel".to_string(),
            "Ctrl+Left/Right: Word".to_string(),
        ],
        Mode::Help => vec![format!("Esc/{}: Close", key(&kb.help))],
        Mode::ConfirmClear => vec![
            "Up/Down: Select".to_string(),
            "Enter: Confirm".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::View => vec![
            format!("{}: Add", key(&kb.add)),
            format!("{}: Toggle", key(&kb.toggle)),
            format!("{}: Edit", key(&kb.edit)),
            format!("{}: Delete", key(&kb.delete)),
            format!("{}: Filter", key(&kb.next_filter)),
            format!("{}: Theme", key(&kb.toggle_theme)),
            format!("{}: Help", key(&kb.help)),
            format!("{}: Quit", key(&kb.quit)),
        ],
    }
}
