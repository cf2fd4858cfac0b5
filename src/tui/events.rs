use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, size as terminal_size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::io;
use std::time::Duration;
use crate::todo_list::Filter;
use crate::tui::{App, Layout, Mode};
use crate::tui::error::TuiError;
use crate::tui::widgets::confirm_clear::CONFIRM_OPTIONS;
use crate::utils::{ParsedKeyBinding, has_primary_modifier, parse_key_binding};

/// Guard that ensures terminal state is restored even on panic.
/// If the terminal is left in raw mode or on the alternate screen, the user's shell is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore terminal state on normal exit; the guard does nothing on drop afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Already in a cleanup path, errors are ignored
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

/// Every configurable binding, parsed once at startup
pub struct Bindings {
    pub quit: ParsedKeyBinding,
    pub add: ParsedKeyBinding,
    pub edit: ParsedKeyBinding,
    pub delete: ParsedKeyBinding,
    pub toggle: ParsedKeyBinding,
    pub clear_completed: ParsedKeyBinding,
    pub filter_all: ParsedKeyBinding,
    pub filter_active: ParsedKeyBinding,
    pub filter_completed: ParsedKeyBinding,
    pub next_filter: ParsedKeyBinding,
    pub list_up: ParsedKeyBinding,
    pub list_down: ParsedKeyBinding,
    pub toggle_theme: ParsedKeyBinding,
    pub help: ParsedKeyBinding,
}

impl Bindings {
    pub fn from_config(config: &crate::Config) -> Result<Self, TuiError> {
        let kb = &config.key_bindings;
        let parse = |action: &str, value: &str| {
            parse_key_binding(value).map_err(|reason| TuiError::KeyBindingError {
                action: action.to_string(),
                reason,
            })
        };
        Ok(Self {
            quit: parse("quit", &kb.quit)?,
            add: parse("add", &kb.add)?,
            edit: parse("edit", &kb.edit)?,
            delete: parse("delete", &kb.delete)?,
            toggle: parse("toggle", &kb.toggle)?,
            clear_completed: parse("clear_completed", &kb.clear_completed)?,
            filter_all: parse("filter_all", &kb.filter_all)?,
            filter_active: parse("filter_active", &kb.filter_active)?,
            filter_completed: parse("filter_completed", &kb.filter_completed)?,
            next_filter: parse("next_filter", &kb.next_filter)?,
            list_up: parse("list_up", &kb.list_up)?,
            list_down: parse("list_down", &kb.list_down)?,
            toggle_theme: parse("toggle_theme", &kb.toggle_theme)?,
            help: parse("help", &kb.help)?,
        })
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    let bindings = Bindings::from_config(&app.config)?;

    // Check terminal size before entering alternate screen so the error shows in the normal terminal
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::TerminalTooSmall {
            width,
            height,
            min_width,
            min_height,
        });
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    loop {
        app.check_status_message_timeout();

        let size = terminal.size()?;
        let layout = Layout::calculate(Rect::new(0, 0, size.width, size.height));
        terminal.draw(|f| crate::tui::render::render(f, &mut app, &layout))?;

        // Only process Press events to avoid duplicate processing on Windows
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, &bindings, key_event) {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    Ok(())
}

/// Returns true when the user asked to quit
pub fn handle_key_event(app: &mut App, bindings: &Bindings, key_event: KeyEvent) -> bool {
    match app.mode {
        Mode::Add | Mode::Edit => {
            handle_input_mode(app, key_event);
            false
        }
        Mode::Help => {
            if key_event.code == KeyCode::Esc || matches_key_event(key_event, &bindings.help) {
                app.exit_help_mode();
            }
            false
        }
        Mode::ConfirmClear => {
            handle_confirm_clear(app, key_event);
            false
        }
        Mode::View => handle_view_mode(app, bindings, key_event),
    }
}

fn handle_view_mode(app: &mut App, bindings: &Bindings, key_event: KeyEvent) -> bool {
    let matches = |binding: &ParsedKeyBinding| matches_key_event(key_event, binding);

    if matches(&bindings.quit) {
        return true;
    }
    if matches(&bindings.add) {
        app.enter_add_mode();
    } else if matches(&bindings.edit) || key_event.code == KeyCode::Enter {
        app.enter_edit_mode();
    } else if matches(&bindings.toggle) {
        app.toggle_selected();
    } else if matches(&bindings.delete) || key_event.code == KeyCode::Delete {
        app.delete_selected();
    } else if matches(&bindings.clear_completed) {
        app.request_clear_completed();
    } else if matches(&bindings.filter_all) {
        app.set_filter(Filter::All);
    } else if matches(&bindings.filter_active) {
        app.set_filter(Filter::Active);
    } else if matches(&bindings.filter_completed) {
        app.set_filter(Filter::Completed);
    } else if matches(&bindings.next_filter) {
        app.next_filter();
    } else if matches(&bindings.list_up) || key_event.code == KeyCode::Up {
        app.move_selection_up();
    } else if matches(&bindings.list_down) || key_event.code == KeyCode::Down {
        app.move_selection_down();
    } else if matches(&bindings.toggle_theme) {
        app.toggle_theme();
    } else if matches(&bindings.help) {
        app.enter_help_mode();
    }
    false
}

fn handle_input_mode(app: &mut App, key_event: KeyEvent) {
    let word_jump = has_primary_modifier(key_event.modifiers);
    match key_event.code {
        KeyCode::Enter => match app.mode {
            Mode::Edit => app.commit_edit(),
            _ => app.submit_add(),
        },
        KeyCode::Esc => app.cancel_input(),
        // Leaving the row while editing commits, like losing focus
        KeyCode::Up | KeyCode::Down if app.mode == Mode::Edit => {
            let up = key_event.code == KeyCode::Up;
            app.commit_edit();
            if up {
                app.move_selection_up();
            } else {
                app.move_selection_down();
            }
        }
        KeyCode::Backspace => app.input.delete_char(),
        KeyCode::Delete => app.input.delete_char_forward(),
        KeyCode::Left if word_jump => app.input.move_cursor_word_left(),
        KeyCode::Right if word_jump => app.input.move_cursor_word_right(),
        KeyCode::Left => app.input.move_cursor_left(),
        KeyCode::Right => app.input.move_cursor_right(),
        KeyCode::Home => app.input.move_cursor_home(),
        KeyCode::End => app.input.move_cursor_end(),
        KeyCode::Char(ch) if !word_jump => app.input.insert_char(ch),
        _ => {}
    }
}

fn handle_confirm_clear(app: &mut App, key_event: KeyEvent) {
    let last = CONFIRM_OPTIONS.len() - 1;
    match key_event.code {
        KeyCode::Up => {
            app.confirm_selection = if app.confirm_selection == 0 { last } else { app.confirm_selection - 1 };
        }
        KeyCode::Down | KeyCode::Tab => {
            app.confirm_selection = if app.confirm_selection == last { 0 } else { app.confirm_selection + 1 };
        }
        KeyCode::Enter => app.confirm_clear_completed(),
        KeyCode::Esc => app.mode = Mode::View,
        _ => {}
    }
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    // Ctrl on Windows/Linux, Option/Alt on macOS
    if binding.requires_ctrl != has_primary_modifier(key_event.modifiers) {
        return false;
    }
    binding.key_code == key_event.code
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::memory_manager;
    use crate::{Config, TodoList};
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn setup() -> (App, Bindings) {
        let config = Config::default();
        let bindings = Bindings::from_config(&config).unwrap();
        (App::new(config, TodoList::new(memory_manager())), bindings)
    }

    fn press_all(app: &mut App, bindings: &Bindings, codes: &[KeyCode]) {
        for code in codes {
            assert!(!handle_key_event(app, bindings, key(*code)));
        }
    }

    fn type_keys(text: &str) -> Vec<KeyCode> {
        text.chars().map(KeyCode::Char).collect()
    }

    #[test]
    fn add_toggle_and_filter_through_keys() {
        let (mut app, bindings) = setup();
        let mut keys = vec![KeyCode::Char('a')];
        keys.extend(type_keys("Buy milk"));
        keys.push(KeyCode::Enter);
        keys.push(KeyCode::Char('a'));
        keys.extend(type_keys("Walk dog"));
        keys.push(KeyCode::Enter);
        press_all(&mut app, &bindings, &keys);
        assert_eq!(app.list.todos().len(), 2);

        // Select "Buy milk" and toggle it
        press_all(&mut app, &bindings, &[KeyCode::Char('k'), KeyCode::Char(' ')]);
        assert!(app.list.todos()[0].completed);

        press_all(&mut app, &bindings, &[KeyCode::Char('2')]);
        let texts: Vec<_> = app.visible_todos().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["Walk dog"]);

        press_all(&mut app, &bindings, &[KeyCode::Tab]);
        assert_eq!(app.list.filter(), Filter::Completed);
    }

    #[test]
    fn escape_discards_inline_edit() {
        let (mut app, bindings) = setup();
        let _ = app.list.add_item("Buy milk");
        app.adjust_selected_index();

        let mut keys = vec![KeyCode::Char('e'), KeyCode::Backspace];
        keys.extend(type_keys("X"));
        keys.push(KeyCode::Esc);
        press_all(&mut app, &bindings, &keys);
        assert_eq!(app.list.todos()[0].text, "Buy milk");
        assert_eq!(app.mode, Mode::View);

        press_all(&mut app, &bindings, &[KeyCode::Char('e'), KeyCode::Backspace, KeyCode::Enter]);
        assert_eq!(app.list.todos()[0].text, "Buy mil");
    }

    #[test]
    fn typing_bound_keys_in_input_inserts_text() {
        let (mut app, bindings) = setup();
        let mut keys = vec![KeyCode::Char('a')];
        keys.extend(type_keys("quit"));
        press_all(&mut app, &bindings, &keys);
        assert_eq!(app.input.text(), "quit");
        assert_eq!(app.mode, Mode::Add);
    }

    #[test]
    fn quit_key_stops_the_loop() {
        let (mut app, bindings) = setup();
        assert!(handle_key_event(&mut app, &bindings, key(KeyCode::Char('q'))));
    }

    #[test]
    fn bad_binding_is_reported() {
        let mut config = Config::default();
        config.key_bindings.delete = "Hyper+x".into();
        assert!(matches!(
            Bindings::from_config(&config),
            Err(TuiError::KeyBindingError { ref action, .. }) if action == "delete"
        ));
    }
}
