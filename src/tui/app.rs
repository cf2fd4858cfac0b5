use crate::{Config, Settings, TodoList};
use crate::config::Theme;
use crate::models::Todo;
use crate::store::StoreKind;
use crate::todo_list::{Filter, Outcome};
use crate::tui::widgets::editor::Editor;
use log::warn;
use ratatui::widgets::ListState;
use std::time::{Duration, Instant};

const STATUS_MESSAGE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    View,
    Add,
    Edit,
    Help,
    ConfirmClear,
}

#[derive(Debug, Clone, Default)]
pub struct StatusState {
    pub message: Option<String>,
    pub message_time: Option<Instant>,
}

pub struct App {
    pub config: Config,
    pub list: TodoList,
    pub settings: Settings,
    pub mode: Mode,
    pub selected_index: usize,
    pub list_state: ListState,
    pub input: Editor,
    pub confirm_selection: usize,
    pub status: StatusState,
}

impl App {
    pub fn new(config: Config, list: TodoList) -> Self {
        let settings = list.storage().load_settings();
        let mut app = Self {
            config,
            list,
            settings,
            mode: Mode::View,
            selected_index: 0,
            list_state: ListState::default(),
            input: Editor::new(),
            confirm_selection: 0,
            status: StatusState::default(),
        };
        if app.list.storage().active_kind() == StoreKind::Session {
            app.set_status_message("Local storage unavailable: changes last for this session only".to_string());
        }
        app.adjust_selected_index();
        app
    }

    pub fn active_theme(&self) -> Theme {
        self.config.get_theme(&self.settings.theme)
    }

    /// Todos under the current filter, in display order
    pub fn visible_todos(&self) -> Vec<Todo> {
        self.list.render().rows
    }

    pub fn selected_id(&self) -> Option<i64> {
        self.list.filtered_items().get(self.selected_index).map(|t| t.id)
    }

    /// Clamp the selection after the visible list changed
    pub fn adjust_selected_index(&mut self) {
        let len = self.list.filtered_items().len();
        if len == 0 {
            self.selected_index = 0;
            self.list_state.select(None);
        } else {
            self.selected_index = self.selected_index.min(len - 1);
            self.sync_list_state();
        }
    }

    /// Sync ListState with selected_index for proper scrolling
    pub fn sync_list_state(&mut self) {
        self.list_state.select(Some(self.selected_index));
    }

    pub fn move_selection_up(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.sync_list_state();
        }
    }

    pub fn move_selection_down(&mut self) {
        let len = self.list.filtered_items().len();
        if self.selected_index < len.saturating_sub(1) {
            self.selected_index += 1;
            self.sync_list_state();
        }
    }

    pub fn set_status_message(&mut self, message: String) {
        self.status.message = Some(message);
        self.status.message_time = Some(Instant::now());
    }

    pub fn clear_status_message(&mut self) {
        self.status.message = None;
        self.status.message_time = None;
    }

    /// Check if status message should be auto-cleared
    pub fn check_status_message_timeout(&mut self) {
        if let Some(time) = self.status.message_time {
            if time.elapsed() >= STATUS_MESSAGE_TIMEOUT {
                self.clear_status_message();
            }
        }
    }

    /// Turn an operation outcome into user feedback; failed writes are never silent
    fn report(&mut self, outcome: Outcome, done: &str) {
        match outcome {
            Outcome::Saved => self.set_status_message(done.to_string()),
            Outcome::NotSaved => {
                warn!("{} (not saved)", done);
                self.set_status_message(format!("{}, but it could not be saved", done));
            }
            Outcome::Unchanged => {}
        }
        self.adjust_selected_index();
    }

    pub fn enter_add_mode(&mut self) {
        self.input.clear();
        self.mode = Mode::Add;
    }

    pub fn submit_add(&mut self) {
        let outcome = self.list.add_item(&self.input.text());
        if outcome.changed() {
            // New todos land at the end; follow them when they are visible
            let len = self.list.filtered_items().len();
            if self.list.filter() != Filter::Completed && len > 0 {
                self.selected_index = len - 1;
            }
        }
        self.report(outcome, "Todo added");
        self.input.clear();
        self.mode = Mode::View;
    }

    pub fn cancel_input(&mut self) {
        if self.mode == Mode::Edit {
            self.list.cancel_edit();
        }
        self.input.clear();
        self.mode = Mode::View;
    }

    pub fn enter_edit_mode(&mut self) {
        let Some(id) = self.selected_id() else {
            return;
        };
        if let Some(text) = self.list.begin_edit(id) {
            self.input = Editor::from_string(&text);
            self.mode = Mode::Edit;
        }
    }

    pub fn commit_edit(&mut self) {
        let outcome = self.list.commit_edit(&self.input.text());
        self.report(outcome, "Todo updated");
        self.input.clear();
        self.mode = Mode::View;
    }

    pub fn toggle_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            let outcome = self.list.toggle_item(id);
            let done = match self.list.get(id) {
                Some(todo) if todo.completed => "Marked completed",
                _ => "Marked active",
            };
            self.report(outcome, done);
        }
    }

    pub fn delete_selected(&mut self) {
        if let Some(id) = self.selected_id() {
            let outcome = self.list.delete_item(id);
            self.report(outcome, "Todo deleted");
        }
    }

    /// Ask before clearing; nothing to clear means nothing to ask
    pub fn request_clear_completed(&mut self) {
        if self.list.completed_count() > 0 {
            self.confirm_selection = 0;
            self.mode = Mode::ConfirmClear;
        } else {
            self.set_status_message("No completed todos".to_string());
        }
    }

    pub fn confirm_clear_completed(&mut self) {
        if self.confirm_selection == 0 {
            let count = self.list.completed_count();
            let outcome = self.list.clear_completed();
            self.report(outcome, &format!("Cleared {} completed", count));
        }
        self.mode = Mode::View;
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.list.set_filter(filter);
        self.selected_index = 0;
        self.adjust_selected_index();
    }

    pub fn next_filter(&mut self) {
        self.set_filter(self.list.filter().next());
    }

    /// Cycle through the available themes and remember the choice
    pub fn toggle_theme(&mut self) {
        let themes = self.config.get_available_themes();
        let next = themes
            .iter()
            .position(|name| *name == self.settings.theme)
            .map_or(0, |i| (i + 1) % themes.len());
        if let Some(name) = themes.get(next) {
            self.settings.theme = name.clone();
        }
        if self.list.storage_mut().save_settings(&self.settings) {
            self.set_status_message(format!("Theme: {}", self.settings.theme));
        } else {
            self.set_status_message("Theme changed, but it could not be saved".to_string());
        }
    }

    pub fn enter_help_mode(&mut self) {
        self.mode = Mode::Help;
    }

    pub fn exit_help_mode(&mut self) {
        self.mode = Mode::View;
    }

    pub fn filter_counts(&self) -> [usize; 3] {
        let active = self.list.active_count();
        [self.list.todos().len(), active, self.list.completed_count()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::memory_manager;
    use crate::{MemoryStore, StorageManager};

    fn app_with(texts: &[&str]) -> App {
        let mut list = TodoList::new(memory_manager());
        for text in texts {
            let _ = list.add_item(text);
        }
        App::new(Config::default(), list)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.input.insert_char(ch);
        }
    }

    #[test]
    fn add_flow_appends_and_selects() {
        let mut app = app_with(&["first"]);
        app.enter_add_mode();
        assert_eq!(app.mode, Mode::Add);
        type_text(&mut app, "second");
        app.submit_add();

        assert_eq!(app.mode, Mode::View);
        assert_eq!(app.list.todos().len(), 2);
        assert_eq!(app.selected_index, 1);
        assert!(app.input.text().is_empty());
        assert_eq!(app.status.message.as_deref(), Some("Todo added"));
    }

    #[test]
    fn blank_add_changes_nothing() {
        let mut app = app_with(&[]);
        app.enter_add_mode();
        type_text(&mut app, "   ");
        app.submit_add();
        assert!(app.list.todos().is_empty());
        assert_eq!(app.status.message, None);
    }

    #[test]
    fn edit_commit_and_cancel() {
        let mut app = app_with(&["Buy milk"]);
        app.enter_edit_mode();
        assert_eq!(app.mode, Mode::Edit);
        assert_eq!(app.input.text(), "Buy milk");
        type_text(&mut app, " today");
        app.commit_edit();
        assert_eq!(app.list.todos()[0].text, "Buy milk today");

        app.enter_edit_mode();
        type_text(&mut app, "!!!");
        app.cancel_input();
        assert_eq!(app.list.todos()[0].text, "Buy milk today");
        assert_eq!(app.list.editing(), None);
    }

    #[test]
    fn toggling_under_active_filter_moves_selection() {
        let mut app = app_with(&["a", "b"]);
        app.set_filter(Filter::Active);
        app.move_selection_down();
        app.toggle_selected();
        assert_eq!(app.visible_todos().len(), 1);
        assert_eq!(app.selected_index, 0);
        assert_eq!(app.selected_id(), Some(app.list.todos()[0].id));
    }

    #[test]
    fn clear_completed_needs_confirmation() {
        let mut app = app_with(&["a", "b"]);
        app.toggle_selected();
        app.request_clear_completed();
        assert_eq!(app.mode, Mode::ConfirmClear);

        app.confirm_selection = 1;
        app.confirm_clear_completed();
        assert_eq!(app.list.todos().len(), 2);

        app.request_clear_completed();
        app.confirm_clear_completed();
        assert_eq!(app.list.todos().len(), 1);
        assert_eq!(app.mode, Mode::View);

        app.request_clear_completed();
        assert_eq!(app.mode, Mode::View);
    }

    #[test]
    fn theme_toggle_is_saved_in_settings() {
        let mut app = app_with(&[]);
        assert_eq!(app.settings.theme, "light");
        app.toggle_theme();
        assert_eq!(app.settings.theme, "dark");
        assert_eq!(app.list.storage().load_settings().theme, "dark");
        assert_eq!(app.active_theme().bg, "black");
    }

    #[test]
    fn session_fallback_is_announced() {
        let list = TodoList::new(StorageManager::session_only("t"));
        let app = App::new(Config::default(), list);
        assert!(app.status.message.as_deref().unwrap().contains("session only"));

        let list = TodoList::new(StorageManager::new(
            "t",
            Box::new(crate::SqliteStore::in_memory().unwrap()),
            Box::new(MemoryStore::new()),
        ));
        let app = App::new(Config::default(), list);
        assert_eq!(app.status.message, None);
    }
}
