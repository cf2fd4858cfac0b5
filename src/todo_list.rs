use log::{debug, info, warn};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::models::{Todo, escape_markup, now_millis};
use crate::storage::{StorageManager, TODOS_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub const ALL: [Filter; 3] = [Filter::All, Filter::Active, Filter::Completed];

    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Filter::All => true,
            Filter::Active => !todo.completed,
            Filter::Completed => todo.completed,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Filter::All => "All",
            Filter::Active => "Active",
            Filter::Completed => "Completed",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Filter::All => Filter::Active,
            Filter::Active => Filter::Completed,
            Filter::Completed => Filter::All,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Filter::All => 0,
            Filter::Active => 1,
            Filter::Completed => 2,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Filter::All => "all",
            Filter::Active => "active",
            Filter::Completed => "completed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
#[error("unknown filter '{0}' (expected all, active or completed)")]
pub struct ParseFilterError(String);

impl FromStr for Filter {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Filter::All),
            "active" => Ok(Filter::Active),
            "completed" => Ok(Filter::Completed),
            other => Err(ParseFilterError(other.to_string())),
        }
    }
}

/// Result of a mutating operation
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Rejected input or unknown id; nothing changed
    Unchanged,
    /// Changed and written to storage
    Saved,
    /// Changed in memory, but the write failed
    NotSaved,
}

impl Outcome {
    pub fn changed(self) -> bool {
        self != Outcome::Unchanged
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    pub active_count: usize,
    pub label: String,
    pub show_clear_completed: bool,
    pub visible: bool,
}

impl Footer {
    pub fn to_markup(&self) -> String {
        let hidden = if self.visible { "" } else { " hidden" };
        let clear = if self.show_clear_completed {
            "<button class=\"clear-completed\">Clear completed</button>"
        } else {
            ""
        };
        format!(
            "<footer class=\"footer\"{}><span class=\"todo-count\">{}</span>{}</footer>",
            hidden,
            escape_markup(&self.label),
            clear
        )
    }
}

/// Snapshot of what the UI should display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListView {
    pub filter: Filter,
    pub rows: Vec<Todo>,
    pub footer: Footer,
}

impl ListView {
    pub fn to_markup(&self) -> String {
        let mut markup = String::from("<ul class=\"todo-list\">");
        for row in &self.rows {
            markup.push_str(&row.render());
        }
        markup.push_str("</ul>");
        markup.push_str(&self.footer.to_markup());
        markup
    }
}

pub fn items_left_label(count: usize) -> String {
    if count == 1 {
        "1 item left".to_string()
    } else {
        format!("{} items left", count)
    }
}

/// Owns the todo collection, the active filter and any in-progress edit.
///
/// Mutations run validate, mutate, persist; callers repaint from
/// [`TodoList::render`] afterwards.
pub struct TodoList {
    todos: Vec<Todo>,
    filter: Filter,
    editing: Option<i64>,
    storage: StorageManager,
}

impl TodoList {
    pub fn new(storage: StorageManager) -> Self {
        let mut list = Self {
            todos: Vec::new(),
            filter: Filter::All,
            editing: None,
            storage,
        };
        list.reload();
        list
    }

    /// Replace the in-memory collection with what storage holds.
    ///
    /// Stored data that needed repair (a missing `createdAt`, duplicate ids) is
    /// written back once so the repaired values stay stable across reloads.
    pub fn reload(&mut self) {
        let raw: Option<serde_json::Value> = self.storage.load(TODOS_KEY);
        let backfilled = raw
            .as_ref()
            .and_then(|v| v.as_array())
            .is_some_and(|items| items.iter().any(|t| t.get("createdAt").is_none()));
        let loaded: Vec<Todo> = match raw.map(serde_json::from_value) {
            Some(Ok(todos)) => todos,
            Some(Err(e)) => {
                warn!("ignoring stored todos that do not decode: {}", e);
                Vec::new()
            }
            None => Vec::new(),
        };

        let mut seen = HashSet::new();
        let total = loaded.len();
        self.todos = loaded.into_iter().filter(|t| seen.insert(t.id)).collect();
        let deduped = self.todos.len() != total;
        if deduped {
            warn!(
                "dropped {} todos with duplicate ids while loading",
                total - self.todos.len()
            );
        }
        self.editing = None;
        info!("loaded {} todos from {}", self.todos.len(), self.storage.active_kind());

        if (backfilled || deduped) && self.persist() == Outcome::NotSaved {
            warn!("repaired todos could not be written back");
        }
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: i64) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut StorageManager {
        &mut self.storage
    }

    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.todos.len() - self.active_count()
    }

    pub fn filtered_items(&self) -> Vec<&Todo> {
        self.todos.iter().filter(|t| self.filter.matches(t)).collect()
    }

    fn persist(&mut self) -> Outcome {
        if self.storage.save(TODOS_KEY, &self.todos) {
            Outcome::Saved
        } else {
            Outcome::NotSaved
        }
    }

    /// Unique id: the current time, or one past the newest id. When the newest
    /// id is `i64::MAX`, the lowest free id counting down from now.
    fn next_id(&self) -> i64 {
        let now = now_millis();
        let newest = self.todos.iter().map(|t| t.id).max().unwrap_or(i64::MIN);
        match newest.checked_add(1) {
            Some(next) => now.max(next),
            None => {
                let taken: HashSet<i64> = self.todos.iter().map(|t| t.id).collect();
                (i64::MIN..=now)
                    .rev()
                    .find(|id| !taken.contains(id))
                    .unwrap_or(i64::MIN)
            }
        }
    }

    pub fn add_item(&mut self, text: &str) -> Outcome {
        let text = text.trim();
        if text.is_empty() {
            return Outcome::Unchanged;
        }
        let todo = Todo::from_parts(text, false, Some(self.next_id()), None);
        debug!("adding todo {}", todo.id);
        self.todos.push(todo);
        self.persist()
    }

    pub fn toggle_item(&mut self, id: i64) -> Outcome {
        match self.todos.iter_mut().find(|t| t.id == id) {
            Some(todo) => {
                todo.toggle();
                debug!("toggled todo {} -> completed={}", id, todo.completed);
                self.persist()
            }
            None => Outcome::Unchanged,
        }
    }

    pub fn delete_item(&mut self, id: i64) -> Outcome {
        let before = self.todos.len();
        self.todos.retain(|t| t.id != id);
        if self.todos.len() == before {
            return Outcome::Unchanged;
        }
        if self.editing == Some(id) {
            self.editing = None;
        }
        debug!("deleted todo {}", id);
        self.persist()
    }

    /// Start editing `id`, returning its current text
    pub fn begin_edit(&mut self, id: i64) -> Option<String> {
        let text = self.get(id)?.text.clone();
        self.editing = Some(id);
        Some(text)
    }

    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    /// Finish the open edit with `text`; blank or unchanged text is discarded
    pub fn commit_edit(&mut self, text: &str) -> Outcome {
        let Some(id) = self.editing.take() else {
            return Outcome::Unchanged;
        };
        let text = text.trim();
        if text.is_empty() {
            return Outcome::Unchanged;
        }
        match self.todos.iter_mut().find(|t| t.id == id) {
            Some(todo) if todo.text != text => {
                todo.text = text.to_string();
                debug!("edited todo {}", id);
                self.persist()
            }
            _ => Outcome::Unchanged,
        }
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    pub fn edit_item(&mut self, id: i64, text: &str) -> Outcome {
        if self.begin_edit(id).is_none() {
            return Outcome::Unchanged;
        }
        self.commit_edit(text)
    }

    /// Remove every completed todo with a single write
    pub fn clear_completed(&mut self) -> Outcome {
        let before = self.todos.len();
        self.todos.retain(|t| !t.completed);
        let removed = before - self.todos.len();
        if removed == 0 {
            return Outcome::Unchanged;
        }
        if let Some(id) = self.editing {
            if self.get(id).is_none() {
                self.editing = None;
            }
        }
        debug!("cleared {} completed todos", removed);
        self.persist()
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    pub fn footer(&self) -> Footer {
        let active_count = self.active_count();
        Footer {
            active_count,
            label: items_left_label(active_count),
            show_clear_completed: self.completed_count() > 0,
            visible: !self.todos.is_empty(),
        }
    }

    pub fn render(&self) -> ListView {
        ListView {
            filter: self.filter,
            rows: self.filtered_items().into_iter().cloned().collect(),
            footer: self.footer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::testing::{counting_manager, memory_manager};
    use crate::store::MemoryStore;
    use crate::storage::DEFAULT_NAMESPACE;

    fn ids(todos: &[&Todo]) -> HashSet<i64> {
        todos.iter().map(|t| t.id).collect()
    }

    fn id_of(list: &TodoList, text: &str) -> i64 {
        list.todos().iter().find(|t| t.text == text).unwrap().id
    }

    #[test]
    fn added_items_get_distinct_ids() {
        let mut list = TodoList::new(memory_manager());
        for i in 0..50 {
            assert_eq!(list.add_item(&format!("task {}", i)), Outcome::Saved);
        }
        let unique: HashSet<i64> = list.todos().iter().map(|t| t.id).collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn ids_stay_unique_after_the_largest_id() {
        let mut storage = memory_manager();
        let stored = vec![Todo::from_parts("last", false, Some(i64::MAX), None)];
        assert!(storage.save(TODOS_KEY, &stored));

        let mut list = TodoList::new(storage);
        let _ = list.add_item("a");
        let _ = list.add_item("b");
        let unique: HashSet<i64> = list.todos().iter().map(|t| t.id).collect();
        assert_eq!(unique.len(), 3);

        let a = id_of(&list, "a");
        assert_eq!(list.delete_item(a), Outcome::Saved);
        let texts: Vec<_> = list.todos().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["last", "b"]);
    }

    #[test]
    fn backfilled_created_at_is_written_back() {
        let mut storage = memory_manager();
        let stored = serde_json::json!([{"id": 1, "text": "old", "completed": false}]);
        assert!(storage.save(TODOS_KEY, &stored));

        let mut list = TodoList::new(storage);
        let stamped = list.todos()[0].created_at.clone();
        let raw: serde_json::Value = list.storage().load(TODOS_KEY).unwrap();
        assert_eq!(raw[0]["createdAt"].as_str(), Some(stamped.as_str()));

        list.reload();
        assert_eq!(list.todos()[0].created_at, stamped);
    }

    #[test]
    fn blank_text_is_ignored() {
        let mut list = TodoList::new(memory_manager());
        assert_eq!(list.add_item(""), Outcome::Unchanged);
        assert_eq!(list.add_item("   "), Outcome::Unchanged);
        assert_eq!(list.add_item("\t\n"), Outcome::Unchanged);
        assert!(list.todos().is_empty());
    }

    #[test]
    fn add_trims_text() {
        let mut list = TodoList::new(memory_manager());
        let _ = list.add_item("  Buy milk  ");
        assert_eq!(list.todos()[0].text, "Buy milk");
    }

    #[test]
    fn single_item_footer() {
        let mut list = TodoList::new(memory_manager());
        let _ = list.add_item("Buy milk");
        let view = list.render();
        assert_eq!(view.rows.len(), 1);
        assert!(!view.rows[0].completed);
        assert_eq!(view.footer.label, "1 item left");
        assert!(view.footer.visible);
        assert!(!view.footer.show_clear_completed);
    }

    #[test]
    fn footer_hidden_when_empty() {
        let list = TodoList::new(memory_manager());
        let footer = list.footer();
        assert!(!footer.visible);
        assert_eq!(footer.label, "0 items left");
    }

    #[test]
    fn filters_partition_the_collection() {
        let mut list = TodoList::new(memory_manager());
        let _ = list.add_item("Buy milk");
        let _ = list.add_item("Walk dog");
        let _ = list.add_item("Read book");
        let _ = list.toggle_item(id_of(&list, "Buy milk"));
        let _ = list.toggle_item(id_of(&list, "Read book"));

        list.set_filter(Filter::All);
        let all = ids(&list.filtered_items());
        list.set_filter(Filter::Active);
        let active = ids(&list.filtered_items());
        list.set_filter(Filter::Completed);
        let completed = ids(&list.filtered_items());

        assert!(active.is_disjoint(&completed));
        let union: HashSet<i64> = active.union(&completed).copied().collect();
        assert_eq!(union, all);
        assert_eq!(list.todos().len(), 3);
    }

    #[test]
    fn filter_views_after_toggle() {
        let mut list = TodoList::new(memory_manager());
        let _ = list.add_item("Buy milk");
        let _ = list.add_item("Walk dog");
        let _ = list.toggle_item(id_of(&list, "Buy milk"));

        list.set_filter(Filter::Active);
        let texts: Vec<_> = list.render().rows.into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["Walk dog"]);

        list.set_filter(Filter::Completed);
        let texts: Vec<_> = list.render().rows.into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["Buy milk"]);

        list.set_filter(Filter::All);
        assert_eq!(list.render().rows.len(), 2);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let (storage, writes) = counting_manager();
        let mut list = TodoList::new(storage);
        let _ = list.add_item("one");
        let writes_before = writes.get();

        assert_eq!(list.toggle_item(-1), Outcome::Unchanged);
        assert_eq!(list.delete_item(-1), Outcome::Unchanged);
        assert_eq!(list.edit_item(-1, "x"), Outcome::Unchanged);
        assert_eq!(list.begin_edit(-1), None);
        assert_eq!(list.todos().len(), 1);
        assert_eq!(writes.get(), writes_before);
    }

    #[test]
    fn delete_removes_only_the_match() {
        let mut list = TodoList::new(memory_manager());
        let _ = list.add_item("a");
        let _ = list.add_item("b");
        let id = id_of(&list, "a");
        assert_eq!(list.delete_item(id), Outcome::Saved);
        assert_eq!(list.todos().len(), 1);
        assert_eq!(list.todos()[0].text, "b");
    }

    #[test]
    fn clear_completed_is_one_write() {
        let (storage, writes) = counting_manager();
        let mut list = TodoList::new(storage);
        for text in ["a", "b", "c", "d"] {
            let _ = list.add_item(text);
        }
        for text in ["a", "c", "d"] {
            let _ = list.toggle_item(id_of(&list, text));
        }
        let before = writes.get();

        assert_eq!(list.clear_completed(), Outcome::Saved);
        assert_eq!(writes.get(), before + 1);
        assert_eq!(list.todos().len(), 1);
        assert_eq!(list.todos()[0].text, "b");

        assert_eq!(list.clear_completed(), Outcome::Unchanged);
        assert_eq!(writes.get(), before + 1);
    }

    #[test]
    fn edit_commit_updates_text() {
        let mut list = TodoList::new(memory_manager());
        let _ = list.add_item("Buy milk");
        let id = id_of(&list, "Buy milk");

        assert_eq!(list.begin_edit(id).as_deref(), Some("Buy milk"));
        assert_eq!(list.editing(), Some(id));
        assert_eq!(list.commit_edit("  Buy oat milk "), Outcome::Saved);
        assert_eq!(list.get(id).unwrap().text, "Buy oat milk");
        assert_eq!(list.editing(), None);
    }

    #[test]
    fn edit_with_blank_or_same_text_keeps_original() {
        let (storage, writes) = counting_manager();
        let mut list = TodoList::new(storage);
        let _ = list.add_item("Buy milk");
        let id = id_of(&list, "Buy milk");
        let before = writes.get();

        let _ = list.begin_edit(id);
        assert_eq!(list.commit_edit("   "), Outcome::Unchanged);
        let _ = list.begin_edit(id);
        assert_eq!(list.commit_edit("Buy milk"), Outcome::Unchanged);
        assert_eq!(list.get(id).unwrap().text, "Buy milk");
        assert_eq!(writes.get(), before);
    }

    #[test]
    fn cancel_discards_edit() {
        let mut list = TodoList::new(memory_manager());
        let _ = list.add_item("Buy milk");
        let id = id_of(&list, "Buy milk");
        let _ = list.begin_edit(id);
        list.cancel_edit();
        assert_eq!(list.commit_edit("changed"), Outcome::Unchanged);
        assert_eq!(list.get(id).unwrap().text, "Buy milk");
    }

    #[test]
    fn failed_write_reports_not_saved() {
        let storage = StorageManager::new(
            DEFAULT_NAMESPACE,
            Box::new(MemoryStore::with_quota(120)),
            Box::new(MemoryStore::new()),
        );
        let mut list = TodoList::new(storage);
        assert_eq!(list.add_item("short"), Outcome::Saved);
        assert_eq!(list.add_item(&"long ".repeat(40)), Outcome::NotSaved);
        // The in-memory state still reflects the change
        assert_eq!(list.todos().len(), 2);
        assert!(Outcome::NotSaved.changed());
    }

    #[test]
    fn reload_drops_duplicate_ids() {
        let mut storage = memory_manager();
        let todos = vec![
            Todo::from_parts("first", false, Some(1), None),
            Todo::from_parts("dupe", true, Some(1), None),
            Todo::from_parts("second", false, Some(2), None),
        ];
        assert!(storage.save(TODOS_KEY, &todos));

        let list = TodoList::new(storage);
        let texts: Vec<_> = list.todos().iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn new_ids_exceed_existing_ones() {
        let mut storage = memory_manager();
        let future = now_millis() + 1_000_000;
        assert!(storage.save(TODOS_KEY, &vec![Todo::from_parts("future", false, Some(future), None)]));
        let mut list = TodoList::new(storage);
        let _ = list.add_item("next");
        assert_eq!(list.todos()[1].id, future + 1);
    }

    #[test]
    fn filter_parses_and_displays() {
        for filter in Filter::ALL {
            assert_eq!(filter.to_string().parse::<Filter>().unwrap(), filter);
        }
        assert_eq!(" Active ".parse::<Filter>().unwrap(), Filter::Active);
        assert!("done".parse::<Filter>().is_err());
        assert_eq!(Filter::Completed.next(), Filter::All);
    }

    #[test]
    fn markup_lists_rows_and_footer() {
        let mut list = TodoList::new(memory_manager());
        let _ = list.add_item("a");
        let _ = list.add_item("b");
        let _ = list.toggle_item(id_of(&list, "a"));
        let markup = list.render().to_markup();
        assert!(markup.starts_with("<ul class=\"todo-list\">"));
        assert_eq!(markup.matches("<li ").count(), 2);
        assert!(markup.contains("<span class=\"todo-count\">1 item left</span>"));
        assert!(markup.contains("clear-completed"));
    }
}
