use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Version string written into every export envelope
pub const EXPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: i64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "now_iso")]
    pub created_at: String, // ISO 8601, millisecond precision
}

impl Todo {
    pub fn new(text: impl Into<String>) -> Self {
        Self::from_parts(text, false, None, None)
    }

    /// Build a todo from persisted parts, generating whatever is missing
    pub fn from_parts(
        text: impl Into<String>,
        completed: bool,
        id: Option<i64>,
        created_at: Option<String>,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(now_millis),
            text: text.into(),
            completed,
            created_at: created_at.unwrap_or_else(now_iso),
        }
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }

    /// Render the todo as a list-row fragment.
    ///
    /// Every affordance carries the todo's id in a `data-id` attribute so a
    /// host can route clicks back to the matching controller operation.
    pub fn render(&self) -> String {
        let class = if self.completed {
            "todo-item completed"
        } else {
            "todo-item"
        };
        let checked = if self.completed { " checked" } else { "" };
        format!(
            "<li class=\"{class}\" data-id=\"{id}\">\
             <input type=\"checkbox\" class=\"toggle\" data-id=\"{id}\"{checked}>\
             <span class=\"todo-text\">{text}</span>\
             <button class=\"edit-btn\" data-id=\"{id}\">Edit</button>\
             <button class=\"delete-btn\" data-id=\"{id}\">Delete</button>\
             </li>",
            class = class,
            id = self.id,
            checked = checked,
            text = escape_markup(&self.text),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub theme: String,
    pub sort_by: String,
    pub show_completed: bool,
    pub notifications: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme: "light".to_string(),
            sort_by: "created".to_string(),
            show_completed: true,
            notifications: false,
        }
    }
}

/// Backup snapshot produced by export and consumed by import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub todos: Vec<Todo>,
    pub settings: Settings,
    pub export_date: String,
    pub version: String,
}

impl Envelope {
    pub fn new(todos: Vec<Todo>, settings: Settings) -> Self {
        Self {
            todos,
            settings,
            export_date: now_iso(),
            version: EXPORT_VERSION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StorageSize {
    pub bytes: usize,
    pub kb: f64,
    pub mb: f64,
}

impl StorageSize {
    pub fn from_bytes(bytes: usize) -> Self {
        let kb = bytes as f64 / 1024.0;
        let mb = kb / 1024.0;
        Self {
            bytes,
            kb: round2(kb),
            mb: round2(mb),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Current time as milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Current time as an ISO 8601 string, e.g. `2024-05-01T09:30:00.000Z`
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn escape_markup(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_todo_starts_incomplete_with_timestamp() {
        let todo = Todo::new("Buy milk");
        assert_eq!(todo.text, "Buy milk");
        assert!(!todo.completed);
        assert!(todo.id > 0);
        assert!(chrono::DateTime::parse_from_rfc3339(&todo.created_at).is_ok());
        assert!(todo.created_at.ends_with('Z'));
    }

    #[test]
    fn from_parts_keeps_supplied_identity() {
        let todo = Todo::from_parts("Walk dog", true, Some(42), Some("2024-01-01T00:00:00.000Z".into()));
        assert_eq!(todo.id, 42);
        assert!(todo.completed);
        assert_eq!(todo.created_at, "2024-01-01T00:00:00.000Z");
    }

    #[test]
    fn toggle_twice_restores_state() {
        let mut todo = Todo::new("x");
        todo.toggle();
        assert!(todo.completed);
        todo.toggle();
        assert!(!todo.completed);
    }

    #[test]
    fn render_reflects_state_and_escapes_text() {
        let mut todo = Todo::from_parts("<b>bold</b> & co", false, Some(7), None);
        let html = todo.render();
        assert!(html.starts_with("<li class=\"todo-item\" data-id=\"7\">"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt; &amp; co"));
        assert!(!html.contains(" checked"));
        assert!(html.contains("class=\"edit-btn\" data-id=\"7\""));
        assert!(html.contains("class=\"delete-btn\" data-id=\"7\""));

        todo.toggle();
        let html = todo.render();
        assert!(html.contains("todo-item completed"));
        assert!(html.contains(" checked>"));
    }

    #[test]
    fn todo_uses_camel_case_keys() {
        let todo = Todo::from_parts("a", false, Some(1), Some("2024-01-01T00:00:00.000Z".into()));
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "text": "a",
                "completed": false,
                "createdAt": "2024-01-01T00:00:00.000Z"
            })
        );
    }

    #[test]
    fn settings_fill_missing_fields_with_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"dark"}"#).unwrap();
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.sort_by, "created");
        assert!(settings.show_completed);
        assert!(!settings.notifications);
    }

    #[test]
    fn storage_size_rounds_to_two_decimals() {
        let size = StorageSize::from_bytes(1536);
        assert_eq!(size.bytes, 1536);
        assert_eq!(size.kb, 1.5);
        assert_eq!(size.mb, 0.0);
    }
}
