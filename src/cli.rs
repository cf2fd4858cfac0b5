use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::Settings;
use crate::storage::SETTINGS_KEY;
use crate::todo_list::{Filter, Outcome, TodoList};

#[derive(Parser)]
#[command(name = "todos")]
#[command(about = "A persistent todo list for the terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Add a new todo
    Add {
        /// Todo text
        text: String,
    },
    /// Flip a todo between active and completed
    Toggle {
        id: i64,
    },
    /// Replace the text of a todo
    Edit {
        id: i64,
        /// New text
        text: String,
    },
    /// Delete a todo
    Delete {
        id: i64,
    },
    /// List todos
    List {
        /// all, active or completed
        #[arg(long, default_value = "all")]
        filter: Filter,
        /// Print the list as HTML markup
        #[arg(long)]
        markup: bool,
    },
    /// Remove every completed todo
    ClearCompleted,
    /// Export todos and settings as JSON
    Export {
        /// Write to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Import todos and settings from an exported JSON file
    Import {
        file: PathBuf,
    },
    /// Show how much space the stored data takes
    Size,
    /// Delete every stored todo and setting
    Reset {
        /// Skip the confirmation requirement
        #[arg(long)]
        yes: bool,
    },
    /// Show settings, updating any that are given
    Settings {
        /// Forget stored settings and go back to the defaults
        #[arg(long, conflicts_with_all = ["theme", "sort_by", "show_completed", "notifications"])]
        reset: bool,
        #[arg(long)]
        theme: Option<String>,
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        show_completed: Option<bool>,
        #[arg(long)]
        notifications: Option<bool>,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("No todo with ID {0}")]
    NotFound(i64),
    #[error("Import failed")]
    ImportFailed,
    #[error("Refusing to delete all data without --yes")]
    NotConfirmed,
    #[error("Failed to clear storage")]
    ClearFailed,
}

fn report(outcome: Outcome, done: &str) {
    match outcome {
        Outcome::Saved => println!("{}", done),
        Outcome::NotSaved => {
            println!("{}", done);
            eprintln!("Warning: change could not be saved to storage");
        }
        Outcome::Unchanged => println!("Nothing changed"),
    }
}

/// Handle the add command
pub fn handle_add(text: String, list: &mut TodoList) -> Result<(), CliError> {
    let outcome = list.add_item(&text);
    match list.todos().last() {
        Some(todo) if outcome.changed() => {
            report(outcome, &format!("Todo added (ID: {})", todo.id));
        }
        _ => println!("Todo text cannot be empty"),
    }
    Ok(())
}

/// Handle the toggle command
pub fn handle_toggle(id: i64, list: &mut TodoList) -> Result<(), CliError> {
    match list.toggle_item(id) {
        Outcome::Unchanged => Err(CliError::NotFound(id)),
        outcome => {
            let state = match list.get(id) {
                Some(todo) if todo.completed => "completed",
                _ => "active",
            };
            report(outcome, &format!("Todo {} marked {}", id, state));
            Ok(())
        }
    }
}

/// Handle the edit command
pub fn handle_edit(id: i64, text: String, list: &mut TodoList) -> Result<(), CliError> {
    if list.get(id).is_none() {
        return Err(CliError::NotFound(id));
    }
    report(list.edit_item(id, &text), &format!("Todo {} updated", id));
    Ok(())
}

/// Handle the delete command
pub fn handle_delete(id: i64, list: &mut TodoList) -> Result<(), CliError> {
    match list.delete_item(id) {
        Outcome::Unchanged => Err(CliError::NotFound(id)),
        outcome => {
            report(outcome, &format!("Todo {} deleted", id));
            Ok(())
        }
    }
}

/// Handle the list command
pub fn handle_list(filter: Filter, markup: bool, list: &mut TodoList) -> Result<(), CliError> {
    list.set_filter(filter);
    let view = list.render();
    if markup {
        println!("{}", view.to_markup());
        return Ok(());
    }
    for todo in &view.rows {
        let status_indicator = if todo.completed { "✓" } else { "○" };
        println!("{} {:>14}  {}", status_indicator, todo.id, todo.text);
    }
    if view.footer.visible {
        println!("{}", view.footer.label);
    } else {
        println!("No todos yet");
    }
    Ok(())
}

/// Handle the clear-completed command
pub fn handle_clear_completed(list: &mut TodoList) -> Result<(), CliError> {
    let completed = list.completed_count();
    report(list.clear_completed(), &format!("Cleared {} completed todos", completed));
    Ok(())
}

/// Handle the export command
pub fn handle_export(output: Option<PathBuf>, list: &TodoList) -> Result<(), CliError> {
    let envelope = list.storage().export_data();
    let json = serde_json::to_string_pretty(&envelope)?;
    match output {
        Some(path) => {
            fs::write(&path, json)?;
            println!("Exported {} todos to {}", envelope.todos.len(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }
    Ok(())
}

/// Handle the import command
pub fn handle_import(file: PathBuf, list: &mut TodoList) -> Result<(), CliError> {
    let contents = fs::read_to_string(&file)?;
    let envelope: serde_json::Value = serde_json::from_str(&contents)?;
    if !list.storage_mut().import_data(&envelope) {
        return Err(CliError::ImportFailed);
    }
    list.reload();
    println!("Imported from {} ({} todos)", file.display(), list.todos().len());
    Ok(())
}

/// Handle the size command
pub fn handle_size(list: &TodoList) -> Result<(), CliError> {
    let size = list.storage().get_storage_size();
    println!(
        "{} bytes ({} KB, {} MB) in {} under '{}'",
        size.bytes,
        size.kb,
        size.mb,
        list.storage().active_kind(),
        list.storage().namespace()
    );
    Ok(())
}

/// Handle the reset command
pub fn handle_reset(yes: bool, list: &mut TodoList) -> Result<(), CliError> {
    if !yes {
        return Err(CliError::NotConfirmed);
    }
    if !list.storage_mut().clear() {
        return Err(CliError::ClearFailed);
    }
    list.reload();
    println!("All todos and settings deleted");
    Ok(())
}

/// Handle the settings command
pub fn handle_settings(
    reset: bool,
    theme: Option<String>,
    sort_by: Option<String>,
    show_completed: Option<bool>,
    notifications: Option<bool>,
    list: &mut TodoList,
) -> Result<(), CliError> {
    if reset && !list.storage_mut().remove(SETTINGS_KEY) {
        eprintln!("Warning: stored settings could not be removed");
    }
    let mut settings = list.storage().load_settings();
    let changed = apply_settings(&mut settings, theme, sort_by, show_completed, notifications);
    if changed && !list.storage_mut().save_settings(&settings) {
        eprintln!("Warning: settings could not be saved to storage");
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}

fn apply_settings(
    settings: &mut Settings,
    theme: Option<String>,
    sort_by: Option<String>,
    show_completed: Option<bool>,
    notifications: Option<bool>,
) -> bool {
    let mut changed = false;
    if let Some(theme) = theme {
        settings.theme = theme;
        changed = true;
    }
    if let Some(sort_by) = sort_by {
        settings.sort_by = sort_by;
        changed = true;
    }
    if let Some(show_completed) = show_completed {
        settings.show_completed = show_completed;
        changed = true;
    }
    if let Some(notifications) = notifications {
        settings.notifications = notifications;
        changed = true;
    }
    changed
}
