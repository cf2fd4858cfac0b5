pub mod config;
pub mod store;
pub mod storage;
pub mod models;
pub mod todo_list;
pub mod logging;
pub mod utils;
pub mod cli;
pub mod tui;

pub use config::Config;
pub use models::{Envelope, Settings, StorageSize, Todo};
pub use storage::StorageManager;
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreKind};
pub use todo_list::{Filter, Outcome, TodoList};
pub use utils::Profile;
