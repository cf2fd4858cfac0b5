use color_eyre::Result;
use clap::Parser;
use todos::{Config, MemoryStore, Profile, SqliteStore, StorageManager, TodoList, cli::{Cli, Commands}};

fn main() -> Result<()> {
    // Set up error reporting with color-eyre
    color_eyre::install()?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Determine profile: --dev flag enables dev mode, otherwise use prod
    let profile = if cli.dev {
        Profile::Dev
    } else {
        Profile::Prod
    };

    // An explicit --config file wins over the profile's default location
    let config = match cli.config {
        Some(ref path) => Config::load_from_path(path)?,
        None => Config::load_with_profile(profile)?,
    };

    todos::logging::init(&config.get_log_path(), &config.log_level)?;
    log::info!("starting todos ({:?} profile)", profile);

    // Open durable storage; if the database cannot be opened the session store takes over
    let db_path = config.get_database_path();
    let db_path = db_path
        .to_str()
        .ok_or_else(|| color_eyre::eyre::eyre!("Database path contains invalid UTF-8"))?;
    let storage = match SqliteStore::open(db_path) {
        Ok(store) => StorageManager::new(
            config.storage_namespace.clone(),
            Box::new(store),
            Box::new(MemoryStore::new()),
        ),
        Err(e) => {
            log::warn!("could not open {}: {}; using session storage", db_path, e);
            StorageManager::session_only(config.storage_namespace.clone())
        }
    };
    let mut list = TodoList::new(storage);

    // Dispatch to appropriate command handler
    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let app = todos::tui::App::new(config, list);
            todos::tui::run_event_loop(app)?;
        }
        Commands::Add { text } => todos::cli::handle_add(text, &mut list)?,
        Commands::Toggle { id } => todos::cli::handle_toggle(id, &mut list)?,
        Commands::Edit { id, text } => todos::cli::handle_edit(id, text, &mut list)?,
        Commands::Delete { id } => todos::cli::handle_delete(id, &mut list)?,
        Commands::List { filter, markup } => todos::cli::handle_list(filter, markup, &mut list)?,
        Commands::ClearCompleted => todos::cli::handle_clear_completed(&mut list)?,
        Commands::Export { output } => todos::cli::handle_export(output, &list)?,
        Commands::Import { file } => todos::cli::handle_import(file, &mut list)?,
        Commands::Size => todos::cli::handle_size(&list)?,
        Commands::Reset { yes } => todos::cli::handle_reset(yes, &mut list)?,
        Commands::Settings { reset, theme, sort_by, show_completed, notifications } => {
            todos::cli::handle_settings(reset, theme, sort_by, show_completed, notifications, &mut list)?
        }
    }

    Ok(())
}
