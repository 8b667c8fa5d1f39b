//! Geoping CLI - location reminders from the command line.

use clap::Parser;
use geoping_cli::commands;
use geoping_cli::watch;
use geoping_cli::{Cli, Command, Config, Formatter};
use geoping_resolver::PostcodesIoResolver;
use geoping_store::SqliteReminderStore;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> geoping_cli::Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load config, falling back to defaults when there is no file yet
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    // Initialize tracing (log to stderr); RUST_LOG wins over the config
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);

    // Determine color setting
    let color_enabled = !cli.no_color && config.settings.color;

    // Create formatter
    let formatter = Formatter::new(format, color_enabled);

    let database_path = match cli.database {
        Some(path) => path,
        None => config.database_path()?,
    };
    tracing::debug!("Using database {}", database_path.display());
    let mut store = SqliteReminderStore::new(&database_path)?;

    match cli.command {
        Command::Add(args) => {
            let resolver = PostcodesIoResolver::from_config(&config.resolver)?;
            commands::execute_add(args, &mut store, &resolver, &formatter).await?;
        }
        Command::List => {
            commands::execute_list(&store, &formatter)?;
        }
        Command::Edit(args) => {
            let resolver = PostcodesIoResolver::from_config(&config.resolver)?;
            commands::execute_edit(args, &mut store, &resolver, &formatter).await?;
        }
        Command::Remove(args) => {
            commands::execute_remove(args, &mut store, &formatter)?;
        }
        Command::Toggle(args) => {
            commands::execute_toggle(args, &mut store, &formatter)?;
        }
        Command::Check(args) => {
            let resolver = PostcodesIoResolver::from_config(&config.resolver)?;
            commands::execute_check(args, &store, &resolver, &config.engine, &formatter).await?;
        }
        Command::Watch(args) => {
            let resolver = PostcodesIoResolver::from_config(&config.resolver)?;
            let history_path = Config::home().ok().map(|home| home.join("history.txt"));
            watch::run_watch(args, &config.engine, resolver, store, formatter, history_path)
                .await?;
        }
    }

    Ok(())
}
