//! Interactive watch session.
//!
//! Each input line is either a postcode to resolve or one of a few control
//! words. Lines are read on a dedicated thread and forwarded to the engine
//! worker, whose events are printed as they arrive.

use crate::cli::WatchArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::sink::ConsoleSink;
use geoping_domain::traits::{LocationResolver, NotificationSink, ReminderStore};
use geoping_engine::{EngineCommand, EngineConfig, EngineError, EngineHandle, EngineWorker};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::fmt::Display;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// A parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    /// End the session
    Exit,
    /// Show available commands
    Help,
    /// Forward to the engine worker
    Engine(EngineCommand),
}

/// Parse an input line.
///
/// Anything that is not a control word is treated as a postcode.
pub fn parse_watch_command(line: &str) -> Result<WatchCommand> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    let command = match parts.as_slice() {
        [] => return Err(CliError::InvalidInput("Empty command".to_string())),
        ["exit" | "quit" | "q"] => WatchCommand::Exit,
        ["help" | "?"] => WatchCommand::Help,
        ["clear"] => WatchCommand::Engine(EngineCommand::Clear),
        ["refresh"] => WatchCommand::Engine(EngineCommand::RefreshReminders),
        ["active", state] => WatchCommand::Engine(EngineCommand::SetActiveOnly(parse_switch(state)?)),
        ["notify", state] => WatchCommand::Engine(EngineCommand::SetPermission(parse_switch(state)?)),
        ["active" | "notify", ..] => {
            return Err(CliError::InvalidInput(format!(
                "Usage: {} on|off",
                parts[0]
            )))
        }
        _ => WatchCommand::Engine(EngineCommand::Resolve(parts.join(" "))),
    };
    Ok(command)
}

fn parse_switch(state: &str) -> Result<bool> {
    match state.to_lowercase().as_str() {
        "on" | "yes" | "true" => Ok(true),
        "off" | "no" | "false" => Ok(false),
        _ => Err(CliError::InvalidInput(format!(
            "Expected 'on' or 'off', got '{}'",
            state
        ))),
    }
}

/// Run the interactive watch session.
pub async fn run_watch<R, S>(
    args: WatchArgs,
    config: &EngineConfig,
    resolver: R,
    store: S,
    formatter: Formatter,
    history_path: Option<PathBuf>,
) -> Result<()>
where
    R: LocationResolver + Send + Sync + 'static,
    S: ReminderStore + Send + 'static,
    S::Error: Display,
{
    let config = EngineConfig {
        active_only: config.active_only && !args.all,
        notifications_enabled: config.notifications_enabled && !args.muted,
        ..config.clone()
    };
    let (worker, handle) = EngineWorker::new(config, resolver, store, ConsoleSink::new(formatter));

    println!(
        "{}",
        formatter.info("Enter a postcode to check reminders. Type 'help' for commands, 'exit' to quit")
    );
    let lines = spawn_reader(history_path)?;

    let summary = run_session(worker, handle, lines, formatter).await?;
    println!("{}", summary);
    Ok(())
}

/// Drive a worker from input lines until exit or end of input.
///
/// Returns the worker's final metrics summary.
pub async fn run_session<R, S, N>(
    mut worker: EngineWorker<R, S, N>,
    handle: EngineHandle,
    mut lines: mpsc::Receiver<String>,
    formatter: Formatter,
) -> Result<String>
where
    R: LocationResolver + Send + Sync + 'static,
    S: ReminderStore + Send + 'static,
    S::Error: Display,
    N: NotificationSink + Send + Sync + 'static,
    N::Error: Display,
{
    let mut events = worker.subscribe();
    // The worker is dropped when the task ends, which closes `events`
    let worker_task = tokio::spawn(async move {
        worker.run().await?;
        Ok::<_, EngineError>(worker.metrics().summary())
    });

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                match parse_watch_command(&line) {
                    Ok(WatchCommand::Exit) => break,
                    Ok(WatchCommand::Help) => print_help(&formatter),
                    Ok(WatchCommand::Engine(command)) => {
                        if handle.send(command).await.is_err() {
                            // Worker already stopped; its result says why
                            break;
                        }
                    }
                    Err(e) => eprintln!("{}", formatter.error(&e.to_string())),
                }
            }
            event = events.recv() => match event {
                Some(event) => print_event(&formatter, &event),
                None => break,
            }
        }
    }

    // Fails only if the worker has already stopped
    let _ = handle.shutdown().await;
    while let Some(event) = events.recv().await {
        print_event(&formatter, &event);
    }

    let summary = worker_task
        .await
        .map_err(|e| EngineError::Worker(e.to_string()))??;
    Ok(summary)
}

fn print_event(formatter: &Formatter, event: &geoping_engine::EngineEvent) {
    if let Some(text) = formatter.event(event) {
        println!("{}", text);
    }
}

/// Read lines on a dedicated thread.
///
/// A plain thread rather than a blocking task, so a pending readline does
/// not hold up runtime shutdown.
fn spawn_reader(history_path: Option<PathBuf>) -> Result<mpsc::Receiver<String>> {
    let mut editor = DefaultEditor::new().map_err(|e| {
        CliError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Failed to initialize editor: {}", e),
        ))
    })?;
    if let Some(path) = &history_path {
        let _ = editor.load_history(path);
    }

    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || loop {
        match editor.readline("geoping> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                editor.add_history_entry(line).ok();
                if let Some(path) = &history_path {
                    editor.save_history(path).ok();
                }
                if tx.blocking_send(line.to_string()).is_err() {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                let _ = tx.blocking_send("exit".to_string());
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                tracing::warn!("Input error: {}", err);
                break;
            }
        }
    });

    Ok(rx)
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  <postcode>         Resolve a postcode and check reminders there");
    println!("  clear              Forget the current location");
    println!("  refresh            Reload reminders from the database");
    println!("  active on|off      Only evaluate active reminders");
    println!("  notify on|off      Allow or withhold notifications");
    println!("  help, ?            Show this help");
    println!("  exit, quit, q      End the session");
    println!();
}
