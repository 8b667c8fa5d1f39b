//! CLI command definitions and argument parsing.

use clap::{Args, Parser, Subcommand};
use geoping_domain::ReminderId;
use std::path::PathBuf;

/// Geoping - location reminders that fire once when you arrive.
#[derive(Debug, Parser)]
#[command(name = "geoping")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Reminder database path
    #[arg(long, global = true, env = "GEOPING_DB")]
    pub database: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a reminder
    Add(AddArgs),

    /// List reminders, newest first
    List,

    /// Change an existing reminder
    Edit(EditArgs),

    /// Delete a reminder
    Remove(IdArgs),

    /// Switch a reminder on or off
    Toggle(IdArgs),

    /// Show which reminders would fire at a postcode
    Check(CheckArgs),

    /// Interactive session: enter postcodes and receive notifications
    Watch(WatchArgs),
}

/// Where a reminder is anchored.
#[derive(Debug, Clone, Args)]
pub struct LocationArgs {
    /// Postcode to resolve and anchor the reminder at
    #[arg(short, long, conflicts_with_all = ["lat", "lng"])]
    pub postcode: Option<String>,

    /// Anchor latitude in decimal degrees
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Anchor longitude in decimal degrees
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,
}

impl LocationArgs {
    /// Whether any location option was given
    pub fn is_set(&self) -> bool {
        self.postcode.is_some() || self.lat.is_some()
    }
}

/// Arguments for the add command.
#[derive(Debug, Parser)]
pub struct AddArgs {
    /// Reminder title
    pub title: String,

    /// Geofence radius in meters (10-5000)
    #[arg(short, long, default_value_t = 100)]
    pub radius: i64,

    #[command(flatten)]
    pub location: LocationArgs,

    /// Free-form notes
    #[arg(short, long, default_value = "")]
    pub notes: String,

    /// Create the reminder switched off
    #[arg(long)]
    pub inactive: bool,
}

/// Arguments for the edit command.
#[derive(Debug, Parser)]
pub struct EditArgs {
    /// Reminder ID
    pub id: ReminderId,

    /// New title
    #[arg(short, long)]
    pub title: Option<String>,

    /// New radius in meters (10-5000)
    #[arg(short, long)]
    pub radius: Option<i64>,

    #[command(flatten)]
    pub location: LocationArgs,

    /// Remove the reminder's location and label
    #[arg(long, conflicts_with_all = ["postcode", "lat", "lng"])]
    pub clear_location: bool,

    /// New notes
    #[arg(short, long)]
    pub notes: Option<String>,
}

/// Arguments naming a single reminder.
#[derive(Debug, Parser)]
pub struct IdArgs {
    /// Reminder ID
    pub id: ReminderId,
}

/// Arguments for the check command.
#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Postcode to evaluate
    pub postcode: String,

    /// Include inactive reminders
    #[arg(short, long)]
    pub all: bool,
}

/// Arguments for the watch command.
#[derive(Debug, Parser)]
pub struct WatchArgs {
    /// Include inactive reminders
    #[arg(short, long)]
    pub all: bool,

    /// Start with notifications withheld (`notify on` releases them)
    #[arg(short, long)]
    pub muted: bool,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_with_postcode() {
        let cli = Cli::parse_from(["geoping", "add", "Buy milk", "--postcode", "SW1A 1AA"]);
        match cli.command {
            Command::Add(args) => {
                assert_eq!(args.title, "Buy milk");
                assert_eq!(args.radius, 100);
                assert_eq!(args.location.postcode.as_deref(), Some("SW1A 1AA"));
                assert!(!args.inactive);
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_add_with_negative_longitude() {
        let cli = Cli::parse_from([
            "geoping", "add", "Buy milk", "--lat", "51.5", "--lng", "-0.12", "-r", "250",
        ]);
        match cli.command {
            Command::Add(args) => {
                assert_eq!(args.location.lat, Some(51.5));
                assert_eq!(args.location.lng, Some(-0.12));
                assert_eq!(args.radius, 250);
            }
            _ => panic!("Expected Add command"),
        }
    }

    #[test]
    fn test_postcode_conflicts_with_coordinates() {
        let result = Cli::try_parse_from([
            "geoping", "add", "Milk", "--postcode", "SW1A 1AA", "--lat", "51.5", "--lng", "0",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_lat_requires_lng() {
        assert!(Cli::try_parse_from(["geoping", "add", "Milk", "--lat", "51.5"]).is_err());
    }

    #[test]
    fn test_toggle_parses_id() {
        let cli = Cli::parse_from(["geoping", "toggle", "7"]);
        match cli.command {
            Command::Toggle(args) => assert_eq!(args.id, ReminderId::new(7)),
            _ => panic!("Expected Toggle command"),
        }
        assert!(Cli::try_parse_from(["geoping", "toggle", "abc"]).is_err());
    }

    #[test]
    fn test_check_all_flag() {
        let cli = Cli::parse_from(["geoping", "--format", "json", "check", "SW1A 1AA", "--all"]);
        assert!(matches!(cli.format, Some(CliFormat::Json)));
        match cli.command {
            Command::Check(args) => {
                assert_eq!(args.postcode, "SW1A 1AA");
                assert!(args.all);
            }
            _ => panic!("Expected Check command"),
        }
    }

    #[test]
    fn test_edit_clear_location() {
        let cli = Cli::parse_from(["geoping", "edit", "3", "--clear-location"]);
        match cli.command {
            Command::Edit(args) => {
                assert_eq!(args.id, ReminderId::new(3));
                assert!(args.clear_location);
                assert!(!args.location.is_set());
            }
            _ => panic!("Expected Edit command"),
        }
        assert!(Cli::try_parse_from([
            "geoping", "edit", "3", "--clear-location", "--postcode", "SW1A 1AA",
        ])
        .is_err());
    }

    #[test]
    fn test_command_required() {
        assert!(Cli::try_parse_from(["geoping"]).is_err());
    }
}
