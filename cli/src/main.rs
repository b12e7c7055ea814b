mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    cmd_add, cmd_clear, cmd_day, cmd_delete, cmd_edit, cmd_export, cmd_import,
    cmd_placeholder_add, cmd_placeholder_delete, cmd_placeholder_edit, cmd_placeholder_list,
    cmd_placeholder_reorder, cmd_recent, cmd_reorder, cmd_settings_set, cmd_settings_show,
};
use crate::config::Config;
use calorie_core::store::Store;

#[derive(Parser)]
#[command(
    name = "calorie",
    version,
    about = "A simple calorie counter",
    long_about = "Log what you eat and burn each day against a daily calorie target.\n\
                  Recurring meals can be saved as placeholders that pre-fill an empty day."
)]
struct Cli {
    /// Database file to use instead of the default location
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the entries and totals for a day (defaults to today)
    Day {
        /// Date to show (YYYY-MM-DD or today/yesterday/tomorrow)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a food or exercise entry
    Add {
        /// Calories per serving
        #[arg(allow_negative_numbers = true)]
        calories: i64,
        /// What was eaten (or the exercise done)
        description: Option<String>,
        /// Date to log for (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Record calories burned instead of eaten
        #[arg(short, long)]
        exercise: bool,
        /// Number of servings to multiply calories by
        #[arg(short, long)]
        servings: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an entry
    Edit {
        /// Entry ID to edit
        id: String,
        /// New calories (negative for exercise)
        #[arg(short, long, allow_negative_numbers = true)]
        calories: Option<i64>,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New date (YYYY-MM-DD or today/yesterday/tomorrow)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry by ID
    Delete {
        /// Entry ID to delete
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the order of a day's entries
    Reorder {
        /// Day whose entries are reordered
        date: String,
        /// Entry IDs in their new order
        #[arg(required = true)]
        ids: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recently logged foods
    Recent {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage recurring meal placeholders
    Placeholder {
        #[command(subcommand)]
        command: PlaceholderCommands,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Export all entries as CSV
    Export {
        /// File to write (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import entries from a CSV export, replacing entries with the same ID
    Import {
        /// CSV file to read
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete every entry and placeholder
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlaceholderCommands {
    /// Add a placeholder meal
    Add {
        /// Meal description
        description: String,
        /// Calories
        calories: i64,
        /// Time of day (HH:MM, 24-hour)
        #[arg(short, long)]
        time: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List placeholders
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a placeholder
    Edit {
        /// Placeholder ID to edit
        id: String,
        /// New description
        #[arg(short, long)]
        description: Option<String>,
        /// New calories
        #[arg(short, long)]
        calories: Option<i64>,
        /// New time of day (HH:MM)
        #[arg(short, long)]
        time: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a placeholder by ID
    Delete {
        /// Placeholder ID to delete
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the order of placeholders
    Reorder {
        /// Placeholder IDs in their new order
        #[arg(required = true)]
        ids: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show current settings
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change settings
    Set {
        /// Daily calorie target (applies to today and later)
        #[arg(short, long)]
        target: Option<i64>,
        /// Theme: light, dark, system
        #[arg(long)]
        theme: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.db)?;
    let store = Store::open(&config.db_path)?;

    match cli.command {
        Commands::Day { date, json } => cmd_day(&store, date, json),
        Commands::Add {
            calories,
            description,
            date,
            exercise,
            servings,
            json,
        } => cmd_add(&store, calories, description, date, exercise, servings, json),
        Commands::Edit {
            id,
            calories,
            description,
            date,
            json,
        } => cmd_edit(&store, &id, calories, description, date, json),
        Commands::Delete { id, json } => cmd_delete(&store, &id, json),
        Commands::Reorder { date, ids, json } => cmd_reorder(&store, &date, &ids, json),
        Commands::Recent { json } => cmd_recent(&store, json),
        Commands::Placeholder { command } => match command {
            PlaceholderCommands::Add {
                description,
                calories,
                time,
                json,
            } => cmd_placeholder_add(&store, &description, calories, &time, json),
            PlaceholderCommands::List { json } => cmd_placeholder_list(&store, json),
            PlaceholderCommands::Edit {
                id,
                description,
                calories,
                time,
                json,
            } => cmd_placeholder_edit(&store, &id, description, calories, time, json),
            PlaceholderCommands::Delete { id, json } => cmd_placeholder_delete(&store, &id, json),
            PlaceholderCommands::Reorder { ids, json } => {
                cmd_placeholder_reorder(&store, &ids, json)
            }
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(&store, json),
            SettingsCommands::Set {
                target,
                theme,
                json,
            } => cmd_settings_set(&store, target, theme.as_deref(), json),
        },
        Commands::Export { output, json } => cmd_export(&store, output.as_deref(), json),
        Commands::Import { file, json } => cmd_import(&store, &file, json),
        Commands::Clear { yes, json } => cmd_clear(&store, yes, json),
    }
}
