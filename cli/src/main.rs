mod commands;
mod config;
mod server;
mod tls;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::commands::{
    cmd_entry_add, cmd_entry_delete, cmd_entry_list, cmd_entry_show, cmd_entry_update, cmd_export,
    cmd_exercise_add, cmd_exercise_delete, cmd_exercise_edit, cmd_exercise_list, cmd_reading_add,
    cmd_reading_delete, cmd_reading_list, cmd_session, cmd_snack_add, cmd_snack_delete,
    cmd_snack_edit, cmd_snack_list, cmd_stats, cmd_user_add, cmd_user_list, resolve_user,
};
use crate::config::Config;
use glucolog_core::db::Database;
use glucolog_core::service::TrackerService;

#[derive(Parser)]
#[command(
    name = "glucolog",
    version,
    about = "Track exercise sessions and the blood sugar readings around them"
)]
struct Cli {
    /// Profile to operate on (created on first use)
    #[arg(short, long, global = true, default_value = "default")]
    user: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a full session: before reading, after reading, completed entry
    Session {
        /// Exercise name
        exercise: String,
        /// Blood sugar before exercising (mmol/L)
        before: f64,
        /// Blood sugar after exercising (mmol/L)
        after: f64,
        /// Session length in minutes
        #[arg(short, long)]
        duration: Option<i64>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Sugar consumed during the session (grams)
        #[arg(long)]
        sugar: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Per-exercise average blood sugar change
    Stats {
        /// Limit to one exercise by name
        exercise: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export entries as a CSV report for your clinician
    Export {
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<std::path::PathBuf>,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Enable TLS (HTTPS). Generates a self-signed certificate on first use.
        #[arg(long)]
        tls: bool,
        /// Path to TLS certificate file (PEM). Implies --tls.
        #[arg(long, value_name = "PATH")]
        tls_cert: Option<std::path::PathBuf>,
        /// Path to TLS private key file (PEM). Implies --tls.
        #[arg(long, value_name = "PATH")]
        tls_key: Option<std::path::PathBuf>,
    },
    /// Manage exercises
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Manage blood sugar readings
    Reading {
        #[command(subcommand)]
        command: ReadingCommands,
    },
    /// Manage exercise entries (reading pairs)
    Entry {
        #[command(subcommand)]
        command: EntryCommands,
    },
    /// Manage the snack catalog
    Snack {
        #[command(subcommand)]
        command: SnackCommands,
    },
    /// Manage profiles and their API keys
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum ExerciseCommands {
    /// Add an exercise
    Add {
        /// Exercise name (unique per profile)
        name: String,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Intensity: low, medium, high
        #[arg(short, long, default_value = "medium")]
        intensity: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List exercises
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an exercise
    Edit {
        /// Exercise name
        name: String,
        /// New name
        #[arg(long)]
        rename: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New intensity: low, medium, high
        #[arg(short, long)]
        intensity: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an exercise and its entries
    Delete {
        /// Exercise name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ReadingCommands {
    /// Log a blood sugar reading
    Add {
        /// Value in mmol/L
        value: f64,
        /// Reading type: before or after
        reading_type: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List readings
    List {
        /// Filter by type: before or after
        #[arg(long = "type", value_name = "TYPE")]
        reading_type: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a reading (entries that referenced it keep going without it)
    Delete {
        /// Reading ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum EntryCommands {
    /// Add an entry, optionally linking existing readings
    Add {
        /// Exercise name
        exercise: String,
        /// Before-reading ID to link
        #[arg(long)]
        before: Option<i64>,
        /// After-reading ID to link
        #[arg(long)]
        after: Option<i64>,
        /// Session length in minutes
        #[arg(short, long)]
        duration: Option<i64>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
        /// Sugar consumed during the session (grams)
        #[arg(long)]
        sugar: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update an entry (link/unlink readings, edit fields)
    Update {
        /// Entry ID
        id: i64,
        /// Move to a different exercise by name
        #[arg(long)]
        exercise: Option<String>,
        /// Before-reading ID to link
        #[arg(long)]
        before: Option<i64>,
        /// Unlink the before reading
        #[arg(long)]
        clear_before: bool,
        /// After-reading ID to link
        #[arg(long)]
        after: Option<i64>,
        /// Unlink the after reading
        #[arg(long)]
        clear_after: bool,
        /// Session length in minutes
        #[arg(short, long)]
        duration: Option<i64>,
        /// Clear the session length
        #[arg(long)]
        clear_duration: bool,
        /// New notes
        #[arg(long)]
        notes: Option<String>,
        /// Sugar consumed during the session (grams)
        #[arg(long)]
        sugar: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one entry
    Show {
        /// Entry ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List entries
    List {
        /// Filter by exercise name
        #[arg(short, long)]
        exercise: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an entry (its readings survive)
    Delete {
        /// Entry ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SnackCommands {
    /// Add a snack to the catalog
    Add {
        /// Snack name
        name: String,
        /// Description
        #[arg(long)]
        description: Option<String>,
        /// Sugar content in grams
        #[arg(short, long)]
        sugar: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List snacks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a snack
    Edit {
        /// Snack ID
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New sugar content in grams
        #[arg(short, long)]
        sugar: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a snack
    Delete {
        /// Snack ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a profile and print its API key
    Add {
        /// Profile name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List profiles
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Serve {
            port,
            bind,
            tls,
            tls_cert,
            tls_key,
        } => {
            let db = Database::open(&config.db_path)?;
            let tls_config = if tls || tls_cert.is_some() || tls_key.is_some() {
                let (default_cert, default_key) = tls::default_cert_paths()?;
                Some(server::TlsConfig {
                    cert_path: tls_cert.unwrap_or(default_cert),
                    key_path: tls_key.unwrap_or(default_key),
                })
            } else {
                None
            };
            server::start_server(db, port, &bind, tls_config).await
        }
        command => {
            let svc = TrackerService::new(&config.db_path)?;
            run_command(&svc, &cli.user, command)
        }
    }
}

#[allow(clippy::too_many_lines)]
fn run_command(svc: &TrackerService, profile: &str, command: Commands) -> Result<()> {
    match command {
        Commands::Serve { .. } => unreachable!("handled in run()"),
        Commands::User { command } => match command {
            UserCommands::Add { name, json } => cmd_user_add(svc, &name, json),
            UserCommands::List { json } => cmd_user_list(svc, json),
        },
        Commands::Session {
            exercise,
            before,
            after,
            duration,
            notes,
            sugar,
            json,
        } => {
            let owner = resolve_user(svc, profile)?;
            cmd_session(svc, owner, &exercise, before, after, duration, notes, sugar, json)
        }
        Commands::Stats { exercise, json } => {
            let owner = resolve_user(svc, profile)?;
            cmd_stats(svc, owner, exercise, json)
        }
        Commands::Export { output } => {
            let owner = resolve_user(svc, profile)?;
            cmd_export(svc, owner, output)
        }
        Commands::Exercise { command } => {
            let owner = resolve_user(svc, profile)?;
            match command {
                ExerciseCommands::Add {
                    name,
                    description,
                    intensity,
                    json,
                } => cmd_exercise_add(svc, owner, &name, description, &intensity, json),
                ExerciseCommands::List { json } => cmd_exercise_list(svc, owner, json),
                ExerciseCommands::Edit {
                    name,
                    rename,
                    description,
                    intensity,
                    json,
                } => cmd_exercise_edit(svc, owner, &name, rename, description, intensity, json),
                ExerciseCommands::Delete { name, json } => {
                    cmd_exercise_delete(svc, owner, &name, json)
                }
            }
        }
        Commands::Reading { command } => {
            let owner = resolve_user(svc, profile)?;
            match command {
                ReadingCommands::Add {
                    value,
                    reading_type,
                    json,
                } => cmd_reading_add(svc, owner, value, &reading_type, json),
                ReadingCommands::List { reading_type, json } => {
                    cmd_reading_list(svc, owner, reading_type.as_deref(), json)
                }
                ReadingCommands::Delete { id, json } => cmd_reading_delete(svc, owner, id, json),
            }
        }
        Commands::Entry { command } => {
            let owner = resolve_user(svc, profile)?;
            match command {
                EntryCommands::Add {
                    exercise,
                    before,
                    after,
                    duration,
                    notes,
                    sugar,
                    json,
                } => cmd_entry_add(
                    svc, owner, &exercise, before, after, duration, notes, sugar, json,
                ),
                EntryCommands::Update {
                    id,
                    exercise,
                    before,
                    clear_before,
                    after,
                    clear_after,
                    duration,
                    clear_duration,
                    notes,
                    sugar,
                    json,
                } => cmd_entry_update(
                    svc,
                    owner,
                    id,
                    exercise,
                    before,
                    clear_before,
                    after,
                    clear_after,
                    duration,
                    clear_duration,
                    notes,
                    sugar,
                    json,
                ),
                EntryCommands::Show { id, json } => cmd_entry_show(svc, owner, id, json),
                EntryCommands::List { exercise, json } => {
                    cmd_entry_list(svc, owner, exercise, json)
                }
                EntryCommands::Delete { id, json } => cmd_entry_delete(svc, owner, id, json),
            }
        }
        Commands::Snack { command } => {
            let owner = resolve_user(svc, profile)?;
            match command {
                SnackCommands::Add {
                    name,
                    description,
                    sugar,
                    json,
                } => cmd_snack_add(svc, owner, &name, description, sugar, json),
                SnackCommands::List { json } => cmd_snack_list(svc, owner, json),
                SnackCommands::Edit {
                    id,
                    name,
                    description,
                    sugar,
                    json,
                } => cmd_snack_edit(svc, owner, id, name, description, sugar, json),
                SnackCommands::Delete { id, json } => cmd_snack_delete(svc, owner, id, json),
            }
        }
    }
}
