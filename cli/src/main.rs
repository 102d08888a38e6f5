mod backend;
mod commands;
mod config;
mod remote;
mod server;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::backend::Backend;
use crate::commands::{
    NotificationArgs, ProfileArgs, SaveOptions, cmd_achievements, cmd_chat, cmd_chat_history,
    cmd_dashboard, cmd_drinks_add, cmd_drinks_set, cmd_drinks_show, cmd_export, cmd_goal_active,
    cmd_goal_list, cmd_goal_set, cmd_goal_target, cmd_import, cmd_notifications_set,
    cmd_notifications_show, cmd_pills_set, cmd_pills_show, cmd_profile_set, cmd_profile_show,
    cmd_reminder_add, cmd_reminder_delete, cmd_reminder_list, cmd_reminder_toggle, cmd_saved_add,
    cmd_saved_categories, cmd_saved_delete, cmd_saved_list, cmd_saved_show, cmd_saved_update,
    cmd_settings_set, cmd_settings_show, cmd_stats, cmd_theme_list, cmd_theme_show,
    cmd_water_add, cmd_water_set, cmd_water_show, cmd_water_status, cmd_weight_delete,
    cmd_weight_log, cmd_weight_progress, cmd_weight_range, cmd_weight_show,
};
use crate::config::{API_KEY_ENV, Config, SERVER_ENV};
use crate::remote::RemoteClient;
use vitalog_core::models::AppSettingsUpdate;
use vitalog_core::service::VitalsService;

#[derive(Parser)]
#[command(
    name = "vitalog",
    version,
    about = "Track pills, drinks and weight from the terminal"
)]
struct Cli {
    /// Use a running `vitalog serve` instead of the local database
    #[arg(long, global = true, env = SERVER_ENV, value_name = "URL")]
    server: Option<String>,
    /// API key for --server
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pills, drinks, weight and the active goal for a day
    Dashboard {
        /// Date (YYYY-MM-DD, DD.MM.YYYY or today/yesterday/tomorrow, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Morning and evening pill tracking
    Pills {
        #[command(subcommand)]
        command: PillsCommands,
    },
    /// Daily drink counters
    Drinks {
        #[command(subcommand)]
        command: DrinksCommands,
    },
    /// Water intake in glasses against a personal daily goal
    Water {
        #[command(subcommand)]
        command: WaterCommands,
    },
    /// Track body weight
    Weight {
        #[command(subcommand)]
        command: WeightCommands,
    },
    /// Manage weight goals
    Goal {
        #[command(subcommand)]
        command: GoalCommands,
    },
    /// Manage daily reminders
    Reminder {
        #[command(subcommand)]
        command: ReminderCommands,
    },
    /// Show or change app settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Show or change notification times
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },
    /// Show or change the user profile used for the water goal
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// List color themes or show a palette
    Theme {
        #[command(subcommand)]
        command: ThemeCommands,
    },
    /// Show badges and their progress
    Achievements {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show level, XP and streaks
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Ask the offline health assistant (interactive without a message)
    Chat {
        /// Question to ask
        message: Option<String>,
        /// Continue an existing session
        #[arg(long)]
        session: Option<String>,
        /// Save the question and answer
        #[arg(long)]
        save: bool,
        /// Title for --save (default: the question)
        #[arg(long, requires = "save")]
        title: Option<String>,
        /// Category for --save (default: guessed from the question)
        #[arg(long, requires = "save")]
        category: Option<String>,
        /// Tag for --save (repeatable)
        #[arg(long = "tag", requires = "save")]
        tags: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the messages of a chat session
    ChatHistory {
        /// Session ID (printed by `chat --json`)
        session_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage saved chat messages
    Saved {
        #[command(subcommand)]
        command: SavedCommands,
    },
    /// Export all data to a JSON file
    Export {
        /// Target directory (default: <data dir>/exports)
        #[arg(long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// Print the snapshot instead of writing a file
        #[arg(long, conflicts_with = "dir")]
        stdout: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace all data with a JSON export
    Import {
        /// Path to the export file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable API key authentication (for development/testing)
        #[arg(long)]
        no_auth: bool,
    },
}

#[derive(Subcommand)]
enum PillsCommands {
    /// Show pills for a day
    Show {
        /// Date (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark pills as taken or not taken
    Set {
        /// Morning pill taken (true/false)
        #[arg(long)]
        morning: Option<bool>,
        /// Evening pill taken (true/false)
        #[arg(long)]
        evening: Option<bool>,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DrinksCommands {
    /// Show drink counters for a day
    Show {
        /// Date (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a counter (negative values become 0)
    Set {
        /// Drink: wasser, abnehmkaffee, ingwer-knoblauch-tee, wasserkur, kaffee
        drink: String,
        /// New count
        #[arg(allow_negative_numbers = true)]
        count: i64,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add to a counter (negative amounts count down)
    Add {
        /// Drink: wasser, abnehmkaffee, ingwer-knoblauch-tee, wasserkur, kaffee
        drink: String,
        /// Amount to add
        #[arg(default_value = "1", allow_negative_numbers = true)]
        amount: i64,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WaterCommands {
    /// Show water intake for a day
    Show {
        /// Date (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set glasses and/or glass size for a day
    Set {
        /// Number of glasses
        #[arg(long)]
        glasses: Option<u32>,
        /// Glass size in ml
        #[arg(long)]
        glass_ml: Option<u32>,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add glasses (negative amounts count down)
    Add {
        /// Glasses to add
        #[arg(default_value = "1", allow_negative_numbers = true)]
        amount: i64,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Progress towards the daily water goal
    Status {
        /// Date (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum WeightCommands {
    /// Log a weight in kg (replaces the entry for that day)
    Log {
        /// Weight in kg ("78.5" or "78,5")
        value: String,
        /// Date (default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show weight for a specific date (default: today)
    Show {
        /// Date (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List weights between two dates
    Range {
        /// First date (default: 30 days before the end date)
        #[arg(long)]
        from: Option<String>,
        /// Last date (default: today)
        #[arg(long)]
        to: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Day-over-day changes for the last N days
    Progress {
        /// Number of days (1-365)
        #[arg(short, long, default_value = "30")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete the weight entry for a date
    Delete {
        /// Date (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum GoalCommands {
    /// Create a goal and make it the active one
    Set {
        /// Target weight in kg
        #[arg(long, conflicts_with = "percent")]
        weight: Option<String>,
        /// Percentage of the start weight to lose
        #[arg(long)]
        percent: Option<f64>,
        /// Start weight in kg (default: latest logged weight)
        #[arg(long)]
        start: Option<String>,
        /// Start date (default: today)
        #[arg(long)]
        from: Option<String>,
        /// Target date
        #[arg(long)]
        by: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List all goals, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the active goal
    Active {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Daily target for the active goal
    Target {
        /// Current weight in kg (default: latest logged weight)
        current: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ReminderCommands {
    /// Add a reminder
    Add {
        /// Type: pills_morning, pills_evening, weight, drinks
        reminder_type: String,
        /// Time of day (HH:MM)
        time: String,
        /// Create the reminder disabled
        #[arg(long)]
        disabled: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List reminders
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Enable a reminder
    Enable {
        /// Reminder ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Disable a reminder
    Disable {
        /// Reminder ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a reminder
    Delete {
        /// Reminder ID
        id: String,
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
    /// Change one or more settings
    Set {
        /// Theme: pink, blue, green
        #[arg(long)]
        theme: Option<String>,
        /// Language code
        #[arg(long)]
        language: Option<String>,
        /// Sound on/off (true/false)
        #[arg(long)]
        sound: Option<bool>,
        /// Vibration on/off (true/false)
        #[arg(long)]
        vibration: Option<bool>,
        /// Analytics on/off (true/false)
        #[arg(long)]
        analytics: Option<bool>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum NotificationCommands {
    /// Show notification times
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one or more notification times (HH:MM or a bare hour)
    Set {
        /// Morning pill time
        #[arg(long)]
        morning: Option<String>,
        /// Evening pill time
        #[arg(long)]
        evening: Option<String>,
        /// Water reminder times, comma separated (replaces the list)
        #[arg(long, value_delimiter = ',')]
        water: Option<Vec<String>>,
        /// Weight reminder time
        #[arg(long)]
        weight: Option<String>,
        /// Motivation reminder time
        #[arg(long)]
        motivation: Option<String>,
        /// Notifications on/off (true/false)
        #[arg(long)]
        enabled: Option<bool>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create or update the profile
    Set {
        /// Height in cm
        #[arg(long)]
        height: Option<f64>,
        /// Age in years
        #[arg(long)]
        age: Option<u32>,
        /// Gender: male, female, other
        #[arg(long)]
        gender: Option<String>,
        /// Activity level: low, medium, high
        #[arg(long)]
        activity: Option<String>,
        /// Default glass size in ml
        #[arg(long)]
        glass_size: Option<u32>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ThemeCommands {
    /// List available themes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a theme's colors (default: the current theme)
    Show {
        /// Theme name
        name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SavedCommands {
    /// List saved messages, newest first
    List {
        /// Only this category
        #[arg(long)]
        category: Option<String>,
        /// Only messages with this tag
        #[arg(long)]
        tag: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save a question and answer
    Add {
        /// The question
        question: String,
        /// The answer
        answer: String,
        /// Title (default: the question)
        #[arg(long)]
        title: Option<String>,
        /// Category (default: guessed from the question)
        #[arg(long)]
        category: Option<String>,
        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one saved message
    Show {
        /// Message ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change title, category or tags
    Update {
        /// Message ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New category
        #[arg(long)]
        category: Option<String>,
        /// Replace tags (repeatable)
        #[arg(long = "tag")]
        tags: Option<Vec<String>>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a saved message
    Delete {
        /// Message ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count saved messages per category
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if matches!(cli.command, Commands::Serve { .. }) {
        "info"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

#[allow(clippy::too_many_lines)]
async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    let backend = match cli.server {
        Some(ref url) => Backend::Remote(RemoteClient::new(url, cli.api_key.clone())?),
        None => Backend::Local(VitalsService::new(&config.db_path)?),
    };
    let b = &backend;

    match cli.command {
        Commands::Dashboard { date, json } => cmd_dashboard(b, date, json).await,
        Commands::Pills { command } => match command {
            PillsCommands::Show { date, json } => cmd_pills_show(b, date, json).await,
            PillsCommands::Set {
                morning,
                evening,
                date,
                json,
            } => cmd_pills_set(b, morning, evening, date, json).await,
        },
        Commands::Drinks { command } => match command {
            DrinksCommands::Show { date, json } => cmd_drinks_show(b, date, json).await,
            DrinksCommands::Set {
                drink,
                count,
                date,
                json,
            } => cmd_drinks_set(b, &drink, count, date, json).await,
            DrinksCommands::Add {
                drink,
                amount,
                date,
                json,
            } => cmd_drinks_add(b, &drink, amount, date, json).await,
        },
        Commands::Water { command } => match command {
            WaterCommands::Show { date, json } => cmd_water_show(b, date, json).await,
            WaterCommands::Set {
                glasses,
                glass_ml,
                date,
                json,
            } => cmd_water_set(b, glasses, glass_ml, date, json).await,
            WaterCommands::Add { amount, date, json } => cmd_water_add(b, amount, date, json).await,
            WaterCommands::Status { date, json } => cmd_water_status(b, date, json).await,
        },
        Commands::Weight { command } => match command {
            WeightCommands::Log { value, date, json } => {
                cmd_weight_log(b, &value, date, json).await
            }
            WeightCommands::Show { date, json } => cmd_weight_show(b, date, json).await,
            WeightCommands::Range { from, to, json } => cmd_weight_range(b, from, to, json).await,
            WeightCommands::Progress { days, json } => cmd_weight_progress(b, days, json).await,
            WeightCommands::Delete { date, json } => cmd_weight_delete(b, date, json).await,
        },
        Commands::Goal { command } => match command {
            GoalCommands::Set {
                weight,
                percent,
                start,
                from,
                by,
                json,
            } => cmd_goal_set(b, weight, percent, start, from, &by, json).await,
            GoalCommands::List { json } => cmd_goal_list(b, json).await,
            GoalCommands::Active { json } => cmd_goal_active(b, json).await,
            GoalCommands::Target { current, json } => cmd_goal_target(b, current, json).await,
        },
        Commands::Reminder { command } => match command {
            ReminderCommands::Add {
                reminder_type,
                time,
                disabled,
                json,
            } => cmd_reminder_add(b, &reminder_type, &time, disabled, json).await,
            ReminderCommands::List { json } => cmd_reminder_list(b, json).await,
            ReminderCommands::Enable { id, json } => cmd_reminder_toggle(b, &id, true, json).await,
            ReminderCommands::Disable { id, json } => {
                cmd_reminder_toggle(b, &id, false, json).await
            }
            ReminderCommands::Delete { id, json } => cmd_reminder_delete(b, &id, json).await,
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(b, json).await,
            SettingsCommands::Set {
                theme,
                language,
                sound,
                vibration,
                analytics,
                json,
            } => {
                let update = AppSettingsUpdate {
                    theme,
                    language,
                    sound_enabled: sound,
                    vibration_enabled: vibration,
                    analytics_enabled: analytics,
                };
                cmd_settings_set(b, &update, json).await
            }
        },
        Commands::Notifications { command } => match command {
            NotificationCommands::Show { json } => cmd_notifications_show(b, json).await,
            NotificationCommands::Set {
                morning,
                evening,
                water,
                weight,
                motivation,
                enabled,
                json,
            } => {
                let args = NotificationArgs {
                    morning,
                    evening,
                    water,
                    weight,
                    motivation,
                    enabled,
                };
                cmd_notifications_set(b, args, json).await
            }
        },
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(b, json).await,
            ProfileCommands::Set {
                height,
                age,
                gender,
                activity,
                glass_size,
                json,
            } => {
                let args = ProfileArgs {
                    height,
                    age,
                    gender,
                    activity,
                    glass_size,
                };
                cmd_profile_set(b, args, json).await
            }
        },
        Commands::Theme { command } => match command {
            ThemeCommands::List { json } => cmd_theme_list(json),
            ThemeCommands::Show { name, json } => cmd_theme_show(b, name, json).await,
        },
        Commands::Achievements { json } => cmd_achievements(b, json).await,
        Commands::Stats { json } => cmd_stats(b, json).await,
        Commands::Chat {
            message,
            session,
            save,
            title,
            category,
            tags,
            json,
        } => {
            let save = save.then_some(SaveOptions {
                title,
                category,
                tags,
            });
            cmd_chat(b, message, session, save, json).await
        }
        Commands::ChatHistory { session_id, json } => cmd_chat_history(b, &session_id, json).await,
        Commands::Saved { command } => match command {
            SavedCommands::List {
                category,
                tag,
                json,
            } => cmd_saved_list(b, category.as_deref(), tag.as_deref(), json).await,
            SavedCommands::Add {
                question,
                answer,
                title,
                category,
                tags,
                json,
            } => {
                let opts = SaveOptions {
                    title,
                    category,
                    tags,
                };
                cmd_saved_add(b, question, answer, opts, json).await
            }
            SavedCommands::Show { id, json } => cmd_saved_show(b, &id, json).await,
            SavedCommands::Update {
                id,
                title,
                category,
                tags,
                json,
            } => cmd_saved_update(b, &id, title, category.as_deref(), tags, json).await,
            SavedCommands::Delete { id, json } => cmd_saved_delete(b, &id, json).await,
            SavedCommands::Categories { json } => cmd_saved_categories(b, json).await,
        },
        Commands::Export { dir, stdout, json } => {
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            cmd_export(b, &dir, stdout, json).await
        }
        Commands::Import { file, json } => cmd_import(b, &file, json).await,
        Commands::Serve {
            port,
            bind,
            no_auth,
        } => {
            let Backend::Local(svc) = backend else {
                bail!("`serve` always uses the local database; drop --server");
            };
            let (api_key, new_api_key) = if no_auth {
                (None, false)
            } else {
                let (key, new) = config.load_or_create_api_key()?;
                (Some(key), new)
            };
            server::start_server(svc, port, &bind, api_key, new_api_key).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_drink_count() {
        let cli = Cli::try_parse_from(["vitalog", "drinks", "set", "wasser", "-2"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Drinks {
                command: DrinksCommands::Set { count: -2, .. }
            }
        ));
    }

    #[test]
    fn test_parse_global_server_flag() {
        let cli = Cli::try_parse_from([
            "vitalog",
            "weight",
            "log",
            "78,5",
            "--server",
            "http://localhost:8080",
        ])
        .unwrap();
        assert_eq!(cli.server.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_chat_save_options_require_save() {
        assert!(Cli::try_parse_from(["vitalog", "chat", "Hallo", "--title", "x"]).is_err());
        assert!(
            Cli::try_parse_from(["vitalog", "chat", "Hallo", "--save", "--title", "x"]).is_ok()
        );
    }

    #[test]
    fn test_parse_notification_water_list() {
        let cli = Cli::try_parse_from([
            "vitalog",
            "notifications",
            "set",
            "--water",
            "9,13:30,18",
        ])
        .unwrap();
        let Commands::Notifications {
            command: NotificationCommands::Set { water, .. },
        } = cli.command
        else {
            panic!("expected notifications set");
        };
        assert_eq!(
            water,
            Some(vec!["9".to_string(), "13:30".to_string(), "18".to_string()])
        );
    }

    #[test]
    fn test_parse_water_add_negative() {
        let cli = Cli::try_parse_from(["vitalog", "water", "add", "-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Water {
                command: WaterCommands::Add { amount: -1, .. }
            }
        ));
    }
}
