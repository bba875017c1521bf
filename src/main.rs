mod cli;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "eating-meeting", version, about = "Eating Meeting: diagnostic tools for the client core")]
struct App {
    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search restaurants around a point (falls back to seed places)
    Places {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Visible latitude span of the viewport
        #[arg(long)]
        delta: Option<f64>,
    },
    /// Print the built-in seed places, optionally around a point
    SeedPlaces {
        #[arg(long, requires = "lng", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lng: Option<f64>,
    },
    /// Manage the local database
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
    /// View or modify configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Create or migrate the local SQLite store
    Init {
        /// Database path (defaults to {data_dir}/local.db)
        #[arg(long)]
        path: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Display the full configuration
    Show,
    /// Get a config value (dot notation: places.page_size)
    Get {
        /// Config key (dot notation)
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key (dot notation)
        key: String,
        /// Value (JSON: true, false, 42, "string")
        value: String,
    },
}

fn main() {
    let app = App::parse();
    eating_meeting::tracing_init::init_stderr_tracing(app.verbose);

    let result = match app.command {
        Commands::Places { lat, lng, delta } => cli::places::run_search(lat, lng, delta),
        Commands::SeedPlaces { lat, lng } => cli::places::run_seeds(lat.zip(lng)),
        Commands::Db { action } => match action {
            DbAction::Init { path } => cli::db::init(path.as_deref()),
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::config::run_show(),
            ConfigAction::Get { key } => cli::config::run_get(&key),
            ConfigAction::Set { key, value } => cli::config::run_set(&key, &value),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
