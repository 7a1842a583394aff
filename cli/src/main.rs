mod commands;
mod config;
mod page;
mod server;
mod supabase;

use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{
    cmd_cute, cmd_export, cmd_interval, cmd_list, cmd_show, cmd_snooze, cmd_status, cmd_water,
};
use crate::config::Config;
use crate::supabase::SupabaseStore;
use frond_core::catalog::{load_catalog, load_catalog_or_empty};
use frond_core::service::ScheduleService;
use frond_core::settings::{FileBackend, SettingsService};

#[derive(Parser)]
#[command(
    name = "frond",
    version,
    about = "A plant-care catalog and watering schedule tracker",
    long_about = "\n\n  ███████╗██████╗  ██████╗ ███╗   ██╗██████╗
  ██╔════╝██╔══██╗██╔═══██╗████╗  ██║██╔══██╗
  █████╗  ██████╔╝██║   ██║██╔██╗ ██║██║  ██║
  ██╔══╝  ██╔══██╗██║   ██║██║╚██╗██║██║  ██║
  ██║     ██║  ██║╚██████╔╝██║ ╚████║██████╔╝
  ╚═╝     ╚═╝  ╚═╝ ╚═════╝ ╚═╝  ╚═══╝╚═════╝
          know when to water.
"
)]
struct Cli {
    /// Path to the plant catalog CSV (default: $FROND_CATALOG, else plants.csv)
    #[arg(long, global = true, value_name = "PATH")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all plants, grouped by category
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one plant's catalog entry
    Show {
        /// Plant name (case-insensitive)
        plant: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show watering schedules for all plants, or one
    Status {
        /// Plant name (case-insensitive); omit for the whole catalog
        plant: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a plant watered now
    Water {
        /// Plant name (case-insensitive)
        plant: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Push a plant's next due date back two days
    Snooze {
        /// Plant name (case-insensitive)
        plant: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set a plant's watering interval
    Interval {
        /// Plant name (case-insensitive)
        plant: String,
        /// Interval in days (positive)
        days: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or flip the cute-mode display setting
    Cute {
        /// Turn cute mode on
        #[arg(long, conflicts_with = "off")]
        on: bool,
        /// Turn cute mode off
        #[arg(long)]
        off: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export the care guide
    Export {
        /// Output format: markdown or html
        #[arg(short, long, default_value = "markdown")]
        format: String,
        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Start the catalog web page and JSON API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Directory plant images are served from
        #[arg(long, default_value = "plants", value_name = "DIR")]
        images: PathBuf,
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
    let catalog_path = cli.catalog.unwrap_or_else(config::default_catalog_path);
    let service = ScheduleService::new(SupabaseStore::new(config.store.clone()));

    match cli.command {
        Commands::List { json } => cmd_list(&load_catalog(&catalog_path)?, json),
        Commands::Show { plant, json } => cmd_show(&load_catalog(&catalog_path)?, &plant, json),
        Commands::Status { plant, json } => {
            cmd_status(&load_catalog(&catalog_path)?, &service, plant.as_deref(), json).await
        }
        Commands::Water { plant, json } => {
            cmd_water(&load_catalog(&catalog_path)?, &service, &plant, json).await
        }
        Commands::Snooze { plant, json } => {
            cmd_snooze(&load_catalog(&catalog_path)?, &service, &plant, json).await
        }
        Commands::Interval { plant, days, json } => {
            cmd_interval(&load_catalog(&catalog_path)?, &service, &plant, days, json).await
        }
        Commands::Cute { on, off, json } => {
            let set_to = match (on, off) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            cmd_cute(config.settings_path, set_to, json)
        }
        Commands::Export { format, output } => {
            cmd_export(&load_catalog(&catalog_path)?, &format, output.as_deref())
        }
        Commands::Serve { port, bind, images } => {
            // The page degrades to an empty catalog rather than refusing
            // to start; the CLI commands above keep the hard error.
            let plants = load_catalog_or_empty(&catalog_path);
            let settings = SettingsService::load(Box::new(FileBackend::new(config.settings_path)));
            let state = server::AppState::new(plants, service, settings);
            server::start_server(state, &bind, port, images).await
        }
    }
}
