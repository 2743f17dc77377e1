use std::fs;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use directories::ProjectDirs;
use log::info;
use serde::Serialize;

use crate::addresses::DeliveryAddress;
use crate::config::Config;
use crate::database::Database;
use crate::error::AppError;
use crate::query::ListRequest;
use crate::seed::{self, DEFAULT_TASK_COUNT};
use crate::tasks::Task;

#[derive(Parser)]
#[command(
    name = "deliverydesk",
    version,
    about = "DeliveryDesk: admin data service for delivery addresses and tasks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the server (default if no command specified)
    Serve,

    /// Load the sample addresses and generated tasks
    Seed {
        /// Delete existing addresses and tasks first
        #[arg(long, default_value_t = false)]
        reset: bool,

        /// Number of tasks to generate
        #[arg(long, default_value_t = DEFAULT_TASK_COUNT)]
        tasks: usize,
    },

    /// Print one page of a resource as JSON
    List {
        #[arg(value_enum)]
        resource: Resource,

        /// List parameter as key=value, e.g. --param sort=createdAt.asc --param status=done,todo
        #[arg(long = "param", short = 'p', value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    Addresses,
    Tasks,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_owned(), value.to_owned()))
        }
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

impl Cli {
    pub fn handle_command_line(project_dirs: &ProjectDirs) -> Result<(), AppError> {
        let args = Cli::parse();
        let db = Self::open_database(project_dirs)?;

        // Default to Serve if no command specified
        match args.command.unwrap_or(Command::Serve) {
            Command::Serve => Self::start_server(db),
            Command::Seed { reset, tasks } => {
                let summary = seed::seed(&db, tasks, reset)?;
                println!(
                    "Seeded {} addresses and {} tasks",
                    summary.addresses, summary.tasks
                );
                Ok(())
            }
            Command::List { resource, params } => {
                let request = ListRequest::from_params(params)?;
                match resource {
                    Resource::Addresses => print_json(&DeliveryAddress::list(&db, &request)),
                    Resource::Tasks => print_json(&Task::list(&db, &request)),
                }
            }
        }
    }

    fn open_database(project_dirs: &ProjectDirs) -> Result<Database, AppError> {
        let config = Config::get();
        let db_dir = config.database_dir(project_dirs);
        fs::create_dir_all(&db_dir)?;

        Database::open(
            &db_dir,
            config.database.pool_size,
            Duration::from_secs(config.database.connection_timeout_secs),
        )
    }

    fn start_server(db: Database) -> Result<(), AppError> {
        let host = Config::get_server_host();
        let port = Config::get_server_port();

        info!("Starting server on {}:{}", host, port);

        let rt = tokio::runtime::Runtime::new()
            .map_err(|e| AppError::Error(format!("Failed to create runtime: {}", e)))?;

        rt.block_on(async {
            let web_server = crate::server::WebServer::new(host, port, db);
            web_server.start().await
        })
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Error(format!("Failed to serialize output: {}", e)))?;
    println!("{json}");
    Ok(())
}
