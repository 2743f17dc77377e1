mod addresses;
mod api;
mod cli;
mod collate;
mod config;
mod database;
mod error;
mod query;
mod schema;
mod seed;
mod server;
mod tasks;
mod utils;

use cli::Cli;
use config::{Config, CONFIG};
use directories::ProjectDirs;
use flexi_logger::Logger;
use log::{error, info};

fn main() {
    let Some(project_dirs) = ProjectDirs::from("", "", "deliverydesk") else {
        eprintln!("Could not determine the application data directory");
        std::process::exit(1);
    };

    let config = Config::load_config(&project_dirs);
    let log_spec = format!("deliverydesk={}", config.logging.deliverydesk);
    // Only main sets the cell, so this cannot already be initialised
    let _ = CONFIG.set(config);

    // RUST_LOG overrides the configured level
    let _logger = match Logger::try_with_env_or_str(&log_spec).and_then(|logger| logger.start()) {
        Ok(handle) => Some(handle),
        Err(e) => {
            eprintln!("Failed to start logger: {}", e);
            None
        }
    };

    info!("deliverydesk {} starting", env!("CARGO_PKG_VERSION"));

    if let Err(err) = Cli::handle_command_line(&project_dirs) {
        error!("Exiting with error: {}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
