//! `user-directory`: headless REST server for the scoped user directory.
//!
//! ```sh
//! user-directory                                   # ~/.config/user-directory/config.toml
//! user-directory --config /etc/user-directory.toml --api-port 8080
//! user-directory --check                           # validate and print the effective config
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use user_directory::config::{AppConfig, ConfigError, CONFIG_ENV};
use user_directory::server::{init_tracing, ServerHandle, ServerOptions};

#[derive(Parser, Debug)]
#[command(
    name = "user-directory",
    version,
    about = "Scoped user directory REST server",
    long_about = "Lists, creates, edits, soft-deletes and restores users. \
                  Holders of super_admin are hidden from everyone who does \
                  not hold the role."
)]
struct Cli {
    /// Configuration file (TOML). Missing file means built-in defaults.
    #[arg(short, long, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Listen port, overriding `server.api_port`.
    #[arg(long)]
    api_port: Option<u16>,

    /// Log filter, overriding `logging.level` (RUST_LOG still wins).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Load and print the effective configuration, then exit.
    #[arg(long)]
    check: bool,

    /// Do not run database migrations on startup.
    #[arg(long)]
    no_migrate: bool,

    /// Do not create the default admin on an empty database.
    #[arg(long)]
    no_admin: bool,
}

impl Cli {
    fn effective_config(&self) -> Result<(PathBuf, AppConfig), ConfigError> {
        let path = self
            .config
            .clone()
            .unwrap_or_else(user_directory::default_config_path);
        let mut config = AppConfig::load(&path)?;

        if let Some(port) = self.api_port {
            config.server.api_port = port;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok((path, config))
    }
}

fn print_summary(path: &Path, config: &AppConfig) {
    println!("Configuration OK: {}", path.display());
    println!("  listen          {}:{}", config.server.api_host, config.server.api_port);
    println!("  database        {}", config.database.connection_url());
    println!("  log level       {}", config.logging.level);
    println!("  email policy    {:?}", config.directory.email_uniqueness);
    println!("  seeded roles    {}", config.directory.roles_to_seed().join(", "));
    println!("  default admin   {}", config.admin.email);
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (path, config) = match cli.effective_config() {
        Ok(loaded) => loaded,
        Err(e) => {
            // No subscriber yet.
            eprintln!("user-directory: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if cli.check {
        print_summary(&path, &config);
        return ExitCode::SUCCESS;
    }

    init_tracing(&config);
    info!(path = %path.display(), "Configuration loaded");

    let options = ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
        create_default_admin: !cli.no_admin,
    };
    let handle = match ServerHandle::start(options).await {
        Ok(handle) => handle,
        Err(e) => {
            error!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    handle.install_signal_handler();
    handle.shutdown_signal().wait().await;
    handle.wait().await;

    ExitCode::SUCCESS
}
