use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::TransactionalBackend;
use super::constants::{
    DEFAULT_CLI_BASE_URL, ENV_API_SECRET, ENV_CLI_BASE_URL, ENV_CLI_SESSION, ENV_CONFIG, ENV_HOST,
    ENV_PORT, ENV_POSTGRES_URL, ENV_SQLITE_PATH, ENV_TRANSACTIONAL_BACKEND,
};

#[derive(Parser)]
#[command(name = "observe")]
#[command(version, about = "Telemetry collection backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to a JSON config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Secret used to MAC API keys before they are stored
    #[arg(long, global = true, env = ENV_API_SECRET, hide_env_values = true)]
    pub api_secret: Option<String>,

    /// Transactional backend: sqlite (default) or postgres
    #[arg(long, global = true, env = ENV_TRANSACTIONAL_BACKEND, value_parser = parse_transactional_backend)]
    pub transactional_backend: Option<TransactionalBackend>,

    /// PostgreSQL connection URL
    #[arg(long, global = true, env = ENV_POSTGRES_URL, hide_env_values = true)]
    pub postgres_url: Option<String>,

    /// SQLite database file
    #[arg(long, global = true, env = ENV_SQLITE_PATH)]
    pub sqlite_path: Option<PathBuf>,
}

fn parse_transactional_backend(s: &str) -> Result<TransactionalBackend, String> {
    match s.to_lowercase().as_str() {
        "sqlite" => Ok(TransactionalBackend::Sqlite),
        "postgres" | "postgresql" => Ok(TransactionalBackend::Postgres),
        _ => Err(format!(
            "Invalid transactional backend '{}'. Valid options: sqlite, postgres",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Talk to a running server as a dashboard user
    Client {
        /// Server base URL
        #[arg(long, env = ENV_CLI_BASE_URL, default_value = DEFAULT_CLI_BASE_URL)]
        url: String,

        /// Session token from `sign-in`
        #[arg(long, env = ENV_CLI_SESSION, hide_env_values = true)]
        session: Option<String>,

        #[command(subcommand)]
        command: ClientCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum ClientCommands {
    /// Create a user
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Sign in and print the session token
    SignIn {
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Team management
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },
    /// Application management
    App {
        #[command(subcommand)]
        command: AppCommands,
    },
    /// API key management
    Key {
        #[command(subcommand)]
        command: KeyCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum TeamCommands {
    /// Create a team owned by the signed-in user
    Create {
        #[arg(long)]
        name: String,
    },
    /// List the teams of the signed-in user
    List,
}

#[derive(Subcommand, Clone, Debug)]
pub enum AppCommands {
    /// Create an application in a team
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        team_id: i64,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum KeyCommands {
    /// Create an API key and print it once
    Create {
        #[arg(long)]
        app_id: i64,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub api_secret: Option<String>,
    pub transactional_backend: Option<TransactionalBackend>,
    pub postgres_url: Option<String>,
    pub sqlite_path: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        api_secret: cli.api_secret,
        transactional_backend: cli.transactional_backend,
        postgres_url: cli.postgres_url,
        sqlite_path: cli.sqlite_path,
    };
    (config, cli.command)
}
