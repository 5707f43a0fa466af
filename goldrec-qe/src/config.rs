//! Configuration resolution for goldrec-qe
//!
//! Provides multi-tier resolution with CLI/ENV → TOML → compiled default
//! priority for every setting.

use std::path::PathBuf;

use clap::Parser;
use goldrec_common::config::{
    load_toml_config_or_default, resolve_config_path, CompiledDefaults, RootFolderResolver,
    TomlConfig,
};
use tracing::warn;

use crate::models::{Role, User};

/// Module name used for the config file and log filter
pub const MODULE_NAME: &str = "goldrec-qe";

/// Command-line arguments for goldrec-qe
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "goldrec-qe")]
#[command(about = "Golden recipe quality scoring and certification service")]
#[command(version)]
pub struct CliArgs {
    /// TOML config file (overrides GOLDREC_CONFIG and the platform default)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Data folder holding the database
    #[arg(short, long)]
    pub root_folder: Option<PathBuf>,

    /// Address to bind the HTTP server to
    #[arg(long, env = "GOLDREC_QE_BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "GOLDREC_QE_PORT")]
    pub port: Option<u16>,

    /// Keep all state in memory (no database)
    #[arg(long, env = "GOLDREC_QE_IN_MEMORY")]
    pub in_memory: bool,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "GOLDREC_QE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// Fully resolved service settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub in_memory: bool,
    pub event_capacity: usize,
    /// Identity provider seed
    pub users: Vec<User>,
}

impl ServiceConfig {
    /// Load the TOML file the CLI/ENV points at, then merge
    pub fn load(cli: &CliArgs) -> Self {
        let config_path = resolve_config_path(cli.config.as_deref(), MODULE_NAME);
        let toml_config = load_toml_config_or_default(config_path.as_deref());
        Self::resolve(cli, &toml_config)
    }

    /// Merge already-loaded sources
    pub fn resolve(cli: &CliArgs, toml_config: &TomlConfig) -> Self {
        let defaults = CompiledDefaults::for_current_platform();
        let root_folder =
            RootFolderResolver::new(MODULE_NAME).resolve(cli.root_folder.as_deref(), toml_config);

        let event_capacity = match toml_config.event_capacity {
            Some(0) => {
                warn!("event_capacity must be positive, using {}", defaults.event_capacity);
                defaults.event_capacity
            }
            Some(capacity) => capacity,
            None => defaults.event_capacity,
        };

        let users = toml_config
            .users
            .iter()
            .filter(|seed| !seed.id.trim().is_empty())
            .map(|seed| User::new(seed.id.trim(), Role::parse(&seed.role)))
            .collect();

        Self {
            root_folder,
            bind_address: cli
                .bind_address
                .clone()
                .or_else(|| toml_config.bind_address.clone())
                .unwrap_or(defaults.bind_address),
            port: cli.port.or(toml_config.port).unwrap_or(defaults.port),
            log_level: cli
                .log_level
                .clone()
                .unwrap_or_else(|| toml_config.logging.level.clone()),
            in_memory: cli.in_memory || toml_config.in_memory.unwrap_or(false),
            event_capacity,
            users,
        }
    }
}
