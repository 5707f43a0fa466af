//! Configuration loading and root folder resolution
//!
//! Every setting resolves in the same priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or malformed TOML file never stops a service from starting;
//! it is logged and the compiled defaults apply.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "GOLDREC_CONFIG";

/// Environment variable overriding the data root folder
pub const ROOT_FOLDER_ENV_VAR: &str = "GOLDREC_ROOT_FOLDER";

/// File name of the service database inside the root folder
pub const DATABASE_FILE_NAME: &str = "goldrec.db";

/// Logging section of the TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter level when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Identity seed: a user known to the role provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSeed {
    pub id: String,
    pub role: String,
}

/// Contents of `<config dir>/goldrec/<module>.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub bind_address: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    /// Run without a database (in-memory collaborators)
    #[serde(default)]
    pub in_memory: Option<bool>,
    /// EventBus channel capacity
    #[serde(default)]
    pub event_capacity: Option<usize>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub users: Vec<UserSeed>,
}

/// Compiled fallbacks used when nothing else supplies a value
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub event_capacity: usize,
}

impl CompiledDefaults {
    /// Defaults for the platform this binary was built for
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            bind_address: "127.0.0.1".to_string(),
            port: 5790,
            log_level: default_log_level(),
            event_capacity: 256,
        }
    }
}

/// OS-dependent default data folder
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/goldrec (or /var/lib/goldrec for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("goldrec"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/goldrec"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("goldrec"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/goldrec"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("goldrec"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\goldrec"))
    } else {
        PathBuf::from("./goldrec_data")
    }
}

/// Platform config file path for a module: `<config dir>/goldrec/<module>.toml`
pub fn default_config_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("goldrec").join(format!("{}.toml", module_name)))
}

/// Pick the config file: CLI path, then `GOLDREC_CONFIG`, then platform default
pub fn resolve_config_path(cli_path: Option<&Path>, module_name: &str) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path(module_name)
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Load a TOML config, falling back to defaults on any failure
pub fn load_toml_config_or_default(path: Option<&Path>) -> TomlConfig {
    let Some(path) = path else {
        info!("No config file location available, using compiled defaults");
        return TomlConfig::default();
    };

    if !path.exists() {
        info!("Config file {} not found, using compiled defaults", path.display());
        return TomlConfig::default();
    }

    match load_toml_config(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("{} - continuing with compiled defaults", e);
            TomlConfig::default()
        }
    }
}

/// Root folder resolution for one module
pub struct RootFolderResolver {
    module_name: String,
}

impl RootFolderResolver {
    pub fn new(module_name: impl Into<String>) -> Self {
        Self {
            module_name: module_name.into(),
        }
    }

    /// Resolve the data folder from CLI, environment, TOML, then compiled default
    pub fn resolve(&self, cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
        if let Some(path) = cli_arg {
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV_VAR) {
            if !path.trim().is_empty() {
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &toml_config.root_folder {
            return path.clone();
        }

        let fallback = CompiledDefaults::for_current_platform().root_folder;
        info!(
            module = %self.module_name,
            "Root folder not configured, using default {}",
            fallback.display()
        );
        fallback
    }
}

/// Creates the root folder and locates files inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    /// Create the root folder if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder {}", self.root_folder.display());
        }
        Ok(())
    }

    /// Path of the service database inside the root folder
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }
}
