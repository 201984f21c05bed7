use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    /// Экспорт в Google Sheets; без секции экспорт недоступен
    pub sheets: Option<SheetsConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Сервисный аккаунт Google для выгрузки спецификаций
#[derive(Debug, Deserialize, Clone)]
pub struct SheetsConfig {
    pub client_email: String,
    /// Путь к PEM-файлу приватного ключа сервисного аккаунта
    pub private_key_path: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
bind = "0.0.0.0:3000"

[database]
path = "target/db/app.db"
"#;

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    // Try to find config.toml next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    // Fall back to default config
    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Store the loaded configuration for the lifetime of the process
pub fn init_config(config: Config) -> anyhow::Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Config already initialized"))
}

pub fn get_config() -> &'static Config {
    CONFIG.get().expect("Config has not been initialized")
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    // If absolute path, use as is
    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    // If relative path, resolve it relative to the executable directory
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(db_path));
        }
    }

    // Last resort: relative to the current directory
    Ok(db_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.server.bind, "0.0.0.0:3000");
        assert_eq!(config.database.path, "target/db/app.db");
        assert!(config.sheets.is_none());
    }

    #[test]
    fn sheets_section_is_optional_with_default_token_uri() {
        let config: Config = toml::from_str(
            r#"
            [database]
            path = "db.sqlite"

            [sheets]
            client_email = "svc@project.iam.gserviceaccount.com"
            private_key_path = "sa.pem"
            "#,
        )
        .unwrap();

        let sheets = config.sheets.unwrap();
        assert_eq!(sheets.token_uri, "https://oauth2.googleapis.com/token");
        // секция server не обязательна
        assert_eq!(config.server.bind, "0.0.0.0:3000");
    }
}
