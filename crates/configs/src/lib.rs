use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use std::time::Duration;

/// File name of the per-type freshness marker. Data files must not reuse it.
pub const MARKER_FILENAME: &str = "last-modified";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub health: HealthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Bucket location used when provisioning; blank means backend default.
    #[serde(default)]
    pub location: String,
    #[serde(default = "default_root_folder")]
    pub root_folder: String,
    #[serde(default = "default_data_filename")]
    pub data_filename: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            location: String::new(),
            root_folder: default_root_folder(),
            data_filename: default_data_filename(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self { workers: default_workers() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_health_interval")]
    pub interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self { interval_secs: default_health_interval() }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub json: bool,
}

fn default_bucket() -> String { "config-store".to_string() }
fn default_root_folder() -> String { "store".to_string() }
fn default_data_filename() -> String { "specification.json".to_string() }
fn default_workers() -> usize { 2 }
fn default_health_interval() -> u64 { 30 }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

/// Parse the config file at `path`; a missing file yields `None`.
/// Unreadable or malformed files are errors.
pub fn load_optional_file(path: &str) -> Result<Option<AppConfig>> {
    match std::fs::read_to_string(path) {
        Ok(content) => load_from_str(&content)
            .map(Some)
            .map_err(|e| anyhow!("parsing {path}: {e}")),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(anyhow!("reading {path}: {e}")),
    }
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load the config file if there is one, otherwise start from defaults.
    /// Returns the validated config and whether it came from a file.
    pub fn load_or_default() -> Result<(Self, bool)> {
        let _ = dotenvy::dotenv();
        Self::validated(load_optional_file(&config_path())?)
    }

    fn validated(loaded: Option<AppConfig>) -> Result<(Self, bool)> {
        let from_file = loaded.is_some();
        let mut cfg = loaded.unwrap_or_default();
        cfg.normalize_and_validate()?;
        Ok((cfg, from_file))
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.storage.normalize_from_env();
        self.storage.normalize();
        self.storage.validate()?;
        self.refresh.normalize();
        self.health.validate()?;
        Ok(())
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health.interval_secs)
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        if let Ok(bucket) = std::env::var("STORAGE_BUCKET") {
            if !bucket.trim().is_empty() {
                self.bucket = bucket;
            }
        }
    }

    fn normalize(&mut self) {
        self.bucket = self.bucket.trim().to_string();
        self.location = self.location.trim().to_string();
        self.root_folder = self.root_folder.trim().trim_matches('/').to_string();
        self.data_filename = self.data_filename.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.is_empty() {
            return Err(anyhow!("storage.bucket is empty; set it in config.toml or STORAGE_BUCKET"));
        }
        if self.root_folder.is_empty() {
            return Err(anyhow!("storage.root_folder must not be empty"));
        }
        if self.data_filename.is_empty() || self.data_filename.contains('/') {
            return Err(anyhow!("storage.data_filename must be a plain, non-empty file name"));
        }
        if self.data_filename == MARKER_FILENAME {
            return Err(anyhow!("storage.data_filename must differ from the marker file name `{MARKER_FILENAME}`"));
        }
        Ok(())
    }

    /// Location to pin on bucket creation, if one is configured.
    pub fn location(&self) -> Option<&str> {
        if self.location.is_empty() { None } else { Some(&self.location) }
    }
}

impl HealthConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interval_secs == 0 {
            return Err(anyhow!("health.interval_secs must be at least 1"));
        }
        Ok(())
    }
}

impl RefreshConfig {
    fn normalize(&mut self) {
        if self.workers == 0 {
            self.workers = 1;
        }
    }
}
