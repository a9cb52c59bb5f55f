use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, info};

/// Environment variable overriding `host.platform`.
pub const PLATFORM_ENV: &str = "ACE_PLATFORM";
/// Default host storage quota, matching the webview local-storage limit.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HostConfig {
    /// Platform identifier in the webview's vocabulary (`win32`, `darwin`, `linux`).
    #[serde(default = "default_platform")]
    pub platform: String,
    /// Project opened at startup; simvar presets live under it.
    #[serde(default)]
    pub project_dir: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self { platform: default_platform(), project_dir: None }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_storage_file")]
    pub file: String,
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file: default_storage_file(),
            quota_bytes: default_quota_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { user_agent: default_user_agent() }
    }
}

fn default_platform() -> String {
    platform_from_os(std::env::consts::OS)
}

fn default_data_dir() -> String {
    "data".into()
}

fn default_storage_file() -> String {
    "local_storage.json".into()
}

fn default_quota_bytes() -> usize {
    DEFAULT_QUOTA_BYTES
}

fn default_user_agent() -> String {
    format!("ace/{}", env!("CARGO_PKG_VERSION"))
}

/// Map a Rust target OS name onto the identifier the webview reports.
pub fn platform_from_os(os: &str) -> String {
    match os {
        "windows" => "win32".into(),
        "macos" => "darwin".into(),
        other => other.into(),
    }
}

/// Load `CONFIG_PATH` (default `config.toml`). A missing file yields defaults.
pub fn load_default() -> Result<AppConfig> {
    dotenvy::dotenv().ok();
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    if std::fs::metadata(&path).is_err() {
        info!(%path, "config file not found; using defaults");
        return Ok(AppConfig::default());
    }
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg = parse(&content)?;
    debug!(%path, platform = %cfg.host.platform, "config loaded");
    Ok(cfg)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.host.apply_override(std::env::var(PLATFORM_ENV).ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.host.normalize();
        self.storage.normalize_and_validate()?;
        self.fetch.normalize();
        Ok(())
    }
}

impl HostConfig {
    /// Replace the platform with a non-blank override value.
    pub fn apply_override(&mut self, value: Option<String>) {
        if let Some(v) = value.filter(|v| !v.trim().is_empty()) {
            self.platform = v;
        }
    }

    fn normalize(&mut self) {
        let trimmed = self.platform.trim();
        if trimmed.is_empty() {
            self.platform = default_platform();
        } else if trimmed.len() != self.platform.len() {
            self.platform = trimmed.to_string();
        }
        if self.project_dir.as_deref().is_some_and(|d| d.trim().is_empty()) {
            self.project_dir = None;
        }
    }
}

impl StorageConfig {
    fn normalize_and_validate(&mut self) -> Result<()> {
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
        if self.file.trim().is_empty() {
            self.file = default_storage_file();
        }
        if self.quota_bytes == 0 {
            return Err(anyhow!("storage.quota_bytes must be >= 1"));
        }
        Ok(())
    }

    /// Full path of the backing store file.
    pub fn path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.data_dir).join(&self.file)
    }
}

impl FetchConfig {
    fn normalize(&mut self) {
        if self.user_agent.trim().is_empty() {
            self.user_agent = default_user_agent();
        }
    }
}
