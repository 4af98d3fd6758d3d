use anyhow::Context;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const BASE_URL_ENV: &str = "NL2SPARQL_BACKEND_BASE_URL";
pub const API_KEY_ENV: &str = "NL2SPARQL_API_KEY";

const CONFIG_DIR_NAME: &str = "nl2sparql";
const CONFIG_FILE_NAME: &str = "console.json";

pub const DEFAULT_LOG_LIMIT: usize = 20;
pub const DEFAULT_PERF_WINDOW_MINUTES: u32 = 60;
/// Upper bounds the backend accepts for `/logs/recent` and `/metrics/perf`.
pub const MAX_LOG_LIMIT: usize = 500;
pub const MAX_PERF_WINDOW_MINUTES: u32 = 1440;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_millis(3200);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct StoredBackend {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigMode {
    /// Operator-adjustable; persisted when a path is known.
    Local { path: Option<PathBuf> },
    /// Fixed deployment target; setters are ignored.
    Locked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendValues {
    pub base_url: String,
    pub api_key: Option<String>,
}

/// Backend base address and access key, shared by every remote call.
#[derive(Debug)]
pub struct BackendConfig {
    mode: ConfigMode,
    values: RwLock<BackendValues>,
}

impl BackendConfig {
    /// Locked when built with the `locked-config` feature, otherwise local
    /// with the per-user config file.
    pub fn load() -> anyhow::Result<Self> {
        if cfg!(feature = "locked-config") {
            return Ok(Self::locked(
                option_env!("NL2SPARQL_BACKEND_BASE_URL").unwrap_or(DEFAULT_BASE_URL),
                option_env!("NL2SPARQL_API_KEY").map(str::to_string),
            ));
        }
        Self::local(default_config_path())
    }

    pub fn local(path: Option<PathBuf>) -> anyhow::Result<Self> {
        let stored = match &path {
            Some(path) => read_stored(path)?,
            None => StoredBackend::default(),
        };
        let base_url = stored
            .base_url
            .or_else(|| non_empty_env(BASE_URL_ENV))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let api_key = stored.api_key.or_else(|| non_empty_env(API_KEY_ENV));
        debug!(?path, %base_url, has_key = api_key.is_some(), "loaded backend config");
        Ok(Self {
            mode: ConfigMode::Local { path },
            values: RwLock::new(BackendValues { base_url, api_key }),
        })
    }

    pub fn locked(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            mode: ConfigMode::Locked,
            values: RwLock::new(BackendValues {
                base_url: base_url.into(),
                api_key,
            }),
        }
    }

    /// Non-persisted local configuration.
    pub fn in_memory(base_url: impl Into<String>) -> Self {
        Self {
            mode: ConfigMode::Local { path: None },
            values: RwLock::new(BackendValues {
                base_url: base_url.into(),
                api_key: None,
            }),
        }
    }

    pub fn mode(&self) -> &ConfigMode {
        &self.mode
    }

    pub fn is_locked(&self) -> bool {
        self.mode == ConfigMode::Locked
    }

    pub fn base_url(&self) -> String {
        self.values.read().base_url.clone()
    }

    pub fn api_key(&self) -> Option<String> {
        self.values.read().api_key.clone()
    }

    pub fn values(&self) -> BackendValues {
        self.values.read().clone()
    }

    pub fn set_base_url(&self, base_url: &str) -> anyhow::Result<()> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            anyhow::bail!("backend base address must not be empty");
        }
        self.update(|values| values.base_url = base_url.to_string())
    }

    /// Empty input removes the key.
    pub fn set_api_key(&self, api_key: &str) -> anyhow::Result<()> {
        let api_key = api_key.trim();
        self.update(|values| {
            values.api_key = (!api_key.is_empty()).then(|| api_key.to_string());
        })
    }

    /// Per-process overrides from the command line; never persisted.
    pub fn apply_overrides(&self, base_url: Option<&str>, api_key: Option<&str>) {
        if self.is_locked() {
            debug!("backend config locked; ignoring command line overrides");
            return;
        }
        let mut values = self.values.write();
        if let Some(base_url) = base_url.map(str::trim).filter(|value| !value.is_empty()) {
            values.base_url = base_url.to_string();
        }
        if let Some(api_key) = api_key {
            let api_key = api_key.trim();
            values.api_key = (!api_key.is_empty()).then(|| api_key.to_string());
        }
    }

    fn update(&self, apply: impl FnOnce(&mut BackendValues)) -> anyhow::Result<()> {
        let path = match &self.mode {
            ConfigMode::Locked => {
                debug!("backend config locked; ignoring update");
                return Ok(());
            }
            ConfigMode::Local { path } => path.clone(),
        };
        let snapshot = {
            let mut values = self.values.write();
            apply(&mut values);
            values.clone()
        };
        if let Some(path) = path {
            persist(&path, &snapshot)?;
            info!(path = %path.display(), "backend config saved");
        }
        Ok(())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn read_stored(path: &Path) -> anyhow::Result<StoredBackend> {
    if !path.exists() {
        return Ok(StoredBackend::default());
    }
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if data.is_empty() {
        return Ok(StoredBackend::default());
    }
    serde_json::from_slice(&data).with_context(|| format!("parsing {}", path.display()))
}

fn persist(path: &Path, values: &BackendValues) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let stored = StoredBackend {
        base_url: Some(values.base_url.clone()),
        api_key: values.api_key.clone(),
    };
    let data = serde_json::to_vec_pretty(&stored)?;
    fs::write(path, data).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// What a remote Generate/Preview failure does to an already held token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenFailurePolicy {
    #[default]
    Retain,
    Clear,
}

impl TokenFailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenFailurePolicy::Retain => "retain",
            TokenFailurePolicy::Clear => "clear",
        }
    }
}

impl fmt::Display for TokenFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenFailurePolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "retain" | "keep" => Ok(TokenFailurePolicy::Retain),
            "clear" => Ok(TokenFailurePolicy::Clear),
            other => Err(format!(
                "unknown token failure policy '{other}' (expected retain|clear)"
            )),
        }
    }
}

/// Console behaviour knobs; the binary fills these from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleSettings {
    pub log_limit: usize,
    pub perf_window_minutes: u32,
    pub poll_interval: Duration,
    pub failure_policy: TokenFailurePolicy,
    pub notice_ttl: Duration,
    pub auto_confirm: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            log_limit: DEFAULT_LOG_LIMIT,
            perf_window_minutes: DEFAULT_PERF_WINDOW_MINUTES,
            poll_interval: DEFAULT_POLL_INTERVAL,
            failure_policy: TokenFailurePolicy::default(),
            notice_ttl: DEFAULT_NOTICE_TTL,
            auto_confirm: false,
        }
    }
}
