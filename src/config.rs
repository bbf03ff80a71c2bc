// Runtime configuration. Everything is read once at start-up and handed
// to the flows through `AppContext`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::history::HistoryStore;
use crate::limits::{SizeLimits, DEFAULT_DIRECTORY_LIMIT_MB, DEFAULT_FILE_LIMIT_MB};

pub const DEFAULT_API_URL: &str = "https://ipfs.glitterprotocol.dev/api/v2";

/// Directory under the home directory holding device id and history.
pub const CONFIG_DIR: &str = ".pinme";
pub const DEVICE_ID_FILE: &str = "device-id";

/// Values taken from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub limits: SizeLimits,
    /// Storage quota in megabytes, only used to word quota errors.
    pub storage_limit_mb: Option<u64>,
    /// Prefix printed in front of a content hash to form a preview link.
    pub preview_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_url: DEFAULT_API_URL.to_string(),
            limits: SizeLimits::default(),
            storage_limit_mb: None,
            preview_url: None,
        }
    }
}

impl Settings {
    /// Read `IPFS_API_URL`, `FILE_SIZE_LIMIT`, `DIRECTORY_SIZE_LIMIT`,
    /// `STORAGE_SIZE_LIMIT` and `IPFS_PREVIEW_URL`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let megabytes = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let api_url = lookup("IPFS_API_URL")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        Settings {
            api_url: api_url.trim().trim_end_matches('/').to_string(),
            limits: SizeLimits::from_megabytes(
                megabytes("FILE_SIZE_LIMIT").unwrap_or(DEFAULT_FILE_LIMIT_MB),
                megabytes("DIRECTORY_SIZE_LIMIT").unwrap_or(DEFAULT_DIRECTORY_LIMIT_MB),
            ),
            storage_limit_mb: megabytes("STORAGE_SIZE_LIMIT"),
            preview_url: lookup("IPFS_PREVIEW_URL").filter(|v| !v.trim().is_empty()),
        }
    }
}

/// Return the device id stored in `dir`, creating one on first use.
pub fn load_or_create_device_id(dir: &Path) -> Result<String> {
    fs::create_dir_all(dir)?;
    let path = dir.join(DEVICE_ID_FILE);

    if path.exists() {
        let id = fs::read_to_string(&path)?.trim().to_string();
        if !id.is_empty() {
            return Ok(id);
        }
    }

    let id = Uuid::new_v4().to_string();
    fs::write(&path, &id)?;
    debug!(path = %path.display(), "generated new device id");
    Ok(id)
}

/// `~/.pinme`, or `./.pinme` when no home directory is known.
pub fn default_config_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(CONFIG_DIR)
}

/// Everything a command needs, built once per process.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub device_id: String,
    pub history: HistoryStore,
}

impl AppContext {
    /// Settings from the environment, state under `~/.pinme`.
    pub fn init() -> Result<Self> {
        Self::with_config_dir(Settings::from_env(), default_config_dir())
    }

    pub fn with_config_dir(settings: Settings, dir: PathBuf) -> Result<Self> {
        let device_id = load_or_create_device_id(&dir)?;
        Ok(AppContext {
            settings,
            device_id,
            history: HistoryStore::new(dir),
        })
    }
}
