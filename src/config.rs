use std::env;
use std::path::PathBuf;

pub const STORE_DIR_ENV: &str = "CATALOG_STORE_DIR";
pub const STORAGE_KEY_ENV: &str = "CATALOG_STORAGE_KEY";

pub const DEFAULT_STORE_DIR: &str = ".catalog";
pub const DEFAULT_STORAGE_KEY: &str = "products";

/// Where the catalog lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// directory holding one JSON file per storage key
    pub store_dir: PathBuf,
    /// key the catalog is stored under
    pub storage_key: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl CatalogConfig {
    /// Defaults overridden by `CATALOG_STORE_DIR` / `CATALOG_STORAGE_KEY` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dir) = env::var_os(STORE_DIR_ENV).filter(|v| !v.is_empty()) {
            config.store_dir = PathBuf::from(dir);
        }
        if let Ok(key) = env::var(STORAGE_KEY_ENV) {
            if !key.is_empty() {
                config.storage_key = key;
            }
        }
        config
    }

    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }
}
