//! Lưu trữ bền vững cho store
//!
//! Chỉ `activeChain` được lưu; địa chỉ, số dư và log giao dịch không bao giờ
//! ghi xuống storage. Layout JSON:
//!
//! ```json
//! {"state":{"activeChain":"sei-testnet"},"version":0}
//! ```

// External imports
use serde::{Deserialize, Serialize};

// Standard library imports
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// Internal imports
use crate::chain::ChainId;
use crate::error::{Result, WalletError};

// Third party imports
use tracing::{debug, warn};

/// Key lưu trữ của store.
pub const STORE_STORAGE_KEY: &str = "multichain-wallet-store";
/// Phiên bản layout hiện tại.
pub const STORE_VERSION: u32 = 0;

/// Phần state được lưu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistedFields {
    pub active_chain: Option<ChainId>,
}

/// Bản ghi lưu trữ hoàn chỉnh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub state: PersistedFields,
    pub version: u32,
}

impl PersistedState {
    pub fn new(active_chain: Option<ChainId>) -> Self {
        Self {
            state: PersistedFields { active_chain },
            version: STORE_VERSION,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Key-value storage dạng chuỗi.
pub trait StateStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Mỗi key là một file `<key>.json` trong thư mục.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(WalletError::StorageError(format!("Invalid storage key: {}", key)));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl StateStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::write(&path, value)?;
        debug!("Đã ghi {} byte vào {}", value.len(), path.display());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Storage trong bộ nhớ.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StateStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Đọc `activeChain` đã lưu. Nội dung hỏng được bỏ qua.
pub fn load_active_chain(storage: &dyn StateStorage) -> Option<ChainId> {
    let raw = match storage.get_item(STORE_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Không đọc được state đã lưu: {}", e);
            return None;
        }
    };

    match PersistedState::from_json(&raw) {
        Ok(persisted) => persisted.state.active_chain,
        Err(e) => {
            warn!("State đã lưu không hợp lệ, bỏ qua: {}", e);
            None
        }
    }
}

pub fn save_active_chain(storage: &dyn StateStorage, active_chain: Option<ChainId>) -> Result<()> {
    let raw = PersistedState::new(active_chain).to_json()?;
    storage.set_item(STORE_STORAGE_KEY, &raw)
}
