//! Trait cho wallet adapter (extension ví) và bus sự kiện dùng chung

// External imports
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// Standard library imports
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

// Internal imports
use crate::error::Result;

// Third party imports
use tracing::debug;

/// Các ví Solana được hỗ trợ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolanaWalletType {
    Phantom,
    Solflare,
    Backpack,
}

impl SolanaWalletType {
    /// Thứ tự phát hiện.
    pub const ALL: [SolanaWalletType; 3] = [
        SolanaWalletType::Phantom,
        SolanaWalletType::Solflare,
        SolanaWalletType::Backpack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Phantom => "phantom",
            Self::Solflare => "solflare",
            Self::Backpack => "backpack",
        }
    }
}

impl fmt::Display for SolanaWalletType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalletEventKind {
    AccountChanged,
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// `None` khi người dùng khóa ví hoặc thu hồi quyền.
    AccountChanged(Option<String>),
    Disconnect,
}

impl WalletEvent {
    pub fn kind(&self) -> WalletEventKind {
        match self {
            Self::AccountChanged(_) => WalletEventKind::AccountChanged,
            Self::Disconnect => WalletEventKind::Disconnect,
        }
    }
}

pub type ListenerId = u64;
pub type EventHandler = Arc<dyn Fn(WalletEvent) + Send + Sync>;

/// Khả năng tối thiểu của một ví extension.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn wallet_type(&self) -> SolanaWalletType;

    fn is_connected(&self) -> bool;

    /// Handshake với ví, trả về public key.
    async fn connect(&self) -> Result<String>;

    async fn disconnect(&self) -> Result<()>;

    fn on(&self, kind: WalletEventKind, handler: EventHandler) -> ListenerId;

    fn off(&self, kind: WalletEventKind, id: ListenerId);
}

/// Danh sách listener theo loại sự kiện.
#[derive(Default)]
pub struct WalletEventBus {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<WalletEventKind, Vec<(ListenerId, EventHandler)>>>,
}

impl WalletEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<WalletEventKind, Vec<(ListenerId, EventHandler)>>> {
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn subscribe(&self, kind: WalletEventKind, handler: EventHandler) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.lock().entry(kind).or_default().push((id, handler));
        id
    }

    pub fn unsubscribe(&self, kind: WalletEventKind, id: ListenerId) {
        if let Some(handlers) = self.lock().get_mut(&kind) {
            handlers.retain(|(listener_id, _)| *listener_id != id);
        }
    }

    pub fn listener_count(&self, kind: WalletEventKind) -> usize {
        self.lock().get(&kind).map(Vec::len).unwrap_or(0)
    }

    /// Gọi mọi handler của loại sự kiện, ngoài lock.
    pub fn emit(&self, event: WalletEvent) {
        let handlers: Vec<EventHandler> = self
            .lock()
            .get(&event.kind())
            .map(|handlers| handlers.iter().map(|(_, handler)| handler.clone()).collect())
            .unwrap_or_default();

        debug!("Phát sự kiện {:?} tới {} listener", event, handlers.len());
        for handler in handlers {
            handler(event.clone());
        }
    }
}
