//! Phiên kết nối ví Solana
//!
//! Điều phối: handshake với adapter -> transition connect -> lấy số dư ->
//! đăng ký listener `accountChanged`/`disconnect`. Lỗi tương tác ví được trả
//! về cho caller, slot chuyển sang ERROR và thông điệp lỗi được lưu lại.

// Standard library imports
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

// Internal imports
use crate::blockchain::BalanceSource;
use crate::chain::{self, ChainId, ChainType};
use crate::error::{Result, WalletError};
use crate::walletlogic::adapter::{
    ListenerId, SolanaWalletType, WalletAdapter, WalletEvent, WalletEventKind,
};
use crate::walletmanager::{MultiChainStore, WalletStatus};

// Third party imports
use tracing::{error, info, warn};

const ECOSYSTEM: ChainType = ChainType::Solana;

pub struct WalletSession {
    store: Arc<MultiChainStore>,
    balances: Arc<dyn BalanceSource>,
    adapters: HashMap<SolanaWalletType, Arc<dyn WalletAdapter>>,
    error: Mutex<Option<String>>,
    connecting: AtomicBool,
    listeners: Mutex<Vec<(SolanaWalletType, WalletEventKind, ListenerId)>>,
}

impl WalletSession {
    pub fn new(store: Arc<MultiChainStore>, balances: Arc<dyn BalanceSource>) -> Self {
        Self {
            store,
            balances,
            adapters: HashMap::new(),
            error: Mutex::new(None),
            connecting: AtomicBool::new(false),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Đăng ký một ví đã phát hiện.
    pub fn with_adapter(mut self, adapter: Arc<dyn WalletAdapter>) -> Self {
        self.adapters.insert(adapter.wallet_type(), adapter);
        self
    }

    pub fn store(&self) -> &Arc<MultiChainStore> {
        &self.store
    }

    /// Các ví đã phát hiện, theo thứ tự Phantom, Solflare, Backpack.
    pub fn available_wallets(&self) -> Vec<SolanaWalletType> {
        SolanaWalletType::ALL
            .iter()
            .copied()
            .filter(|wallet_type| self.adapters.contains_key(wallet_type))
            .collect()
    }

    pub fn has_phantom(&self) -> bool {
        self.adapters.contains_key(&SolanaWalletType::Phantom)
    }

    pub fn has_solflare(&self) -> bool {
        self.adapters.contains_key(&SolanaWalletType::Solflare)
    }

    pub fn has_backpack(&self) -> bool {
        self.adapters.contains_key(&SolanaWalletType::Backpack)
    }

    pub fn is_connected(&self) -> bool {
        self.store.wallet(ECOSYSTEM).status == WalletStatus::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    pub fn address(&self) -> Option<String> {
        self.store.wallet(ECOSYSTEM).address
    }

    pub fn balance(&self) -> Option<String> {
        self.store.wallet(ECOSYSTEM).balance
    }

    pub fn error(&self) -> Option<String> {
        self.lock_error().clone()
    }

    pub fn clear_error(&self) {
        *self.lock_error() = None;
    }

    fn lock_error(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.error.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_listeners(&self) -> std::sync::MutexGuard<'_, Vec<(SolanaWalletType, WalletEventKind, ListenerId)>> {
        self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Kết nối ví cho `chain_id`.
    pub async fn connect(&self, wallet_type: SolanaWalletType, chain_id: ChainId) -> Result<()> {
        // Chain không thuộc phiên này thì slot đang có giữ nguyên
        if let Err(e) = Self::check_chain(chain_id) {
            warn!("Từ chối kết nối ví {} trên {}: {}", wallet_type, chain_id, e);
            *self.lock_error() = Some(e.to_string());
            return Err(e);
        }

        self.connecting.store(true, Ordering::SeqCst);
        self.clear_error();
        self.store.set_status(ECOSYSTEM, WalletStatus::Connecting);

        let result = self.try_connect(wallet_type, chain_id).await;
        self.connecting.store(false, Ordering::SeqCst);

        if let Err(e) = &result {
            error!("Kết nối ví {} thất bại: {}", wallet_type, e);
            *self.lock_error() = Some(e.to_string());
            self.store.set_status(ECOSYSTEM, WalletStatus::Error);
        }
        result
    }

    /// Sui chưa hỗ trợ, chain của hệ sinh thái khác không thuộc phiên này.
    fn check_chain(chain_id: ChainId) -> Result<()> {
        let chain_type = chain_id.chain_type();
        if !chain::is_chain_type_supported(chain_type) || chain_type != ECOSYSTEM {
            return Err(WalletError::ChainNotSupported(chain_id.to_string()));
        }
        Ok(())
    }

    async fn try_connect(&self, wallet_type: SolanaWalletType, chain_id: ChainId) -> Result<()> {
        let adapter = self
            .adapters
            .get(&wallet_type)
            .cloned()
            .ok_or_else(|| WalletError::WalletNotFound(wallet_type.to_string()))?;

        let address = adapter.connect().await?;
        self.store.connect_wallet(&address, chain_id);

        let balance = self.balances.fetch_balance(&address, chain_id).await;
        self.store.update_balance(ECOSYSTEM, &balance);
        info!("Số dư {} SOL cho {}", balance, address);

        self.detach_listeners();
        self.attach_listeners(wallet_type, adapter.as_ref(), chain_id);

        info!("Đã kết nối ví {} ({}) trên {}", wallet_type, address, chain_id);
        Ok(())
    }

    fn attach_listeners(&self, wallet_type: SolanaWalletType, adapter: &dyn WalletAdapter, chain_id: ChainId) {
        let store = self.store.clone();
        let account_id = adapter.on(
            WalletEventKind::AccountChanged,
            Arc::new(move |event| {
                if let WalletEvent::AccountChanged(key) = event {
                    match key {
                        Some(address) => store.connect_wallet(&address, chain_id),
                        None => store.disconnect_wallet(ECOSYSTEM),
                    }
                }
            }),
        );

        let store = self.store.clone();
        let disconnect_id = adapter.on(
            WalletEventKind::Disconnect,
            Arc::new(move |_| store.disconnect_wallet(ECOSYSTEM)),
        );

        let mut listeners = self.lock_listeners();
        listeners.push((wallet_type, WalletEventKind::AccountChanged, account_id));
        listeners.push((wallet_type, WalletEventKind::Disconnect, disconnect_id));
    }

    fn detach_listeners(&self) {
        let listeners: Vec<_> = self.lock_listeners().drain(..).collect();
        for (wallet_type, kind, id) in listeners {
            if let Some(adapter) = self.adapters.get(&wallet_type) {
                adapter.off(kind, id);
            }
        }
    }

    /// Ngắt mọi ví đang kết nối rồi reset slot Solana
    ///
    /// Lỗi từ ví được ghi vào `error()`, slot giữ nguyên khi có lỗi.
    pub async fn disconnect(&self) {
        for wallet_type in self.available_wallets() {
            let Some(adapter) = self.adapters.get(&wallet_type) else {
                continue;
            };
            if !adapter.is_connected() {
                continue;
            }
            if let Err(e) = adapter.disconnect().await {
                warn!("Ngắt ví {} thất bại: {}", wallet_type, e);
                *self.lock_error() = Some(e.to_string());
                return;
            }
        }

        self.detach_listeners();
        self.store.disconnect_wallet(ECOSYSTEM);
        info!("Đã ngắt kết nối ví Solana");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walletlogic::adapter::EventHandler;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub Adapter {}
        #[async_trait]
        impl WalletAdapter for Adapter {
            fn wallet_type(&self) -> SolanaWalletType;
            fn is_connected(&self) -> bool;
            async fn connect(&self) -> Result<String>;
            async fn disconnect(&self) -> Result<()>;
            fn on(&self, kind: WalletEventKind, handler: EventHandler) -> ListenerId;
            fn off(&self, kind: WalletEventKind, id: ListenerId);
        }
    }

    mock! {
        pub Balances {}
        #[async_trait]
        impl BalanceSource for Balances {
            fn chain_type(&self) -> ChainType;
            async fn fetch_balance(&self, address: &str, chain_id: ChainId) -> String;
        }
    }

    fn balances(value: &'static str) -> Arc<dyn BalanceSource> {
        let mut mock = MockBalances::new();
        mock.expect_fetch_balance().returning(move |_, _| value.to_string());
        Arc::new(mock)
    }

    #[tokio::test]
    async fn test_missing_wallet_sets_error() {
        let store = Arc::new(MultiChainStore::new());
        let session = WalletSession::new(store.clone(), balances("0"));

        let result = session.connect(SolanaWalletType::Phantom, ChainId::SolanaDevnet).await;
        assert_eq!(result, Err(WalletError::WalletNotFound("phantom".to_string())));
        assert_eq!(
            session.error().as_deref(),
            Some("phantom wallet not found. Please install the extension.")
        );
        assert_eq!(store.wallet(ChainType::Solana).status, WalletStatus::Error);
        assert!(!session.is_connecting());

        session.clear_error();
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_rejected_handshake_propagates() {
        let mut adapter = MockAdapter::new();
        adapter.expect_wallet_type().return_const(SolanaWalletType::Solflare);
        adapter
            .expect_connect()
            .returning(|| Err(WalletError::ConnectionRejected("User rejected the request".to_string())));
        let store = Arc::new(MultiChainStore::new());
        let session = WalletSession::new(store.clone(), balances("0")).with_adapter(Arc::new(adapter));

        let result = session.connect(SolanaWalletType::Solflare, ChainId::SolanaMainnet).await;
        assert!(matches!(result, Err(WalletError::ConnectionRejected(_))));
        assert_eq!(store.wallet(ChainType::Solana).status, WalletStatus::Error);
        assert!(store.active_chain().is_none());
    }

    #[tokio::test]
    async fn test_non_solana_chain_rejected() {
        let store = Arc::new(MultiChainStore::new());
        let session = WalletSession::new(store.clone(), balances("0"));

        let result = session.connect(SolanaWalletType::Phantom, ChainId::SuiMainnet).await;
        assert!(matches!(result, Err(WalletError::ChainNotSupported(_))));
        let result = session.connect(SolanaWalletType::Phantom, ChainId::SeiTestnet).await;
        assert!(matches!(result, Err(WalletError::ChainNotSupported(_))));
        assert_eq!(store.wallet(ChainType::EVM).status, WalletStatus::Disconnected);
        assert_eq!(store.wallet(ChainType::Solana).status, WalletStatus::Disconnected);
        assert!(session.error().is_some());
    }

    #[tokio::test]
    async fn test_wrong_chain_keeps_live_session() {
        let mut adapter = MockAdapter::new();
        adapter.expect_wallet_type().return_const(SolanaWalletType::Phantom);
        adapter
            .expect_connect()
            .times(1)
            .returning(|| Ok("So11111111111111111111111111111111111111112".to_string()));
        adapter.expect_on().returning(|_, _| 1);

        let store = Arc::new(MultiChainStore::new());
        let session = WalletSession::new(store.clone(), balances("2")).with_adapter(Arc::new(adapter));
        session.connect(SolanaWalletType::Phantom, ChainId::SolanaDevnet).await.unwrap();

        let result = session.connect(SolanaWalletType::Phantom, ChainId::SeiTestnet).await;
        assert!(matches!(result, Err(WalletError::ChainNotSupported(_))));
        assert!(session.is_connected());
        assert!(store.is_wallet_connected_for_chain(ChainId::SolanaDevnet));
        assert_eq!(store.active_chain(), Some(ChainId::SolanaDevnet));
        assert_eq!(session.balance().as_deref(), Some("2"));
        assert!(!session.is_connecting());
    }

    #[tokio::test]
    async fn test_connect_registers_listeners() {
        let mut adapter = MockAdapter::new();
        adapter.expect_wallet_type().return_const(SolanaWalletType::Phantom);
        adapter
            .expect_connect()
            .returning(|| Ok("So11111111111111111111111111111111111111112".to_string()));
        adapter.expect_on().times(2).returning(|kind, _| match kind {
            WalletEventKind::AccountChanged => 1,
            WalletEventKind::Disconnect => 2,
        });

        let store = Arc::new(MultiChainStore::new());
        let session = WalletSession::new(store.clone(), balances("1.5")).with_adapter(Arc::new(adapter));

        session.connect(SolanaWalletType::Phantom, ChainId::SolanaDevnet).await.unwrap();
        assert!(session.is_connected());
        assert_eq!(session.balance().as_deref(), Some("1.5"));
        assert_eq!(store.active_chain(), Some(ChainId::SolanaDevnet));
        assert_eq!(session.available_wallets(), vec![SolanaWalletType::Phantom]);
        assert!(session.has_phantom());
        assert!(!session.has_backpack());
    }
}
