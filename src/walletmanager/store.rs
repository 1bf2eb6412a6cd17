//! Store đa chain
//!
//! `MultiChainState::reduce` là hàm thuần `(state, action) -> state`, không
//! I/O. `MultiChainStore` giữ snapshot hiện tại sau một `Arc` và thay thế
//! nguyên khối mỗi lần dispatch; người đọc luôn thấy một snapshot nhất quán.

// Standard library imports
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

// Internal imports
use crate::chain::{ChainId, ChainMetadata, ChainType};
use crate::config::{WalletSystemConfig, MAX_TRANSACTIONS};
use crate::walletmanager::persist::{self, StateStorage};
use crate::walletmanager::types::{
    MultiChainState, Transaction, TransactionStatus, WalletState, WalletStatus,
};

// Third party imports
use tracing::{debug, warn};

/// Các transition của store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreAction {
    /// Slot được chọn theo loại của `chain_id`.
    Connect { address: String, chain_id: ChainId },
    Disconnect(ChainType),
    UpdateBalance { ecosystem: ChainType, balance: String },
    SetStatus { ecosystem: ChainType, status: WalletStatus },
    SetActiveChain(ChainId),
    AddTransaction(Transaction),
    UpdateTransactionStatus { hash: String, status: TransactionStatus },
    ClearTransactions,
    OpenChainSelector,
    CloseChainSelector,
    SetSelectedChainForAction(Option<ChainId>),
    DisconnectAll,
    Reset,
}

impl MultiChainState {
    /// Áp dụng action với giới hạn log mặc định.
    pub fn reduce(&self, action: StoreAction) -> Self {
        self.reduce_with_limit(action, MAX_TRANSACTIONS)
    }

    pub fn reduce_with_limit(&self, action: StoreAction, max_transactions: usize) -> Self {
        let mut next = self.clone();

        match action {
            StoreAction::Connect { address, chain_id } => {
                let slot = next.wallet_mut(chain_id.chain_type());
                slot.address = Some(address);
                slot.chain_id = Some(chain_id);
                slot.status = WalletStatus::Connected;
                next.active_chain = Some(chain_id);
            }
            StoreAction::Disconnect(ecosystem) => {
                let previous_chain = self.wallet(ecosystem).chain_id;
                *next.wallet_mut(ecosystem) = WalletState::empty(ecosystem);
                if next.active_chain == previous_chain {
                    next.active_chain = None;
                }
            }
            StoreAction::UpdateBalance { ecosystem, balance } => {
                next.wallet_mut(ecosystem).balance = Some(balance);
            }
            StoreAction::SetStatus { ecosystem, status } => {
                next.wallet_mut(ecosystem).status = status;
            }
            StoreAction::SetActiveChain(chain_id) => {
                next.active_chain = Some(chain_id);
            }
            StoreAction::AddTransaction(transaction) => {
                next.transactions.insert(0, transaction);
                next.transactions.truncate(max_transactions);
            }
            StoreAction::UpdateTransactionStatus { hash, status } => {
                next.transactions
                    .iter_mut()
                    .filter(|tx| tx.hash == hash)
                    .for_each(|tx| tx.status = status);
            }
            StoreAction::ClearTransactions => {
                next.transactions.clear();
            }
            StoreAction::OpenChainSelector => {
                next.is_chain_selector_open = true;
            }
            StoreAction::CloseChainSelector => {
                next.is_chain_selector_open = false;
            }
            StoreAction::SetSelectedChainForAction(chain_id) => {
                next.selected_chain_for_action = chain_id;
            }
            StoreAction::DisconnectAll => {
                next = Self {
                    is_chain_selector_open: self.is_chain_selector_open,
                    selected_chain_for_action: self.selected_chain_for_action,
                    ..Self::default()
                };
            }
            StoreAction::Reset => {
                next = Self::default();
            }
        }

        next
    }

    pub fn active_chain_metadata(&self) -> Option<&'static ChainMetadata> {
        self.active_chain.map(|id| id.metadata())
    }

    /// Slot của hệ sinh thái chứa chain đang active.
    pub fn active_wallet_state(&self) -> Option<&WalletState> {
        self.active_chain.map(|id| self.wallet(id.chain_type()))
    }

    /// Đúng khi slot đã CONNECTED và đúng chain ID.
    pub fn is_wallet_connected_for_chain(&self, chain_id: ChainId) -> bool {
        let slot = self.wallet(chain_id.chain_type());
        slot.status == WalletStatus::Connected && slot.chain_id == Some(chain_id)
    }

    pub fn transactions_by_chain(&self, chain_id: ChainId) -> Vec<&Transaction> {
        self.transactions.iter().filter(|tx| tx.chain_id == chain_id).collect()
    }
}

/// Container dùng chung của store, có thể gắn storage để lưu `activeChain`.
pub struct MultiChainStore {
    state: RwLock<Arc<MultiChainState>>,
    storage: Option<Arc<dyn StateStorage>>,
    max_transactions: usize,
}

impl Default for MultiChainStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MultiChainStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(Arc::new(MultiChainState::default())),
            storage: None,
            max_transactions: MAX_TRANSACTIONS,
        }
    }

    /// Store có storage, `activeChain` được khôi phục ngay khi tạo.
    pub fn with_storage(storage: Arc<dyn StateStorage>) -> Self {
        let state = MultiChainState {
            active_chain: persist::load_active_chain(storage.as_ref()),
            ..MultiChainState::default()
        };
        debug!("Khôi phục store, activeChain = {:?}", state.active_chain);

        Self {
            state: RwLock::new(Arc::new(state)),
            storage: Some(storage),
            max_transactions: MAX_TRANSACTIONS,
        }
    }

    /// Store áp dụng giới hạn log `max_transactions` của cấu hình.
    pub fn from_config(config: &WalletSystemConfig) -> Self {
        Self::new().with_max_transactions(config.max_transactions)
    }

    pub fn with_max_transactions(mut self, max_transactions: usize) -> Self {
        self.max_transactions = max_transactions;
        self
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Arc<MultiChainState>> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Arc<MultiChainState>> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot hiện tại.
    pub fn snapshot(&self) -> Arc<MultiChainState> {
        self.read_lock().clone()
    }

    /// Áp dụng action và trả về snapshot mới.
    pub fn dispatch(&self, action: StoreAction) -> Arc<MultiChainState> {
        debug!("Store dispatch: {:?}", action);

        let (previous_chain, next) = {
            let mut guard = self.write_lock();
            let previous_chain = guard.active_chain;
            let next = Arc::new(guard.reduce_with_limit(action, self.max_transactions));
            *guard = next.clone();
            (previous_chain, next)
        };

        if previous_chain != next.active_chain {
            self.persist(next.active_chain);
        }
        next
    }

    fn persist(&self, active_chain: Option<ChainId>) {
        if let Some(storage) = &self.storage {
            if let Err(e) = persist::save_active_chain(storage.as_ref(), active_chain) {
                warn!("Không lưu được activeChain: {}", e);
            }
        }
    }

    pub fn connect_wallet(&self, address: &str, chain_id: ChainId) {
        self.dispatch(StoreAction::Connect { address: address.to_string(), chain_id });
    }

    pub fn disconnect_wallet(&self, ecosystem: ChainType) {
        self.dispatch(StoreAction::Disconnect(ecosystem));
    }

    pub fn update_balance(&self, ecosystem: ChainType, balance: &str) {
        self.dispatch(StoreAction::UpdateBalance { ecosystem, balance: balance.to_string() });
    }

    pub fn set_status(&self, ecosystem: ChainType, status: WalletStatus) {
        self.dispatch(StoreAction::SetStatus { ecosystem, status });
    }

    pub fn set_active_chain(&self, chain_id: ChainId) {
        self.dispatch(StoreAction::SetActiveChain(chain_id));
    }

    pub fn add_transaction(&self, transaction: Transaction) {
        self.dispatch(StoreAction::AddTransaction(transaction));
    }

    pub fn update_transaction_status(&self, hash: &str, status: TransactionStatus) {
        self.dispatch(StoreAction::UpdateTransactionStatus { hash: hash.to_string(), status });
    }

    pub fn clear_transactions(&self) {
        self.dispatch(StoreAction::ClearTransactions);
    }

    pub fn open_chain_selector(&self) {
        self.dispatch(StoreAction::OpenChainSelector);
    }

    pub fn close_chain_selector(&self) {
        self.dispatch(StoreAction::CloseChainSelector);
    }

    pub fn set_selected_chain_for_action(&self, chain_id: Option<ChainId>) {
        self.dispatch(StoreAction::SetSelectedChainForAction(chain_id));
    }

    pub fn disconnect_all(&self) {
        self.dispatch(StoreAction::DisconnectAll);
    }

    pub fn reset_store(&self) {
        self.dispatch(StoreAction::Reset);
    }

    pub fn wallet(&self, ecosystem: ChainType) -> WalletState {
        self.snapshot().wallet(ecosystem).clone()
    }

    pub fn active_chain(&self) -> Option<ChainId> {
        self.snapshot().active_chain
    }

    pub fn active_chain_metadata(&self) -> Option<&'static ChainMetadata> {
        self.snapshot().active_chain_metadata()
    }

    pub fn active_wallet_state(&self) -> Option<WalletState> {
        self.snapshot().active_wallet_state().cloned()
    }

    pub fn is_wallet_connected_for_chain(&self, chain_id: ChainId) -> bool {
        self.snapshot().is_wallet_connected_for_chain(chain_id)
    }

    pub fn transactions_by_chain(&self, chain_id: ChainId) -> Vec<Transaction> {
        self.snapshot().transactions_by_chain(chain_id).into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::walletmanager::persist::{MemoryStorage, STORE_STORAGE_KEY};

    const EVM_ADDRESS: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";
    const SOL_ADDRESS: &str = "So11111111111111111111111111111111111111112";

    fn connect(state: &MultiChainState, address: &str, chain_id: ChainId) -> MultiChainState {
        state.reduce(StoreAction::Connect { address: address.to_string(), chain_id })
    }

    fn tx(hash: &str, chain_id: ChainId) -> Transaction {
        Transaction::new(hash, chain_id, EVM_ADDRESS, None, "0")
    }

    #[test]
    fn test_connect_sets_slot_and_active_chain() {
        let state = connect(&MultiChainState::default(), EVM_ADDRESS, ChainId::SeiTestnet);

        assert_eq!(state.evm.address.as_deref(), Some(EVM_ADDRESS));
        assert_eq!(state.evm.chain_id, Some(ChainId::SeiTestnet));
        assert_eq!(state.evm.status, WalletStatus::Connected);
        assert_eq!(state.active_chain, Some(ChainId::SeiTestnet));
        // Slot khác không đổi
        assert_eq!(state.solana, WalletState::empty(ChainType::Solana));
    }

    #[test]
    fn test_connect_keeps_balance() {
        let state = MultiChainState::default().reduce(StoreAction::UpdateBalance {
            ecosystem: ChainType::Solana,
            balance: "2.5".to_string(),
        });
        let state = connect(&state, SOL_ADDRESS, ChainId::SolanaDevnet);
        assert_eq!(state.solana.balance.as_deref(), Some("2.5"));
    }

    #[test]
    fn test_multiple_ecosystems_connected() {
        let state = connect(&MultiChainState::default(), EVM_ADDRESS, ChainId::SeiTestnet);
        let state = connect(&state, SOL_ADDRESS, ChainId::SolanaDevnet);

        assert!(state.evm.is_connected());
        assert!(state.solana.is_connected());
        assert_eq!(state.active_chain, Some(ChainId::SolanaDevnet));
    }

    #[test]
    fn test_disconnect_clears_matching_focus() {
        let state = connect(&MultiChainState::default(), SOL_ADDRESS, ChainId::SolanaDevnet);
        let state = state.reduce(StoreAction::Disconnect(ChainType::Solana));

        assert_eq!(state.solana, WalletState::empty(ChainType::Solana));
        assert_eq!(state.active_chain, None);
    }

    #[test]
    fn test_disconnect_keeps_other_focus() {
        let state = connect(&MultiChainState::default(), EVM_ADDRESS, ChainId::SeiTestnet);
        let state = connect(&state, SOL_ADDRESS, ChainId::SolanaDevnet);
        let state = state.reduce(StoreAction::Disconnect(ChainType::EVM));

        assert_eq!(state.evm.status, WalletStatus::Disconnected);
        assert_eq!(state.active_chain, Some(ChainId::SolanaDevnet));
    }

    #[test]
    fn test_disconnect_empty_slot_keeps_focus() {
        let state = MultiChainState::default().reduce(StoreAction::SetActiveChain(ChainId::SeiMainnet));
        let state = state.reduce(StoreAction::Disconnect(ChainType::Sui));
        assert_eq!(state.active_chain, Some(ChainId::SeiMainnet));
    }

    #[test]
    fn test_update_balance_and_status_touch_one_field() {
        let base = connect(&MultiChainState::default(), EVM_ADDRESS, ChainId::SeiTestnet);

        let with_balance = base.reduce(StoreAction::UpdateBalance {
            ecosystem: ChainType::EVM,
            balance: "12.5".to_string(),
        });
        assert_eq!(with_balance.evm.balance.as_deref(), Some("12.5"));
        assert_eq!(with_balance.evm.status, base.evm.status);
        assert_eq!(with_balance.evm.address, base.evm.address);

        let with_status = base.reduce(StoreAction::SetStatus {
            ecosystem: ChainType::EVM,
            status: WalletStatus::Error,
        });
        assert_eq!(with_status.evm.status, WalletStatus::Error);
        assert_eq!(with_status.evm.address, base.evm.address);
        assert_eq!(with_status.active_chain, base.active_chain);
    }

    #[test]
    fn test_exact_chain_connection_check() {
        let state = connect(&MultiChainState::default(), EVM_ADDRESS, ChainId::SeiTestnet);
        assert!(state.is_wallet_connected_for_chain(ChainId::SeiTestnet));
        assert!(!state.is_wallet_connected_for_chain(ChainId::SeiMainnet));
        assert!(!state.is_wallet_connected_for_chain(ChainId::SolanaDevnet));

        let errored = state.reduce(StoreAction::SetStatus {
            ecosystem: ChainType::EVM,
            status: WalletStatus::Error,
        });
        assert!(!errored.is_wallet_connected_for_chain(ChainId::SeiTestnet));
    }

    #[test]
    fn test_active_queries() {
        let empty = MultiChainState::default();
        assert!(empty.active_chain_metadata().is_none());
        assert!(empty.active_wallet_state().is_none());

        // Chọn trước chain chưa kết nối vẫn được phép
        let focused = empty.reduce(StoreAction::SetActiveChain(ChainId::SolanaMainnet));
        assert_eq!(focused.active_chain_metadata().unwrap().id, ChainId::SolanaMainnet);
        let slot = focused.active_wallet_state().unwrap();
        assert_eq!(slot.chain_type, ChainType::Solana);
        assert_eq!(slot.status, WalletStatus::Disconnected);
    }

    #[test]
    fn test_transaction_log_is_bounded() {
        let mut state = MultiChainState::default();
        for i in 0..101 {
            state = state.reduce(StoreAction::AddTransaction(tx(&format!("0x{}", i), ChainId::SeiTestnet)));
        }

        assert_eq!(state.transactions.len(), 100);
        assert_eq!(state.transactions[0].hash, "0x100");
        assert!(state.transactions.iter().all(|t| t.hash != "0x0"));
        assert_eq!(state.transactions[99].hash, "0x1");
    }

    #[test]
    fn test_update_transaction_status_by_hash() {
        let state = MultiChainState::default()
            .reduce(StoreAction::AddTransaction(tx("0xa", ChainId::SeiTestnet)))
            .reduce(StoreAction::AddTransaction(tx("0xb", ChainId::SeiTestnet)))
            .reduce(StoreAction::AddTransaction(tx("0xa", ChainId::SeiMainnet)));

        let updated = state.reduce(StoreAction::UpdateTransactionStatus {
            hash: "0xa".to_string(),
            status: TransactionStatus::Confirmed,
        });
        let statuses: Vec<_> = updated.transactions.iter().map(|t| (t.hash.as_str(), t.status)).collect();
        assert_eq!(
            statuses,
            vec![
                ("0xa", TransactionStatus::Confirmed),
                ("0xb", TransactionStatus::Pending),
                ("0xa", TransactionStatus::Confirmed),
            ]
        );

        let unchanged = state.reduce(StoreAction::UpdateTransactionStatus {
            hash: "0xmissing".to_string(),
            status: TransactionStatus::Failed,
        });
        assert_eq!(unchanged, state);
    }

    #[test]
    fn test_transactions_by_chain_preserves_order() {
        let state = MultiChainState::default()
            .reduce(StoreAction::AddTransaction(tx("1", ChainId::SeiTestnet)))
            .reduce(StoreAction::AddTransaction(tx("2", ChainId::SolanaDevnet)))
            .reduce(StoreAction::AddTransaction(tx("3", ChainId::SeiTestnet)));

        let hashes: Vec<_> = state
            .transactions_by_chain(ChainId::SeiTestnet)
            .iter()
            .map(|t| t.hash.as_str())
            .collect();
        assert_eq!(hashes, vec!["3", "1"]);
        assert!(state.transactions_by_chain(ChainId::SuiMainnet).is_empty());

        let cleared = state.reduce(StoreAction::ClearTransactions);
        assert!(cleared.transactions.is_empty());
    }

    #[test]
    fn test_disconnect_all_and_reset() {
        let state = connect(&MultiChainState::default(), EVM_ADDRESS, ChainId::SeiTestnet);
        let state = connect(&state, SOL_ADDRESS, ChainId::SolanaDevnet)
            .reduce(StoreAction::AddTransaction(tx("0x1", ChainId::SeiTestnet)))
            .reduce(StoreAction::OpenChainSelector)
            .reduce(StoreAction::SetSelectedChainForAction(Some(ChainId::SeiMainnet)));

        let disconnected = state.reduce(StoreAction::DisconnectAll);
        assert_eq!(disconnected.evm, WalletState::empty(ChainType::EVM));
        assert_eq!(disconnected.solana, WalletState::empty(ChainType::Solana));
        assert_eq!(disconnected.sui, WalletState::empty(ChainType::Sui));
        assert_eq!(disconnected.active_chain, None);
        assert!(disconnected.transactions.is_empty());
        assert!(disconnected.is_chain_selector_open);
        assert_eq!(disconnected.selected_chain_for_action, Some(ChainId::SeiMainnet));

        let reset = state.reduce(StoreAction::Reset);
        assert_eq!(reset, MultiChainState::default());
    }

    #[test]
    fn test_chain_selector_ui_state() {
        let state = MultiChainState::default().reduce(StoreAction::OpenChainSelector);
        assert!(state.is_chain_selector_open);
        let state = state.reduce(StoreAction::CloseChainSelector);
        assert!(!state.is_chain_selector_open);
        let state = state.reduce(StoreAction::SetSelectedChainForAction(Some(ChainId::SuiTestnet)));
        assert_eq!(state.selected_chain_for_action, Some(ChainId::SuiTestnet));
        let state = state.reduce(StoreAction::SetSelectedChainForAction(None));
        assert_eq!(state.selected_chain_for_action, None);
    }

    #[test]
    fn test_reduce_does_not_mutate_input() {
        let before = MultiChainState::default();
        let after = connect(&before, EVM_ADDRESS, ChainId::SeiTestnet);
        assert_eq!(before, MultiChainState::default());
        assert_ne!(before, after);
    }

    #[test]
    fn test_store_snapshots_are_immutable() {
        let store = MultiChainStore::new();
        let before = store.snapshot();
        store.connect_wallet(EVM_ADDRESS, ChainId::SeiTestnet);
        let after = store.snapshot();

        assert!(before.active_chain.is_none());
        assert_eq!(after.active_chain, Some(ChainId::SeiTestnet));
        assert!(store.is_wallet_connected_for_chain(ChainId::SeiTestnet));
    }

    #[test]
    fn test_store_persists_only_active_chain() {
        let storage = Arc::new(MemoryStorage::new());
        let store = MultiChainStore::with_storage(storage.clone());

        store.connect_wallet(SOL_ADDRESS, ChainId::SolanaDevnet);
        store.update_balance(ChainType::Solana, "3");
        store.add_transaction(tx("0x1", ChainId::SolanaDevnet));

        let raw = storage.get_item(STORE_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"state":{"activeChain":"solana-devnet"},"version":0}"#);

        let restored = MultiChainStore::with_storage(storage.clone());
        let snapshot = restored.snapshot();
        assert_eq!(snapshot.active_chain, Some(ChainId::SolanaDevnet));
        assert_eq!(snapshot.solana, WalletState::empty(ChainType::Solana));
        assert!(snapshot.transactions.is_empty());

        restored.disconnect_all();
        let raw = storage.get_item(STORE_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(raw, r#"{"state":{"activeChain":null},"version":0}"#);
    }

    #[test]
    fn test_store_limit_from_config() {
        let config = WalletSystemConfig {
            max_transactions: 3,
            ..WalletSystemConfig::default()
        };
        let store = MultiChainStore::from_config(&config);
        for i in 0..5 {
            store.add_transaction(tx(&format!("0x{}", i), ChainId::SeiTestnet));
        }
        let hashes: Vec<_> = store.snapshot().transactions.iter().map(|t| t.hash.clone()).collect();
        assert_eq!(hashes, vec!["0x4", "0x3", "0x2"]);

        let default_store = MultiChainStore::from_config(&WalletSystemConfig::default());
        for i in 0..5 {
            default_store.add_transaction(tx(&format!("0x{}", i), ChainId::SeiTestnet));
        }
        assert_eq!(default_store.snapshot().transactions.len(), 5);
    }

    #[test]
    fn test_store_custom_transaction_limit() {
        let store = MultiChainStore::new().with_max_transactions(2);
        for hash in ["a", "b", "c"] {
            store.add_transaction(tx(hash, ChainId::SeiTestnet));
        }
        let hashes: Vec<_> = store.snapshot().transactions.iter().map(|t| t.hash.clone()).collect();
        assert_eq!(hashes, vec!["c", "b"]);
    }
}
