// External imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Internal imports
use crate::chain::{ChainId, ChainType};
use crate::utils::transaction_url;

/// Trạng thái kết nối của một ví.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WalletStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Error,
}

/// Trạng thái ví cho một hệ sinh thái (slot).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletState {
    pub address: Option<String>,
    /// Số dư theo đơn vị native, dạng chuỗi thập phân.
    pub balance: Option<String>,
    pub status: WalletStatus,
    pub chain_id: Option<ChainId>,
    /// Cố định theo slot.
    pub chain_type: ChainType,
}

impl WalletState {
    /// Slot rỗng, chưa kết nối.
    pub fn empty(chain_type: ChainType) -> Self {
        Self {
            address: None,
            balance: None,
            status: WalletStatus::Disconnected,
            chain_id: None,
            chain_type,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.status == WalletStatus::Connected
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Confirmed,
    Failed,
}

/// Giao dịch trong log của store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub hash: String,
    pub chain_id: ChainId,
    pub chain_type: ChainType,
    pub from: String,
    pub to: Option<String>,
    pub value: String,
    pub status: TransactionStatus,
    /// Epoch milliseconds trên wire.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub block_explorer_url: String,
}

impl Transaction {
    /// Giao dịch pending mới, URL explorer tính từ registry.
    pub fn new(hash: &str, chain_id: ChainId, from: &str, to: Option<&str>, value: &str) -> Self {
        Self {
            hash: hash.to_string(),
            chain_id,
            chain_type: chain_id.chain_type(),
            from: from.to_string(),
            to: to.map(str::to_string),
            value: value.to_string(),
            status: TransactionStatus::Pending,
            timestamp: Utc::now(),
            block_explorer_url: transaction_url(chain_id, hash),
        }
    }

    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Toàn bộ state của store đa chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiChainState {
    pub evm: WalletState,
    pub solana: WalletState,
    pub sui: WalletState,
    /// Chain đang được focus, không bắt buộc trùng ví đã kết nối.
    pub active_chain: Option<ChainId>,
    /// Mới nhất ở đầu.
    pub transactions: Vec<Transaction>,
    pub is_chain_selector_open: bool,
    pub selected_chain_for_action: Option<ChainId>,
}

impl Default for MultiChainState {
    fn default() -> Self {
        Self {
            evm: WalletState::empty(ChainType::EVM),
            solana: WalletState::empty(ChainType::Solana),
            sui: WalletState::empty(ChainType::Sui),
            active_chain: None,
            transactions: Vec::new(),
            is_chain_selector_open: false,
            selected_chain_for_action: None,
        }
    }
}

impl MultiChainState {
    /// Slot của một hệ sinh thái.
    pub fn wallet(&self, ecosystem: ChainType) -> &WalletState {
        match ecosystem {
            ChainType::EVM => &self.evm,
            ChainType::Solana => &self.solana,
            ChainType::Sui => &self.sui,
        }
    }

    pub(crate) fn wallet_mut(&mut self, ecosystem: ChainType) -> &mut WalletState {
        match ecosystem {
            ChainType::EVM => &mut self.evm,
            ChainType::Solana => &mut self.solana,
            ChainType::Sui => &mut self.sui,
        }
    }
}
