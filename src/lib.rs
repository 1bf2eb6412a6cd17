// multichain-wallet/src/lib.rs

//! Lõi điều phối ví đa chuỗi
//!
//! Registry metadata cho SEI EVM, Solana và Sui; connection client có pool
//! và đọc số dư theo kiểu fail-open; store đa chain với transition thuần,
//! log giao dịch giới hạn và lưu trữ `activeChain`.

// Re-export API công khai
pub use crate::blockchain::BalanceSource;
pub use crate::blockchain::evm::EvmClient;
pub use crate::blockchain::solana::{SolanaClient, chain_id_to_cluster};
pub use crate::chain::{ChainId, ChainMetadata, ChainType, NetworkEnvironment, SolanaCluster};
pub use crate::config::WalletSystemConfig;
pub use crate::error::{ConnectionError, Result, WalletError};
pub use crate::walletlogic::{BalanceWatcher, SolanaWalletType, WalletAdapter, WalletSession};
pub use crate::walletmanager::{MultiChainState, MultiChainStore, StoreAction, Transaction, WalletState, WalletStatus};

pub mod blockchain;
pub mod chain;
pub mod config;
pub mod error;
pub mod utils;
pub mod walletlogic;
pub mod walletmanager;
