//! Quản lý state ví đa chain: kiểu dữ liệu, store và lưu trữ

pub mod persist;
pub mod store;
pub mod types;

pub use persist::{FileStorage, MemoryStorage, StateStorage, STORE_STORAGE_KEY};
pub use store::{MultiChainStore, StoreAction};
pub use types::{MultiChainState, Transaction, TransactionStatus, WalletState, WalletStatus};
