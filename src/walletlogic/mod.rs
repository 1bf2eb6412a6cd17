//! Logic phiên ví: adapter, kết nối/ngắt kết nối, làm mới số dư định kỳ

pub mod adapter;
pub mod handler;
pub mod watcher;

pub use adapter::{SolanaWalletType, WalletAdapter, WalletEvent, WalletEventBus, WalletEventKind};
pub use handler::WalletSession;
pub use watcher::BalanceWatcher;
