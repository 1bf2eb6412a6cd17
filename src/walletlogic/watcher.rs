// External imports
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};

// Standard library imports
use std::sync::Arc;

// Internal imports
use crate::blockchain::BalanceSource;
use crate::chain::ChainId;
use crate::config::WalletSystemConfig;
use crate::walletmanager::{MultiChainStore, WalletStatus};

// Third party imports
use tracing::{debug, info};

/// Task làm mới số dư định kỳ cho một địa chỉ.
///
/// Lấy số dư ngay khi bắt đầu, sau đó mỗi `interval`. Dừng khi gọi `stop()`,
/// khi bị drop, hoặc khi slot trong store không còn là ví đang theo dõi.
pub struct BalanceWatcher {
    stop_tx: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

/// Slot vẫn CONNECTED với đúng địa chỉ và chain.
fn is_still_watched(store: &MultiChainStore, address: &str, chain_id: ChainId) -> bool {
    let slot = store.wallet(chain_id.chain_type());
    slot.status == WalletStatus::Connected
        && slot.address.as_deref() == Some(address)
        && slot.chain_id == Some(chain_id)
}

impl BalanceWatcher {
    /// Dùng chu kỳ `balance_poll_interval_ms` của cấu hình.
    pub fn from_config(
        config: &WalletSystemConfig,
        store: Arc<MultiChainStore>,
        balances: Arc<dyn BalanceSource>,
        address: Option<String>,
        chain_id: Option<ChainId>,
    ) -> Option<Self> {
        Self::start(store, balances, address, chain_id, config.poll_interval())
    }

    /// Không khởi động nếu thiếu địa chỉ hoặc chain.
    pub fn start(
        store: Arc<MultiChainStore>,
        balances: Arc<dyn BalanceSource>,
        address: Option<String>,
        chain_id: Option<ChainId>,
        interval: Duration,
    ) -> Option<Self> {
        let (address, chain_id) = match (address, chain_id) {
            (Some(address), Some(chain_id)) if !address.is_empty() => (address, chain_id),
            _ => {
                debug!("Bỏ qua balance watcher: thiếu địa chỉ hoặc chain");
                return None;
            }
        };

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let ecosystem = chain_id.chain_type();

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !is_still_watched(&store, &address, chain_id) {
                            info!("Ví {} trên {} không còn kết nối, dừng balance watcher", address, chain_id);
                            break;
                        }
                        let balance = balances.fetch_balance(&address, chain_id).await;
                        // Ví có thể đã đổi trong lúc chờ RPC
                        if !is_still_watched(&store, &address, chain_id) {
                            info!("Ví {} trên {} không còn kết nối, bỏ số dư vừa lấy", address, chain_id);
                            break;
                        }
                        debug!("Cập nhật số dư {} cho {} trên {}", balance, address, chain_id);
                        store.update_balance(ecosystem, &balance);
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            info!("Balance watcher cho {} đã dừng", address);
                            break;
                        }
                    }
                }
            }
        });

        Some(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|handle| !handle.is_finished()).unwrap_or(false)
    }

    /// Dừng và chờ task kết thúc.
    pub async fn stop(mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for BalanceWatcher {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
