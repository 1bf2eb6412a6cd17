use std::collections::HashMap;
use std::time::Duration;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chain::{self, ChainId, NetworkEnvironment, SolanaCluster};
use crate::utils::evm_chain_id_to_chain_id;

/// Commitment level dùng cho mọi truy vấn Solana.
pub const DEFAULT_COMMITMENT: &str = "confirmed";
/// Timeout xác nhận giao dịch (ms).
pub const CONFIRM_TRANSACTION_TIMEOUT_MS: u64 = 60000;
/// Timeout cho mỗi HTTP request tới RPC (ms).
pub const REQUEST_TIMEOUT_MS: u64 = 30000;
/// Số lần thử lại mặc định khi lấy số dư.
pub const MAX_RETRIES: u32 = 3;
/// Chu kỳ làm mới số dư (ms).
pub const BALANCE_POLL_INTERVAL_MS: u64 = 30000;
/// Số giao dịch tối đa giữ trong log.
pub const MAX_TRANSACTIONS: usize = 100;

const SOLANA_RPC_VARS: [(SolanaCluster, &str); 3] = [
    (SolanaCluster::MainnetBeta, "NEXT_PUBLIC_SOLANA_MAINNET_RPC"),
    (SolanaCluster::Devnet, "NEXT_PUBLIC_SOLANA_DEVNET_RPC"),
    (SolanaCluster::Testnet, "NEXT_PUBLIC_SOLANA_TESTNET_RPC"),
];

/// Chain ưu tiên, dạng `sei-testnet` hoặc EVM chain ID dạng số.
const CHAIN_ID_VAR: &str = "NEXT_PUBLIC_CHAIN_ID";

const SEI_RPC_VARS: [(ChainId, &str); 3] = [
    (ChainId::SeiMainnet, "NEXT_PUBLIC_SEI_MAINNET_RPC"),
    (ChainId::SeiTestnet, "NEXT_PUBLIC_SEI_TESTNET_RPC"),
    (ChainId::SeiDevnet, "NEXT_PUBLIC_SEI_DEVNET_RPC"),
];

fn parse_chain_id(raw: &str) -> Option<ChainId> {
    let raw = raw.trim();
    match raw.parse::<u64>() {
        Ok(evm_chain_id) => evm_chain_id_to_chain_id(evm_chain_id),
        Err(_) => raw.parse().ok(),
    }
}

/// URL public mặc định cho từng Solana cluster.
pub fn default_solana_endpoint(cluster: SolanaCluster) -> &'static str {
    match cluster {
        SolanaCluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
        SolanaCluster::Devnet => "https://api.devnet.solana.com",
        SolanaCluster::Testnet => "https://api.testnet.solana.com",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSystemConfig {
    pub environment: NetworkEnvironment,
    /// Override RPC cho Solana, theo cluster.
    pub solana_rpc_overrides: HashMap<SolanaCluster, String>,
    /// Override RPC cho SEI EVM, theo chain.
    pub evm_rpc_overrides: HashMap<ChainId, String>,
    pub chain_id_override: Option<ChainId>,
    pub commitment: String,
    pub confirm_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    /// Backoff = base * 2^attempt.
    pub retry_base_delay_ms: u64,
    pub balance_poll_interval_ms: u64,
    pub max_transactions: usize,
}

impl Default for WalletSystemConfig {
    fn default() -> Self {
        Self {
            environment: NetworkEnvironment::Testnet,
            solana_rpc_overrides: HashMap::new(),
            evm_rpc_overrides: HashMap::new(),
            chain_id_override: None,
            commitment: DEFAULT_COMMITMENT.to_string(),
            confirm_timeout_ms: CONFIRM_TRANSACTION_TIMEOUT_MS,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            max_retries: MAX_RETRIES,
            retry_base_delay_ms: 1000,
            balance_poll_interval_ms: BALANCE_POLL_INTERVAL_MS,
            max_transactions: MAX_TRANSACTIONS,
        }
    }
}

impl WalletSystemConfig {
    /// Đọc cấu hình từ biến môi trường (và `.env` nếu có).
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Dựng cấu hình từ một hàm tra cứu biến bất kỳ.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup(chain::ENVIRONMENT_VAR) {
            config.environment = NetworkEnvironment::parse(&env);
        }

        for (cluster, var) in SOLANA_RPC_VARS {
            if let Some(url) = lookup(var).filter(|url| !url.is_empty()) {
                debug!("Solana RPC override cho {}: {}", cluster, url);
                config.solana_rpc_overrides.insert(cluster, url);
            }
        }

        for (chain_id, var) in SEI_RPC_VARS {
            if let Some(url) = lookup(var).filter(|url| !url.is_empty()) {
                debug!("SEI RPC override cho {}: {}", chain_id, url);
                config.evm_rpc_overrides.insert(chain_id, url);
            }
        }

        if let Some(raw) = lookup(CHAIN_ID_VAR) {
            config.chain_id_override = parse_chain_id(&raw);
            if config.chain_id_override.is_none() {
                warn!("Bỏ qua {}={}: chain không được hỗ trợ", CHAIN_ID_VAR, raw);
            }
        }

        config
    }

    pub fn with_solana_rpc(mut self, cluster: SolanaCluster, url: &str) -> Self {
        self.solana_rpc_overrides.insert(cluster, url.to_string());
        self
    }

    pub fn with_evm_rpc(mut self, chain_id: ChainId, url: &str) -> Self {
        self.evm_rpc_overrides.insert(chain_id, url.to_string());
        self
    }

    pub fn with_retry_base_delay(mut self, delay_ms: u64) -> Self {
        self.retry_base_delay_ms = delay_ms;
        self
    }

    pub fn with_request_timeout(mut self, timeout_ms: u64) -> Self {
        self.request_timeout_ms = timeout_ms;
        self
    }

    pub fn with_poll_interval(mut self, interval_ms: u64) -> Self {
        self.balance_poll_interval_ms = interval_ms;
        self
    }

    /// RPC endpoint cho cluster: override từ môi trường, hoặc URL public mặc định.
    pub fn solana_endpoint(&self, cluster: SolanaCluster) -> String {
        self.solana_rpc_overrides
            .get(&cluster)
            .cloned()
            .unwrap_or_else(|| default_solana_endpoint(cluster).to_string())
    }

    /// RPC endpoint cho EVM chain: override, hoặc primary URL trong registry.
    pub fn evm_endpoint(&self, chain_id: ChainId) -> String {
        self.evm_rpc_overrides
            .get(&chain_id)
            .cloned()
            .unwrap_or_else(|| chain_id.metadata().primary_rpc_url().to_string())
    }

    /// `NEXT_PUBLIC_CHAIN_ID` nếu có, không thì chain mặc định của môi trường.
    pub fn default_chain(&self) -> ChainId {
        self.chain_id_override
            .unwrap_or_else(|| chain::default_chain_for(self.environment))
    }

    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms.saturating_mul(1u64 << attempt.min(16)))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.balance_poll_interval_ms)
    }
}
