//! Module cho Solana connection client
//!
//! Cung cấp connection pool theo cluster và các truy vấn chỉ đọc (số dư,
//! account info, blockhash). Các truy vấn số dư/account theo chính sách
//! fail-open: lỗi được log và trả về `"0"` hoặc `None` thay vì propagate.
//!
//! ## Ví dụ:
//! ```no_run
//! use multichain_wallet::blockchain::solana::SolanaClient;
//! use multichain_wallet::chain::SolanaCluster;
//!
//! # async fn run() {
//! let client = SolanaClient::global();
//! let balance = client
//!     .get_balance("So11111111111111111111111111111111111111112", SolanaCluster::Devnet)
//!     .await;
//! println!("Balance: {} SOL", balance);
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use async_trait::async_trait;
use ethers::types::U256;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::blockchain::BalanceSource;
use crate::chain::{ChainId, ChainType, SolanaCluster};
use crate::config::WalletSystemConfig;
use crate::error::ConnectionError;
use crate::utils::units_to_native;

/// 1 SOL = 10^9 lamports.
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const SOL_DECIMALS: u32 = 9;

/// Public key Solana (32 bytes, mã hóa Base58).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pubkey([u8; 32]);

impl Pubkey {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }
}

impl FromStr for Pubkey {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|_| ConnectionError::InvalidAddress(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ConnectionError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

/// Cấu hình cho mỗi connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub commitment: String,
    pub confirm_transaction_initial_timeout: Duration,
    pub request_timeout: Duration,
}

impl ConnectionConfig {
    pub fn from_system(config: &WalletSystemConfig) -> Self {
        Self {
            commitment: config.commitment.clone(),
            confirm_transaction_initial_timeout: Duration::from_millis(config.confirm_timeout_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
        }
    }
}

/// Thông tin tài khoản trả về từ `getAccountInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub lamports: u64,
    pub owner: String,
    pub executable: bool,
    pub rent_epoch: u64,
    #[serde(default)]
    pub space: Option<u64>,
    pub data: Value,
}

/// Blockhash gần nhất.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockhashInfo {
    pub blockhash: String,
    pub last_valid_block_height: u64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    value: T,
}

/// Các truy vấn RPC mà client cần từ một connection.
#[async_trait]
pub trait SolanaRpc: Send + Sync {
    /// Số dư theo lamports.
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, ConnectionError>;

    /// `None` nếu tài khoản không tồn tại.
    async fn get_account_info(&self, pubkey: &Pubkey) -> Result<Option<AccountInfo>, ConnectionError>;

    async fn get_latest_blockhash(&self) -> Result<BlockhashInfo, ConnectionError>;
}

/// Connection JSON-RPC qua HTTP.
pub struct HttpSolanaConnection {
    endpoint: String,
    config: ConnectionConfig,
    client: Client,
    request_id: AtomicU64,
}

impl HttpSolanaConnection {
    pub fn new(endpoint: &str, config: ConnectionConfig) -> Result<Self, ConnectionError> {
        let client = ClientBuilder::new()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConnectionError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.to_string(),
            config,
            client,
            request_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn next_request_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::SeqCst)
    }

    async fn call_rpc<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ConnectionError> {
        let payload = json!({
            "jsonrpc": "2.0",
            "id": self.next_request_id(),
            "method": method,
            "params": params,
        });

        let response = self.client.post(&self.endpoint).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectionError::Transport(format!("RPC request failed with status: {}", status)));
        }

        let response_json: Value = response.json().await?;

        // Lỗi JSON-RPC
        if let Some(error) = response_json.get("error") {
            return Err(ConnectionError::Rpc {
                code: error["code"].as_i64().unwrap_or(0),
                message: error["message"].as_str().unwrap_or("Unknown error").to_string(),
            });
        }

        let result = response_json
            .get("result")
            .cloned()
            .ok_or_else(|| ConnectionError::MalformedResponse("No result field in RPC response".to_string()))?;

        serde_json::from_value(result)
            .map_err(|e| ConnectionError::MalformedResponse(format!("Failed to parse RPC result: {}", e)))
    }
}

#[async_trait]
impl SolanaRpc for HttpSolanaConnection {
    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, ConnectionError> {
        let params = json!([pubkey.to_string(), { "commitment": self.config.commitment }]);
        let response: RpcResponse<u64> = self.call_rpc("getBalance", params).await?;
        Ok(response.value)
    }

    async fn get_account_info(&self, pubkey: &Pubkey) -> Result<Option<AccountInfo>, ConnectionError> {
        let params = json!([
            pubkey.to_string(),
            { "encoding": "base64", "commitment": self.config.commitment }
        ]);
        let response: RpcResponse<Option<AccountInfo>> = self.call_rpc("getAccountInfo", params).await?;
        Ok(response.value)
    }

    async fn get_latest_blockhash(&self) -> Result<BlockhashInfo, ConnectionError> {
        let params = json!([{ "commitment": self.config.commitment }]);
        let response: RpcResponse<BlockhashInfo> = self.call_rpc("getLatestBlockhash", params).await?;
        Ok(response.value)
    }
}

/// Hàm dựng connection mới cho một endpoint.
pub type ConnectionFactory =
    Arc<dyn Fn(&str, &ConnectionConfig) -> Result<Arc<dyn SolanaRpc>, ConnectionError> + Send + Sync>;

fn http_connection_factory() -> ConnectionFactory {
    Arc::new(|endpoint: &str, config: &ConnectionConfig| -> Result<Arc<dyn SolanaRpc>, ConnectionError> {
        let connection = HttpSolanaConnection::new(endpoint, config.clone())?;
        Ok(Arc::new(connection) as Arc<dyn SolanaRpc>)
    })
}

/// Client dùng chung cho toàn process.
static SOLANA_CLIENT: Lazy<Arc<SolanaClient>> =
    Lazy::new(|| Arc::new(SolanaClient::new(WalletSystemConfig::from_env())));

/// Map chain ID sang cluster, chain lạ thì dùng devnet.
pub fn chain_id_to_cluster(chain_id: ChainId) -> SolanaCluster {
    chain_id.metadata().solana_cluster.unwrap_or(SolanaCluster::Devnet)
}

/// Solana connection client với pool theo cluster.
pub struct SolanaClient {
    config: WalletSystemConfig,
    connection_config: ConnectionConfig,
    factory: ConnectionFactory,
    pool: RwLock<HashMap<SolanaCluster, Arc<dyn SolanaRpc>>>,
}

impl SolanaClient {
    pub fn new(config: WalletSystemConfig) -> Self {
        Self::with_factory(config, http_connection_factory())
    }

    /// Dựng client với factory tùy chỉnh (dùng cho test).
    pub fn with_factory(config: WalletSystemConfig, factory: ConnectionFactory) -> Self {
        let connection_config = ConnectionConfig::from_system(&config);
        Self {
            config,
            connection_config,
            factory,
            pool: RwLock::new(HashMap::new()),
        }
    }

    pub fn global() -> Arc<SolanaClient> {
        SOLANA_CLIENT.clone()
    }

    pub fn config(&self) -> &WalletSystemConfig {
        &self.config
    }

    /// Lấy connection từ pool, hoặc tạo mới nếu chưa có.
    pub async fn get_connection(&self, cluster: SolanaCluster) -> Result<Arc<dyn SolanaRpc>, ConnectionError> {
        {
            let pool = self.pool.read().await;
            if let Some(connection) = pool.get(&cluster) {
                return Ok(connection.clone());
            }
        }

        let endpoint = self.rpc_endpoint(cluster);
        let connection = (self.factory)(&endpoint, &self.connection_config)?;
        info!("Tạo Solana connection mới cho {} ({})", cluster, endpoint);

        let mut pool = self.pool.write().await;
        Ok(pool.entry(cluster).or_insert(connection).clone())
    }

    /// Số dư theo SOL dạng chuỗi thập phân. Lỗi bất kỳ trả về `"0"`.
    pub async fn get_balance(&self, address: &str, cluster: SolanaCluster) -> String {
        match self.try_get_balance(address, cluster).await {
            Ok(balance) => balance,
            Err(e) => {
                error!("Failed to fetch Solana balance for {}: {}", address, e);
                "0".to_string()
            }
        }
    }

    /// Như `get_balance` nhưng thử lại với backoff 2^attempt, hết lượt thì trả về `"0"`.
    pub async fn get_balance_with_retry(&self, address: &str, cluster: SolanaCluster, max_retries: u32) -> String {
        // Địa chỉ sai thì thử lại cũng vô ích
        let pubkey = match Pubkey::from_str(address) {
            Ok(pubkey) => pubkey,
            Err(e) => {
                error!("Failed to fetch Solana balance for {}: {}", address, e);
                return "0".to_string();
            }
        };

        let mut last_error = None;
        for attempt in 0..max_retries {
            match self.fetch_balance_string(&pubkey, cluster).await {
                Ok(balance) => return balance,
                Err(e) => {
                    warn!("Lấy số dư Solana thất bại (lần {}/{}): {}", attempt + 1, max_retries, e);
                    last_error = Some(e);
                    if attempt + 1 < max_retries {
                        tokio::time::sleep(self.config.retry_delay(attempt)).await;
                    }
                }
            }
        }

        error!(
            "Failed to fetch Solana balance after {} attempts: {:?}",
            max_retries, last_error
        );
        "0".to_string()
    }

    /// Account info, `None` nếu tài khoản không tồn tại hoặc có lỗi.
    pub async fn get_account_info(&self, address: &str, cluster: SolanaCluster) -> Option<AccountInfo> {
        match self.try_get_account_info(address, cluster).await {
            Ok(info) => info,
            Err(e) => {
                error!("Failed to fetch account info for {}: {}", address, e);
                None
            }
        }
    }

    pub async fn get_recent_blockhash(&self, cluster: SolanaCluster) -> Result<BlockhashInfo, ConnectionError> {
        let connection = self.get_connection(cluster).await?;
        connection.get_latest_blockhash().await
    }

    pub fn is_valid_address(address: &str) -> bool {
        Pubkey::from_str(address).is_ok()
    }

    pub fn rpc_endpoint(&self, cluster: SolanaCluster) -> String {
        self.config.solana_endpoint(cluster)
    }

    /// Xóa toàn bộ pool, lần gọi sau sẽ tạo connection mới.
    pub async fn clear_pool(&self) {
        let mut pool = self.pool.write().await;
        debug!("Xóa {} Solana connection khỏi pool", pool.len());
        pool.clear();
    }

    pub async fn pool_size(&self) -> usize {
        self.pool.read().await.len()
    }

    async fn try_get_balance(&self, address: &str, cluster: SolanaCluster) -> Result<String, ConnectionError> {
        let pubkey = Pubkey::from_str(address)?;
        self.fetch_balance_string(&pubkey, cluster).await
    }

    async fn try_get_account_info(
        &self,
        address: &str,
        cluster: SolanaCluster,
    ) -> Result<Option<AccountInfo>, ConnectionError> {
        let pubkey = Pubkey::from_str(address)?;
        let connection = self.get_connection(cluster).await?;
        connection.get_account_info(&pubkey).await
    }

    async fn fetch_balance_string(&self, pubkey: &Pubkey, cluster: SolanaCluster) -> Result<String, ConnectionError> {
        let connection = self.get_connection(cluster).await?;
        let lamports = connection.get_balance(pubkey).await?;
        units_to_native(U256::from(lamports), SOL_DECIMALS)
            .map_err(|e| ConnectionError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl BalanceSource for SolanaClient {
    fn chain_type(&self) -> ChainType {
        ChainType::Solana
    }

    async fn fetch_balance(&self, address: &str, chain_id: ChainId) -> String {
        self.get_balance(address, chain_id_to_cluster(chain_id)).await
    }
}
