// External imports
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::Address;
use reqwest::{ClientBuilder, Url};
use tokio::sync::RwLock;

// Standard library imports
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

// Internal imports
use crate::blockchain::BalanceSource;
use crate::chain::{ChainId, ChainType};
use crate::config::WalletSystemConfig;
use crate::error::ConnectionError;
use crate::utils::units_to_native;

// Third party imports
use tracing::{debug, error, info};

/// Client cho các EVM chain (SEI), giữ một provider cho mỗi chain.
pub struct EvmClient {
    config: WalletSystemConfig,
    providers: RwLock<HashMap<ChainId, Arc<Provider<Http>>>>,
}

impl EvmClient {
    pub fn new(config: WalletSystemConfig) -> Self {
        Self {
            config,
            providers: RwLock::new(HashMap::new()),
        }
    }

    /// Provider cho chain, tạo mới nếu chưa có trong pool.
    pub async fn get_provider(&self, chain_id: ChainId) -> Result<Arc<Provider<Http>>, ConnectionError> {
        if chain_id.chain_type() != ChainType::EVM {
            return Err(ConnectionError::Transport(format!("{} is not an EVM chain", chain_id)));
        }

        {
            let providers = self.providers.read().await;
            if let Some(provider) = providers.get(&chain_id) {
                return Ok(provider.clone());
            }
        }

        let endpoint = self.rpc_endpoint(chain_id);
        let url = Url::parse(&endpoint)
            .map_err(|e| ConnectionError::Transport(format!("Invalid RPC URL '{}': {}", endpoint, e)))?;
        let client = ClientBuilder::new()
            .timeout(Duration::from_millis(self.config.request_timeout_ms))
            .build()
            .map_err(|e| ConnectionError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        let provider = Arc::new(Provider::new(Http::new_with_client(url, client)));
        info!("Tạo EVM provider mới cho {} ({})", chain_id, endpoint);

        let mut providers = self.providers.write().await;
        Ok(providers.entry(chain_id).or_insert(provider).clone())
    }

    /// Số dư native (đơn vị SEI), lỗi bất kỳ trả về `"0"`.
    pub async fn get_balance(&self, address: &str, chain_id: ChainId) -> String {
        match self.try_get_balance(address, chain_id).await {
            Ok(balance) => balance,
            Err(e) => {
                error!("Failed to fetch EVM balance for {} on {}: {}", address, chain_id, e);
                "0".to_string()
            }
        }
    }

    /// Địa chỉ hex 20 bytes có tiền tố `0x`.
    pub fn is_valid_address(address: &str) -> bool {
        parse_address(address).is_ok()
    }

    pub fn rpc_endpoint(&self, chain_id: ChainId) -> String {
        self.config.evm_endpoint(chain_id)
    }

    pub async fn clear_pool(&self) {
        let mut providers = self.providers.write().await;
        debug!("Xóa {} EVM provider khỏi pool", providers.len());
        providers.clear();
    }

    pub async fn pool_size(&self) -> usize {
        self.providers.read().await.len()
    }

    async fn try_get_balance(&self, address: &str, chain_id: ChainId) -> Result<String, ConnectionError> {
        let address = parse_address(address)?;
        let provider = self.get_provider(chain_id).await?;
        let wei = provider
            .get_balance(address, None)
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))?;
        let decimals = chain_id.metadata().native_currency.decimals;
        units_to_native(wei, decimals).map_err(|e| ConnectionError::MalformedResponse(e.to_string()))
    }
}

fn parse_address(address: &str) -> Result<Address, ConnectionError> {
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| ConnectionError::InvalidAddress(address.to_string()))?;
    if hex.len() != 40 {
        return Err(ConnectionError::InvalidAddress(address.to_string()));
    }
    Address::from_str(hex).map_err(|_| ConnectionError::InvalidAddress(address.to_string()))
}

#[async_trait]
impl BalanceSource for EvmClient {
    fn chain_type(&self) -> ChainType {
        ChainType::EVM
    }

    async fn fetch_balance(&self, address: &str, chain_id: ChainId) -> String {
        self.get_balance(address, chain_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x71C7656EC7ab88b098defB751B7401B5f6d8976F";

    fn unreachable_client() -> EvmClient {
        let config = WalletSystemConfig::default()
            .with_evm_rpc(ChainId::SeiTestnet, "http://127.0.0.1:1")
            .with_request_timeout(2000);
        EvmClient::new(config)
    }

    #[test]
    fn test_address_validation() {
        assert!(EvmClient::is_valid_address(ADDRESS));
        assert!(EvmClient::is_valid_address("0x0000000000000000000000000000000000000000"));
        assert!(!EvmClient::is_valid_address("71C7656EC7ab88b098defB751B7401B5f6d8976F"));
        assert!(!EvmClient::is_valid_address("0x1234"));
        assert!(!EvmClient::is_valid_address("0xZZC7656EC7ab88b098defB751B7401B5f6d8976F"));
        assert!(!EvmClient::is_valid_address("So11111111111111111111111111111111111111112"));
    }

    #[tokio::test]
    async fn test_provider_reused_per_chain() {
        let client = unreachable_client();
        let first = client.get_provider(ChainId::SeiTestnet).await.unwrap();
        let second = client.get_provider(ChainId::SeiTestnet).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        client.get_provider(ChainId::SeiMainnet).await.unwrap();
        assert_eq!(client.pool_size().await, 2);

        client.clear_pool().await;
        assert_eq!(client.pool_size().await, 0);
        let third = client.get_provider(ChainId::SeiTestnet).await.unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[tokio::test]
    async fn test_non_evm_chain_rejected() {
        let client = unreachable_client();
        assert!(client.get_provider(ChainId::SolanaDevnet).await.is_err());
        assert_eq!(client.get_balance(ADDRESS, ChainId::SolanaDevnet).await, "0");
    }

    #[tokio::test]
    async fn test_balance_fails_open() {
        let client = unreachable_client();
        assert_eq!(client.get_balance(ADDRESS, ChainId::SeiTestnet).await, "0");
        assert_eq!(client.get_balance("not-an-address", ChainId::SeiTestnet).await, "0");
        assert_eq!(client.fetch_balance(ADDRESS, ChainId::SeiTestnet).await, "0");
    }

    #[test]
    fn test_rpc_endpoint_override() {
        let client = unreachable_client();
        assert_eq!(client.rpc_endpoint(ChainId::SeiTestnet), "http://127.0.0.1:1");
        assert_eq!(client.rpc_endpoint(ChainId::SeiMainnet), "https://evm-rpc.sei-apis.com");
    }
}
