//! Registry metadata cho các chain được hỗ trợ
//!
//! Bảng tra cứu tĩnh từ `ChainId` sang `ChainMetadata`. Không có state,
//! mọi `ChainId` đều có đúng một bản ghi metadata.

use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Biến môi trường chọn network mặc định.
pub const ENVIRONMENT_VAR: &str = "NEXT_PUBLIC_ENVIRONMENT";

/// Loại hệ sinh thái blockchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainType {
    EVM,
    Solana,
    /// Chưa hỗ trợ kết nối, chỉ hiển thị.
    Sui,
}

impl ChainType {
    pub const ALL: [ChainType; 3] = [ChainType::EVM, ChainType::Solana, ChainType::Sui];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EVM => "evm",
            Self::Solana => "solana",
            Self::Sui => "sui",
        }
    }
}

impl fmt::Display for ChainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chain ID cho các network được hỗ trợ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainId {
    /// SEI Mainnet (EVM).
    SeiMainnet,
    /// SEI Atlantic-2 Testnet.
    SeiTestnet,
    /// SEI Arctic-1 Devnet.
    SeiDevnet,
    /// Solana Mainnet Beta.
    SolanaMainnet,
    /// Solana Devnet.
    SolanaDevnet,
    /// Sui Mainnet.
    SuiMainnet,
    /// Sui Testnet.
    SuiTestnet,
}

impl ChainId {
    pub const ALL: [ChainId; 7] = [
        ChainId::SeiMainnet,
        ChainId::SeiTestnet,
        ChainId::SeiDevnet,
        ChainId::SolanaMainnet,
        ChainId::SolanaDevnet,
        ChainId::SuiMainnet,
        ChainId::SuiTestnet,
    ];

    /// ID dạng chuỗi, ổn định và không bao giờ tái sử dụng.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SeiMainnet => "sei-mainnet",
            Self::SeiTestnet => "sei-testnet",
            Self::SeiDevnet => "sei-devnet",
            Self::SolanaMainnet => "solana-mainnet",
            Self::SolanaDevnet => "solana-devnet",
            Self::SuiMainnet => "sui-mainnet",
            Self::SuiTestnet => "sui-testnet",
        }
    }

    /// Metadata của chain này.
    pub fn metadata(&self) -> &'static ChainMetadata {
        match self {
            Self::SeiMainnet => &SEI_MAINNET,
            Self::SeiTestnet => &SEI_TESTNET,
            Self::SeiDevnet => &SEI_DEVNET,
            Self::SolanaMainnet => &SOLANA_MAINNET,
            Self::SolanaDevnet => &SOLANA_DEVNET,
            Self::SuiMainnet => &SUI_MAINNET,
            Self::SuiTestnet => &SUI_TESTNET,
        }
    }

    pub fn chain_type(&self) -> ChainType {
        self.metadata().chain_type
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChainId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| WalletError::ChainNotSupported(s.to_string()))
    }
}

/// Môi trường network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkEnvironment {
    Mainnet,
    Testnet,
    Devnet,
}

impl NetworkEnvironment {
    /// Switch ba nhánh: mainnet / devnet / còn lại là testnet.
    pub fn parse(value: &str) -> Self {
        match value {
            "mainnet" => Self::Mainnet,
            "devnet" => Self::Devnet,
            _ => Self::Testnet,
        }
    }
}

/// Solana cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SolanaCluster {
    MainnetBeta,
    Devnet,
    Testnet,
}

impl SolanaCluster {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MainnetBeta => "mainnet-beta",
            Self::Devnet => "devnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for SolanaCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u32,
}

/// Metadata bất biến của một chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainMetadata {
    pub id: ChainId,
    pub chain_type: ChainType,
    pub name: &'static str,
    pub display_name: &'static str,
    pub environment: NetworkEnvironment,
    pub native_currency: NativeCurrency,
    /// URL đầu tiên là primary.
    pub rpc_urls: &'static [&'static str],
    pub block_explorer_urls: &'static [&'static str],
    pub icon_url: Option<&'static str>,
    pub is_testnet: bool,
    pub evm_chain_id: Option<u64>,
    pub solana_cluster: Option<SolanaCluster>,
}

impl ChainMetadata {
    pub fn primary_rpc_url(&self) -> &'static str {
        self.rpc_urls.first().copied().unwrap_or_default()
    }

    pub fn primary_explorer_url(&self) -> &'static str {
        self.block_explorer_urls.first().copied().unwrap_or_default()
    }
}

const SEI_CURRENCY: NativeCurrency = NativeCurrency { name: "SEI", symbol: "SEI", decimals: 18 };
const SOL_CURRENCY: NativeCurrency = NativeCurrency { name: "Solana", symbol: "SOL", decimals: 9 };
const SUI_CURRENCY: NativeCurrency = NativeCurrency { name: "Sui", symbol: "SUI", decimals: 9 };

static SEI_MAINNET: ChainMetadata = ChainMetadata {
    id: ChainId::SeiMainnet,
    chain_type: ChainType::EVM,
    name: "SEI Mainnet",
    display_name: "SEI",
    environment: NetworkEnvironment::Mainnet,
    native_currency: SEI_CURRENCY,
    rpc_urls: &["https://evm-rpc.sei-apis.com", "https://evm-rpc-testnet.sei-apis.com"],
    block_explorer_urls: &["https://seitrace.com"],
    icon_url: Some("/chains/sei.svg"),
    is_testnet: false,
    evm_chain_id: Some(1329),
    solana_cluster: None,
};

static SEI_TESTNET: ChainMetadata = ChainMetadata {
    id: ChainId::SeiTestnet,
    chain_type: ChainType::EVM,
    name: "SEI Atlantic-2 Testnet",
    display_name: "SEI Testnet",
    environment: NetworkEnvironment::Testnet,
    native_currency: SEI_CURRENCY,
    rpc_urls: &["https://evm-rpc-testnet.sei-apis.com"],
    block_explorer_urls: &["https://seitrace.com/atlantic-2"],
    icon_url: Some("/chains/sei.svg"),
    is_testnet: true,
    evm_chain_id: Some(1328),
    solana_cluster: None,
};

static SEI_DEVNET: ChainMetadata = ChainMetadata {
    id: ChainId::SeiDevnet,
    chain_type: ChainType::EVM,
    name: "SEI Arctic-1 Devnet",
    display_name: "SEI Devnet",
    environment: NetworkEnvironment::Devnet,
    native_currency: SEI_CURRENCY,
    rpc_urls: &["https://evm-rpc-arctic-1.sei-apis.com"],
    block_explorer_urls: &["https://seitrace.com/?chain=devnet"],
    icon_url: Some("/chains/sei.svg"),
    is_testnet: true,
    evm_chain_id: Some(713715),
    solana_cluster: None,
};

static SOLANA_MAINNET: ChainMetadata = ChainMetadata {
    id: ChainId::SolanaMainnet,
    chain_type: ChainType::Solana,
    name: "Solana Mainnet Beta",
    display_name: "Solana",
    environment: NetworkEnvironment::Mainnet,
    native_currency: SOL_CURRENCY,
    rpc_urls: &["https://api.mainnet-beta.solana.com", "https://solana-api.projectserum.com"],
    block_explorer_urls: &["https://explorer.solana.com", "https://solscan.io"],
    icon_url: Some("/chains/solana.svg"),
    is_testnet: false,
    evm_chain_id: None,
    solana_cluster: Some(SolanaCluster::MainnetBeta),
};

static SOLANA_DEVNET: ChainMetadata = ChainMetadata {
    id: ChainId::SolanaDevnet,
    chain_type: ChainType::Solana,
    name: "Solana Devnet",
    display_name: "Solana Devnet",
    environment: NetworkEnvironment::Devnet,
    native_currency: SOL_CURRENCY,
    rpc_urls: &["https://api.devnet.solana.com"],
    block_explorer_urls: &["https://explorer.solana.com/?cluster=devnet"],
    icon_url: Some("/chains/solana.svg"),
    is_testnet: true,
    evm_chain_id: None,
    solana_cluster: Some(SolanaCluster::Devnet),
};

static SUI_MAINNET: ChainMetadata = ChainMetadata {
    id: ChainId::SuiMainnet,
    chain_type: ChainType::Sui,
    name: "Sui Mainnet",
    display_name: "Sui",
    environment: NetworkEnvironment::Mainnet,
    native_currency: SUI_CURRENCY,
    rpc_urls: &["https://fullnode.mainnet.sui.io"],
    block_explorer_urls: &["https://explorer.sui.io"],
    icon_url: Some("/chains/sui.svg"),
    is_testnet: false,
    evm_chain_id: None,
    solana_cluster: None,
};

static SUI_TESTNET: ChainMetadata = ChainMetadata {
    id: ChainId::SuiTestnet,
    chain_type: ChainType::Sui,
    name: "Sui Testnet",
    display_name: "Sui Testnet",
    environment: NetworkEnvironment::Testnet,
    native_currency: SUI_CURRENCY,
    rpc_urls: &["https://fullnode.testnet.sui.io"],
    block_explorer_urls: &["https://explorer.sui.io/?network=testnet"],
    icon_url: Some("/chains/sui.svg"),
    is_testnet: true,
    evm_chain_id: None,
    solana_cluster: None,
};

/// Lấy metadata theo chain ID.
pub fn get_chain_metadata(chain_id: ChainId) -> &'static ChainMetadata {
    chain_id.metadata()
}

/// Lấy metadata theo ID dạng chuỗi, lỗi nếu chain chưa đăng ký.
pub fn lookup_chain_metadata(chain_id: &str) -> Result<&'static ChainMetadata, WalletError> {
    Ok(ChainId::from_str(chain_id)?.metadata())
}

pub fn get_chains_by_type(chain_type: ChainType) -> Vec<&'static ChainMetadata> {
    ChainId::ALL
        .iter()
        .map(|id| id.metadata())
        .filter(|meta| meta.chain_type == chain_type)
        .collect()
}

pub fn get_mainnet_chains() -> Vec<&'static ChainMetadata> {
    ChainId::ALL.iter().map(|id| id.metadata()).filter(|meta| !meta.is_testnet).collect()
}

pub fn get_testnet_chains() -> Vec<&'static ChainMetadata> {
    ChainId::ALL.iter().map(|id| id.metadata()).filter(|meta| meta.is_testnet).collect()
}

/// Chain mặc định theo môi trường, luôn là một SEI EVM chain.
pub fn default_chain_for(environment: NetworkEnvironment) -> ChainId {
    match environment {
        NetworkEnvironment::Mainnet => ChainId::SeiMainnet,
        NetworkEnvironment::Devnet => ChainId::SeiDevnet,
        NetworkEnvironment::Testnet => ChainId::SeiTestnet,
    }
}

/// Đọc `NEXT_PUBLIC_ENVIRONMENT`, mặc định testnet.
pub fn get_default_chain() -> ChainId {
    let env = std::env::var(ENVIRONMENT_VAR).unwrap_or_else(|_| "testnet".to_string());
    default_chain_for(NetworkEnvironment::parse(&env))
}

/// Hiện tại chỉ EVM và Solana được phép kết nối, Sui để sau.
pub fn is_chain_type_supported(chain_type: ChainType) -> bool {
    match chain_type {
        ChainType::EVM | ChainType::Solana => true,
        ChainType::Sui => false,
    }
}

pub fn get_evm_chain_id(chain_id: ChainId) -> Option<u64> {
    chain_id.metadata().evm_chain_id
}

pub fn get_solana_cluster(chain_id: ChainId) -> Option<SolanaCluster> {
    chain_id.metadata().solana_cluster
}
