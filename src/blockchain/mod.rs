//! Connection client cho từng hệ sinh thái
//!
//! - `solana`: pool connection theo cluster, số dư/account/blockhash
//! - `evm`: pool provider ethers theo chain, số dư native

// External imports
use async_trait::async_trait;

// Internal imports
use crate::chain::{ChainId, ChainType};

pub mod evm;
pub mod solana;

/// Nguồn số dư native cho một hệ sinh thái
///
/// Không bao giờ trả lỗi: lỗi được log và số dư là `"0"`.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    fn chain_type(&self) -> ChainType;

    async fn fetch_balance(&self, address: &str, chain_id: ChainId) -> String;
}
