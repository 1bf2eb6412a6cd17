//! Tiện ích cho chain: URL explorer, định dạng số dư, chuyển đổi chain ID

use ethers::types::U256;
use ethers::utils::format_units;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::str::FromStr;

use crate::chain::{self, ChainId, ChainType};
use crate::error::{Result, WalletError};

/// Số chữ số hiển thị mặc định.
pub const DEFAULT_DISPLAY_DECIMALS: u32 = 4;

/// URL explorer cho một giao dịch.
pub fn transaction_url(chain_id: ChainId, tx_hash: &str) -> String {
    let metadata = chain_id.metadata();
    let base_url = metadata.primary_explorer_url();

    match metadata.chain_type {
        ChainType::EVM | ChainType::Solana => format!("{}/tx/{}", base_url, tx_hash),
        ChainType::Sui => format!("{}/txblock/{}", base_url, tx_hash),
    }
}

/// URL explorer cho một địa chỉ.
pub fn address_url(chain_id: ChainId, address: &str) -> String {
    let base_url = chain_id.metadata().primary_explorer_url();
    format!("{}/address/{}", base_url, address)
}

/// Đổi số nguyên minor-unit sang chuỗi thập phân đơn vị native, bỏ số 0 thừa
///
/// `5_000_000_000` lamports với 9 decimals thành `"5"`, `1` thành `"0.000000001"`.
pub fn units_to_native(raw: U256, decimals: u32) -> Result<String> {
    let formatted = format_units(raw, decimals)
        .map_err(|e| WalletError::InvalidAmount(format!("{}: {}", raw, e)))?;

    if !formatted.contains('.') {
        return Ok(formatted);
    }
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    Ok(trimmed.to_string())
}

/// Định dạng số dư minor-unit để hiển thị với `min(max_decimals, decimals)` chữ số.
pub fn format_balance(balance: &str, chain_id: ChainId, max_decimals: u32) -> Result<String> {
    let decimals = chain_id.metadata().native_currency.decimals;
    let raw = U256::from_dec_str(balance.trim())
        .map_err(|e| WalletError::InvalidAmount(format!("{}: {}", balance, e)))?;

    let native = units_to_native(raw, decimals)?;
    let value = Decimal::from_str(&native)
        .map_err(|e| WalletError::InvalidAmount(format!("{}: {}", native, e)))?;

    let places = max_decimals.min(decimals);
    let mut rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(places);
    Ok(rounded.to_string())
}

/// Đổi EVM chain ID dạng số sang `ChainId`.
pub fn evm_chain_id_to_chain_id(evm_chain_id: u64) -> Option<ChainId> {
    ChainId::ALL
        .iter()
        .copied()
        .find(|id| id.metadata().evm_chain_id == Some(evm_chain_id))
}

/// Các chain có thể kết nối (bỏ Sui), tùy chọn bỏ testnet.
pub fn supported_chains(include_testnets: bool) -> Vec<ChainId> {
    ChainId::ALL
        .iter()
        .copied()
        .filter(|id| {
            let metadata = id.metadata();
            if !include_testnets && metadata.is_testnet {
                return false;
            }
            chain::is_chain_type_supported(metadata.chain_type)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainIcon {
    pub src: &'static str,
    pub alt: String,
}

pub fn chain_icon(chain_id: ChainId) -> Option<ChainIcon> {
    let metadata = chain_id.metadata();
    metadata.icon_url.map(|src| ChainIcon {
        src,
        alt: format!("{} icon", metadata.display_name),
    })
}
