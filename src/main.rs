// multichain-wallet/src/main.rs

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use multichain_wallet::blockchain::evm::EvmClient;
use multichain_wallet::blockchain::solana::{chain_id_to_cluster, SolanaClient};
use multichain_wallet::chain::{ChainId, ChainType};
use multichain_wallet::config::WalletSystemConfig;
use multichain_wallet::utils::{address_url, supported_chains};

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global default subscriber")?;
    Ok(())
}

fn print_chains(config: &WalletSystemConfig) {
    println!("Environment: {:?}", config.environment);
    println!("Default chain: {}", config.default_chain());
    println!("Supported chains:");
    for chain_id in supported_chains(true) {
        let metadata = chain_id.metadata();
        println!(
            "  {:<16} {:<24} {:<6} {}",
            chain_id.as_str(),
            metadata.name,
            metadata.native_currency.symbol,
            metadata.primary_rpc_url()
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    let config = WalletSystemConfig::from_env();
    let mut args = std::env::args().skip(1);

    let Some(address) = args.next() else {
        print_chains(&config);
        return Ok(());
    };

    let chain_id = match args.next() {
        Some(raw) => raw.parse::<ChainId>()?,
        None => config.default_chain(),
    };
    info!("Lấy số dư cho {} trên {}", address, chain_id);

    let symbol = chain_id.metadata().native_currency.symbol;
    let balance = match chain_id.chain_type() {
        ChainType::EVM => {
            if !EvmClient::is_valid_address(&address) {
                bail!("Invalid EVM address: {}", address);
            }
            EvmClient::new(config.clone()).get_balance(&address, chain_id).await
        }
        ChainType::Solana => {
            if !SolanaClient::is_valid_address(&address) {
                bail!("Invalid Solana address: {}", address);
            }
            let client = SolanaClient::new(config.clone());
            client
                .get_balance_with_retry(&address, chain_id_to_cluster(chain_id), config.max_retries)
                .await
        }
        ChainType::Sui => bail!("Chain not supported: {}", chain_id),
    };

    println!("{} {}", balance, symbol);
    println!("{}", address_url(chain_id, &address));
    Ok(())
}
