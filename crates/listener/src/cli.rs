use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use shared::chainhook::ChainhookClient;
use shared::models::predicate::Network;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::aggregator::snapshot::SnapshotWriter;
use crate::aggregator::{Aggregator, NoAmounts};
use crate::observer::{ChainhookObserver, ServerOptions};
use crate::predicates::{build_predicates, PredicateSettings};

/// Every option can also be set through the environment (or a `.env` file).
#[derive(Parser, Debug)]
#[command(name = "marketplace-listener")]
#[command(about = "Chainhook listener aggregating NFT marketplace activity")]
pub struct Cli {
    /// Fully qualified marketplace contract id (`<address>.<name>`)
    #[arg(long = "contract", env = "NFT_MARKETPLACE_CONTRACT")]
    pub contract_identifier: String,

    /// First block the predicates should scan
    #[arg(long, env = "START_BLOCK", default_value = "0")]
    pub start_block: u64,

    /// Public base URL the Chainhook node posts callbacks to
    #[arg(short = 'u', long, env = "EXTERNAL_BASE_URL")]
    pub external_base_url: String,

    /// Shared bearer token for callbacks
    #[arg(short = 'a', long, env = "SERVER_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: String,

    /// Host the callback server binds to
    #[arg(long, env = "SERVER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port the callback server binds to
    #[arg(short = 'p', long, env = "SERVER_PORT", default_value = "3000")]
    pub port: u16,

    /// Chainhook node URL
    #[arg(
        short = 'c',
        long,
        env = "CHAINHOOK_NODE_URL",
        default_value = "http://localhost:20456"
    )]
    pub chainhook_node_url: String,

    /// Stacks network: mainnet or testnet
    #[arg(short = 'n', long, env = "STACKS_NETWORK", default_value = "testnet")]
    pub network: Network,

    /// Where the analytics snapshot is written
    #[arg(
        short = 's',
        long,
        env = "ANALYTICS_SNAPSHOT_PATH",
        default_value = "analytics-data.json"
    )]
    pub snapshot_path: PathBuf,

    /// Log level
    #[arg(short = 'l', long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    fn predicate_settings(&self) -> Result<PredicateSettings> {
        Url::parse(&self.external_base_url)
            .with_context(|| format!("invalid external base url: {}", self.external_base_url))?;

        Ok(PredicateSettings {
            contract_identifier: self.contract_identifier.clone(),
            external_base_url: self.external_base_url.clone(),
            auth_token: self.auth_token.clone(),
            start_block: self.start_block,
            network: self.network,
        })
    }

    pub async fn run(self, cancellation_token: CancellationToken) -> Result<()> {
        info!("🚀 Starting NFT Marketplace Chainhook Observer");

        let settings = self.predicate_settings()?;
        let predicates = build_predicates(&settings);
        let client = ChainhookClient::new(&self.chainhook_node_url)
            .with_context(|| format!("invalid chainhook node url: {}", self.chainhook_node_url))?;

        info!("📡 Server: {}", self.external_base_url);
        info!("🔗 Chainhook Node: {}", client.base_url());
        info!("🌐 Network: {} ({})", self.network, self.network.chain_id());
        info!("📋 Monitoring {} event types", predicates.len());
        debug!("Snapshot path: {}", self.snapshot_path.display());

        let aggregator = Aggregator::new(
            SnapshotWriter::new(self.snapshot_path),
            Box::new(NoAmounts),
        );
        let observer = ChainhookObserver::new(
            client,
            predicates,
            aggregator,
            ServerOptions {
                host: self.host,
                port: self.port,
                auth_token: self.auth_token,
            },
        );

        observer.run(cancellation_token).await
    }
}
