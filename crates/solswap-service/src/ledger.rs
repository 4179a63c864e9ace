// ----- standard library imports
use std::sync::Arc;
use std::time::Duration;
// ----- extra library imports
use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde_with::serde_as;
use solana_commitment_config::CommitmentConfig;
use solana_rpc_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::hash::Hash;
// ----- local imports
use crate::service::FreshnessSource;

// ----- end imports

pub const DEFAULT_LEDGER_TIMEOUT: Duration = Duration::from_secs(5);

fn default_timeout() -> Duration {
    DEFAULT_LEDGER_TIMEOUT
}

#[serde_as]
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LedgerClientConfig {
    pub rpc_url: reqwest::Url,
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct RpcLedger {
    rpc: Arc<RpcClient>,
}

impl RpcLedger {
    pub fn new(cfg: &LedgerClientConfig) -> Self {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            cfg.rpc_url.to_string(),
            cfg.timeout,
            CommitmentConfig::confirmed(),
        );
        Self { rpc: Arc::new(rpc) }
    }
}

#[async_trait]
impl FreshnessSource for RpcLedger {
    async fn latest_blockhash(&self) -> AnyResult<Hash> {
        let hash = self.rpc.get_latest_blockhash().await?;
        tracing::debug!("latest blockhash {hash}");
        Ok(hash)
    }
}
