use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    providers::{Http, HttpRateLimitRetryPolicy, Middleware, Provider, RetryClient},
    types::{Address, Block, BlockNumber, Filter, Log, Transaction, H256},
};
use eyre::Result;
use reqwest::Url;

/// Read access to the settlement chain. The four operations below are the
/// only chain queries the ingestion pipeline performs; retries for
/// transient RPC failures belong in the implementation, not the callers.
#[async_trait]
pub trait ChainProvider {
    /// Fetches a transaction by its hash.
    async fn transaction_by_hash(&self, hash: H256) -> Result<Option<Transaction>>;

    /// Fetches a block by its number.
    async fn block_by_number(&self, number: u64) -> Result<Option<Block<H256>>>;

    /// Queries the logs emitted by `address` with the given topic over the
    /// inclusive block range `[from_block, to_block]`.
    async fn logs(
        &self,
        address: Address,
        topic: H256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>>;

    /// Returns the number of the most recent finalized block.
    async fn finalized_block_number(&self) -> Result<u64>;
}

/// A [ChainProvider] backed by an ethers HTTP provider with the rate-limit
/// retry policy.
#[derive(Debug, Clone)]
pub struct EthersChainProvider {
    provider: Arc<Provider<RetryClient<Http>>>,
}

impl EthersChainProvider {
    /// Creates a provider for the given rpc url.
    /// Errors if the rpc url is invalid.
    pub fn new(url: &str) -> Result<Self> {
        let client = reqwest::ClientBuilder::new()
            .timeout(Duration::from_secs(5))
            .build()?;
        let http = Http::new_with_client(Url::parse(url)?, client);
        let policy = Box::new(HttpRateLimitRetryPolicy);
        let client = RetryClient::new(http, policy, 100, 50);

        Ok(Self {
            provider: Arc::new(Provider::new(client)),
        })
    }
}

#[async_trait]
impl ChainProvider for EthersChainProvider {
    async fn transaction_by_hash(&self, hash: H256) -> Result<Option<Transaction>> {
        Ok(self.provider.get_transaction(hash).await?)
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<Block<H256>>> {
        Ok(self.provider.get_block(number).await?)
    }

    async fn logs(
        &self,
        address: Address,
        topic: H256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        let filter = Filter::new()
            .address(address)
            .topic0(topic)
            .from_block(from_block)
            .to_block(to_block);

        Ok(self.provider.get_logs(&filter).await?)
    }

    async fn finalized_block_number(&self) -> Result<u64> {
        Ok(self
            .provider
            .get_block(BlockNumber::Finalized)
            .await?
            .ok_or(eyre::eyre!("block not found"))?
            .number
            .ok_or(eyre::eyre!("block pending"))?
            .as_u64())
    }
}

/// A preset-response [ChainProvider] used to drive the pipeline in tests
/// without any network access.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone, Default)]
pub struct MockChainProvider {
    pub transactions: std::collections::HashMap<H256, Transaction>,
    pub blocks: std::collections::HashMap<u64, Block<H256>>,
    pub logs: Vec<Log>,
    pub finalized_block: u64,
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl ChainProvider for MockChainProvider {
    async fn transaction_by_hash(&self, hash: H256) -> Result<Option<Transaction>> {
        Ok(self.transactions.get(&hash).cloned())
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<Block<H256>>> {
        Ok(self.blocks.get(&number).cloned())
    }

    async fn logs(
        &self,
        address: Address,
        topic: H256,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<Log>> {
        Ok(self
            .logs
            .iter()
            .filter(|log| log.address == address)
            .filter(|log| log.topics.first() == Some(&topic))
            .filter(|log| {
                log.block_number
                    .map(|n| (from_block..=to_block).contains(&n.as_u64()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect())
    }

    async fn finalized_block_number(&self) -> Result<u64> {
        Ok(self.finalized_block)
    }
}
