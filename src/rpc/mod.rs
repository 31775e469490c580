use std::{net::SocketAddr, sync::Arc};

use eyre::Result;

use jsonrpsee::{
    core::{async_trait, Error},
    proc_macros::rpc,
    server::ServerBuilder,
};

use serde::{Deserialize, Serialize};

use crate::{
    backend::{Database, TransactionBatchEntry, TransactionEntry},
    config::Config,
};

/// This trait defines the read-only RPC methods served under the `ctc`
/// namespace, backed by the entry store.
#[rpc(server, namespace = "ctc")]
pub trait Rpc {
    /// Returns the transaction entry at the given global index.
    #[method(name = "transactionByIndex")]
    async fn transaction_by_index(&self, index: u64) -> Result<Option<TransactionEntry>, Error>;

    /// Returns the batch entry at the given batch index.
    #[method(name = "batchByIndex")]
    async fn batch_by_index(&self, index: u64) -> Result<Option<TransactionBatchEntry>, Error>;

    /// Returns the node's ingestion progress.
    #[method(name = "syncStatus")]
    async fn sync_status(&self) -> Result<SyncStatusResponse, Error>;
}

/// The query RPC server, backed by the entry store.
#[derive(Debug)]
pub struct RpcServerImpl {
    /// The entry store
    db: Database,
}

#[async_trait]
impl RpcServer for RpcServerImpl {
    async fn transaction_by_index(&self, index: u64) -> Result<Option<TransactionEntry>, Error> {
        convert_err(self.db.transaction_by_index(index))
    }

    async fn batch_by_index(&self, index: u64) -> Result<Option<TransactionBatchEntry>, Error> {
        convert_err(self.db.batch_by_index(index))
    }

    async fn sync_status(&self) -> Result<SyncStatusResponse, Error> {
        Ok(SyncStatusResponse {
            scanned_l1_block: convert_err(self.db.read_head())?.map(|head| head.l1_block),
            latest_batch_index: convert_err(self.db.latest_batch_index())?,
            latest_transaction_index: convert_err(self.db.latest_transaction_index())?,
        })
    }
}

/// Converts a generic error to a [jsonrpsee::core::Error] if one exists
fn convert_err<T>(res: Result<T>) -> Result<T, Error> {
    res.map_err(|err| Error::Custom(err.to_string()))
}

/// The response for the `ctc_syncStatus` RPC method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    /// The highest fully scanned L1 block
    pub scanned_l1_block: Option<u64>,
    /// The index of the most recently ingested batch
    pub latest_batch_index: Option<u64>,
    /// The global index of the most recently ingested transaction
    pub latest_transaction_index: Option<u64>,
}

/// Starts the query RPC server
pub async fn run_server(config: Arc<Config>, db: Database) -> Result<SocketAddr> {
    let port = config.rpc_port;

    let server = ServerBuilder::default()
        .build(format!("127.0.0.1:{}", port))
        .await?;
    let addr = server.local_addr()?;
    let rpc_impl = RpcServerImpl { db };
    let handle = server.start(rpc_impl.into_rpc())?;

    tokio::spawn(handle.stopped());
    tracing::info!("rpc server started at port {}", port);

    Ok(addr)
}
