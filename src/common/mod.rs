use std::fmt::Debug;

use ethers::types::{Address, Bytes, U256};
use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

/// The fixed gas limit attributed to every sequenced transaction entry.
pub const SEQUENCER_GAS_LIMIT: u64 = 8_000_000;

/// One raw transaction extracted from batch calldata. Ownership is
/// transient: slices are produced by the calldata decoder and consumed
/// immediately by the sequencer transaction codec.
#[derive(Clone, PartialEq, Eq)]
pub struct RawTransactionSlice(pub Vec<u8>);

impl Debug for RawTransactionSlice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl Serialize for RawTransactionSlice {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(&self.0)))
    }
}

impl<'de> Deserialize<'de> for RawTransactionSlice {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tx: String = serde::Deserialize::deserialize(deserializer)?;
        let tx = tx.strip_prefix("0x").unwrap_or(&tx);
        Ok(RawTransactionSlice(hex::decode(tx).map_err(D::Error::custom)?))
    }
}

/// The recognized sequencer transaction variants. This enumeration is
/// closed: the soft-fork validator dispatches over it by table lookup,
/// and any unlisted wire marker is treated as undecodable rather than
/// extending the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxType {
    #[serde(rename = "EIP155")]
    Eip155,
    #[serde(rename = "ETH_SIGN")]
    EthSign,
}

/// A compact transaction signature. `v` is the raw recovery byte as it
/// appears on the wire; only `0` and `1` are ever accepted downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSignature {
    pub r: U256,
    pub s: U256,
    pub v: u8,
}

/// The decoded fields of one sequencer transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedTransaction {
    pub nonce: u64,
    pub gas_price: u64,
    pub gas_limit: u64,
    /// The transaction's own destination address
    pub target: Address,
    /// The transaction payload
    pub data: Bytes,
    pub sig: TransactionSignature,
}
