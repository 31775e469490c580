use ethers::types::{Address, U256};

use crate::common::{DecodedTransaction, RawTransactionSlice, TransactionSignature, TxType};

use super::uint_be;

/// Wire marker of an EIP-155 signed sequencer transaction.
pub const TX_TYPE_EIP155: u8 = 0;

/// Wire marker of an eth_sign style sequencer transaction.
pub const TX_TYPE_ETH_SIGN: u8 = 1;

/// The fixed-size portion of a sequencer transaction slice: the type
/// marker, the signature triple, the three 3-byte integer fields, and the
/// target address. Payload data follows to the end of the slice.
const TX_FIXED_LEN: usize = 1 + 32 + 32 + 1 + 3 + 3 + 3 + 20;

/// Decodes one raw sequencer transaction slice.
///
/// Decode failures here are data, not faults: an unrecognized type marker
/// or a slice too short for the fixed field layout yields `(None, None)`
/// and the caller still emits the entry, undecoded.
///
/// Binary Format
/// ```md
/// +---------+--------------------------+
/// | Bytes   | Field                    |
/// +---------+--------------------------+
/// | 1       | TypeMarker               |
/// | 32      | Sig.R                    |
/// | 32      | Sig.S                    |
/// | 1       | Sig.V                    |
/// | 3       | GasLimit                 |
/// | 3       | GasPrice                 |
/// | 3       | Nonce                    |
/// | 20      | Target                   |
/// | *       | Data                     |
/// +---------+--------------------------+
/// ```
pub fn decode_sequencer_transaction(
    slice: &RawTransactionSlice,
) -> (Option<TxType>, Option<DecodedTransaction>) {
    let data = &slice.0;

    let tx_type = match data.first() {
        Some(&TX_TYPE_EIP155) => TxType::Eip155,
        Some(&TX_TYPE_ETH_SIGN) => TxType::EthSign,
        _ => return (None, None),
    };

    if data.len() < TX_FIXED_LEN {
        return (None, None);
    }

    let sig = TransactionSignature {
        r: U256::from_big_endian(&data[1..33]),
        s: U256::from_big_endian(&data[33..65]),
        v: data[65],
    };

    let decoded = DecodedTransaction {
        gas_limit: uint_be(&data[66..69]),
        gas_price: uint_be(&data[69..72]),
        nonce: uint_be(&data[72..75]),
        target: Address::from_slice(&data[75..95]),
        data: data[95..].to_vec().into(),
        sig,
    };

    (Some(tx_type), Some(decoded))
}

/// Encodes a sequencer transaction into its compact slice layout, the
/// inverse of [decode_sequencer_transaction]. The 3-byte integer fields
/// keep only their low 24 bits.
pub fn encode_sequencer_transaction(
    tx_type: TxType,
    tx: &DecodedTransaction,
) -> RawTransactionSlice {
    let marker = match tx_type {
        TxType::Eip155 => TX_TYPE_EIP155,
        TxType::EthSign => TX_TYPE_ETH_SIGN,
    };

    let mut word = [0u8; 32];
    let mut data = Vec::with_capacity(TX_FIXED_LEN + tx.data.len());

    data.push(marker);
    tx.sig.r.to_big_endian(&mut word);
    data.extend_from_slice(&word);
    tx.sig.s.to_big_endian(&mut word);
    data.extend_from_slice(&word);
    data.push(tx.sig.v);
    data.extend_from_slice(&tx.gas_limit.to_be_bytes()[5..]);
    data.extend_from_slice(&tx.gas_price.to_be_bytes()[5..]);
    data.extend_from_slice(&tx.nonce.to_be_bytes()[5..]);
    data.extend_from_slice(tx.target.as_bytes());
    data.extend_from_slice(&tx.data);

    RawTransactionSlice(data)
}

#[cfg(test)]
mod tests {
    use ethers::types::{Address, U256};

    use crate::common::{DecodedTransaction, RawTransactionSlice, TransactionSignature, TxType};

    use super::{decode_sequencer_transaction, encode_sequencer_transaction};

    fn sample_transaction() -> DecodedTransaction {
        DecodedTransaction {
            nonce: 42,
            gas_price: 1_000_000,
            gas_limit: 500_000,
            target: Address::from([7; 20]),
            data: vec![1, 2, 3, 4].into(),
            sig: TransactionSignature {
                r: U256::from(11),
                s: U256::from(22),
                v: 1,
            },
        }
    }

    #[test]
    fn test_decode_eip155_transaction() {
        let tx = sample_transaction();
        let slice = encode_sequencer_transaction(TxType::Eip155, &tx);

        let (tx_type, decoded) = decode_sequencer_transaction(&slice);
        assert_eq!(tx_type, Some(TxType::Eip155));
        assert_eq!(decoded, Some(tx));
    }

    #[test]
    fn test_decode_eth_sign_transaction() {
        let slice = encode_sequencer_transaction(TxType::EthSign, &sample_transaction());

        let (tx_type, decoded) = decode_sequencer_transaction(&slice);
        assert_eq!(tx_type, Some(TxType::EthSign));
        assert!(decoded.is_some());
    }

    #[test]
    fn test_unknown_marker_is_undecodable() {
        let mut slice = encode_sequencer_transaction(TxType::Eip155, &sample_transaction());
        slice.0[0] = 0x7f;

        let (tx_type, decoded) = decode_sequencer_transaction(&slice);
        assert_eq!(tx_type, None);
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_short_slice_is_undecodable() {
        let (tx_type, decoded) = decode_sequencer_transaction(&RawTransactionSlice(vec![0; 94]));
        assert_eq!(tx_type, None);
        assert_eq!(decoded, None);

        let (tx_type, decoded) = decode_sequencer_transaction(&RawTransactionSlice(Vec::new()));
        assert_eq!(tx_type, None);
        assert_eq!(decoded, None);
    }

    #[test]
    fn test_empty_payload_decodes() {
        let mut tx = sample_transaction();
        tx.data = Default::default();
        let slice = encode_sequencer_transaction(TxType::Eip155, &tx);
        assert_eq!(slice.0.len(), 95);

        let (_, decoded) = decode_sequencer_transaction(&slice);
        assert_eq!(decoded.unwrap().data.len(), 0);
    }
}
