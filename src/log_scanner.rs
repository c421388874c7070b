//! Filtered-log queries and schema-checked event decoding.
//!
//! One `eth_getLogs` call covers the whole requested range; the caller is
//! expected to have pre-bounded the range via the chain clock. Decoding is
//! tolerant: an entry missing a required indexed/data field is dropped with
//! a debug log instead of failing the scan.

use ethers::prelude::Middleware;
use ethers::types::{Address, Filter, Log, H256, U256};
use ethers::utils::keccak256;
use once_cell::sync::Lazy;
use tracing::{debug, trace};

use crate::error::ScanError;
use crate::types::{BlockRange, PairCreationEvent, TransferEvent};

/// keccak256("PairCreated(address,address,address,uint256)")
pub static PAIR_CREATED_TOPIC: Lazy<H256> =
    Lazy::new(|| H256::from(keccak256("PairCreated(address,address,address,uint256)")));

/// keccak256("Transfer(address,address,uint256)")
pub static TRANSFER_TOPIC: Lazy<H256> =
    Lazy::new(|| H256::from(keccak256("Transfer(address,address,uint256)")));

/// Scans a factory's `PairCreated` events over `range`.
///
/// Transport or endpoint errors surface as `ScanError::Rpc`; malformed
/// entries are excluded without failing the call. Event order follows the
/// source's block order, the pipeline only re-sorts the final record set.
pub async fn scan_pair_created<M: Middleware>(
    provider: &M,
    factory: Address,
    range: BlockRange,
) -> Result<Vec<PairCreationEvent>, ScanError> {
    let filter = Filter::new()
        .from_block(range.from)
        .to_block(range.to)
        .address(factory)
        .topic0(*PAIR_CREATED_TOPIC);

    let logs = provider
        .get_logs(&filter)
        .await
        .map_err(|e| ScanError::rpc("eth_getLogs(PairCreated)", e))?;

    let total = logs.len();
    let events: Vec<PairCreationEvent> = logs
        .iter()
        .filter_map(|log| decode_pair_created(log, factory))
        .collect();

    if events.len() < total {
        debug!(
            "Dropped {} malformed PairCreated log(s) from factory {:?}",
            total - events.len(),
            factory
        );
    }
    trace!(
        "Factory {:?}: {} creation event(s) in blocks [{}, {}]",
        factory,
        events.len(),
        range.from,
        range.to
    );
    Ok(events)
}

/// Scans a token's ERC-20 `Transfer` events over `range`.
pub async fn scan_transfers<M: Middleware>(
    provider: &M,
    token: Address,
    range: BlockRange,
) -> Result<Vec<TransferEvent>, ScanError> {
    let filter = Filter::new()
        .from_block(range.from)
        .to_block(range.to)
        .address(token)
        .topic0(*TRANSFER_TOPIC);

    let logs = provider
        .get_logs(&filter)
        .await
        .map_err(|e| ScanError::rpc("eth_getLogs(Transfer)", e))?;

    Ok(logs.iter().filter_map(decode_transfer).collect())
}

/// Decodes one `PairCreated(address indexed token0, address indexed token1,
/// address pair, uint256)` log. Returns `None` when a required field is
/// absent: wrong topic, missing indexed topics, short data word, or a log
/// without a block number (the pipeline needs it for the creation
/// timestamp).
pub fn decode_pair_created(log: &Log, factory: Address) -> Option<PairCreationEvent> {
    if log.topics.first() != Some(&*PAIR_CREATED_TOPIC) {
        return None;
    }
    if log.topics.len() < 3 || log.data.len() < 32 {
        return None;
    }
    let block_number = log.block_number?.as_u64();

    let token0 = Address::from_slice(&log.topics[1].as_bytes()[12..]);
    let token1 = Address::from_slice(&log.topics[2].as_bytes()[12..]);
    let pair = Address::from_slice(&log.data[12..32]);

    Some(PairCreationEvent {
        token0,
        token1,
        pair,
        block_number,
        factory,
    })
}

/// Decodes one `Transfer(address indexed from, address indexed to,
/// uint256 value)` log, tolerating malformed entries.
pub fn decode_transfer(log: &Log) -> Option<TransferEvent> {
    if log.topics.first() != Some(&*TRANSFER_TOPIC) {
        return None;
    }
    if log.topics.len() < 3 || log.data.len() < 32 {
        return None;
    }

    Some(TransferEvent {
        from: Address::from_slice(&log.topics[1].as_bytes()[12..]),
        to: Address::from_slice(&log.topics[2].as_bytes()[12..]),
        value: U256::from_big_endian(&log.data[0..32]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::{PairCreatedFilter, TransferFilter};
    use ethers::contract::EthEvent;
    use ethers::types::{Bytes, U64};

    fn addr(n: u64) -> Address {
        Address::from_low_u64_be(n)
    }

    #[test]
    fn topic_constants_match_abi_event_signatures() {
        assert_eq!(*PAIR_CREATED_TOPIC, PairCreatedFilter::signature());
        assert_eq!(*TRANSFER_TOPIC, TransferFilter::signature());
    }

    fn topic_for(address: Address) -> H256 {
        H256::from(address)
    }

    fn test_log(address: Address, topics: Vec<H256>, data: Vec<u8>, block: Option<u64>) -> Log {
        Log {
            address,
            topics,
            data: Bytes::from(data),
            block_hash: None,
            block_number: block.map(U64::from),
            transaction_hash: None,
            transaction_index: None,
            log_index: None,
            transaction_log_index: None,
            log_type: None,
            removed: Some(false),
        }
    }

    fn pair_created_log(token0: Address, token1: Address, pair: Address) -> Log {
        let mut data = vec![0u8; 64];
        data[12..32].copy_from_slice(pair.as_bytes());
        // second data word is the all-pairs counter, irrelevant here
        test_log(
            addr(0xfac),
            vec![*PAIR_CREATED_TOPIC, topic_for(token0), topic_for(token1)],
            data,
            Some(1234),
        )
    }

    #[test]
    fn decodes_well_formed_pair_created() {
        let log = pair_created_log(addr(1), addr(2), addr(3));
        let event = decode_pair_created(&log, addr(0xfac)).unwrap();
        assert_eq!(event.token0, addr(1));
        assert_eq!(event.token1, addr(2));
        assert_eq!(event.pair, addr(3));
        assert_eq!(event.block_number, 1234);
        assert_eq!(event.factory, addr(0xfac));
    }

    #[test]
    fn drops_log_with_missing_indexed_topics() {
        let mut log = pair_created_log(addr(1), addr(2), addr(3));
        log.topics.truncate(2);
        assert!(decode_pair_created(&log, addr(0xfac)).is_none());
    }

    #[test]
    fn drops_log_with_short_data() {
        let mut log = pair_created_log(addr(1), addr(2), addr(3));
        log.data = Bytes::from(vec![0u8; 16]);
        assert!(decode_pair_created(&log, addr(0xfac)).is_none());
    }

    #[test]
    fn drops_log_without_block_number() {
        let mut log = pair_created_log(addr(1), addr(2), addr(3));
        log.block_number = None;
        assert!(decode_pair_created(&log, addr(0xfac)).is_none());
    }

    #[test]
    fn drops_log_with_foreign_topic0() {
        let mut log = pair_created_log(addr(1), addr(2), addr(3));
        log.topics[0] = *TRANSFER_TOPIC;
        assert!(decode_pair_created(&log, addr(0xfac)).is_none());
    }

    #[test]
    fn decodes_transfer_value() {
        let mut data = vec![0u8; 32];
        U256::from(123_456u64).to_big_endian(&mut data);
        let log = test_log(
            addr(0x70),
            vec![*TRANSFER_TOPIC, topic_for(addr(7)), topic_for(addr(8))],
            data,
            Some(1),
        );
        let transfer = decode_transfer(&log).unwrap();
        assert_eq!(transfer.from, addr(7));
        assert_eq!(transfer.to, addr(8));
        assert_eq!(transfer.value, U256::from(123_456u64));
    }
}
