//! End-to-end pipeline tests against a mocked transport.
//!
//! `Provider::mocked()` serves queued responses last-pushed-first and
//! errors once the queue is empty, which makes every degradation path
//! reachable without a network: a drained queue behaves exactly like an
//! unreachable RPC endpoint.

use std::sync::Arc;

use ethers::providers::{MockProvider, Provider};
use ethers::types::{Address, Bytes, Log, H256, U64};
use fresh_markets_watch::log_scanner::PAIR_CREATED_TOPIC;
use fresh_markets_watch::{PairScanner, ScanOutcome, ScanRequest, Settings};

fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

fn scanner(provider: Provider<MockProvider>) -> PairScanner<Provider<MockProvider>> {
    PairScanner::new(Arc::new(provider), Arc::new(Settings::default()))
}

fn request(factories: Vec<Address>) -> ScanRequest {
    ScanRequest {
        chain: "ethereum".to_string(),
        factories,
        window_minutes: 30,
    }
}

fn pair_created_log(token0: Address, token1: Address, pair: Address, block: u64) -> Log {
    let mut data = vec![0u8; 64];
    data[12..32].copy_from_slice(pair.as_bytes());
    Log {
        address: addr(0xfac),
        topics: vec![
            *PAIR_CREATED_TOPIC,
            H256::from(token0),
            H256::from(token1),
        ],
        data: Bytes::from(data),
        block_hash: None,
        block_number: Some(U64::from(block)),
        transaction_hash: None,
        transaction_index: None,
        log_index: None,
        transaction_log_index: None,
        log_type: None,
        removed: Some(false),
    }
}

#[tokio::test]
async fn height_resolution_failure_yields_error_shape() {
    // Empty queue: the very first call (current block height) fails.
    let (provider, _mock) = Provider::mocked();
    let outcome = scanner(provider)
        .scan_to_outcome(&request(vec![addr(0xfac)]))
        .await;

    match outcome {
        ScanOutcome::Err(failure) => {
            assert!(!failure.error.is_empty());
            assert!(failure.pairs.is_empty());
            assert_eq!(failure.count, 0);
        }
        ScanOutcome::Ok(_) => panic!("expected the error shape"),
    }
}

#[tokio::test]
async fn zero_creation_events_yield_empty_success() {
    let (provider, mock) = Provider::mocked();
    // Responses serve last-pushed-first: logs for the factory scan, then
    // the current block height.
    mock.push::<Vec<Log>, _>(Vec::new()).unwrap();
    mock.push(U64::from(10_000)).unwrap();

    let req = request(vec![addr(0xfac)]);
    let response = match scanner(provider).scan_to_outcome(&req).await {
        ScanOutcome::Ok(response) => response,
        ScanOutcome::Err(failure) => panic!("unexpected failure: {}", failure.error),
    };

    assert!(response.pairs.is_empty());
    assert_eq!(response.count, 0);
    assert_eq!(response.window_minutes, 30);
    assert_eq!(response.scanned_factories, vec![addr(0xfac)]);
}

#[tokio::test]
async fn failing_factory_scan_is_recoverable() {
    let (provider, mock) = Provider::mocked();
    // Only the height is queued; the factory's log query hits a drained
    // transport, is logged, and skipped.
    mock.push(U64::from(10_000)).unwrap();

    let outcome = scanner(provider)
        .scan_to_outcome(&request(vec![addr(0xfac)]))
        .await;

    match outcome {
        ScanOutcome::Ok(response) => {
            assert!(response.pairs.is_empty());
            assert_eq!(response.count, 0);
        }
        ScanOutcome::Err(failure) => panic!("factory failure must not be fatal: {}", failure.error),
    }
}

#[tokio::test]
async fn discovered_pair_survives_enrichment_failures() {
    let (provider, mock) = Provider::mocked();
    let log = pair_created_log(addr(0xa), addr(0xb), addr(0xabcd), 9_990);
    // Queue height + one creation event; every enrichment call then hits
    // the drained transport and degrades to its sentinel.
    mock.push::<Vec<Log>, _>(vec![log]).unwrap();
    mock.push(U64::from(10_000)).unwrap();

    let response = match scanner(provider)
        .scan_to_outcome(&request(vec![addr(0xfac)]))
        .await
    {
        ScanOutcome::Ok(response) => response,
        ScanOutcome::Err(failure) => panic!("unexpected failure: {}", failure.error),
    };

    assert_eq!(response.count, 1);
    let record = &response.pairs[0];
    assert_eq!(record.pair_address, addr(0xabcd));
    assert_eq!(record.tokens, [addr(0xa), addr(0xb)]);
    assert_eq!(record.init_liquidity, "0, 0");
    assert!(record.top_holders.is_empty());
    // Wall-clock fallback for the unresolvable creation block.
    assert!(record.created_at > 0);
}

#[tokio::test]
async fn zero_window_is_rejected_before_any_rpc_call() {
    let (provider, _mock) = Provider::mocked();
    let mut req = request(vec![addr(0xfac)]);
    req.window_minutes = 0;

    let outcome = scanner(provider).scan_to_outcome(&req).await;
    match outcome {
        ScanOutcome::Err(failure) => assert!(failure.error.contains("window_minutes")),
        ScanOutcome::Ok(_) => panic!("zero window must be rejected"),
    }
}
