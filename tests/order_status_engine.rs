use std::collections::HashMap;
use std::time::Duration;

use btc_evm_swap::orderbook::{AdditionalData, CreateOrder, MatchedOrder, Swap};
use btc_evm_swap::swap::status::{DeadlinePolicy, is_expired, order_status, swap_status};
use btc_evm_swap::swap::{OrderStatus, SwapStatus};

const SOURCE_CHAIN: &str = "bitcoin_testnet";
const DEST_CHAIN: &str = "ethereum_sepolia";

fn leg(chain: &str) -> Swap {
    Swap {
        swap_id: format!("swap:{chain}"),
        chain: chain.to_string(),
        timelock: 288,
        amount: "5000000".to_string(),
        ..Default::default()
    }
}

fn order(source: Swap, destination: Swap, deadline: u64) -> MatchedOrder {
    MatchedOrder {
        source_swap: source,
        destination_swap: destination,
        create_order: CreateOrder {
            additional_data: AdditionalData {
                deadline,
                ..Default::default()
            },
            ..Default::default()
        },
        ..Default::default()
    }
}

fn heights(source: u64, destination: u64) -> HashMap<String, u64> {
    HashMap::from([
        (SOURCE_CHAIN.to_string(), source),
        (DEST_CHAIN.to_string(), destination),
    ])
}

const FAR_DEADLINE: u64 = 2_000_000_000;

#[test]
fn leg_status_follows_observed_transactions() {
    let mut swap = leg(SOURCE_CHAIN);
    assert_eq!(swap_status(&swap, 100), SwapStatus::Idle);

    swap.initiate_tx_hash = "tx-init".to_string();
    assert_eq!(swap_status(&swap, 100), SwapStatus::InitiateDetected);

    swap.initiate_block_number = Some("90".to_string());
    assert_eq!(swap_status(&swap, 100), SwapStatus::Initiated);

    swap.redeem_tx_hash = "tx-redeem".to_string();
    assert_eq!(swap_status(&swap, 100), SwapStatus::RedeemDetected);

    swap.redeem_block_number = Some("101".to_string());
    assert_eq!(swap_status(&swap, 100), SwapStatus::Redeemed);
}

#[test]
fn leg_refund_outranks_expiry() {
    let mut swap = leg(SOURCE_CHAIN);
    swap.initiate_tx_hash = "tx-init".to_string();
    swap.initiate_block_number = Some("10".to_string());
    swap.refund_tx_hash = "tx-refund".to_string();

    assert_eq!(swap_status(&swap, 10_000), SwapStatus::RefundDetected);

    swap.refund_block_number = Some("9999".to_string());
    assert_eq!(swap_status(&swap, 10_000), SwapStatus::Refunded);
}

#[test]
fn leg_zero_block_number_is_not_confirmed() {
    let mut swap = leg(SOURCE_CHAIN);
    swap.initiate_tx_hash = "tx-init".to_string();
    swap.initiate_block_number = Some("0".to_string());
    assert_eq!(swap_status(&swap, 100), SwapStatus::InitiateDetected);
}

#[test]
fn leg_expires_strictly_after_timelock() {
    let mut swap = leg(SOURCE_CHAIN);
    swap.initiate_tx_hash = "tx-init".to_string();
    swap.initiate_block_number = Some("100".to_string());

    // expiry height is initiate + timelock; at the boundary the leg still
    // counts as initiated
    assert_eq!(swap_status(&swap, 100 + 288), SwapStatus::Initiated);
    assert_eq!(swap_status(&swap, 100 + 288 + 1), SwapStatus::Expired);
}

#[test]
fn deadline_expiry_boundaries() {
    let deadline = 1_700_000_000;

    assert!(!is_expired(deadline, Duration::ZERO, deadline - 1));
    assert!(is_expired(deadline, Duration::ZERO, deadline));

    let twelve_hours = Duration::from_secs(12 * 3600);
    assert!(!is_expired(deadline, twelve_hours, deadline + 12 * 3600 - 1));
    assert!(is_expired(deadline, twelve_hours, deadline + 12 * 3600));
}

#[test]
fn derivation_is_deterministic() {
    let mut source = leg(SOURCE_CHAIN);
    source.initiate_tx_hash = "tx-init".to_string();
    let o = order(source, leg(DEST_CHAIN), FAR_DEADLINE);
    let blocks = heights(1000, 2000);
    let policy = DeadlinePolicy::default();

    let first = order_status(&o, &blocks, 1_600_000_000, &policy).unwrap();
    let second = order_status(&o, &blocks, 1_600_000_000, &policy).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, OrderStatus::InitiateDetected);
}

#[test]
fn destination_redeem_outranks_source_refund() {
    let mut source = leg(SOURCE_CHAIN);
    source.refund_tx_hash = "tx-refund".to_string();
    source.refund_block_number = Some("500".to_string());

    let mut destination = leg(DEST_CHAIN);
    destination.redeem_tx_hash = "tx-redeem".to_string();

    let o = order(source, destination, FAR_DEADLINE);
    let status = order_status(&o, &heights(1000, 2000), 1_600_000_000, &DeadlinePolicy::default())
        .unwrap();
    assert_eq!(status, OrderStatus::RedeemDetected);
}

#[test]
fn confirmed_destination_redeem_outranks_everything() {
    let mut source = leg(SOURCE_CHAIN);
    source.refund_tx_hash = "tx-refund".to_string();
    source.refund_block_number = Some("500".to_string());

    let mut destination = leg(DEST_CHAIN);
    destination.redeem_tx_hash = "tx-redeem".to_string();
    destination.redeem_block_number = Some("2100".to_string());

    let o = order(source, destination, 0);
    let status = order_status(&o, &heights(1000, 2000), 1_600_000_000, &DeadlinePolicy::default())
        .unwrap();
    assert_eq!(status, OrderStatus::Redeemed);
}

#[test]
fn counterparty_expiry_outranks_own_expiry() {
    let mut source = leg(SOURCE_CHAIN);
    source.initiate_tx_hash = "tx-init".to_string();
    source.initiate_block_number = Some("100".to_string());

    let mut destination = leg(DEST_CHAIN);
    destination.initiate_tx_hash = "tx-init-dest".to_string();
    destination.initiate_block_number = Some("100".to_string());

    let o = order(source, destination, FAR_DEADLINE);
    let status = order_status(&o, &heights(10_000, 10_000), 1_600_000_000, &DeadlinePolicy::default())
        .unwrap();
    assert_eq!(status, OrderStatus::CounterPartySwapExpired);
}

#[test]
fn counterparty_initiated_signals_redeem() {
    let mut source = leg(SOURCE_CHAIN);
    source.initiate_tx_hash = "tx-init".to_string();
    source.initiate_block_number = Some("900".to_string());

    let mut destination = leg(DEST_CHAIN);
    destination.initiate_tx_hash = "tx-init-dest".to_string();
    destination.initiate_block_number = Some("1900".to_string());

    let o = order(source, destination, FAR_DEADLINE);
    let status = order_status(&o, &heights(1000, 2000), 1_600_000_000, &DeadlinePolicy::default())
        .unwrap();
    assert_eq!(status, OrderStatus::CounterPartyInitiated);
}

#[test]
fn pending_source_initiate_before_deadline_window() {
    let mut source = leg(SOURCE_CHAIN);
    source.initiate_tx_hash = "tx-init".to_string();

    let o = order(source, leg(DEST_CHAIN), FAR_DEADLINE);
    let status = order_status(&o, &heights(1000, 2000), 1_600_000_000, &DeadlinePolicy::default())
        .unwrap();
    assert_eq!(status, OrderStatus::InitiateDetected);
}

#[test]
fn deadline_exceeded_blocks_late_initiate() {
    let deadline = 1_600_000_000;
    let policy = DeadlinePolicy::default();

    // a detected-but-unconfirmed deposit is worthless once the initiate
    // window (deadline + 1h) is gone
    let mut source = leg(SOURCE_CHAIN);
    source.initiate_tx_hash = "tx-init".to_string();
    let o = order(source, leg(DEST_CHAIN), deadline);
    let status = order_status(&o, &heights(1000, 2000), deadline + 3600, &policy).unwrap();
    assert_eq!(status, OrderStatus::DeadLineExceeded);

    // a confirmed deposit survives until the confirm window (deadline + 12h)
    let mut source = leg(SOURCE_CHAIN);
    source.initiate_tx_hash = "tx-init".to_string();
    source.initiate_block_number = Some("900".to_string());
    let o = order(source, leg(DEST_CHAIN), deadline);
    let status = order_status(&o, &heights(1000, 2000), deadline + 3600, &policy).unwrap();
    assert_eq!(status, OrderStatus::Initiated);

    let status = order_status(&o, &heights(1000, 2000), deadline + 12 * 3600, &policy).unwrap();
    assert_eq!(status, OrderStatus::DeadLineExceeded);
}

#[test]
fn counterparty_progress_outranks_deadline() {
    let deadline = 1_600_000_000;

    let mut source = leg(SOURCE_CHAIN);
    source.initiate_tx_hash = "tx-init".to_string();
    source.initiate_block_number = Some("900".to_string());

    let mut destination = leg(DEST_CHAIN);
    destination.initiate_tx_hash = "tx-init-dest".to_string();
    destination.initiate_block_number = Some("1900".to_string());

    let o = order(source, destination, deadline);
    let status = order_status(
        &o,
        &heights(1000, 2000),
        deadline + 24 * 3600,
        &DeadlinePolicy::default(),
    )
    .unwrap();
    assert_eq!(status, OrderStatus::CounterPartyInitiated);
}

#[test]
fn both_legs_idle_is_matched() {
    let o = order(leg(SOURCE_CHAIN), leg(DEST_CHAIN), FAR_DEADLINE);
    let status = order_status(&o, &heights(1000, 2000), 1_600_000_000, &DeadlinePolicy::default())
        .unwrap();
    assert_eq!(status, OrderStatus::Matched);
}

#[test]
fn missing_chain_height_is_rejected() {
    let o = order(leg(SOURCE_CHAIN), leg(DEST_CHAIN), FAR_DEADLINE);
    let blocks = HashMap::from([(SOURCE_CHAIN.to_string(), 1000u64)]);

    let err = order_status(&o, &blocks, 1_600_000_000, &DeadlinePolicy::default()).unwrap_err();
    assert!(err.to_string().contains(DEST_CHAIN));
}
