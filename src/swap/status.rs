use std::collections::HashMap;
use std::time::Duration;

use super::{OrderStatus, SwapStatus};
use crate::error::{SwapError, SwapResult};
use crate::orderbook::{MatchedOrder, Swap};

/// Wall-clock buffers applied to the attested deadline. A source deposit
/// must be confirmed 12h past the deadline at the latest and detected 1h
/// past it; both are policy, not protocol, and tunable per deployment.
#[derive(Debug, Clone)]
pub struct DeadlinePolicy {
    pub confirm_buffer: Duration,
    pub initiate_buffer: Duration,
}

impl Default for DeadlinePolicy {
    fn default() -> Self {
        Self {
            confirm_buffer: Duration::from_secs(12 * 3600),
            initiate_buffer: Duration::from_secs(3600),
        }
    }
}

/// True once `now_unix` has reached the attested deadline plus the buffer.
pub fn is_expired(deadline_unix: u64, buffer: Duration, now_unix: u64) -> bool {
    now_unix >= deadline_unix.saturating_add(buffer.as_secs())
}

/// Status of a single leg. The checks are ordered by how final they are: an
/// observed redeem outranks a refund, which outranks timelock expiry, which
/// outranks a pending initiate. Expiry triggers strictly after
/// `initiate_block + timelock`.
pub fn swap_status(swap: &Swap, current_height: u64) -> SwapStatus {
    if !swap.redeem_tx_hash.is_empty() {
        if swap.redeem_block().is_some() {
            return SwapStatus::Redeemed;
        }
        return SwapStatus::RedeemDetected;
    }

    if !swap.refund_tx_hash.is_empty() {
        if swap.refund_block().is_some() {
            return SwapStatus::Refunded;
        }
        return SwapStatus::RefundDetected;
    }

    if let Some(initiate_block) = swap.initiate_block()
        && current_height > initiate_block + swap.timelock
    {
        return SwapStatus::Expired;
    }

    if !swap.initiate_tx_hash.is_empty() {
        if swap.initiate_block().is_some() {
            return SwapStatus::Initiated;
        }
        return SwapStatus::InitiateDetected;
    }

    SwapStatus::Idle
}

/// Collapses both legs plus the deadline into one order-level status.
///
/// The rule order is load-bearing: a completed redeem always wins, a source
/// refund beats any expiry warning, and counterparty progress beats the
/// user's own pending state. Reordering these changes which side effect the
/// coordinator drives next.
pub fn order_status(
    order: &MatchedOrder,
    block_numbers: &HashMap<String, u64>,
    now_unix: u64,
    policy: &DeadlinePolicy,
) -> SwapResult<OrderStatus> {
    let source_height = height_for(block_numbers, &order.source_swap.chain)?;
    let destination_height = height_for(block_numbers, &order.destination_swap.chain)?;

    let source = swap_status(&order.source_swap, source_height);
    let destination = swap_status(&order.destination_swap, destination_height);

    if destination == SwapStatus::RedeemDetected {
        return Ok(OrderStatus::RedeemDetected);
    }
    if destination == SwapStatus::Redeemed {
        return Ok(OrderStatus::Redeemed);
    }

    if source == SwapStatus::Refunded {
        return Ok(OrderStatus::Refunded);
    }
    if source == SwapStatus::RefundDetected {
        return Ok(OrderStatus::RefundDetected);
    }

    if destination == SwapStatus::Expired {
        return Ok(OrderStatus::CounterPartySwapExpired);
    }
    if source == SwapStatus::Expired {
        return Ok(OrderStatus::Expired);
    }

    if destination == SwapStatus::Refunded {
        return Ok(OrderStatus::CounterPartyRefunded);
    }
    if destination == SwapStatus::RefundDetected {
        return Ok(OrderStatus::CounterPartyRefundDetected);
    }

    let deadline = order.create_order.additional_data.deadline;

    if destination == SwapStatus::Initiated {
        return Ok(OrderStatus::CounterPartyInitiated);
    }
    if destination == SwapStatus::InitiateDetected {
        return Ok(OrderStatus::CounterPartyInitiateDetected);
    }

    if is_expired(deadline, policy.confirm_buffer, now_unix) {
        return Ok(OrderStatus::DeadLineExceeded);
    }
    if source == SwapStatus::Initiated {
        return Ok(OrderStatus::Initiated);
    }

    if is_expired(deadline, policy.initiate_buffer, now_unix) {
        return Ok(OrderStatus::DeadLineExceeded);
    }
    if source == SwapStatus::InitiateDetected {
        return Ok(OrderStatus::InitiateDetected);
    }

    if source == SwapStatus::Redeemed {
        return Ok(OrderStatus::CounterPartyRedeemed);
    }
    if source == SwapStatus::RedeemDetected {
        return Ok(OrderStatus::CounterPartyRedeemDetected);
    }

    Ok(OrderStatus::Matched)
}

// A status derived against a height snapshot that is missing one of the
// order's chains would be fiction; refuse instead.
fn height_for(block_numbers: &HashMap<String, u64>, chain: &str) -> SwapResult<u64> {
    block_numbers
        .get(chain)
        .copied()
        .ok_or_else(|| SwapError::Validation(format!("no block height for chain {chain}")))
}
