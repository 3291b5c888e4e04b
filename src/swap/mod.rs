pub mod coordinator;
pub mod status;
pub mod store;

use serde::{Deserialize, Serialize};

/// Per-leg lifecycle, derived from the indexed swap record plus the current
/// block height. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapStatus {
    Idle,
    InitiateDetected,
    Initiated,
    RedeemDetected,
    Redeemed,
    RefundDetected,
    Refunded,
    Expired,
}

/// Order-level status combining both legs and the attested deadline.
/// Always recomputed from a fresh observation, never cached or stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Matched,
    InitiateDetected,
    Initiated,
    CounterPartyInitiateDetected,
    CounterPartyInitiated,
    RedeemDetected,
    Redeemed,
    CounterPartyRedeemDetected,
    CounterPartyRedeemed,
    CounterPartySwapExpired,
    Expired,
    RefundDetected,
    Refunded,
    CounterPartyRefundDetected,
    CounterPartyRefunded,
    // Never derived here; the matching service reports cancellation out of
    // band and the coordinator treats it like the other dead ends.
    Cancelled,
    DeadLineExceeded,
}

impl OrderStatus {
    /// Dead ends: the coordinator stops driving the order and leaves the
    /// persisted state in place for the operator to inspect.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            OrderStatus::Refunded
                | OrderStatus::CounterPartyRefunded
                | OrderStatus::Expired
                | OrderStatus::CounterPartySwapExpired
                | OrderStatus::DeadLineExceeded
                | OrderStatus::Cancelled
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Matched => "Awaiting Deposit",
            OrderStatus::InitiateDetected => "Awaiting Confirmation",
            OrderStatus::Initiated => "Deposit Confirmed",
            OrderStatus::CounterPartyInitiateDetected => "Confirming Counter Party Deposit",
            OrderStatus::CounterPartyInitiated => "Ready to Redeem",
            OrderStatus::RedeemDetected => "Confirming Redeem",
            OrderStatus::Redeemed => "Completed",
            OrderStatus::CounterPartyRedeemDetected => "Completing Swap",
            OrderStatus::CounterPartyRedeemed => "Awaiting Final Confirmation",
            OrderStatus::CounterPartySwapExpired => "Counter Party Expired",
            OrderStatus::Expired => "Swap Expired",
            OrderStatus::RefundDetected => "Confirming Refund",
            OrderStatus::Refunded => "Refunded Successfully",
            OrderStatus::CounterPartyRefundDetected => "Counter Party Refunding",
            OrderStatus::CounterPartyRefunded => "Counter Party Refunded",
            OrderStatus::Cancelled => "Swap Cancelled",
            OrderStatus::DeadLineExceeded => "Deadline Exceeded",
        }
    }
}

/// The single persisted record of the in-flight swap. One exists at a time:
/// created on order submission, gains the deposit tx hash once the deposit
/// is broadcast, cleared only after a successful redeem submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderState {
    pub order_id: String,
    pub secret: String,
    pub interface_id: Option<String>,
    pub initiate_tx_hash: Option<String>,
}

impl OrderState {
    pub fn new(order_id: String, secret: String) -> Self {
        Self {
            order_id,
            secret,
            interface_id: None,
            initiate_tx_hash: None,
        }
    }
}
