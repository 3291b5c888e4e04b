pub mod client;

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{SwapError, SwapResult};

pub use client::{ApiConfig, MatchingApi, OrderbookClient};

/// Response envelope shared by every matching-service endpoint. The service
/// signals business-rule rejections through `status: "Error"` with an HTTP
/// 200, so transport success alone means nothing.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Ok,
    Error,
}

impl<T> ApiResponse<T> {
    pub fn into_result(self, what: &str) -> SwapResult<T> {
        self.into_optional_result(what)?
            .ok_or_else(|| SwapError::Service(format!("{what}: missing result")))
    }

    /// Like [`Self::into_result`] but a null/absent result on an Ok envelope
    /// is a valid answer (e.g. an order that has not been matched yet).
    pub fn into_optional_result(self, what: &str) -> SwapResult<Option<T>> {
        if self.status == ResponseStatus::Error || self.error.is_some() {
            let reason = self
                .error
                .unwrap_or_else(|| format!("{what}: unknown service error"));
            return Err(SwapError::Service(reason));
        }
        Ok(self.result)
    }
}

/// Strategy quotes in service insertion order. JSON objects do not promise
/// ordering, but the quote service puts its preferred strategy first and
/// callers pick the first entry, so the order must survive decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyQuotes(Vec<(String, u64)>);

impl StrategyQuotes {
    pub fn new(entries: Vec<(String, u64)>) -> Self {
        Self(entries)
    }

    pub fn first(&self) -> Option<&(String, u64)> {
        self.0.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, u64)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for StrategyQuotes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (strategy, amount) in &self.0 {
            map.serialize_entry(strategy, amount)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StrategyQuotes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct QuotesVisitor;

        impl<'de> Visitor<'de> for QuotesVisitor {
            type Value = StrategyQuotes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of strategy id to destination amount")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(1));
                while let Some(entry) = map.next_entry::<String, u64>()? {
                    entries.push(entry);
                }
                Ok(StrategyQuotes(entries))
            }
        }

        deserializer.deserialize_map(QuotesVisitor)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    pub quotes: StrategyQuotes,
    #[serde(default)]
    pub input_token_price: f64,
    #[serde(default)]
    pub output_token_price: f64,
}

/// One on-chain leg of a matched order, as indexed by the matching service.
/// Tx-hash fields are empty until the corresponding transaction is seen in
/// the mempool; block-number fields stay unset until it reaches the
/// required confirmation depth. Read-only on this side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Swap {
    #[serde(default)]
    pub created_at: String,
    pub swap_id: String,
    pub chain: String,
    #[serde(default)]
    pub asset: String,
    #[serde(default)]
    pub initiator: String,
    #[serde(default)]
    pub redeemer: String,
    pub timelock: u64,
    pub amount: String,
    #[serde(default)]
    pub filled_amount: String,
    #[serde(default)]
    pub secret_hash: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub initiate_tx_hash: String,
    #[serde(default)]
    pub redeem_tx_hash: String,
    #[serde(default)]
    pub refund_tx_hash: String,
    #[serde(default)]
    pub initiate_block_number: Option<String>,
    #[serde(default)]
    pub redeem_block_number: Option<String>,
    #[serde(default)]
    pub refund_block_number: Option<String>,
    #[serde(default)]
    pub required_confirmations: u64,
}

impl Swap {
    pub fn initiate_block(&self) -> Option<u64> {
        positive_block(&self.initiate_block_number)
    }

    pub fn redeem_block(&self) -> Option<u64> {
        positive_block(&self.redeem_block_number)
    }

    pub fn refund_block(&self) -> Option<u64> {
        positive_block(&self.refund_block_number)
    }
}

// The indexer reports block numbers as decimal strings and uses "0" as a
// placeholder before the confirmation depth is reached.
fn positive_block(value: &Option<String>) -> Option<u64> {
    value
        .as_deref()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|n| *n > 0)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOrderRequest {
    pub source_chain: String,
    pub destination_chain: String,
    pub source_asset: String,
    pub destination_asset: String,
    pub initiator_source_address: String,
    pub initiator_destination_address: String,
    pub source_amount: String,
    pub destination_amount: String,
    pub fee: String,
    pub nonce: String,
    pub min_destination_confirmations: u32,
    pub timelock: u64,
    pub secret_hash: String,
}

/// Strategy selection sent alongside the draft when asking the quote
/// service to attest it.
#[derive(Debug, Clone, Serialize)]
pub struct StrategyHint {
    pub strategy_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bitcoin_optional_recipient: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttestedQuoteRequest {
    #[serde(flatten)]
    pub order: CreateOrderRequest,
    pub additional_data: StrategyHint,
}

/// Quote-service attestation attached to an order draft. `deadline` is the
/// unix time the attestation expires; `sig` binds the prices to it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalData {
    #[serde(default)]
    pub strategy_id: String,
    #[serde(default)]
    pub sig: String,
    #[serde(default)]
    pub input_token_price: f64,
    #[serde(default)]
    pub output_token_price: f64,
    #[serde(default)]
    pub deadline: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bitcoin_optional_recipient: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttestedOrder {
    #[serde(flatten)]
    pub order: CreateOrderRequest,
    pub additional_data: AdditionalData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrder {
    #[serde(flatten)]
    pub order: CreateOrderRequest,
    #[serde(default)]
    pub additional_data: AdditionalData,
    #[serde(default)]
    pub create_id: String,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchedOrder {
    #[serde(default)]
    pub created_at: String,
    pub source_swap: Swap,
    pub destination_swap: Swap,
    #[serde(default)]
    pub create_order: CreateOrder,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaginatedOrders {
    #[serde(default)]
    pub data: Vec<MatchedOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RedeemHalf {
    Source,
    Destination,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedeemRequest {
    pub order_id: String,
    pub secret: String,
    pub perform_on: RedeemHalf,
}
