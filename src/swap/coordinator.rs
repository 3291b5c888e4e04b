use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio_util::sync::CancellationToken;

use super::status::{DeadlinePolicy, order_status};
use super::store::OrderStateStore;
use super::{OrderState, OrderStatus};
use crate::amount::{BTC_DECIMALS, best_quote, decimal_to_base};
use crate::error::{SwapError, SwapResult};
use crate::notify::Notifier;
use crate::orderbook::{
    AttestedQuoteRequest, CreateOrderRequest, MatchedOrder, MatchingApi, Quote, RedeemHalf,
    RedeemRequest, StrategyHint,
};
use crate::poll::{PollPolicy, wait_for};
use crate::secret::generate_secret;
use crate::wallet::FundsMover;

#[derive(Debug, Clone)]
pub struct SwapConfig {
    pub source_chain: String,
    pub destination_chain: String,
    pub source_asset: String,
    pub destination_asset: String,
    /// X-only public key funding the source-chain HTLC.
    pub initiator_source_address: String,
    /// EVM address redeeming the destination-chain HTLC.
    pub initiator_destination_address: String,
    /// Optional bitcoin address the service pays out refunds to.
    pub bitcoin_recipient: Option<String>,
    pub fee: u64,
    pub timelock: u64,
    pub min_destination_confirmations: u32,
    pub min_amount: f64,
    pub max_amount: f64,
    pub deadline: DeadlinePolicy,
    pub match_poll: PollPolicy,
}

impl SwapConfig {
    pub fn order_pair(&self) -> String {
        format!(
            "{}:{}::{}:{}",
            self.source_chain, self.source_asset, self.destination_chain, self.destination_asset
        )
    }
}

/// Result of one lifecycle tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    NoPendingOrder,
    AwaitingMatch { order_id: String },
    DepositBroadcast { order_id: String, tx_hash: String },
    InProgress { order_id: String, status: OrderStatus },
    Redeemed { order_id: String },
    Failed { order_id: String, status: OrderStatus },
}

/// Read-only view for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderView {
    NoPendingOrder,
    AwaitingMatch { order_id: String },
    Matched { order_id: String, status: OrderStatus },
}

/// Drives one swap at a time from order submission through redeem.
///
/// All collaborators are injected; the coordinator owns the persisted
/// [`OrderState`] exclusively and serializes lifecycle entry points so a
/// periodic tick cannot interleave with a user-triggered action.
pub struct SwapCoordinator<A, W, S, N> {
    client: A,
    wallet: W,
    store: Mutex<S>,
    notifier: N,
    cfg: SwapConfig,
    lifecycle: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
}

impl<A, W, S, N> SwapCoordinator<A, W, S, N>
where
    A: MatchingApi,
    W: FundsMover,
    S: OrderStateStore,
    N: Notifier,
{
    pub fn new(client: A, wallet: W, store: S, notifier: N, cfg: SwapConfig) -> Self {
        Self {
            client,
            wallet,
            store: Mutex::new(store),
            notifier,
            cfg,
            lifecycle: tokio::sync::Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().expect("order store mutex poisoned")
    }

    /// Submits a new order for `amount` BTC against `quote` and persists the
    /// resulting order id and secret. Nothing is persisted on any failure,
    /// so a retry starts clean.
    pub async fn create_order(&self, amount: f64, quote: &Quote) -> SwapResult<OrderState> {
        let _guard = self.lifecycle.lock().await;

        if let Some(existing) = self.store().get()? {
            return Err(SwapError::StateConflict(format!(
                "order {} is already in flight",
                existing.order_id
            )));
        }

        if !amount.is_finite() || amount < self.cfg.min_amount || amount > self.cfg.max_amount {
            return Err(SwapError::Validation(format!(
                "amount must be between {} and {} BTC",
                self.cfg.min_amount, self.cfg.max_amount
            )));
        }

        let amount_base = decimal_to_base(amount, BTC_DECIMALS);

        let have = self.wallet.balance().await?;
        if have < amount_base {
            return Err(SwapError::InsufficientFunds {
                have,
                need: amount_base,
            });
        }

        let (strategy_id, destination_amount) = best_quote(quote)?;
        let strategy_id = strategy_id.to_string();

        let order_count = self
            .client
            .fetch_user_order_count(&self.cfg.initiator_destination_address)
            .await?;
        let nonce = order_count + 1;

        let swap_secret = generate_secret(nonce, &self.cfg.initiator_destination_address);

        let order = CreateOrderRequest {
            source_chain: self.cfg.source_chain.clone(),
            destination_chain: self.cfg.destination_chain.clone(),
            source_asset: self.cfg.source_asset.clone(),
            destination_asset: self.cfg.destination_asset.clone(),
            initiator_source_address: self.cfg.initiator_source_address.clone(),
            initiator_destination_address: self.cfg.initiator_destination_address.clone(),
            source_amount: amount_base.to_string(),
            destination_amount: destination_amount.to_string(),
            fee: self.cfg.fee.to_string(),
            nonce: nonce.to_string(),
            min_destination_confirmations: self.cfg.min_destination_confirmations,
            timelock: self.cfg.timelock,
            secret_hash: swap_secret.secret_hash.clone(),
        };

        let attested = self
            .client
            .fetch_attested_quote(&AttestedQuoteRequest {
                order,
                additional_data: StrategyHint {
                    strategy_id,
                    bitcoin_optional_recipient: self.cfg.bitcoin_recipient.clone(),
                },
            })
            .await?;

        let order_id = self.client.create_order(&attested).await?;

        let state = OrderState::new(order_id.clone(), swap_secret.secret);
        self.store().set(&state)?;

        tracing::info!(%order_id, amount_base, "order submitted");
        Ok(state)
    }

    /// Blocks until the in-flight order is matched, within the configured
    /// poll policy.
    pub async fn wait_for_match(&self) -> SwapResult<MatchedOrder> {
        let order_id = self
            .store()
            .get()?
            .ok_or_else(|| SwapError::StateConflict("no order in flight".to_string()))?
            .order_id;

        wait_for("order match", &self.cfg.match_poll, &self.cancel, || {
            self.client.fetch_order(&order_id)
        })
        .await
    }

    /// One lifecycle tick: deposit if the source leg is unfunded, otherwise
    /// observe both legs and act on the derived status. Safe to call from a
    /// periodic trigger; every step is idempotent against reruns.
    pub async fn advance(&self) -> SwapResult<AdvanceOutcome> {
        let _guard = self.lifecycle.lock().await;

        let Some(state) = self.store().get()? else {
            return Ok(AdvanceOutcome::NoPendingOrder);
        };
        let order_id = state.order_id.clone();

        let Some(order) = self.client.fetch_order(&order_id).await? else {
            tracing::debug!(%order_id, "order not matched yet");
            return Ok(AdvanceOutcome::AwaitingMatch { order_id });
        };

        if state.initiate_tx_hash.is_none() {
            if order.source_swap.initiate_tx_hash.is_empty() {
                let amount = order.source_swap.amount.parse::<u64>().map_err(|_| {
                    SwapError::Validation(format!(
                        "source amount {:?} is not a satoshi value",
                        order.source_swap.amount
                    ))
                })?;

                let tx_hash = self.wallet.send(amount, &order.source_swap.swap_id).await?;
                self.store().set_initiate_tx_hash(&tx_hash)?;

                tracing::info!(%order_id, %tx_hash, "deposit broadcast");
                return Ok(AdvanceOutcome::DepositBroadcast { order_id, tx_hash });
            }

            // The chain already shows our deposit (a crash lost the local
            // record); adopt the indexed hash instead of paying twice.
            self.store()
                .set_initiate_tx_hash(&order.source_swap.initiate_tx_hash)?;
        }

        let block_numbers = self.client.fetch_block_numbers().await?;
        let status = order_status(&order, &block_numbers, unix_now(), &self.cfg.deadline)?;
        tracing::debug!(%order_id, ?status, "derived order status");

        if status == OrderStatus::CounterPartyInitiated {
            self.client
                .submit_redeem(&RedeemRequest {
                    order_id: order_id.clone(),
                    secret: state.secret.clone(),
                    perform_on: RedeemHalf::Destination,
                })
                .await?;
            self.store().clear()?;
            self.notifier.swap_completed(&order_id).await;

            tracing::info!(%order_id, "redeem submitted");
            return Ok(AdvanceOutcome::Redeemed { order_id });
        }

        if status.is_failure() {
            tracing::warn!(%order_id, ?status, "swap cannot proceed");
            return Ok(AdvanceOutcome::Failed { order_id, status });
        }

        Ok(AdvanceOutcome::InProgress { order_id, status })
    }

    /// Recomputes the current status without side effects. Callers may poll
    /// this freely; it takes no lifecycle lock.
    pub async fn status(&self) -> SwapResult<OrderView> {
        let Some(state) = self.store().get()? else {
            return Ok(OrderView::NoPendingOrder);
        };
        let order_id = state.order_id;

        let Some(order) = self.client.fetch_order(&order_id).await? else {
            return Ok(OrderView::AwaitingMatch { order_id });
        };

        let block_numbers = self.client.fetch_block_numbers().await?;
        let status = order_status(&order, &block_numbers, unix_now(), &self.cfg.deadline)?;

        Ok(OrderView::Matched { order_id, status })
    }

    /// Associates a host UI handle with the in-flight order.
    pub async fn attach_interface(&self, interface_id: &str) -> SwapResult<()> {
        let _guard = self.lifecycle.lock().await;
        self.store().set_interface_id(interface_id)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
