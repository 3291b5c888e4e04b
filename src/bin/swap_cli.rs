use std::path::PathBuf;
use std::str::FromStr as _;
use std::time::Duration;

use anyhow::{Context as _, Result};
use btc_evm_swap::amount::{BTC_DECIMALS, decimal_to_base, swap_fee};
use btc_evm_swap::orderbook::{ApiConfig, MatchingApi as _, OrderbookClient};
use btc_evm_swap::poll::PollPolicy;
use btc_evm_swap::swap::coordinator::{AdvanceOutcome, OrderView, SwapConfig, SwapCoordinator};
use btc_evm_swap::swap::status::{DeadlinePolicy, order_status};
use btc_evm_swap::swap::store::SqliteOrderStore;
use btc_evm_swap::wallet::BitcoinCoreWallet;
use btc_evm_swap::{logging, notify::LogNotifier};
use clap::{Parser as _, Subcommand};
use serde_json::json;

#[derive(Debug, clap::Parser)]
struct Args {
    #[arg(long, default_value = "https://quote-knrp.onrender.com")]
    quote_url: String,

    #[arg(long, default_value = "https://evm-swapper-relay.onrender.com")]
    orderbook_url: String,

    #[arg(long, default_value = "https://prod-mainnet-virtual-balance-pr-5.onrender.com")]
    data_url: String,

    #[arg(long, default_value = "testnet")]
    network: String,

    #[arg(long)]
    auth_token: Option<String>,

    #[arg(long, default_value_t = 30)]
    request_timeout_secs: u64,

    #[arg(long, default_value = "swap_state.sqlite3")]
    store_path: PathBuf,

    #[arg(long, default_value = "http://127.0.0.1:18332")]
    bitcoind_url: String,

    #[arg(long)]
    bitcoind_user: Option<String>,

    #[arg(long)]
    bitcoind_pass: Option<String>,

    #[arg(long, default_value = "testnet")]
    bitcoin_network: String,

    #[arg(long, default_value_t = 1_000)]
    fee_reserve_sats: u64,

    #[arg(long, default_value = "bitcoin_testnet")]
    source_chain: String,

    #[arg(long, default_value = "ethereum_sepolia")]
    destination_chain: String,

    #[arg(long, default_value = "primary")]
    source_asset: String,

    #[arg(long, default_value = "0x3c6a17b8cd92976d1d91e491c93c98cd81998265")]
    destination_asset: String,

    /// X-only public key (hex) funding the bitcoin-side HTLC.
    #[arg(long)]
    source_pubkey: Option<String>,

    /// EVM address receiving the destination-side funds.
    #[arg(long)]
    evm_address: Option<String>,

    /// Bitcoin address for service-side refund payouts.
    #[arg(long)]
    refund_address: Option<String>,

    #[arg(long, default_value_t = 1)]
    fee: u64,

    #[arg(long, default_value_t = 288)]
    timelock: u64,

    #[arg(long, default_value_t = 0)]
    min_destination_confirmations: u32,

    #[arg(long, default_value_t = 0.01)]
    min_amount: f64,

    #[arg(long, default_value_t = 5.0)]
    max_amount: f64,

    #[arg(long, default_value_t = 12)]
    confirm_buffer_hours: u64,

    #[arg(long, default_value_t = 1)]
    initiate_buffer_hours: u64,

    #[arg(long, default_value_t = 600)]
    match_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch a quote for the configured pair.
    Quote {
        #[arg(long)]
        amount: f64,
    },
    /// Create an order, wait for a match, then exit.
    Create {
        #[arg(long)]
        amount: f64,
    },
    /// Show the derived status of the in-flight order.
    Status,
    /// Run one lifecycle tick, or keep ticking with --watch.
    Advance {
        #[arg(long, default_value_t = false)]
        watch: bool,

        #[arg(long, default_value_t = 30)]
        interval_secs: u64,
    },
    /// List recent matched orders for the configured EVM address.
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    logging::init().ok();
    let args = Args::parse();

    let api_cfg = ApiConfig {
        quote_url: args.quote_url.clone(),
        orderbook_url: args.orderbook_url.clone(),
        data_url: args.data_url.clone(),
        network: args.network.clone(),
        auth_token: args.auth_token.clone(),
        request_timeout: Duration::from_secs(args.request_timeout_secs),
    };
    let client = OrderbookClient::new(api_cfg).context("build orderbook client")?;

    let out = match &args.command {
        Command::Quote { amount } => {
            let amount = *amount;
            let swap_cfg = swap_config(&args)?;
            let amount_base = decimal_to_base(amount, BTC_DECIMALS);
            let quote = client
                .fetch_quote(&swap_cfg.order_pair(), amount_base)
                .await
                .context("fetch quote")?;
            let fee_usd = swap_fee(&quote, amount).context("compute fee")?;

            json!({
              "quote": quote,
              "fee_usd": format!("{fee_usd:.2}"),
            })
        }
        Command::Create { amount } => {
            let amount = *amount;
            let quote_client = client.clone();
            let coordinator = build_coordinator(&args, client)?;

            let amount_base = decimal_to_base(amount, BTC_DECIMALS);
            let quote = quote_client
                .fetch_quote(&swap_config(&args)?.order_pair(), amount_base)
                .await
                .context("fetch quote")?;

            let state = coordinator
                .create_order(amount, &quote)
                .await
                .context("create order")?;
            tracing::info!(order_id = %state.order_id, "waiting for match");

            let order = coordinator.wait_for_match().await.context("wait for match")?;

            json!({
              "order_id": state.order_id,
              "deposit_address": order.source_swap.swap_id,
              "deposit_amount_sats": order.source_swap.amount,
            })
        }
        Command::Status => {
            let coordinator = build_coordinator(&args, client)?;
            match coordinator.status().await.context("derive status")? {
                OrderView::NoPendingOrder => json!({ "state": "no pending order" }),
                OrderView::AwaitingMatch { order_id } => json!({
                  "order_id": order_id,
                  "state": "awaiting match",
                }),
                OrderView::Matched { order_id, status } => json!({
                  "order_id": order_id,
                  "status": status,
                  "label": status.label(),
                }),
            }
        }
        Command::Advance {
            watch,
            interval_secs,
        } => {
            let (watch, interval_secs) = (*watch, *interval_secs);
            let coordinator = build_coordinator(&args, client)?;

            if !watch {
                outcome_json(&coordinator.advance().await.context("advance")?)
            } else {
                let interval = Duration::from_secs(interval_secs);
                loop {
                    let outcome = tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            coordinator.cancel();
                            anyhow::bail!("interrupted");
                        }
                        outcome = coordinator.advance() => outcome.context("advance")?,
                    };

                    match outcome {
                        AdvanceOutcome::Redeemed { .. }
                        | AdvanceOutcome::Failed { .. }
                        | AdvanceOutcome::NoPendingOrder => break outcome_json(&outcome),
                        other => {
                            println!("{}", serde_json::to_string_pretty(&outcome_json(&other))?);
                            tokio::time::sleep(interval).await;
                        }
                    }
                }
            }
        }
        Command::History => {
            let address = args
                .evm_address
                .as_deref()
                .context("--evm-address is required for history")?;

            let orders = client
                .fetch_user_orders(address)
                .await
                .context("fetch user orders")?;
            let block_numbers = client
                .fetch_block_numbers()
                .await
                .context("fetch block numbers")?;

            let deadline = deadline_policy(&args);
            let now = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs();

            let rows: Vec<_> = orders
                .iter()
                .map(|order| {
                    let label = order_status(order, &block_numbers, now, &deadline)
                        .map(|s| s.label())
                        .unwrap_or("Pending");
                    json!({
                      "order_id": order.create_order.create_id,
                      "created_at": order.created_at,
                      "source_amount": order.source_swap.amount,
                      "destination_amount": order.destination_swap.amount,
                      "status": label,
                    })
                })
                .collect();

            json!({ "orders": rows })
        }
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn deadline_policy(args: &Args) -> DeadlinePolicy {
    DeadlinePolicy {
        confirm_buffer: Duration::from_secs(args.confirm_buffer_hours * 3600),
        initiate_buffer: Duration::from_secs(args.initiate_buffer_hours * 3600),
    }
}

fn swap_config(args: &Args) -> Result<SwapConfig> {
    Ok(SwapConfig {
        source_chain: args.source_chain.clone(),
        destination_chain: args.destination_chain.clone(),
        source_asset: args.source_asset.clone(),
        destination_asset: args.destination_asset.clone(),
        initiator_source_address: args.source_pubkey.clone().unwrap_or_default(),
        initiator_destination_address: args.evm_address.clone().unwrap_or_default(),
        bitcoin_recipient: args.refund_address.clone(),
        fee: args.fee,
        timelock: args.timelock,
        min_destination_confirmations: args.min_destination_confirmations,
        min_amount: args.min_amount,
        max_amount: args.max_amount,
        deadline: deadline_policy(args),
        match_poll: PollPolicy {
            timeout: Duration::from_secs(args.match_timeout_secs),
            ..PollPolicy::default()
        },
    })
}

fn build_coordinator(
    args: &Args,
    client: OrderbookClient,
) -> Result<SwapCoordinator<OrderbookClient, BitcoinCoreWallet, SqliteOrderStore, LogNotifier>> {
    let network =
        bitcoin::Network::from_str(&args.bitcoin_network).context("parse bitcoin network")?;

    let auth = match (&args.bitcoind_user, &args.bitcoind_pass) {
        (Some(user), Some(pass)) => bitcoincore_rpc::Auth::UserPass(user.clone(), pass.clone()),
        _ => bitcoincore_rpc::Auth::None,
    };

    let wallet = BitcoinCoreWallet::new(&args.bitcoind_url, auth, network, args.fee_reserve_sats)
        .context("connect bitcoind wallet")?;

    let store = SqliteOrderStore::open(args.store_path.clone()).context("open order store")?;

    Ok(SwapCoordinator::new(
        client,
        wallet,
        store,
        LogNotifier,
        swap_config(args)?,
    ))
}

fn outcome_json(outcome: &AdvanceOutcome) -> serde_json::Value {
    match outcome {
        AdvanceOutcome::NoPendingOrder => json!({ "state": "no pending order" }),
        AdvanceOutcome::AwaitingMatch { order_id } => json!({
          "order_id": order_id,
          "state": "awaiting match",
        }),
        AdvanceOutcome::DepositBroadcast { order_id, tx_hash } => json!({
          "order_id": order_id,
          "state": "deposit broadcast",
          "tx_hash": tx_hash,
        }),
        AdvanceOutcome::InProgress { order_id, status } => json!({
          "order_id": order_id,
          "status": status,
          "label": status.label(),
        }),
        AdvanceOutcome::Redeemed { order_id } => json!({
          "order_id": order_id,
          "state": "redeem submitted",
        }),
        AdvanceOutcome::Failed { order_id, status } => json!({
          "order_id": order_id,
          "state": "failed",
          "status": status,
          "label": status.label(),
        }),
    }
}
