use std::sync::Arc;

use async_trait::async_trait;
use bitcoin::address::NetworkUnchecked;
use bitcoin::{Address, Amount, Network};
use bitcoincore_rpc::{Auth, Client, RpcApi as _};

use crate::error::{SwapError, SwapResult};

/// The "send funds" capability the coordinator depends on. Coin selection,
/// signing and broadcast are the implementation's problem; the coordinator
/// only ever hands over an amount and a destination.
#[async_trait]
pub trait FundsMover: Send + Sync {
    /// A receive address of the underlying wallet.
    async fn address(&self) -> SwapResult<String>;

    /// Spendable balance in satoshis.
    async fn balance(&self) -> SwapResult<u64>;

    /// Sends `amount_sats` to `to_address` and returns the broadcast tx id.
    /// Fails with [`SwapError::InsufficientFunds`] when the spendable
    /// balance cannot cover the amount plus the fee reserve.
    async fn send(&self, amount_sats: u64, to_address: &str) -> SwapResult<String>;
}

/// FundsMover backed by a Bitcoin Core wallet over JSON-RPC. Keys never
/// leave the Core wallet, so this also stands in for the host keystore.
pub struct BitcoinCoreWallet {
    client: Arc<Client>,
    network: Network,
    fee_reserve_sats: u64,
}

impl BitcoinCoreWallet {
    pub fn new(
        url: &str,
        auth: Auth,
        network: Network,
        fee_reserve_sats: u64,
    ) -> SwapResult<Self> {
        let client = Client::new(url, auth).map_err(wallet_err)?;
        Ok(Self {
            client: Arc::new(client),
            network,
            fee_reserve_sats,
        })
    }

    async fn blocking<T, F>(&self, f: F) -> SwapResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Client) -> SwapResult<T> + Send + 'static,
    {
        let client = self.client.clone();
        tokio::task::spawn_blocking(move || f(&client))
            .await
            .map_err(|e| SwapError::Wallet(format!("wallet task join: {e}")))?
    }
}

#[async_trait]
impl FundsMover for BitcoinCoreWallet {
    async fn address(&self) -> SwapResult<String> {
        let network = self.network;
        self.blocking(move |client| {
            let address = client.get_new_address(None, None).map_err(wallet_err)?;
            let address = address
                .require_network(network)
                .map_err(|e| SwapError::Wallet(format!("wallet address network: {e}")))?;
            Ok(address.to_string())
        })
        .await
    }

    async fn balance(&self) -> SwapResult<u64> {
        self.blocking(|client| {
            let balance = client.get_balance(None, None).map_err(wallet_err)?;
            Ok(balance.to_sat())
        })
        .await
    }

    async fn send(&self, amount_sats: u64, to_address: &str) -> SwapResult<String> {
        let network = self.network;
        let fee_reserve = self.fee_reserve_sats;
        let to_address = to_address.to_string();

        self.blocking(move |client| {
            let address = to_address
                .parse::<Address<NetworkUnchecked>>()
                .map_err(|e| SwapError::Validation(format!("deposit address: {e}")))?
                .require_network(network)
                .map_err(|e| SwapError::Validation(format!("deposit address network: {e}")))?;

            let have = client.get_balance(None, None).map_err(wallet_err)?.to_sat();
            let need = amount_sats.saturating_add(fee_reserve);
            if have < need {
                return Err(SwapError::InsufficientFunds { have, need });
            }

            let txid = client
                .send_to_address(
                    &address,
                    Amount::from_sat(amount_sats),
                    None,
                    None,
                    None,
                    None,
                    None,
                    None,
                )
                .map_err(wallet_err)?;

            tracing::info!(%txid, amount_sats, to = %address, "broadcast deposit");
            Ok(txid.to_string())
        })
        .await
    }
}

fn wallet_err(err: bitcoincore_rpc::Error) -> SwapError {
    SwapError::Wallet(err.to_string())
}
