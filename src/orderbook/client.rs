use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::{
    ApiResponse, AttestedOrder, AttestedQuoteRequest, MatchedOrder, PaginatedOrders, Quote,
    RedeemRequest,
};
use crate::error::{SwapError, SwapResult};

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub quote_url: String,
    pub orderbook_url: String,
    pub data_url: String,
    /// Network segment of the block-number endpoint ("mainnet"/"testnet").
    pub network: String,
    pub auth_token: Option<String>,
    pub request_timeout: Duration,
}

/// The matching-service surface the coordinator depends on. Split out as a
/// trait so the lifecycle can be driven against a scripted service in tests.
#[async_trait]
pub trait MatchingApi: Send + Sync {
    async fn fetch_quote(&self, order_pair: &str, amount_base: u64) -> SwapResult<Quote>;

    async fn fetch_attested_quote(&self, req: &AttestedQuoteRequest) -> SwapResult<AttestedOrder>;

    /// Returns the new order id.
    async fn create_order(&self, order: &AttestedOrder) -> SwapResult<String>;

    /// `Ok(None)` means the order exists but has not been matched yet.
    async fn fetch_order(&self, order_id: &str) -> SwapResult<Option<MatchedOrder>>;

    async fn fetch_user_orders(&self, address: &str) -> SwapResult<Vec<MatchedOrder>>;

    async fn fetch_user_order_count(&self, address: &str) -> SwapResult<u64>;

    async fn fetch_block_numbers(&self) -> SwapResult<HashMap<String, u64>>;

    async fn submit_redeem(&self, req: &RedeemRequest) -> SwapResult<()>;
}

#[derive(Clone)]
pub struct OrderbookClient {
    cfg: ApiConfig,
    http: reqwest::Client,
}

impl OrderbookClient {
    pub fn new(cfg: ApiConfig) -> SwapResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()?;
        Ok(Self { cfg, http })
    }

    async fn get_json<T: DeserializeOwned>(&self, what: &str, url: String) -> SwapResult<T> {
        let resp = self.http.get(&url).send().await?;
        decode_response(what, resp).await
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        what: &str,
        url: String,
        body: &B,
    ) -> SwapResult<T> {
        let mut req = self.http.post(&url).json(body);
        if let Some(token) = &self.cfg.auth_token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await?;
        decode_response(what, resp).await
    }
}

async fn decode_response<T: DeserializeOwned>(
    what: &str,
    resp: reqwest::Response,
) -> SwapResult<T> {
    let status = resp.status();
    let bytes = resp.bytes().await?;

    if !status.is_success() {
        // Failed calls still tend to carry an envelope with the reason.
        if let Ok(envelope) = serde_json::from_slice::<ApiResponse<serde_json::Value>>(&bytes)
            && let Some(error) = envelope.error
        {
            return Err(SwapError::Service(error));
        }
        return Err(SwapError::Network(format!("{what}: http status {status}")));
    }

    serde_json::from_slice(&bytes)
        .map_err(|e| SwapError::Service(format!("{what}: malformed response: {e}")))
}

#[async_trait]
impl MatchingApi for OrderbookClient {
    async fn fetch_quote(&self, order_pair: &str, amount_base: u64) -> SwapResult<Quote> {
        let url = format!(
            "{}/quote?order_pair={order_pair}&amount={amount_base}&exact_out=false",
            self.cfg.quote_url
        );
        self.get_json::<ApiResponse<Quote>>("fetch quote", url)
            .await?
            .into_result("fetch quote")
    }

    async fn fetch_attested_quote(
        &self,
        req: &AttestedQuoteRequest,
    ) -> SwapResult<AttestedOrder> {
        let url = format!("{}/quote/attested", self.cfg.quote_url);
        self.post_json::<_, ApiResponse<AttestedOrder>>("attest quote", url, req)
            .await?
            .into_result("attest quote")
    }

    async fn create_order(&self, order: &AttestedOrder) -> SwapResult<String> {
        let url = format!("{}/relayer/create-order", self.cfg.orderbook_url);
        self.post_json::<_, ApiResponse<String>>("create order", url, order)
            .await?
            .into_result("create order")
    }

    async fn fetch_order(&self, order_id: &str) -> SwapResult<Option<MatchedOrder>> {
        let url = format!("{}/orders/id/matched/{order_id}", self.cfg.orderbook_url);
        self.get_json::<ApiResponse<MatchedOrder>>("fetch order", url)
            .await?
            .into_optional_result("fetch order")
    }

    async fn fetch_user_orders(&self, address: &str) -> SwapResult<Vec<MatchedOrder>> {
        let url = format!(
            "{}/orders/user/matched/{address}?per_page=6&pending=false",
            self.cfg.orderbook_url
        );
        let page = self
            .get_json::<ApiResponse<PaginatedOrders>>("fetch user orders", url)
            .await?
            .into_result("fetch user orders")?;
        Ok(page.data)
    }

    async fn fetch_user_order_count(&self, address: &str) -> SwapResult<u64> {
        let url = format!("{}/orders/user/count/{address}", self.cfg.orderbook_url);
        self.get_json::<ApiResponse<u64>>("fetch order count", url)
            .await?
            .into_result("fetch order count")
    }

    async fn fetch_block_numbers(&self) -> SwapResult<HashMap<String, u64>> {
        let url = format!("{}/blocknumber/{}", self.cfg.data_url, self.cfg.network);
        self.get_json::<ApiResponse<HashMap<String, u64>>>("fetch block numbers", url)
            .await?
            .into_result("fetch block numbers")
    }

    async fn submit_redeem(&self, req: &RedeemRequest) -> SwapResult<()> {
        let url = format!("{}/relayer/redeem", self.cfg.orderbook_url);
        self.post_json::<_, ApiResponse<String>>("submit redeem", url, req)
            .await?
            .into_result("submit redeem")?;
        Ok(())
    }
}
