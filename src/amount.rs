use crate::error::{SwapError, SwapResult};
use crate::orderbook::Quote;

pub const BTC_DECIMALS: u32 = 8;

pub fn decimal_to_base(amount: f64, decimals: u32) -> u64 {
    (amount * 10f64.powi(decimals as i32)).round() as u64
}

pub fn base_to_decimal(base_units: u64, decimals: u32) -> f64 {
    base_units as f64 / 10f64.powi(decimals as i32)
}

/// The matching service returns strategies in its own preference order;
/// the first entry is the one to take, regardless of value.
pub fn best_quote(quote: &Quote) -> SwapResult<(&str, u64)> {
    quote
        .quotes
        .first()
        .map(|(strategy, amount)| (strategy.as_str(), *amount))
        .ok_or_else(|| SwapError::Validation("quote carries no strategies".to_string()))
}

/// USD fee implied by the quote: input value minus output value at the
/// attested token prices. Display form, two decimals.
pub fn swap_fee(quote: &Quote, in_amount: f64) -> SwapResult<f64> {
    let (_, best) = best_quote(quote)?;

    let in_amount_usd = in_amount * quote.input_token_price;
    let out_amount_usd = base_to_decimal(best, BTC_DECIMALS) * quote.output_token_price;

    Ok(in_amount_usd - out_amount_usd)
}
