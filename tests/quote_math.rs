use bitcoin::hashes::{Hash as _, sha256};
use btc_evm_swap::amount::{BTC_DECIMALS, base_to_decimal, best_quote, decimal_to_base, swap_fee};
use btc_evm_swap::error::SwapError;
use btc_evm_swap::orderbook::{ApiResponse, Quote, StrategyQuotes};
use btc_evm_swap::secret::generate_secret;

fn sample_quote() -> Quote {
    Quote {
        quotes: StrategyQuotes::new(vec![("stratA".to_string(), 4_900_000)]),
        input_token_price: 95_000.0,
        output_token_price: 94_000.0,
    }
}

#[test]
fn base_unit_conversion() {
    assert_eq!(decimal_to_base(0.05, BTC_DECIMALS), 5_000_000);
    assert_eq!(decimal_to_base(1.0, BTC_DECIMALS), 100_000_000);
    assert!((base_to_decimal(4_900_000, BTC_DECIMALS) - 0.049).abs() < 1e-12);
}

#[test]
fn fee_from_token_prices() {
    let fee = swap_fee(&sample_quote(), 0.05).unwrap();
    assert!((fee - 144.0).abs() < 1e-6);
    assert_eq!(format!("{fee:.2}"), "144.00");
}

#[test]
fn best_quote_is_first_entry_not_maximum() {
    let quote = Quote {
        quotes: StrategyQuotes::new(vec![
            ("preferred".to_string(), 100),
            ("bigger".to_string(), 999),
        ]),
        ..Default::default()
    };

    let (strategy, amount) = best_quote(&quote).unwrap();
    assert_eq!(strategy, "preferred");
    assert_eq!(amount, 100);
}

#[test]
fn empty_quote_is_rejected() {
    let err = best_quote(&Quote::default()).unwrap_err();
    assert!(matches!(err, SwapError::Validation(_)));
}

#[test]
fn quotes_keep_service_order_through_json() {
    let raw = r#"{
      "quotes": { "z_strat": 100, "a_strat": 999 },
      "input_token_price": 95000.0,
      "output_token_price": 94000.0
    }"#;

    let quote: Quote = serde_json::from_str(raw).unwrap();
    let (strategy, amount) = best_quote(&quote).unwrap();
    assert_eq!(strategy, "z_strat");
    assert_eq!(amount, 100);
}

#[test]
fn envelope_error_wins_over_http_success() {
    let raw = r#"{ "status": "Error", "error": "insufficient liquidity" }"#;
    let resp: ApiResponse<Quote> = serde_json::from_str(raw).unwrap();

    let err = resp.into_result("fetch quote").unwrap_err();
    match err {
        SwapError::Service(reason) => assert_eq!(reason, "insufficient liquidity"),
        other => panic!("expected service error, got {other:?}"),
    }
}

#[test]
fn envelope_ok_without_result_is_an_error() {
    let raw = r#"{ "status": "Ok" }"#;
    let resp: ApiResponse<u64> = serde_json::from_str(raw).unwrap();
    assert!(matches!(
        resp.into_result("fetch order count"),
        Err(SwapError::Service(_))
    ));
}

#[test]
fn envelope_null_result_means_not_yet() {
    let raw = r#"{ "status": "Ok", "result": null }"#;
    let resp: ApiResponse<u64> = serde_json::from_str(raw).unwrap();
    assert_eq!(resp.into_optional_result("fetch order").unwrap(), None);
}

#[test]
fn envelope_result_round_trips() {
    let raw = r#"{ "status": "Ok", "result": 7 }"#;
    let resp: ApiResponse<u64> = serde_json::from_str(raw).unwrap();
    assert_eq!(resp.into_result("fetch order count").unwrap(), 7);
}

#[test]
fn secret_hash_round_trip() {
    let secret = generate_secret(1, "0x7c26162c5f0c598510");

    assert!(!secret.secret.is_empty());
    assert!(!secret.secret.starts_with("0x"));
    assert!(!secret.secret_hash.starts_with("0x"));

    let bytes = hex::decode(&secret.secret).unwrap();
    assert_eq!(bytes.len(), 32);

    let recomputed = hex::encode(sha256::Hash::hash(&bytes).to_byte_array());
    assert_eq!(recomputed, secret.secret_hash);
}

#[test]
fn secrets_are_unique_per_order() {
    let a = generate_secret(1, "0x7c26162c5f0c598510");
    let b = generate_secret(1, "0x7c26162c5f0c598510");
    assert_ne!(a.secret, b.secret);
    assert_ne!(a.secret_hash, b.secret_hash);
}
