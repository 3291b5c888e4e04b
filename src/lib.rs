pub mod amount;
pub mod error;
pub mod logging;
pub mod notify;
pub mod orderbook;
pub mod poll;
pub mod secret;
pub mod swap;
pub mod wallet;
