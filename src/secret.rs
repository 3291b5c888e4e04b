use bitcoin::hashes::{Hash as _, sha256};
use rand::RngCore as _;
use rand::rngs::OsRng;

/// HTLC secret and its SHA-256 hash, both lowercase hex without a `0x`
/// prefix. The hash is what goes on chain; the secret is revealed only at
/// redeem time.
#[derive(Debug, Clone)]
pub struct SwapSecret {
    pub secret: String,
    pub secret_hash: String,
}

/// Draws 32 bytes from the OS RNG per order. `nonce` and `redeemer` are
/// trace context only; the secret must stay unpredictable even when two
/// orders are created in the same instant.
pub fn generate_secret(nonce: u64, redeemer: &str) -> SwapSecret {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);

    let hash = sha256::Hash::hash(&bytes);

    tracing::debug!(nonce, redeemer, "generated swap secret");

    SwapSecret {
        secret: hex::encode(bytes),
        secret_hash: hex::encode(hash.to_byte_array()),
    }
}
