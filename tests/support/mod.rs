//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod socket_guard;

/// A 32-character checksum made of `fill`.
#[must_use]
pub fn checksum(fill: char) -> String {
    std::iter::repeat_n(fill, 32).collect()
}

/// JSON body of a successful client-credentials exchange.
#[must_use]
pub fn token_body(token: &str, expires_in: u64) -> serde_json::Value {
    serde_json::json!({
        "token_type": "Bearer",
        "expires_in": expires_in,
        "access_token": token,
    })
}
