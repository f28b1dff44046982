//! OAuth callback signature verification.
//!
//! Shopify signs the callback query string with the app's client secret:
//! drop `hmac`, sort the remaining parameters by key, join them as
//! `key=value` pairs with `&`, and HMAC-SHA256 the result. The signature is
//! sent as lower-case hex.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Name of the query parameter carrying the signature.
pub const HMAC_PARAM: &str = "hmac";

/// Build the signed message from callback parameters (excluding `hmac`).
fn signing_message(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(k, _)| k.as_str() != HMAC_PARAM)
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Compute the lower-case hex signature Shopify would send for `params`.
#[must_use]
pub fn sign(params: &BTreeMap<String, String>, secret: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(signing_message(params).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Returns `true` iff `params["hmac"]` is the signature of the remaining
/// parameters under `secret`.
///
/// The supplied value must be lower-case hex; it is decoded and checked with
/// the MAC's constant-time verifier.
#[must_use]
pub fn verify_hmac(params: &BTreeMap<String, String>, secret: &str) -> bool {
    let Some(provided) = params.get(HMAC_PARAM) else {
        return false;
    };

    if provided.chars().any(|c| c.is_ascii_uppercase()) {
        return false;
    }
    let Ok(provided_bytes) = hex::decode(provided) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(signing_message(params).as_bytes());

    mac.verify_slice(&provided_bytes).is_ok()
}
