//! Master-key request signing for the REST transport.
//!
//! Each request carries an HMAC-SHA256 signature over the verb, resource
//! type, resource link, and request date, keyed by the account's
//! base64-encoded master key.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use hmac::{Hmac, Mac};
use jiff::Timestamp;
use sha2::Sha256;

use crate::{Error, Result};

pub(crate) type KeyMac = Hmac<Sha256>;

/// Builds the reusable HMAC state from the base64-encoded master key.
pub(crate) fn master_key_mac(key: &str) -> Result<KeyMac> {
    let key = BASE64
        .decode(key)
        .map_err(|e| Error::config(format!("access key is not valid base64: {e}")))?;

    KeyMac::new_from_slice(&key)
        .map_err(|e| Error::config(format!("access key is not usable: {e}")))
}

/// Returns the current time as a lowercase RFC 1123 date.
///
/// The same string is signed and sent in the `x-ms-date` header.
pub(crate) fn http_date() -> String {
    Timestamp::now()
        .strftime("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
        .to_lowercase()
}

/// Computes the authorization token for one request.
///
/// The signed payload is `{verb}\n{resource_type}\n{resource_link}\n{date}\n\n`
/// with verb, resource type, and date lowercased; the token is the
/// URL-encoded `type=master&ver=1.0&sig=...` string.
pub(crate) fn sign(
    mac: &KeyMac,
    verb: &str,
    resource_type: &str,
    resource_link: &str,
    date: &str,
) -> String {
    let payload = format!(
        "{}\n{}\n{}\n{}\n\n",
        verb.to_lowercase(),
        resource_type.to_lowercase(),
        resource_link,
        date.to_lowercase(),
    );

    let signature = mac.clone().chain_update(payload.as_bytes()).finalize();
    let signature = BASE64.encode(signature.into_bytes());

    let token = format!("type=master&ver=1.0&sig={signature}");
    url::form_urlencoded::byte_serialize(token.as_bytes()).collect()
}
