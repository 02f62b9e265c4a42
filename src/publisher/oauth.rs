//! OAuth 1.0a request signing (HMAC-SHA1) for the X API.
//!
//! Only query parameters and the `oauth_*` protocol parameters take part in
//! the signature. JSON and multipart bodies are not signed.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use itertools::Itertools;
use rand::distr::{Alphanumeric, SampleString};
use sha1::Sha1;
use std::error::Error;
use url::Url;

type HmacSha1 = Hmac<Sha1>;

/// User-context credentials for an X app.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    pub consumer_key: String,
    pub consumer_secret: String,
    pub access_token: String,
    pub access_token_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"<redacted>")
            .field("access_token", &"<redacted>")
            .field("access_token_secret", &"<redacted>")
            .finish()
    }
}

/// RFC 3986 percent-encoding: everything except `A-Z a-z 0-9 - . _ ~`.
fn encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

/// `Authorization` header value for a request, with a fresh nonce and timestamp.
pub fn authorization_header(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
) -> Result<String, Box<dyn Error>> {
    let nonce = Alphanumeric.sample_string(&mut rand::rng(), 32);
    let timestamp = chrono::Utc::now().timestamp();
    authorization_header_with(credentials, method, url, &[], &nonce, timestamp)
}

/// `Authorization` header value for fixed nonce and timestamp.
///
/// `extra_params` are form parameters that are part of the signature in
/// addition to the URL's query string.
pub fn authorization_header_with(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    extra_params: &[(&str, &str)],
    nonce: &str,
    timestamp: i64,
) -> Result<String, Box<dyn Error>> {
    let timestamp = timestamp.to_string();
    let mut oauth_params = vec![
        ("oauth_consumer_key", credentials.consumer_key.as_str()),
        ("oauth_nonce", nonce),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_token", credentials.access_token.as_str()),
        ("oauth_version", "1.0"),
    ];

    let signature = signature(credentials, method, url, &oauth_params, extra_params)?;
    oauth_params.push(("oauth_signature", signature.as_str()));

    let header = oauth_params
        .iter()
        .sorted()
        .map(|(k, v)| format!(r#"{}="{}""#, encode(k), encode(v)))
        .join(", ");
    Ok(format!("OAuth {}", header))
}

fn signature(
    credentials: &OAuthCredentials,
    method: &str,
    url: &str,
    oauth_params: &[(&str, &str)],
    extra_params: &[(&str, &str)],
) -> Result<String, Box<dyn Error>> {
    let mut parsed = Url::parse(url)?;
    let query: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
    parsed.set_query(None);
    parsed.set_fragment(None);

    let parameter_string = oauth_params
        .iter()
        .chain(extra_params.iter())
        .map(|(k, v)| (encode(k), encode(v)))
        .chain(query.iter().map(|(k, v)| (encode(k), encode(v))))
        .sorted()
        .map(|(k, v)| format!("{}={}", k, v))
        .join("&");

    let base_string = format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(parsed.as_str()),
        encode(&parameter_string)
    );
    let signing_key = format!(
        "{}&{}",
        encode(&credentials.consumer_secret),
        encode(&credentials.access_token_secret)
    );

    let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
        .map_err(|e| format!("invalid signing key: {}", e))?;
    mac.update(base_string.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
