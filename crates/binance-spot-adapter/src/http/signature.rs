/*
[INPUT]:  Ordered request parameters and API secret
[OUTPUT]: Canonical query strings and HMAC-SHA256 hex signatures
[POS]:    HTTP layer - request signing for authenticated endpoints
[UPDATE]: When changing signing algorithm or query encoding
*/

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::http::client::Credentials;
use crate::http::{BinanceError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Serialize parameters into an `&`-joined `key=value` query string.
///
/// Keys keep the order they were supplied in. The exchange verifies the
/// signature against these exact bytes, so the order must never be sorted.
pub fn canonicalize(params: &[(String, String)]) -> Result<String> {
    Ok(serde_urlencoded::to_string(params)?)
}

/// HMAC-SHA256 of `query` keyed by `secret`, as lowercase hex
pub fn sign(query: &str, secret: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take a key of any size");
    mac.update(query.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Signs query strings with the account's API secret
#[derive(Clone)]
pub struct RequestSigner {
    api_key: String,
    api_secret: String,
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

impl RequestSigner {
    /// Create a signer, failing when either credential half is missing
    pub fn from_credentials(credentials: &Credentials) -> Result<Self> {
        if !credentials.is_complete() {
            return Err(BinanceError::Credentials);
        }
        Ok(Self {
            api_key: credentials.api_key.clone(),
            api_secret: credentials.api_secret.clone(),
        })
    }

    /// API key sent in the `x-mbx-apikey` header
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Sign an already canonical query string
    pub fn sign(&self, query: &str) -> String {
        sign(query, &self.api_secret)
    }

    /// Canonicalize `params` and append `&signature=<hex>`
    pub fn signed_query(&self, params: &[(String, String)]) -> Result<String> {
        let query = canonicalize(params)?;
        let signature = self.sign(&query);
        if query.is_empty() {
            Ok(format!("signature={signature}"))
        } else {
            Ok(format!("{query}&signature={signature}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const BINANCE_TEST_SECRET: &str =
        "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[rstest]
    #[case(
        "timestamp=1578963600000",
        "d84e6641b1e328e7b418fff030caed655c266299c9355e36ce801ed14631eed4"
    )]
    #[case(
        "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559",
        "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
    )]
    fn test_sign_matches_published_vectors(#[case] query: &str, #[case] expected: &str) {
        assert_eq!(sign(query, BINANCE_TEST_SECRET), expected);
    }

    #[test]
    fn test_canonicalize_keeps_supplied_order() {
        let query = canonicalize(&params(&[
            ("symbol", "LTCBTC"),
            ("side", "BUY"),
            ("type", "LIMIT"),
            ("timeInForce", "GTC"),
            ("quantity", "1"),
            ("price", "0.1"),
            ("recvWindow", "5000"),
            ("timestamp", "1499827319559"),
        ]))
        .unwrap();

        assert_eq!(
            query,
            "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559"
        );
    }

    #[test]
    fn test_canonicalize_encodes_values() {
        let query = canonicalize(&params(&[("newClientOrderId", "a/b&c=d")])).unwrap();
        assert_eq!(query, "newClientOrderId=a%2Fb%26c%3Dd");
    }

    #[test]
    fn test_canonicalize_empty() {
        assert_eq!(canonicalize(&[]).unwrap(), "");
    }

    #[test]
    fn test_signature_is_deterministic_and_input_sensitive() {
        let query = canonicalize(&params(&[("symbol", "BTCUSDT"), ("timestamp", "1000")])).unwrap();
        let first = sign(&query, "secret");
        let second = sign(&query, "secret");
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));

        let other_query =
            canonicalize(&params(&[("symbol", "ETHUSDT"), ("timestamp", "1000")])).unwrap();
        assert_ne!(sign(&other_query, "secret"), first);
        assert_ne!(sign(&query, "other-secret"), first);
    }

    #[test]
    fn test_signer_requires_both_halves() {
        let missing_secret = Credentials::new("key", "");
        assert!(matches!(
            RequestSigner::from_credentials(&missing_secret),
            Err(BinanceError::Credentials)
        ));

        let missing_key = Credentials::new("", "secret");
        assert!(matches!(
            RequestSigner::from_credentials(&missing_key),
            Err(BinanceError::Credentials)
        ));
    }

    #[test]
    fn test_signed_query_appends_trailing_signature() {
        let signer =
            RequestSigner::from_credentials(&Credentials::new("key", BINANCE_TEST_SECRET)).unwrap();
        let signed = signer
            .signed_query(&params(&[("timestamp", "1578963600000")]))
            .unwrap();

        assert_eq!(
            signed,
            "timestamp=1578963600000&signature=d84e6641b1e328e7b418fff030caed655c266299c9355e36ce801ed14631eed4"
        );
        assert_eq!(signer.api_key(), "key");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let signer = RequestSigner::from_credentials(&Credentials::new("key", "s3cr3t")).unwrap();
        let rendered = format!("{signer:?}");
        assert!(!rendered.contains("s3cr3t"));
        assert!(rendered.contains("<redacted>"));
    }
}
