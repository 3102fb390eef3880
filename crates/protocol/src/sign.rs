//! Canonical request signing.
//!
//! The hub authenticates every request by recomputing an HMAC over a fixed,
//! ordered subset of the query parameters. The canonical string is each
//! `name=value` pair concatenated with no separator between pairs:
//!
//! ```text
//! key=df94b12c3355425eb4efa406f09e8b9fexpiration=2020-05-28T09:02:49.5754586
//! ```
//!
//! The HMAC-SHA512 output is base64-encoded and then made URL-safe by
//! replacing `/` with `_` and `+` with `-`. Padding is kept.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Accumulates ordered signature parameters and produces the signature.
///
/// Order is significant and preserved exactly as added. Nothing is sorted
/// or deduplicated.
#[derive(Clone)]
pub struct SignatureBuilder<'a> {
    secret: &'a str,
    params: Vec<(String, String)>,
}

impl<'a> SignatureBuilder<'a> {
    pub fn new(secret: &'a str) -> Self {
        Self { secret, params: Vec::new() }
    }

    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// The exact byte string that is fed to the HMAC.
    pub fn canonical_string(&self) -> String {
        self.params
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect()
    }

    /// Compute the URL-safe signature over the parameters added so far.
    ///
    /// Returns `None` only if the HMAC cannot be keyed.
    pub fn result(&self) -> Option<String> {
        let mut mac = HmacSha512::new_from_slice(self.secret.as_bytes()).ok()?;
        mac.update(self.canonical_string().as_bytes());
        let encoded = STANDARD.encode(mac.finalize().into_bytes());
        Some(to_url_safe(&encoded))
    }

    /// Like [`result`](Self::result), but refuses to sign an empty parameter
    /// list. An empty list means the request was assembled incorrectly.
    pub fn result_if_not_empty(&self) -> Option<String> {
        if self.params.is_empty() {
            return None;
        }
        self.result()
    }
}

impl std::fmt::Debug for SignatureBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureBuilder")
            .field("secret", &"<redacted>")
            .field("params", &self.params)
            .finish()
    }
}

fn to_url_safe(encoded: &str) -> String {
    encoded.replace('/', "_").replace('+', "-")
}

/// Reverse the `_`/`-` substitution and decode the raw HMAC bytes.
pub fn decode_signature(signature: &str) -> Option<Vec<u8>> {
    let standard = signature.replace('_', "/").replace('-', "+");
    STANDARD.decode(standard).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "df94b12c3355425eb4efa406f09e8b9f";
    const EXPIRATION: &str = "2020-05-28T09:02:49.5754586";

    fn signed(secret: &str, params: &[(&str, &str)]) -> Option<String> {
        let mut builder = SignatureBuilder::new(secret);
        for (name, value) in params {
            builder.add(*name, *value);
        }
        builder.result()
    }

    #[test]
    fn test_canonical_string_has_no_separators() {
        let mut builder = SignatureBuilder::new("s");
        builder.add("key", KEY).add("expiration", EXPIRATION);
        assert_eq!(
            builder.canonical_string(),
            "key=df94b12c3355425eb4efa406f09e8b9fexpiration=2020-05-28T09:02:49.5754586"
        );
    }

    #[test]
    fn test_known_signature() {
        let sig = signed("hub-secret-0", &[("key", KEY), ("expiration", EXPIRATION)]).unwrap();
        assert_eq!(
            sig,
            "wzRYrT1dxph_Y7E_ygVM3qevwmND6dmFNVOzdvzEOVd0ctRPIbGs-DOAqtUFJfbmxF8uP9BhUFPY66So8pJcOA=="
        );

        let sig = signed("test-secret", &[("key", KEY), ("expiration", EXPIRATION)]).unwrap();
        assert_eq!(
            sig,
            "nabLdy5Hjd7YwvxgW6Plr4yPeawy3XGtikwQn1QGfwNVMqLlM0nRurZPMCIITF_wyHcPhh3gA3Dmg7QZgHirIQ=="
        );
    }

    #[test]
    fn test_signature_is_deterministic() {
        let params = [("key", KEY), ("expiration", EXPIRATION)];
        let a = signed("secret", &params);
        let b = signed("secret", &params);
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_is_order_sensitive() {
        let forward = signed("test-secret", &[("key", KEY), ("expiration", EXPIRATION)]).unwrap();
        let reversed = signed("test-secret", &[("expiration", EXPIRATION), ("key", KEY)]).unwrap();
        assert_ne!(forward, reversed);
        assert_eq!(
            reversed,
            "OxCNGlQitg2o_p3qFsdxLhQKpbOkVkbH4JmoqdmSwWbCx9CKGyao4qib1oMzrEvkmkJ0cWlH6oSARc4YrX_wZA=="
        );
    }

    #[test]
    fn test_signature_depends_on_secret() {
        let params = [("key", KEY), ("expiration", EXPIRATION)];
        assert_ne!(signed("one", &params), signed("two", &params));
    }

    #[test]
    fn test_signature_alphabet_is_url_safe() {
        for i in 0..64 {
            let value = format!("value-{}", i);
            let sig = signed("secret", &[("key", value.as_str())]).unwrap();
            assert!(!sig.contains('/'), "{}", sig);
            assert!(!sig.contains('+'), "{}", sig);
        }
    }

    #[test]
    fn test_signature_decodes_to_hmac_bytes() {
        let sig = signed("hub-secret-0", &[("key", KEY), ("expiration", EXPIRATION)]).unwrap();
        let raw = decode_signature(&sig).unwrap();
        assert_eq!(raw.len(), 64);
        assert_eq!(
            STANDARD.encode(&raw),
            "wzRYrT1dxph/Y7E/ygVM3qevwmND6dmFNVOzdvzEOVd0ctRPIbGs+DOAqtUFJfbmxF8uP9BhUFPY66So8pJcOA=="
        );
    }

    #[test]
    fn test_empty_builder() {
        let builder = SignatureBuilder::new("secret");
        assert!(builder.is_empty());
        assert!(builder.result_if_not_empty().is_none());
        // Plain result still signs the empty string.
        assert!(builder.result().is_some());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let mut builder = SignatureBuilder::new("super-secret");
        builder.add("key", "k");
        let debug = format!("{:?}", builder);
        assert!(!debug.contains("super-secret"));
    }
}
