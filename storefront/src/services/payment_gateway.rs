//! Signed-redirect payment gateway
//!
//! Outbound redirects and inbound callbacks carry a hex SHA-256 signature over
//! `secret|k1=v1&k2=v2...` with keys in lexical order.

use sha2::{Digest, Sha256};
use url::Url;

use crate::core::credentials::constant_time_eq;
use crate::error::{StorefrontError, StorefrontResult};
use crate::traits::PaymentGateway;
use crate::types::{Order, PaymentCallback};

/// Real payment gateway implementation
#[derive(Clone)]
pub struct RealPaymentGateway {
    secret: String,
    gateway_url: Url,
    return_url: String,
}

impl RealPaymentGateway {
    pub fn new(secret: impl Into<String>, gateway_url: &str, return_url: impl Into<String>) -> StorefrontResult<Self> {
        let gateway_url = Url::parse(gateway_url)
            .map_err(|e| StorefrontError::Config(format!("Invalid payment gateway URL {gateway_url}: {e}")))?;
        Ok(Self {
            secret: secret.into(),
            gateway_url,
            return_url: return_url.into(),
        })
    }

    /// `k=v` pairs joined with `&`, sorted by key
    fn canonical(params: &[(&str, String)]) -> String {
        let mut sorted: Vec<&(&str, String)> = params.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        sorted
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("&")
    }

    fn signature(&self, params: &[(&str, String)]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b"|");
        hasher.update(Self::canonical(params).as_bytes());
        hex::encode(hasher.finalize())
    }

    fn callback_params(callback: &PaymentCallback) -> [(&'static str, String); 4] {
        [
            ("order_id", callback.order_id.to_string()),
            ("amount", callback.amount.to_string()),
            ("txn_ref", callback.txn_ref.clone()),
            ("code", callback.code.clone()),
        ]
    }
}

impl PaymentGateway for RealPaymentGateway {
    fn checkout_url(&self, order: &Order) -> String {
        let params = [
            ("order_id", order.id.to_string()),
            ("amount", order.total.cents().to_string()),
            ("txn_ref", order.txn_ref.clone().unwrap_or_default()),
            ("return_url", self.return_url.clone()),
        ];
        let signature = self.signature(&params);

        let mut url = self.gateway_url.clone();
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .append_pair("signature", &signature);
        url.to_string()
    }

    fn sign(&self, callback: &PaymentCallback) -> String {
        self.signature(&Self::callback_params(callback))
    }

    fn verify(&self, callback: &PaymentCallback) -> bool {
        let expected = self.sign(callback);
        constant_time_eq(expected.as_bytes(), callback.signature.to_ascii_lowercase().as_bytes())
    }
}
