use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::error::{ErrorMessage, HttpError};

type HmacSha256 = Hmac<Sha256>;

/// Payment gateway client.
///
/// Wraps a `reqwest::Client` for the order-creation call and carries the
/// (optional) API credentials. When credentials are absent every operation
/// fails with a generic configuration error, so an undeployed gateway never
/// takes the rest of the site down. Cloning is cheap; `reqwest::Client` is
/// reference-counted internally.
#[derive(Clone)]
pub struct GatewayClient {
    conn: reqwest::Client,
    key_id: Option<String>,
    key_secret: Option<String>,
    base_url: String,
}

/// Order-creation request body, mirroring the gateway's `POST /v1/orders`.
#[derive(Debug, Serialize)]
struct CreateOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: &'a str,
    notes: serde_json::Value,
}

/// The slice of the gateway's order response this backend cares about.
#[derive(Debug, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

impl GatewayClient {
    pub fn new(
        conn: reqwest::Client,
        key_id: Option<String>,
        key_secret: Option<String>,
        base_url: String,
    ) -> Self {
        Self {
            conn,
            key_id,
            key_secret,
            base_url,
        }
    }

    /// The public key id handed to the checkout frontend.
    pub fn key_id(&self) -> Result<&str, HttpError> {
        self.key_id
            .as_deref()
            .ok_or_else(|| HttpError::server_error(ErrorMessage::GatewayNotConfigured.to_string()))
    }

    fn key_secret(&self) -> Result<&str, HttpError> {
        self.key_secret
            .as_deref()
            .ok_or_else(|| HttpError::server_error(ErrorMessage::GatewayNotConfigured.to_string()))
    }

    /// Create a gateway order for `amount` minor currency units.
    ///
    /// `notes` travels with the order for audit (course id/title, buyer
    /// email/name). Communication failures surface as a generic server
    /// error; the caller re-initiates the purchase, there is no retry here.
    pub async fn create_order(
        &self,
        amount: i64,
        currency: &str,
        receipt: &str,
        notes: serde_json::Value,
    ) -> Result<GatewayOrder, HttpError> {
        let key_id = self.key_id()?.to_string();
        let key_secret = self.key_secret()?.to_string();

        let body = CreateOrderRequest {
            amount,
            currency,
            receipt,
            notes,
        };

        let response = self
            .conn
            .post(format!("{}/v1/orders", self.base_url))
            .basic_auth(key_id, Some(key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Gateway order request failed: {}", e);
                HttpError::server_error("Failed to create payment order")
            })?;

        if !response.status().is_success() {
            tracing::error!("Gateway order rejected with status {}", response.status());
            return Err(HttpError::server_error("Failed to create payment order"));
        }

        response.json::<GatewayOrder>().await.map_err(|e| {
            tracing::error!("Gateway order response unreadable: {}", e);
            HttpError::server_error("Failed to create payment order")
        })
    }

    /// Check a callback signature against the configured secret.
    ///
    /// The expected value is HMAC-SHA256 over `"{order_id}|{payment_id}"`,
    /// transmitted hex-encoded. Comparison happens in constant time via the
    /// MAC's own verifier, so a forged signature learns nothing from timing.
    /// Returns `Ok(false)` for any mismatch, including undecodable hex.
    pub fn verify_signature(
        &self,
        order_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, HttpError> {
        let secret = self.key_secret()?;
        Ok(signature_matches(secret, order_id, payment_id, signature))
    }
}

/// Hex HMAC-SHA256 signature over the gateway's `order_id|payment_id` pair.
pub fn sign_payment(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

fn signature_matches(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(provided) = hex::decode(signature) else {
        return false;
    };

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    mac.verify_slice(&provided).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_with_creds() -> GatewayClient {
        GatewayClient::new(
            reqwest::Client::new(),
            Some("key_test".to_string()),
            Some("secret_test".to_string()),
            "http://127.0.0.1:0".to_string(),
        )
    }

    #[test]
    fn valid_signature_verifies() {
        let client = client_with_creds();
        let signature = sign_payment("secret_test", "order_1", "pay_1");
        assert!(client
            .verify_signature("order_1", "pay_1", &signature)
            .unwrap());
    }

    #[test]
    fn single_character_mutation_fails() {
        let client = client_with_creds();
        let mut signature = sign_payment("secret_test", "order_1", "pay_1");
        let flipped = if signature.ends_with('0') { '1' } else { '0' };
        signature.pop();
        signature.push(flipped);
        assert!(!client
            .verify_signature("order_1", "pay_1", &signature)
            .unwrap());
    }

    #[test]
    fn non_hex_signature_fails_cleanly() {
        let client = client_with_creds();
        assert!(!client
            .verify_signature("order_1", "pay_1", "not-hex-at-all")
            .unwrap());
    }

    #[test]
    fn signature_binds_both_ids() {
        let client = client_with_creds();
        let signature = sign_payment("secret_test", "order_1", "pay_1");
        assert!(!client
            .verify_signature("order_2", "pay_1", &signature)
            .unwrap());
        assert!(!client
            .verify_signature("order_1", "pay_2", &signature)
            .unwrap());
    }

    #[test]
    fn missing_credentials_surface_configuration_error() {
        let client = GatewayClient::new(
            reqwest::Client::new(),
            None,
            None,
            "http://127.0.0.1:0".to_string(),
        );
        assert!(client.verify_signature("o", "p", "sig").is_err());
        assert!(client.key_id().is_err());
    }
}
