//! Hosted payment provider integration.
//!
//! Speaks the provider's checkout sessions HTTP API and verifies its
//! webhook signatures.

use std::time::Duration;

use derive_more::{Display, Error as StdError, From};
use ring::hmac;
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use tracerr::Traced;

use crate::{domain::order, read};
#[cfg(doc)]
use crate::domain::Order;

/// [`Event`] type of a checkout [`Session`] completing successfully.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Maximum accepted age of a webhook [`Signature`] timestamp.
///
/// Anything older is treated as a possible replay.
const SIGNATURE_TOLERANCE: Duration = Duration::from_secs(5 * 60);

/// Configuration of a payment [`Gateway`].
#[derive(Clone, Debug)]
pub struct Config {
    /// Secret API key, sent as a `Bearer` token.
    pub secret_key: SecretString,

    /// Secret used to verify webhook [`Signature`]s.
    pub webhook_secret: SecretString,

    /// Base URL of the provider's HTTP API.
    pub api_url: String,

    /// Public base URL of this application, used to build the URLs the
    /// customer is redirected to after checkout.
    pub app_url: String,

    /// Timeout of provider HTTP requests.
    pub timeout: Duration,
}

/// Client of a hosted payment provider.
#[derive(Clone, Debug)]
pub struct Gateway {
    /// HTTP client to perform requests with.
    client: reqwest::Client,

    /// [`Config`] of this [`Gateway`].
    config: Config,
}

impl Gateway {
    /// Creates a new [`Gateway`] out of the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If the underlying HTTP client cannot be constructed.
    pub fn new(config: Config) -> Result<Self, Traced<Error>> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self { client, config })
    }

    /// Creates a new hosted checkout [`Session`] for the provided [`Order`]
    /// with its [`Line`]s.
    ///
    /// The customer pays on the returned [`Session::url`], and the
    /// [`Order`]'s [`order::Id`] travels back in the webhook [`Event`]
    /// metadata.
    ///
    /// [`Line`]: order::Line
    ///
    /// # Errors
    ///
    /// If the provider rejects the request or responds malformed.
    pub async fn create_session(
        &self,
        order: &read::order::WithLines,
    ) -> Result<Session, Traced<Error>> {
        let app_url = &self.config.app_url;

        let mut form = vec![
            ("mode".to_owned(), "payment".to_owned()),
            (
                "success_url".to_owned(),
                format!("{app_url}/orders/{}?success=true", order.order.id),
            ),
            (
                "cancel_url".to_owned(),
                format!("{app_url}/cart?cancelled=true"),
            ),
            (
                "metadata[order_id]".to_owned(),
                order.order.id.to_string(),
            ),
            (
                "metadata[order_number]".to_owned(),
                order.order.number.to_string(),
            ),
        ];
        for (n, line) in order.lines.iter().enumerate() {
            let mut name = line.menu_item_name.to_string();
            if let Some(temp) = line.temperature {
                name = format!("{name} ({temp})");
            }
            form.extend([
                (
                    format!("line_items[{n}][price_data][currency]"),
                    "jpy".to_owned(),
                ),
                (
                    format!("line_items[{n}][price_data][product_data][name]"),
                    name,
                ),
                (
                    format!("line_items[{n}][price_data][unit_amount]"),
                    line.unit_price.as_i64().to_string(),
                ),
                (
                    format!("line_items[{n}][quantity]"),
                    line.quantity.to_string(),
                ),
            ]);
        }

        let resp = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.config.api_url))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&form)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(tracerr::new!(Error::BadStatus { status, body }));
        }
        resp.json().await.map_err(tracerr::from_and_wrap!(=> Error))
    }

    /// Verifies the provided webhook `payload` against its [`Signature`]
    /// header, returning the parsed [`Event`] on success.
    ///
    /// # Errors
    ///
    /// If the header is malformed, the timestamp is outside the accepted
    /// tolerance, the signature doesn't match, or the `payload` isn't a
    /// valid [`Event`].
    pub fn verify_webhook(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<Event, Traced<Error>> {
        let sig = Signature::parse(signature_header)
            .ok_or_else(|| tracerr::new!(Error::MalformedSignature))?;

        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        if now.abs_diff(sig.timestamp)
            > SIGNATURE_TOLERANCE.as_secs()
        {
            return Err(tracerr::new!(Error::StaleSignature));
        }

        let expected = self.expected_signature(sig.timestamp, payload);
        ring::constant_time::verify_slices_are_equal(
            expected.as_bytes(),
            sig.v1.as_bytes(),
        )
        .map_err(|_: ring::error::Unspecified| {
            tracerr::new!(Error::SignatureMismatch)
        })?;

        serde_json::from_slice(payload).map_err(tracerr::from_and_wrap!(=> Error))
    }

    /// Computes the expected hex-encoded HMAC-SHA256 signature of the
    /// provided `payload` at the provided `timestamp`.
    fn expected_signature(&self, timestamp: i64, payload: &[u8]) -> String {
        let key = hmac::Key::new(
            hmac::HMAC_SHA256,
            self.config.webhook_secret.expose_secret().as_bytes(),
        );
        let mut signed = format!("{timestamp}.").into_bytes();
        signed.extend_from_slice(payload);

        hmac::sign(&key, &signed)
            .as_ref()
            .iter()
            .fold(String::new(), |mut hex, b| {
                use std::fmt::Write as _;

                _ = write!(hex, "{b:02x}");
                hex
            })
    }
}

#[cfg(test)]
impl Gateway {
    /// Produces a webhook signature header this [`Gateway`] would accept
    /// for the provided `payload` right now.
    pub(crate) fn signed_webhook_header(&self, payload: &[u8]) -> String {
        let now = time::OffsetDateTime::now_utc().unix_timestamp();
        format!("t={now},v1={}", self.expected_signature(now, payload))
    }
}

/// Hosted checkout session created by a [`Gateway`].
#[derive(Clone, Debug, Deserialize)]
pub struct Session {
    /// ID of this [`Session`] on the provider's side.
    pub id: order::PaymentSessionId,

    /// URL the customer completes the payment on.
    pub url: String,
}

/// Webhook event emitted by the payment provider.
#[derive(Clone, Debug, Deserialize)]
pub struct Event {
    /// Type of this [`Event`] (e.g. [`CHECKOUT_COMPLETED`]).
    #[serde(rename = "type")]
    pub kind: String,

    /// Payload of this [`Event`].
    pub data: EventData,
}

/// Payload of an [`Event`].
#[derive(Clone, Debug, Deserialize)]
pub struct EventData {
    /// [`Session`] this [`Event`] is about.
    pub object: EventSession,
}

/// [`Session`] representation inside an [`Event`].
#[derive(Clone, Debug, Deserialize)]
pub struct EventSession {
    /// ID of the [`Session`].
    pub id: order::PaymentSessionId,

    /// Metadata attached to the [`Session`] at creation.
    #[serde(default)]
    pub metadata: EventMetadata,
}

/// Metadata attached to a checkout [`Session`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EventMetadata {
    /// [`order::Id`] of the [`Order`] the [`Session`] was created for.
    pub order_id: Option<order::Id>,
}

/// Parsed webhook signature header of the `t=<unix>,v1=<hex>` form.
#[derive(Clone, Copy, Debug)]
struct Signature<'a> {
    /// Unix timestamp the signature was produced at.
    timestamp: i64,

    /// Hex-encoded HMAC-SHA256 of `"{timestamp}.{payload}"`.
    v1: &'a str,
}

impl<'a> Signature<'a> {
    /// Parses a [`Signature`] out of the provided header value.
    fn parse(header: &'a str) -> Option<Self> {
        let mut timestamp = None;
        let mut v1 = None;
        for part in header.split(',') {
            match part.trim().split_once('=')? {
                ("t", t) => timestamp = t.parse().ok(),
                ("v1", sig) => v1 = Some(sig),
                _ => {}
            }
        }
        Some(Self {
            timestamp: timestamp?,
            v1: v1?,
        })
    }
}

/// Error of interacting with the payment provider.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// HTTP request failed.
    #[display("HTTP request failed: {_0}")]
    Http(reqwest::Error),

    /// Provider responded with a non-success status.
    #[display("Provider responded with `{status}` status: {body}")]
    #[from(ignore)]
    BadStatus {
        /// Status code of the response.
        status: reqwest::StatusCode,

        /// Body of the response.
        #[error(not(source))]
        body: String,
    },

    /// Webhook signature header is malformed.
    #[display("Malformed webhook signature header")]
    MalformedSignature,

    /// Webhook signature timestamp is outside the accepted tolerance.
    #[display("Webhook signature timestamp is outside the tolerance")]
    StaleSignature,

    /// Webhook signature doesn't match the payload.
    #[display("Webhook signature doesn't match the payload")]
    SignatureMismatch,

    /// Webhook payload isn't a valid [`Event`].
    #[display("Malformed webhook payload: {_0}")]
    MalformedPayload(serde_json::Error),
}

#[cfg(test)]
mod signature_spec {
    use super::Signature;

    #[test]
    fn parses_well_formed_header() {
        let sig = Signature::parse("t=1700000000,v1=deadbeef").unwrap();

        assert_eq!(sig.timestamp, 1700000000);
        assert_eq!(sig.v1, "deadbeef");
    }

    #[test]
    fn tolerates_spaces_and_extra_schemes() {
        let sig =
            Signature::parse("t=1700000000, v0=ignored, v1=deadbeef").unwrap();

        assert_eq!(sig.timestamp, 1700000000);
        assert_eq!(sig.v1, "deadbeef");
    }

    #[test]
    fn requires_both_parts() {
        assert!(Signature::parse("t=1700000000").is_none());
        assert!(Signature::parse("v1=deadbeef").is_none());
        assert!(Signature::parse("garbage").is_none());
    }
}

#[cfg(test)]
mod verify_webhook_spec {
    use std::time::Duration;

    use super::{Config, Error, Gateway};

    fn gateway() -> Gateway {
        Gateway::new(Config {
            secret_key: "sk_test".into(),
            webhook_secret: "whsec_test".into(),
            api_url: "https://api.example.com".into(),
            app_url: "https://cafe.example.com".into(),
            timeout: Duration::from_secs(10),
        })
        .unwrap()
    }

    #[test]
    fn accepts_correctly_signed_event() {
        let gw = gateway();
        let payload = br#"{
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_123",
                    "metadata": {
                        "order_id": "7e57ed00-0000-4000-8000-000000000001"
                    }
                }
            }
        }"#;

        let event = gw
            .verify_webhook(payload, &gw.signed_webhook_header(payload))
            .unwrap();

        assert_eq!(event.kind, super::CHECKOUT_COMPLETED);
        assert_eq!(event.data.object.id.to_string(), "cs_test_123");
        assert_eq!(
            event.data.object.metadata.order_id.unwrap().to_string(),
            "7e57ed00-0000-4000-8000-000000000001",
        );
    }

    #[test]
    fn rejects_tampered_payload() {
        let gw = gateway();
        let header = gw.signed_webhook_header(b"{\"type\":\"original\"}");

        let err = gw
            .verify_webhook(b"{\"type\":\"tampered\"}", &header)
            .unwrap_err();

        assert!(matches!(err.as_ref(), Error::SignatureMismatch));
    }

    #[test]
    fn rejects_stale_timestamp() {
        let gw = gateway();
        let payload = b"{}";
        let stale = time::OffsetDateTime::now_utc().unix_timestamp() - 3600;
        let header =
            format!("t={stale},v1={}", gw.expected_signature(stale, payload));

        let err = gw.verify_webhook(payload, &header).unwrap_err();

        assert!(matches!(err.as_ref(), Error::StaleSignature));
    }

    #[test]
    fn rejects_wrong_secret() {
        let gw = gateway();
        let other = Gateway::new(Config {
            webhook_secret: "whsec_other".into(),
            ..gw.config.clone()
        })
        .unwrap();
        let payload = b"{}";

        let err = gw
            .verify_webhook(payload, &other.signed_webhook_header(payload))
            .unwrap_err();

        assert!(matches!(err.as_ref(), Error::SignatureMismatch));
    }
}
