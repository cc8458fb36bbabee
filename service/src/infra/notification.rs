//! Customer notification delivery.
//!
//! Both channels are best effort: a failed delivery is reported to the
//! caller, which logs it and moves on without failing the operation that
//! triggered it.

use std::time::Duration;

use derive_more::{Display, Error as StdError, From};
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::json;
use tracerr::Traced;

use crate::read;
#[cfg(doc)]
use crate::domain::Order;

/// Configuration of the email channel of a [`Sink`].
#[derive(Clone, Debug)]
pub struct EmailConfig {
    /// Secret API key, sent as a `Bearer` token.
    pub api_key: SecretString,

    /// Base URL of the email provider's HTTP API.
    pub api_url: String,

    /// Sender address of outgoing emails.
    pub from: String,

    /// Timeout of provider HTTP requests.
    pub timeout: Duration,
}

/// Configuration of the messaging channel of a [`Sink`].
#[derive(Clone, Debug)]
pub struct MessagingConfig {
    /// Secret channel access token, sent as a `Bearer` token.
    pub access_token: SecretString,

    /// Base URL of the messaging provider's HTTP API.
    pub api_url: String,

    /// Timeout of provider HTTP requests.
    pub timeout: Duration,
}

/// Notification delivery client for a single channel.
#[derive(Clone, Debug)]
pub struct Sink {
    /// HTTP client to perform requests with.
    client: reqwest::Client,

    /// Channel this [`Sink`] delivers to.
    channel: Channel,
}

/// Delivery channel of a [`Sink`].
#[derive(Clone, Debug)]
enum Channel {
    /// Transactional email.
    Email(EmailConfig),

    /// Push message in a messaging app.
    Messaging(MessagingConfig),
}

impl Sink {
    /// Creates a new email [`Sink`] out of the provided [`EmailConfig`].
    ///
    /// # Errors
    ///
    /// If the underlying HTTP client cannot be constructed.
    pub fn email(config: EmailConfig) -> Result<Self, Traced<Error>> {
        Self::new(config.timeout, Channel::Email(config))
    }

    /// Creates a new messaging [`Sink`] out of the provided
    /// [`MessagingConfig`].
    ///
    /// # Errors
    ///
    /// If the underlying HTTP client cannot be constructed.
    pub fn messaging(
        config: MessagingConfig,
    ) -> Result<Self, Traced<Error>> {
        Self::new(config.timeout, Channel::Messaging(config))
    }

    fn new(
        timeout: Duration,
        channel: Channel,
    ) -> Result<Self, Traced<Error>> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(tracerr::from_and_wrap!(=> Error))?;
        Ok(Self { client, channel })
    }

    /// Delivers an [`Order`] confirmation for the provided [`Order`] with
    /// its [`Line`]s.
    ///
    /// Skips silently when the [`Order`] carries no recipient for this
    /// [`Sink`]'s channel.
    ///
    /// [`Line`]: crate::domain::order::Line
    ///
    /// # Errors
    ///
    /// If the provider rejects the delivery.
    pub async fn deliver_confirmation(
        &self,
        order: &read::order::WithLines,
    ) -> Result<(), Traced<Error>> {
        let text = confirmation_text(order);
        match &self.channel {
            Channel::Email(config) => {
                let Some(email) = &order.order.customer_email else {
                    return Ok(());
                };
                let body = json!({
                    "from": config.from,
                    "to": [email],
                    "subject": format!(
                        "Order {} confirmed",
                        order.order.number,
                    ),
                    "text": text,
                });
                self.post(
                    format!("{}/emails", config.api_url),
                    config.api_key.expose_secret(),
                    &body,
                )
                .await
            }
            Channel::Messaging(config) => {
                let Some(to) = &order.order.customer_messaging_id else {
                    return Ok(());
                };
                let body = json!({
                    "to": to,
                    "messages": [{"type": "text", "text": text}],
                });
                self.post(
                    format!("{}/v2/bot/message/push", config.api_url),
                    config.access_token.expose_secret(),
                    &body,
                )
                .await
            }
        }
    }

    async fn post(
        &self,
        url: String,
        token: &str,
        body: &serde_json::Value,
    ) -> Result<(), Traced<Error>> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(tracerr::from_and_wrap!(=> Error))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(tracerr::new!(Error::BadStatus { status, body }));
        }
        Ok(())
    }
}

/// Renders the confirmation text of the provided [`Order`] with its
/// [`Line`]s.
///
/// [`Line`]: crate::domain::order::Line
#[must_use]
pub fn confirmation_text(order: &read::order::WithLines) -> String {
    use std::fmt::Write as _;

    let mut text = format!(
        "Thank you for your order, {}!\n\nOrder {}\n",
        order.order.customer_name, order.order.number,
    );
    for line in &order.lines {
        _ = write!(text, "\n{}", line.menu_item_name);
        if let Some(temp) = line.temperature {
            _ = write!(text, " ({temp})");
        }
        _ = writeln!(
            text,
            " x{} {}",
            line.quantity,
            line.unit_price * line.quantity.as_u32(),
        );
    }
    _ = write!(text, "\nTotal: {}", order.order.total_amount);
    if let Some(pickup) = &order.order.pickup_time {
        _ = write!(text, "\nPickup: {}", pickup.to_rfc3339());
    }
    text
}

/// Error of delivering a notification.
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
}

#[cfg(test)]
mod confirmation_text_spec {
    use common::Money;

    use crate::{
        domain::{
            order::{self, line, Line},
            Order,
        },
        read,
    };

    fn order() -> read::order::WithLines {
        let order_id = order::Id::new();
        let order = Order {
            id: order_id,
            number: order::Number::new("1042-567").unwrap(),
            customer_name: order::CustomerName::new("Sato").unwrap(),
            customer_email: None,
            customer_phone: None,
            customer_messaging_id: None,
            status: order::Status::Confirmed,
            total_amount: Money::new(960).unwrap(),
            notes: None,
            pickup_time: None,
            payment_session_id: None,
            created_at: common::DateTime::now().coerce(),
            updated_at: common::DateTime::now().coerce(),
        };
        let lines = vec![Line {
            id: line::Id::new(),
            order_id,
            menu_item_id: crate::domain::menu_item::Id::new(),
            menu_item_name: crate::domain::menu_item::Name::new("Latte")
                .unwrap(),
            quantity: line::Quantity::new(2).unwrap(),
            unit_price: Money::new(480).unwrap(),
            temperature: Some(line::Temperature::Hot),
            options: vec![],
            created_at: common::DateTime::now().coerce(),
        }];
        read::order::WithLines { order, lines }
    }

    #[test]
    fn includes_number_lines_and_total() {
        let text = super::confirmation_text(&order());

        assert!(text.contains("Order 1042-567"));
        assert!(text.contains("Latte (hot) x2 ¥960"));
        assert!(text.contains("Total: ¥960"));
    }
}
