//! [`Command`] for reconciling a payment provider webhook with an
//! [`Order`].

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{order, Order},
    events,
    infra::{database, notification, payment, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for verifying a payment provider webhook delivery and
/// confirming the [`Order`] it refers to.
///
/// Confirmation is idempotent: a duplicate delivery re-confirms the
/// [`Order`] and re-sends the notifications, which is acceptable for this
/// domain. Events of other types are ignored.
#[derive(Clone, Debug)]
pub struct ConfirmPayment {
    /// Raw webhook payload, exactly as received.
    pub payload: Vec<u8>,

    /// Value of the webhook signature header.
    pub signature: String,
}

/// Result of a [`ConfirmPayment`] [`Command`] execution.
#[derive(Clone, Debug)]
pub enum Outcome {
    /// The [`Order`] was confirmed.
    Confirmed(read::order::WithLines),

    /// The webhook was valid, but of a type this system doesn't act upon.
    Ignored,
}

impl<Db> Command<ConfirmPayment> for Service<Db>
where
    Db: Database<
            Select<By<Option<read::order::WithLines>, order::Id>>,
            Ok = Option<read::order::WithLines>,
            Err = Traced<database::Error>,
        > + Database<Update<Order>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Outcome;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: ConfirmPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ConfirmPayment { payload, signature } = cmd;

        let config = self
            .config()
            .payment
            .clone()
            .ok_or(E::PaymentNotConfigured)
            .map_err(tracerr::wrap!())?;
        let gateway = payment::Gateway::new(config)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let event = gateway
            .verify_webhook(&payload, &signature)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if event.kind != payment::CHECKOUT_COMPLETED {
            return Ok(Outcome::Ignored);
        }
        let session = event.data.object;
        let order_id = session
            .metadata
            .order_id
            .ok_or(E::NoOrderReference)
            .map_err(tracerr::wrap!())?;

        let mut order = self
            .database()
            .execute(Select(By::<Option<read::order::WithLines>, _>::new(
                order_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(order_id))
            .map_err(tracerr::wrap!())?;

        order.order.set_status(order::Status::Confirmed);
        if order.order.payment_session_id.is_none() {
            order.order.payment_session_id = Some(session.id);
        }
        self.database()
            .execute(Update(order.order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.events()
            .publish(events::Event::Updated(order.order.clone()));

        self.notify(&order).await;

        Ok(Outcome::Confirmed(order))
    }
}

impl<Db> Service<Db> {
    /// Delivers the confirmation notifications for the provided [`Order`],
    /// logging failures instead of propagating them.
    ///
    /// A paid [`Order`] must never be failed by a notification channel.
    async fn notify(&self, order: &read::order::WithLines) {
        let sinks = [
            self.config()
                .email
                .clone()
                .map(notification::Sink::email),
            self.config()
                .messaging
                .clone()
                .map(notification::Sink::messaging),
        ];
        for sink in sinks.into_iter().flatten() {
            let delivery = match sink {
                Ok(sink) => sink.deliver_confirmation(order).await,
                Err(e) => Err(e),
            };
            if let Err(e) = delivery {
                tracing::warn!(
                    order_id = %order.order.id,
                    "failed to deliver confirmation: {e}",
                );
            }
        }
    }
}

/// Error of [`ConfirmPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// No payment provider is configured.
    #[display("No payment provider is configured")]
    PaymentNotConfigured,

    /// Webhook verification or parsing failed.
    #[display("Webhook rejected: {_0}")]
    Payment(payment::Error),

    /// Webhook carries no [`Order`] reference in its metadata.
    #[display("Webhook carries no order reference")]
    NoOrderReference,

    /// Referred [`Order`] doesn't exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),
}

#[cfg(test)]
mod spec {
    use std::{sync::Mutex, time::Duration};

    use common::{
        operations::{By, Select, Update},
        DateTime, Money,
    };
    use tracerr::Traced;

    use crate::{
        domain::{order, Order},
        infra::{database, payment, Database},
        read, Config, Service,
    };

    use super::{Command as _, ConfirmPayment, ExecutionError, Outcome};

    /// In-memory [`Database`] stub of the operations [`ConfirmPayment`]
    /// uses.
    #[derive(Debug)]
    struct MockDb {
        order: Mutex<Option<Order>>,
    }

    impl Database<Select<By<Option<read::order::WithLines>, order::Id>>>
        for MockDb
    {
        type Ok = Option<read::order::WithLines>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Select(by): Select<
                By<Option<read::order::WithLines>, order::Id>,
            >,
        ) -> Result<Self::Ok, Self::Err> {
            let id = by.into_inner();
            Ok(self
                .order
                .lock()
                .unwrap()
                .clone()
                .filter(|o| o.id == id)
                .map(|order| read::order::WithLines {
                    order,
                    lines: vec![],
                }))
        }
    }

    impl Database<Update<Order>> for MockDb {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Update(order): Update<Order>,
        ) -> Result<Self::Ok, Self::Err> {
            *self.order.lock().unwrap() = Some(order);
            Ok(())
        }
    }

    fn payment_config() -> payment::Config {
        payment::Config {
            secret_key: "sk_test".into(),
            webhook_secret: "whsec_test".into(),
            api_url: "https://api.example.com".into(),
            app_url: "https://cafe.example.com".into(),
            timeout: Duration::from_secs(10),
        }
    }

    fn pending_order() -> Order {
        Order {
            id: order::Id::new(),
            number: order::Number::generate(),
            customer_name: order::CustomerName::new("Sato").unwrap(),
            customer_email: None,
            customer_phone: None,
            customer_messaging_id: None,
            status: order::Status::Pending,
            total_amount: Money::new(480).unwrap(),
            notes: None,
            pickup_time: None,
            payment_session_id: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    fn signed(config: &payment::Config, payload: &[u8]) -> String {
        let gateway = payment::Gateway::new(config.clone()).unwrap();
        gateway.signed_webhook_header(payload)
    }

    fn completed_payload(id: order::Id) -> Vec<u8> {
        format!(
            r#"{{
                "type": "checkout.session.completed",
                "data": {{
                    "object": {{
                        "id": "cs_test_1",
                        "metadata": {{"order_id": "{id}"}}
                    }}
                }}
            }}"#,
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn confirms_the_referred_order() {
        let order = pending_order();
        let id = order.id;
        let config = payment_config();
        let svc = Service::new(
            Config {
                payment: Some(config.clone()),
                ..Config::default()
            },
            MockDb {
                order: Mutex::new(Some(order)),
            },
        );
        let payload = completed_payload(id);

        let outcome = svc
            .execute(ConfirmPayment {
                signature: signed(&config, &payload),
                payload,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Confirmed(_)));
        let stored = svc.database().order.lock().unwrap().clone().unwrap();
        assert_eq!(stored.status, order::Status::Confirmed);
        assert_eq!(
            stored.payment_session_id.unwrap().to_string(),
            "cs_test_1",
        );
    }

    #[tokio::test]
    async fn duplicate_delivery_reconfirms_idempotently() {
        let order = pending_order();
        let id = order.id;
        let config = payment_config();
        let svc = Service::new(
            Config {
                payment: Some(config.clone()),
                ..Config::default()
            },
            MockDb {
                order: Mutex::new(Some(order)),
            },
        );
        let payload = completed_payload(id);

        for _ in 0..2 {
            let outcome = svc
                .execute(ConfirmPayment {
                    signature: signed(&config, &payload),
                    payload: payload.clone(),
                })
                .await
                .unwrap();
            assert!(matches!(outcome, Outcome::Confirmed(_)));
        }

        let stored = svc.database().order.lock().unwrap().clone().unwrap();
        assert_eq!(stored.status, order::Status::Confirmed);
    }

    #[tokio::test]
    async fn ignores_unrelated_event_types() {
        let config = payment_config();
        let svc = Service::new(
            Config {
                payment: Some(config.clone()),
                ..Config::default()
            },
            MockDb {
                order: Mutex::new(None),
            },
        );
        let payload =
            br#"{"type": "invoice.paid", "data": {"object": {"id": "in_1"}}}"#
                .to_vec();

        let outcome = svc
            .execute(ConfirmPayment {
                signature: signed(&config, &payload),
                payload,
            })
            .await
            .unwrap();

        assert!(matches!(outcome, Outcome::Ignored));
    }

    #[tokio::test]
    async fn rejects_bad_signatures() {
        let config = payment_config();
        let svc = Service::new(
            Config {
                payment: Some(config),
                ..Config::default()
            },
            MockDb {
                order: Mutex::new(None),
            },
        );

        let err = svc
            .execute(ConfirmPayment {
                payload: b"{}".to_vec(),
                signature: "t=1,v1=deadbeef".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Payment(_)));
    }
}
