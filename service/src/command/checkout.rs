//! [`Command`] for checking out a new [`Order`] through a hosted payment
//! session.

use common::operations::Update;
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Order;
use crate::{
    domain::order,
    infra::{database, payment, Database},
    read, Service,
};

use super::{create_order, Command, CreateOrder};

/// [`Command`] for creating a new [`Order`] and opening a hosted payment
/// session for it.
///
/// The [`Order`] is committed first, in the [`Status::Pending`] status,
/// and confirmed only by the provider's webhook. If opening the session
/// fails, the [`Order`] stays pending and unpaid.
///
/// [`Status::Pending`]: crate::domain::order::Status::Pending
#[derive(Clone, Debug, From)]
pub struct Checkout(pub CreateOrder);

/// Result of a [`Checkout`] [`Command`] execution.
#[derive(Clone, Debug)]
pub struct Session {
    /// Created [`Order`] with its [`Line`]s.
    ///
    /// [`Line`]: crate::domain::order::Line
    pub order: read::order::WithLines,

    /// URL the customer completes the payment on.
    pub payment_url: String,
}

impl<Db> Command<Checkout> for Service<Db>
where
    Self: Command<
        CreateOrder,
        Ok = read::order::WithLines,
        Err = Traced<create_order::ExecutionError>,
    >,
    Db: Database<
        Update<crate::domain::Order>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        Checkout(mut cmd): Checkout,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        // The payment webhook owns the `pending -> confirmed` edge.
        cmd.initial_status = order::Status::Pending;

        let config = self
            .config()
            .payment
            .clone()
            .ok_or(E::PaymentNotConfigured)
            .map_err(tracerr::wrap!())?;
        let gateway = payment::Gateway::new(config)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut order = self
            .execute(cmd)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let session = gateway
            .create_session(&order)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        order.order.payment_session_id = Some(session.id);
        self.database()
            .execute(Update(order.order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Session {
            order,
            payment_url: session.url,
        })
    }
}

/// Error of [`Checkout`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`CreateOrder`] [`Command`] failed.
    #[display("{_0}")]
    CreateOrder(create_order::ExecutionError),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// No payment provider is configured.
    #[display("No payment provider is configured")]
    PaymentNotConfigured,

    /// Payment provider error.
    #[display("Payment provider failed: {_0}")]
    Payment(payment::Error),
}

#[cfg(test)]
mod spec {
    use std::{sync::Mutex, time::Duration};

    use common::{
        operations::{Insert, Update},
        Money,
    };
    use tracerr::Traced;

    use crate::{
        command::{create_order::Item, CreateOrder},
        domain::{menu_item, order, Order},
        infra::{database, payment, Database},
        read, Config, Service,
    };

    use super::{Checkout, Command as _, ExecutionError};

    /// In-memory [`Database`] stub of the operations [`Checkout`] uses.
    #[derive(Debug, Default)]
    struct MockDb {
        inserted: Mutex<Vec<read::order::WithLines>>,
        updated: Mutex<Vec<Order>>,
    }

    impl Database<Insert<read::order::WithLines>> for MockDb {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Insert(order): Insert<read::order::WithLines>,
        ) -> Result<Self::Ok, Self::Err> {
            self.inserted.lock().unwrap().push(order);
            Ok(())
        }
    }

    impl Database<Update<Order>> for MockDb {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Update(order): Update<Order>,
        ) -> Result<Self::Ok, Self::Err> {
            self.updated.lock().unwrap().push(order);
            Ok(())
        }
    }

    fn cmd() -> Checkout {
        Checkout(CreateOrder {
            customer_name: order::CustomerName::new("Sato").unwrap(),
            customer_email: None,
            customer_phone: None,
            customer_messaging_id: None,
            pickup_time: None,
            notes: None,
            // Must be overridden by the command itself.
            initial_status: order::Status::Confirmed,
            total_amount: Money::new(480).unwrap(),
            items: vec![Item {
                menu_item_id: menu_item::Id::new(),
                menu_item_name: menu_item::Name::new("Latte").unwrap(),
                quantity: order::line::Quantity::ONE,
                unit_price: Money::new(480).unwrap(),
                temperature: None,
                options: vec![],
            }],
        })
    }

    #[tokio::test]
    async fn requires_a_configured_payment_provider() {
        let service = Service::new(Config::default(), MockDb::default());

        let err = service.execute(cmd()).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::PaymentNotConfigured));
        assert!(
            service.database().inserted.lock().unwrap().is_empty(),
            "no order may be committed without a payment provider",
        );
    }

    #[tokio::test]
    async fn leaves_the_order_pending_when_the_provider_is_unreachable() {
        let config = Config {
            payment: Some(payment::Config {
                secret_key: "sk_test".to_owned().into(),
                webhook_secret: "whsec_test".to_owned().into(),
                // Nothing listens on the discard port.
                api_url: "http://127.0.0.1:9".to_owned(),
                app_url: "http://127.0.0.1:3000".to_owned(),
                timeout: Duration::from_secs(1),
            }),
            ..Config::default()
        };
        let service = Service::new(config, MockDb::default());

        let err = service.execute(cmd()).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Payment(payment::Error::Http(_)),
        ));
        let inserted = service.database().inserted.lock().unwrap();
        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].order.status, order::Status::Pending);
        assert!(
            service.database().updated.lock().unwrap().is_empty(),
            "no session id may be stored for a session that never opened",
        );
    }
}
