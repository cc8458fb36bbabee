//! [`Command`] for advancing an [`Order`] along its preparation chain.

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{order, Order},
    events,
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for advancing an [`Order`] to the next [`order::Status`] of
/// the preparation chain.
///
/// Only the forward chain is walkable this way: confirmed, preparing,
/// ready, completed. Pending and terminal [`Order`]s cannot be advanced.
#[derive(Clone, Copy, Debug, From)]
pub struct AdvanceOrderStatus {
    /// ID of the [`Order`] to advance.
    pub id: order::Id,
}

impl<Db> Command<AdvanceOrderStatus> for Service<Db>
where
    Db: Database<
            Select<By<Option<Order>, order::Id>>,
            Ok = Option<Order>,
            Err = Traced<database::Error>,
        > + Database<Update<Order>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Order;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        AdvanceOrderStatus { id }: AdvanceOrderStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let mut order = self
            .database()
            .execute(Select(By::<Option<Order>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(id))
            .map_err(tracerr::wrap!())?;

        _ = order
            .advance_status()
            .map_err(|e| tracerr::new!(E::InvalidTransition(e)))?;

        self.database()
            .execute(Update(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.events().publish(events::Event::Updated(order.clone()));

        Ok(order)
    }
}

/// Error of [`AdvanceOrderStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Order`] doesn't exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),

    /// [`Order`] cannot be advanced from its current [`order::Status`].
    #[display("{_0}")]
    InvalidTransition(order::InvalidTransition),
}

#[cfg(test)]
mod spec {
    use std::sync::Mutex;

    use common::{
        operations::{By, Select, Update},
        DateTime, Money,
    };
    use tracerr::Traced;

    use crate::{
        domain::{order, Order},
        infra::{database, Database},
        Config, Service,
    };

    use super::{AdvanceOrderStatus, Command as _, ExecutionError};

    #[derive(Debug)]
    struct MockDb(Mutex<Option<Order>>);

    impl Database<Select<By<Option<Order>, order::Id>>> for MockDb {
        type Ok = Option<Order>;
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Select(by): Select<By<Option<Order>, order::Id>>,
        ) -> Result<Self::Ok, Self::Err> {
            let id = by.into_inner();
            Ok(self.0.lock().unwrap().clone().filter(|o| o.id == id))
        }
    }

    impl Database<Update<Order>> for MockDb {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Update(order): Update<Order>,
        ) -> Result<Self::Ok, Self::Err> {
            *self.0.lock().unwrap() = Some(order);
            Ok(())
        }
    }

    fn order_in(status: order::Status) -> Order {
        Order {
            id: order::Id::new(),
            number: order::Number::generate(),
            customer_name: order::CustomerName::new("Sato").unwrap(),
            customer_email: None,
            customer_phone: None,
            customer_messaging_id: None,
            status,
            total_amount: Money::new(480).unwrap(),
            notes: None,
            pickup_time: None,
            payment_session_id: None,
            created_at: DateTime::now().coerce(),
            updated_at: DateTime::now().coerce(),
        }
    }

    #[tokio::test]
    async fn walks_the_whole_preparation_chain() {
        let order = order_in(order::Status::Confirmed);
        let id = order.id;
        let svc =
            Service::new(Config::default(), MockDb(Mutex::new(Some(order))));

        for expected in [
            order::Status::Preparing,
            order::Status::Ready,
            order::Status::Completed,
        ] {
            let advanced =
                svc.execute(AdvanceOrderStatus { id }).await.unwrap();
            assert_eq!(advanced.status, expected);
        }

        let err = svc.execute(AdvanceOrderStatus { id }).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition(_),
        ));
    }

    #[tokio::test]
    async fn refuses_pending_orders() {
        let order = order_in(order::Status::Pending);
        let id = order.id;
        let svc =
            Service::new(Config::default(), MockDb(Mutex::new(Some(order))));

        let err = svc.execute(AdvanceOrderStatus { id }).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition(_),
        ));
    }

    #[tokio::test]
    async fn reports_missing_orders() {
        let svc = Service::new(Config::default(), MockDb(Mutex::new(None)));

        let err = svc
            .execute(AdvanceOrderStatus {
                id: order::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::OrderNotExists(_)));
    }
}
