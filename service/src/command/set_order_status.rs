//! [`Command`] for directly setting an [`Order`]'s [`order::Status`].

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

/// [`Command`] for setting an [`Order`] to an arbitrary [`order::Status`].
///
/// Unlike [`AdvanceOrderStatus`], no transition rules apply: staff may
/// cancel at any point or correct a mis-tapped status.
///
/// [`AdvanceOrderStatus`]: super::AdvanceOrderStatus
#[derive(Clone, Copy, Debug)]
pub struct SetOrderStatus {
    /// ID of the [`Order`] to update.
    pub id: order::Id,

    /// [`order::Status`] to set.
    pub status: order::Status,
}

impl<Db> Command<SetOrderStatus> for Service<Db>
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
        SetOrderStatus { id, status }: SetOrderStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let mut order = self
            .database()
            .execute(Select(By::<Option<Order>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrderNotExists(id))
            .map_err(tracerr::wrap!())?;

        order.set_status(status);
        self.database()
            .execute(Update(order.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.events().publish(events::Event::Updated(order.clone()));

        Ok(order)
    }
}

/// Error of [`SetOrderStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Order`] doesn't exist.
    #[display("`Order(id: {_0})` does not exist")]
    #[from(ignore)]
    OrderNotExists(#[error(not(source))] order::Id),
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

    use super::{Command as _, ExecutionError, SetOrderStatus};

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
    async fn sets_any_status_without_transition_rules() {
        let order = order_in(order::Status::Completed);
        let id = order.id;
        let svc =
            Service::new(Config::default(), MockDb(Mutex::new(Some(order))));

        // Even backwards or out of a terminal status.
        let updated = svc
            .execute(SetOrderStatus {
                id,
                status: order::Status::Preparing,
            })
            .await
            .unwrap();
        assert_eq!(updated.status, order::Status::Preparing);

        let updated = svc
            .execute(SetOrderStatus {
                id,
                status: order::Status::Cancelled,
            })
            .await
            .unwrap();
        assert_eq!(updated.status, order::Status::Cancelled);
    }

    #[tokio::test]
    async fn reports_missing_orders() {
        let svc = Service::new(Config::default(), MockDb(Mutex::new(None)));

        let err = svc
            .execute(SetOrderStatus {
                id: order::Id::new(),
                status: order::Status::Ready,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::OrderNotExists(_)));
    }
}
