//! [`Command`] for creating a new [`Order`].

use common::{operations::Insert, DateTime, Money};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        menu_item,
        order::{self, line, line::Temperature, Line},
        Order,
    },
    events,
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for creating a new [`Order`] out of submitted cart lines.
///
/// Names, unit prices and the total are taken as given by the caller, the
/// way the cart captured them: the catalog is not consulted, so a price
/// change (or even a removal) between browsing and submitting never fails
/// the submission.
#[derive(Clone, Debug)]
pub struct CreateOrder {
    /// Name of the ordering customer.
    pub customer_name: order::CustomerName,

    /// Email address of the ordering customer, if provided.
    pub customer_email: Option<order::CustomerEmail>,

    /// Phone number of the ordering customer, if provided.
    pub customer_phone: Option<order::CustomerPhone>,

    /// Messaging platform identifier of the ordering customer, if provided.
    pub customer_messaging_id: Option<order::MessagingId>,

    /// Desired pickup time, if chosen.
    pub pickup_time: Option<order::PickupDateTime>,

    /// Freeform notes, if provided.
    pub notes: Option<order::Notes>,

    /// Initial [`order::Status`] of the [`Order`].
    ///
    /// [`order::Status::Confirmed`] for the pay-at-counter flow, or
    /// [`order::Status::Pending`] when the payment is collected through a
    /// hosted session afterwards.
    pub initial_status: order::Status,

    /// Total amount of the [`Order`], as computed by the cart.
    pub total_amount: Money,

    /// Ordered [`Item`]s.
    pub items: Vec<Item>,
}

/// Single ordered position of a [`CreateOrder`] [`Command`].
#[derive(Clone, Debug)]
pub struct Item {
    /// ID of the ordered [`MenuItem`].
    ///
    /// [`MenuItem`]: crate::domain::MenuItem
    pub menu_item_id: menu_item::Id,

    /// Name of the ordered [`MenuItem`], as the cart captured it.
    ///
    /// [`MenuItem`]: crate::domain::MenuItem
    pub menu_item_name: menu_item::Name,

    /// Ordered quantity.
    pub quantity: line::Quantity,

    /// Price of one unit, as the cart captured it.
    pub unit_price: Money,

    /// Chosen [`Temperature`], if any.
    pub temperature: Option<Temperature>,

    /// Chosen free-form options.
    pub options: Vec<line::SelectedOption>,
}

impl<Db> Command<CreateOrder> for Service<Db>
where
    Db: Database<
        Insert<read::order::WithLines>,
        Ok = (),
        Err = Traced<database::Error>,
    >,
{
    type Ok = read::order::WithLines;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateOrder {
            customer_name,
            customer_email,
            customer_phone,
            customer_messaging_id,
            pickup_time,
            notes,
            initial_status,
            total_amount,
            items,
        } = cmd;

        if items.is_empty() {
            return Err(tracerr::new!(E::NoItems));
        }

        let order_id = order::Id::new();
        let now = DateTime::now();

        let lines = items
            .into_iter()
            .map(|item| {
                let Item {
                    menu_item_id,
                    menu_item_name,
                    quantity,
                    unit_price,
                    temperature,
                    options,
                } = item;

                Line {
                    id: line::Id::new(),
                    order_id,
                    menu_item_id,
                    menu_item_name,
                    quantity,
                    unit_price,
                    temperature,
                    options,
                    created_at: now.coerce(),
                }
            })
            .collect();

        let order = Order {
            id: order_id,
            number: order::Number::generate(),
            customer_name,
            customer_email,
            customer_phone,
            customer_messaging_id,
            status: initial_status,
            total_amount,
            notes,
            pickup_time,
            payment_session_id: None,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        let with_lines = read::order::WithLines { order, lines };

        self.database()
            .execute(Insert(with_lines.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        self.events().publish(events::Event::Created(with_lines.clone()));

        Ok(with_lines)
    }
}

/// Error of [`CreateOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// No [`Item`]s were provided.
    #[display("An `Order` must contain at least one item")]
    NoItems,
}

#[cfg(test)]
mod spec {
    use std::sync::Mutex;

    use common::{operations::Insert, Money};
    use tracerr::Traced;

    use crate::{
        domain::{menu_item, order},
        infra::{database, Database},
        read, Config, Service,
    };

    use super::{Command as _, CreateOrder, ExecutionError, Item};

    /// In-memory [`Database`] stub of the operations [`CreateOrder`] uses.
    #[derive(Debug, Default)]
    struct MockDb {
        fail_insert: bool,
        inserted: Mutex<Vec<read::order::WithLines>>,
    }

    impl Database<Insert<read::order::WithLines>> for MockDb {
        type Ok = ();
        type Err = Traced<database::Error>;

        async fn execute(
            &self,
            Insert(order): Insert<read::order::WithLines>,
        ) -> Result<Self::Ok, Self::Err> {
            if self.fail_insert {
                return Err(tracerr::new!(database::Error::Postgres(
                    crate::infra::database::postgres::Error::PoolError(
                        deadpool_postgres::PoolError::Closed,
                    ),
                )));
            }
            self.inserted.lock().unwrap().push(order);
            Ok(())
        }
    }

    fn service(db: MockDb) -> Service<MockDb> {
        Service::new(Config::default(), db)
    }

    fn latte_line() -> Item {
        Item {
            menu_item_id: menu_item::Id::new(),
            menu_item_name: menu_item::Name::new("Latte").unwrap(),
            quantity: order::line::Quantity::new(2).unwrap(),
            unit_price: Money::new(480).unwrap(),
            temperature: Some(order::line::Temperature::Hot),
            options: vec![],
        }
    }

    fn cmd(total_amount: Money, items: Vec<Item>) -> CreateOrder {
        CreateOrder {
            customer_name: order::CustomerName::new("Sato").unwrap(),
            customer_email: None,
            customer_phone: None,
            customer_messaging_id: None,
            pickup_time: None,
            notes: None,
            initial_status: order::Status::Confirmed,
            total_amount,
            items,
        }
    }

    #[tokio::test]
    async fn persists_the_submitted_lines_and_total_as_given() {
        let svc = service(MockDb::default());

        let created = svc
            .execute(cmd(Money::new(960).unwrap(), vec![latte_line()]))
            .await
            .unwrap();

        assert_eq!(created.order.status, order::Status::Confirmed);
        assert_eq!(created.order.total_amount, Money::new(960).unwrap());
        assert_eq!(created.lines.len(), 1);
        assert_eq!(created.lines[0].unit_price, Money::new(480).unwrap());
        assert_eq!(created.lines[0].menu_item_name.to_string(), "Latte");
        assert_eq!(svc.database().inserted.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn never_consults_the_catalog() {
        // An item deleted (or re-priced) after it was carted still orders
        // fine, at the carted price.
        let svc = service(MockDb::default());

        let created = svc
            .execute(cmd(Money::new(100).unwrap(), vec![Item {
                unit_price: Money::new(100).unwrap(),
                quantity: order::line::Quantity::ONE,
                ..latte_line()
            }]))
            .await
            .unwrap();

        assert_eq!(created.order.total_amount, Money::new(100).unwrap());
        assert_eq!(created.lines[0].unit_price, Money::new(100).unwrap());
    }

    #[tokio::test]
    async fn generates_a_display_number_in_time_format() {
        let svc = service(MockDb::default());

        let created = svc
            .execute(cmd(Money::new(960).unwrap(), vec![latte_line()]))
            .await
            .unwrap();

        let number = created.order.number.to_string();
        assert_eq!(number.len(), 8);
        assert_eq!(&number[4..5], "-");
        assert!(number[..4].chars().all(|c| c.is_ascii_digit()));
        assert!(number[5..].chars().all(|c| c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn rejects_empty_orders() {
        let svc = service(MockDb::default());

        let err =
            svc.execute(cmd(Money::ZERO, vec![])).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NoItems));
    }

    #[tokio::test]
    async fn leaves_no_order_behind_on_a_failed_insert() {
        let svc = service(MockDb {
            fail_insert: true,
            ..MockDb::default()
        });

        let err = svc
            .execute(cmd(Money::new(960).unwrap(), vec![latte_line()]))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Db(_)));
        assert!(
            svc.database().inserted.lock().unwrap().is_empty(),
            "a failed insert must not leave a partial order",
        );
    }
}
