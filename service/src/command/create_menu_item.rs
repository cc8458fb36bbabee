//! [`Command`] for creating a new [`MenuItem`].

use common::{operations::Insert, DateTime, Money};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{menu_item, MenuItem},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for adding a new [`MenuItem`] to the catalog.
#[derive(Clone, Debug)]
pub struct CreateMenuItem {
    /// Name of the [`MenuItem`].
    pub name: menu_item::Name,

    /// Description of the [`MenuItem`], if any.
    pub description: Option<menu_item::Description>,

    /// Price of the [`MenuItem`].
    pub price: Money,

    /// Image of the [`MenuItem`], if any.
    pub image_url: Option<menu_item::ImageUrl>,

    /// Whether the [`MenuItem`] is available for ordering right away.
    pub is_available: bool,

    /// Whether a temperature choice is required when ordering.
    pub has_temperature: bool,

    /// Display position in the catalog.
    pub sort_order: menu_item::SortOrder,
}

impl<Db> Command<CreateMenuItem> for Service<Db>
where
    Db: Database<Insert<MenuItem>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = MenuItem;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateMenuItem,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateMenuItem {
            name,
            description,
            price,
            image_url,
            is_available,
            has_temperature,
            sort_order,
        } = cmd;

        let item = MenuItem {
            id: menu_item::Id::new(),
            name,
            description,
            price,
            image_url,
            is_available,
            has_temperature,
            sort_order,
            created_at: DateTime::now().coerce(),
        };

        self.database()
            .execute(Insert(item.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(item)
    }
}

/// Error of [`CreateMenuItem`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),
}
