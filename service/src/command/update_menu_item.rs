//! [`Command`] for updating an existing [`MenuItem`].

use common::{
    operations::{By, Select, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{menu_item, MenuItem},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for replacing all the editable fields of a [`MenuItem`].
///
/// Already placed [`Order`]s are unaffected: their [`Line`]s own a
/// snapshot of the name and price.
///
/// [`Line`]: crate::domain::order::Line
/// [`Order`]: crate::domain::Order
#[derive(Clone, Debug)]
pub struct UpdateMenuItem {
    /// ID of the [`MenuItem`] to update.
    pub id: menu_item::Id,

    /// New name of the [`MenuItem`].
    pub name: menu_item::Name,

    /// New description of the [`MenuItem`], if any.
    pub description: Option<menu_item::Description>,

    /// New price of the [`MenuItem`].
    pub price: Money,

    /// New image of the [`MenuItem`], if any.
    pub image_url: Option<menu_item::ImageUrl>,

    /// New availability of the [`MenuItem`].
    pub is_available: bool,

    /// Whether a temperature choice is required when ordering.
    pub has_temperature: bool,

    /// New display position in the catalog.
    pub sort_order: menu_item::SortOrder,
}

impl<Db> Command<UpdateMenuItem> for Service<Db>
where
    Db: Database<
            Select<By<Option<MenuItem>, menu_item::Id>>,
            Ok = Option<MenuItem>,
            Err = Traced<database::Error>,
        > + Database<Update<MenuItem>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = MenuItem;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateMenuItem,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateMenuItem {
            id,
            name,
            description,
            price,
            image_url,
            is_available,
            has_temperature,
            sort_order,
        } = cmd;

        let mut item = self
            .database()
            .execute(Select(By::<Option<MenuItem>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::MenuItemNotExists(id))
            .map_err(tracerr::wrap!())?;

        item.name = name;
        item.description = description;
        item.price = price;
        item.image_url = image_url;
        item.is_available = is_available;
        item.has_temperature = has_temperature;
        item.sort_order = sort_order;

        self.database()
            .execute(Update(item.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(item)
    }
}

/// Error of [`UpdateMenuItem`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`MenuItem`] doesn't exist.
    #[display("`MenuItem(id: {_0})` does not exist")]
    #[from(ignore)]
    MenuItemNotExists(#[error(not(source))] menu_item::Id),
}
