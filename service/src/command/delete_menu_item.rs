//! [`Command`] for deleting a [`MenuItem`].

use common::operations::{By, Delete};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{menu_item, MenuItem},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for removing a [`MenuItem`] from the catalog.
///
/// A hard delete: historical [`Order`]s keep rendering through their
/// [`Line`] snapshots.
///
/// [`Line`]: crate::domain::order::Line
/// [`Order`]: crate::domain::Order
#[derive(Clone, Copy, Debug, From)]
pub struct DeleteMenuItem {
    /// ID of the [`MenuItem`] to delete.
    pub id: menu_item::Id,
}

impl<Db> Command<DeleteMenuItem> for Service<Db>
where
    Db: Database<
        Delete<By<MenuItem, menu_item::Id>>,
        Ok = bool,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeleteMenuItem { id }: DeleteMenuItem,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let deleted = self
            .database()
            .execute(Delete(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !deleted {
            return Err(tracerr::new!(E::MenuItemNotExists(id)));
        }
        Ok(())
    }
}

/// Error of [`DeleteMenuItem`] [`Command`] execution.
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
