//! [`Command`] for toggling a [`MenuItem`]'s availability.

use common::operations::Update;
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{menu_item, MenuItem},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for toggling whether a [`MenuItem`] can be ordered.
///
/// A fast path touching nothing but the availability flag, so the staff
/// toggle cannot race a concurrent full edit of the [`MenuItem`].
#[derive(Clone, Copy, Debug)]
pub struct SetMenuItemAvailability {
    /// ID of the [`MenuItem`] to toggle.
    pub id: menu_item::Id,

    /// New availability of the [`MenuItem`].
    pub is_available: bool,
}

impl<Db> Command<SetMenuItemAvailability> for Service<Db>
where
    Db: Database<
        Update<menu_item::Availability>,
        Ok = bool,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        SetMenuItemAvailability { id, is_available }: SetMenuItemAvailability,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let updated = self
            .database()
            .execute(Update(menu_item::Availability { id, is_available }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !updated {
            return Err(tracerr::new!(E::MenuItemNotExists(id)));
        }
        Ok(())
    }
}

/// Error of [`SetMenuItemAvailability`] [`Command`] execution.
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
