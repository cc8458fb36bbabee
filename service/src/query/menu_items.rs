//! [`Query`] collection related to the [`MenuItem`] catalog.

use common::operations::By;

use crate::{domain::MenuItem, read};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a list of [`MenuItem`]s, ordered for display.
pub type List = DatabaseQuery<By<Vec<MenuItem>, read::menu_item::list::Filter>>;
