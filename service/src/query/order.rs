//! [`Query`] collection related to a single [`Order`].

use common::operations::By;

use crate::{domain::order, read};
#[cfg(doc)]
use crate::{domain::Order, Query};

use super::DatabaseQuery;

/// Queries an [`Order`] with its [`Line`]s by its [`order::Id`].
///
/// [`Line`]: order::Line
pub type ById =
    DatabaseQuery<By<Option<read::order::WithLines>, order::Id>>;
