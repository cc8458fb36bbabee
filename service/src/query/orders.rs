//! [`Query`] collection related to the multiple [`Order`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Order, Query};

use super::DatabaseQuery;

/// Queries today's [`Order`]s with their [`Line`]s, newest first.
///
/// [`Line`]: crate::domain::order::Line
pub type Today = DatabaseQuery<
    By<Vec<read::order::WithLines>, read::order::list::Today>,
>;
