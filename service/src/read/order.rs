//! [`Order`] read model definition.
//!
//! [`Order`]: crate::domain::Order

use crate::domain::{order, Order};

/// [`Order`] together with its [`Line`]s.
///
/// The shape staff views render without a follow-up fetch, and the shape
/// notifications are built from.
///
/// [`Line`]: order::Line
#[derive(Clone, Debug)]
pub struct WithLines {
    /// The [`Order`] itself.
    pub order: Order,

    /// [`Line`]s of the [`Order`].
    pub lines: Vec<order::Line>,
}

pub mod list {
    //! [`Order`]s list definitions.

    #[cfg(doc)]
    use crate::domain::Order;

    /// Selector of the staff snapshot: all of today's [`Order`]s, newest
    /// first.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Today;
}
