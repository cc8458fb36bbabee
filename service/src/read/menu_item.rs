//! [`MenuItem`] read model definition.
//!
//! [`MenuItem`]: crate::domain::MenuItem

pub mod list {
    //! [`MenuItem`]s list definitions.

    #[cfg(doc)]
    use crate::domain::MenuItem;

    /// Filter selecting a list of [`MenuItem`]s ordered by their sort
    /// order.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// Whether to select only [`MenuItem`]s available for ordering.
        pub available_only: bool,
    }
}
