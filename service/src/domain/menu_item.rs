//! [`MenuItem`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sellable product of the menu catalog.
#[derive(Clone, Debug)]
pub struct MenuItem {
    /// ID of this [`MenuItem`].
    pub id: Id,

    /// [`Name`] of this [`MenuItem`].
    pub name: Name,

    /// [`Description`] of this [`MenuItem`], if any.
    pub description: Option<Description>,

    /// Price of this [`MenuItem`], in the smallest currency unit.
    pub price: Money,

    /// [`ImageUrl`] of this [`MenuItem`], if any.
    pub image_url: Option<ImageUrl>,

    /// Indicator whether this [`MenuItem`] is available for ordering.
    pub is_available: bool,

    /// Indicator whether a temperature choice is required before adding
    /// this [`MenuItem`] to a cart.
    pub has_temperature: bool,

    /// [`SortOrder`] of this [`MenuItem`] in the displayed catalog.
    pub sort_order: SortOrder,

    /// [`DateTime`] when this [`MenuItem`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`MenuItem`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Name of a [`MenuItem`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

/// Description of a [`MenuItem`].
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Description(String);

/// URL (or blob reference) of a [`MenuItem`] image.
#[derive(
    AsRef, Clone, Debug, Deserialize, Display, Eq, From, PartialEq, Serialize,
)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct ImageUrl(String);

/// Display position of a [`MenuItem`] in the catalog.
///
/// Neither uniqueness nor contiguity is required.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SortOrder(i32);

/// Availability fast path of a [`MenuItem`], distinct from a full
/// [`MenuItem`] update.
#[derive(Clone, Copy, Debug)]
pub struct Availability {
    /// ID of the [`MenuItem`] to toggle.
    pub id: Id,

    /// New availability of the [`MenuItem`].
    pub is_available: bool,
}

/// [`DateTime`] of a [`MenuItem`] creation.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<unit::Creation>;

common::define_kind! {
    #[doc = "Binary temperature variant of a [`MenuItem`] flagged with \
             `has_temperature`."]
    enum Temperature {
        #[doc = "Served hot."]
        Hot = 1,

        #[doc = "Served iced."]
        Ice = 2,
    }
}
