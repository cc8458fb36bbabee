//! [`Order`] [`Line`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf, Money};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::menu_item;
#[cfg(doc)]
use crate::domain::{MenuItem, Order};

pub use crate::domain::menu_item::Temperature;

/// Denormalized snapshot of one ordered [`MenuItem`] within an [`Order`].
///
/// Owns a copy of the [`MenuItem`] name and price captured at order time,
/// so it survives later catalog edits and hard deletes.
#[derive(Clone, Debug)]
pub struct Line {
    /// ID of this [`Line`].
    pub id: Id,

    /// ID of the parent [`Order`].
    pub order_id: super::Id,

    /// ID of the source [`MenuItem`].
    ///
    /// Kept for traceability only, never used for live lookups.
    pub menu_item_id: menu_item::Id,

    /// Name of the [`MenuItem`] at order time.
    pub menu_item_name: menu_item::Name,

    /// Ordered [`Quantity`].
    pub quantity: Quantity,

    /// Price of one unit at order time.
    pub unit_price: Money,

    /// Chosen [`Temperature`] variant, if the [`MenuItem`] required one.
    pub temperature: Option<Temperature>,

    /// Freeform [`SelectedOption`]s of this [`Line`].
    pub options: Vec<SelectedOption>,

    /// [`DateTime`] when this [`Line`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`Line`].
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

/// Quantity of an ordered [`MenuItem`].
///
/// Always positive: a zero quantity is expressed by removing the [`Line`].
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(try_from = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// One unit.
    pub const ONE: Self = Self(1);

    /// Creates a new [`Quantity`] if the given `quantity` is positive.
    #[must_use]
    pub fn new(quantity: u32) -> Option<Self> {
        (quantity > 0).then_some(Self(quantity))
    }

    /// Returns this [`Quantity`] as a [`u32`].
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Adds the provided [`Quantity`] to this one.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl TryFrom<u32> for Quantity {
    type Error = &'static str;

    fn try_from(quantity: u32) -> Result<Self, Self::Error> {
        Self::new(quantity).ok_or("`Quantity` must be positive")
    }
}

#[cfg(feature = "postgres")]
impl<'a> FromSql<'a> for Quantity {
    postgres_types::accepts!(INT4);

    fn from_sql(
        ty: &postgres_types::Type,
        raw: &'a [u8],
    ) -> Result<Self, Box<dyn std::error::Error + Sync + Send>> {
        Self::new(u32::try_from(i32::from_sql(ty, raw)?)?)
            .ok_or_else(|| "`Quantity` must be positive".into())
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Quantity {
    postgres_types::accepts!(INT4);
    postgres_types::to_sql_checked!();

    fn to_sql(
        &self,
        ty: &postgres_types::Type,
        w: &mut postgres_types::private::BytesMut,
    ) -> Result<
        postgres_types::IsNull,
        Box<dyn std::error::Error + Sync + Send>,
    > {
        i32::try_from(self.0)?.to_sql(ty, w)
    }
}

/// Freeform option selected for a [`Line`] (e.g. an extra shot), with an
/// optional price.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SelectedOption {
    /// Name of this [`SelectedOption`].
    pub name: String,

    /// Price of this [`SelectedOption`], if it is charged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
}

/// [`DateTime`] of a [`Line`] creation.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<unit::Creation>;
