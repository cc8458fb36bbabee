//! [`Cart`] definitions.
//!
//! The cart is entirely client-local state: it lives on one device, is
//! persisted only through the injected [`Storage`] adapter (so it survives
//! a restart of the same device), and gains no server-side identity until
//! checkout.

use std::fmt;

use common::Money;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

use crate::domain::{
    menu_item::{self, Temperature},
    order::line::Quantity,
    MenuItem,
};

/// Client-local collection of [`MenuItem`] selections.
#[derive(Debug)]
pub struct Cart<S> {
    /// [`Line`]s of this [`Cart`].
    lines: Vec<Line>,

    /// [`Storage`] adapter persisting this [`Cart`] across reloads.
    storage: S,
}

impl<S: Storage> Cart<S> {
    /// Creates a new [`Cart`] restoring its [`Line`]s from the provided
    /// [`Storage`].
    ///
    /// # Errors
    ///
    /// If the [`Storage`] fails to load.
    pub fn restore(storage: S) -> Result<Self, S::Err> {
        let lines = storage.load()?;
        Ok(Self { lines, storage })
    }

    /// Returns the [`Line`]s of this [`Cart`].
    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Adds the provided `quantity` of a [`MenuItem`] to this [`Cart`].
    ///
    /// If a [`Line`] with the same `(menu_item, temperature)` [`Key`]
    /// already exists, its quantity accumulates and the total recomputes
    /// from the unit price captured on first add; otherwise a new [`Line`]
    /// is appended.
    ///
    /// # Errors
    ///
    /// If the [`Storage`] fails to persist.
    pub fn add_item(
        &mut self,
        item: &MenuItem,
        quantity: Quantity,
        temperature: Option<Temperature>,
    ) -> Result<(), S::Err> {
        let key = Key::new(item.id, temperature);

        if let Some(line) = self.lines.iter_mut().find(|l| l.key == key) {
            line.quantity = line.quantity.saturating_add(quantity);
            line.total_price = line.unit_price * line.quantity.as_u32();
        } else {
            self.lines.push(Line {
                key,
                menu_item_id: item.id,
                menu_item_name: item.name.clone(),
                unit_price: item.price,
                quantity,
                temperature,
                total_price: item.price * quantity.as_u32(),
            });
        }

        self.storage.persist(&self.lines)
    }

    /// Sets the quantity of the [`Line`] with the provided [`Key`].
    ///
    /// A `new_quantity` of zero (expressed as [`None`], since [`Quantity`]
    /// itself cannot be zero) removes the [`Line`], keeping the invariant
    /// that no [`Line`] ever has a non-positive quantity.
    ///
    /// The total recomputes from the unit price captured on the [`Line`],
    /// not re-read from the catalog: a mid-session price change never
    /// silently applies to an open cart.
    ///
    /// # Errors
    ///
    /// If the [`Storage`] fails to persist.
    pub fn update_quantity(
        &mut self,
        key: Key,
        new_quantity: Option<Quantity>,
    ) -> Result<(), S::Err> {
        let Some(new_quantity) = new_quantity else {
            return self.remove_item(key);
        };

        if let Some(line) = self.lines.iter_mut().find(|l| l.key == key) {
            line.quantity = new_quantity;
            line.total_price = line.unit_price * new_quantity.as_u32();
        }

        self.storage.persist(&self.lines)
    }

    /// Removes the [`Line`] with the provided [`Key`] unconditionally.
    ///
    /// No-op if absent.
    ///
    /// # Errors
    ///
    /// If the [`Storage`] fails to persist.
    pub fn remove_item(&mut self, key: Key) -> Result<(), S::Err> {
        self.lines.retain(|l| l.key != key);
        self.storage.persist(&self.lines)
    }

    /// Empties this [`Cart`].
    ///
    /// Called after a successful order submission.
    ///
    /// # Errors
    ///
    /// If the [`Storage`] fails to persist.
    pub fn clear(&mut self) -> Result<(), S::Err> {
        self.lines.clear();
        self.storage.persist(&self.lines)
    }

    /// Returns the total amount of this [`Cart`].
    #[must_use]
    pub fn total_amount(&self) -> Money {
        self.lines.iter().map(|l| l.total_price).sum()
    }

    /// Returns the total number of items in this [`Cart`].
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity.as_u32()).sum()
    }
}

/// One logical selection within a [`Cart`].
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Line {
    /// Deduplication [`Key`] of this [`Line`].
    pub key: Key,

    /// ID of the selected [`MenuItem`].
    pub menu_item_id: menu_item::Id,

    /// Name of the selected [`MenuItem`], captured at add time.
    pub menu_item_name: menu_item::Name,

    /// Price of one unit, captured at add time.
    pub unit_price: Money,

    /// Selected [`Quantity`].
    pub quantity: Quantity,

    /// Chosen [`Temperature`] variant, if any.
    pub temperature: Option<Temperature>,

    /// Derived total of this [`Line`]: `quantity` x `unit_price`.
    pub total_price: Money,
}

/// Compound identity of a [`Line`]: the selected [`MenuItem`] plus its
/// [`Temperature`] variant (or none).
///
/// Adding the same pair again accumulates quantity; a different
/// temperature choice yields a distinct [`Line`].
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Key {
    /// ID of the selected [`MenuItem`].
    pub menu_item_id: menu_item::Id,

    /// Chosen [`Temperature`] variant, if any.
    pub temperature: Option<Temperature>,
}

impl Key {
    /// Creates a new [`Key`] from its parts.
    #[must_use]
    pub fn new(
        menu_item_id: menu_item::Id,
        temperature: Option<Temperature>,
    ) -> Self {
        Self {
            menu_item_id,
            temperature,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self {
            menu_item_id,
            temperature,
        } = self;
        match temperature {
            Some(t) => write!(f, "{menu_item_id}-{t}"),
            None => write!(f, "{menu_item_id}-none"),
        }
    }
}

/// Durable local storage a [`Cart`] persists its [`Line`]s into.
///
/// Per-device and unsynchronized: two devices can never share (or race on)
/// one cart.
pub trait Storage {
    /// Type of this [`Storage`] error.
    type Err;

    /// Loads the previously persisted [`Line`]s, if any.
    ///
    /// # Errors
    ///
    /// If the underlying storage fails to read.
    fn load(&self) -> Result<Vec<Line>, Self::Err>;

    /// Persists the provided [`Line`]s, replacing any previous state.
    ///
    /// # Errors
    ///
    /// If the underlying storage fails to write.
    fn persist(&self, lines: &[Line]) -> Result<(), Self::Err>;
}

impl<S: Storage> Storage for &S {
    type Err = S::Err;

    fn load(&self) -> Result<Vec<Line>, Self::Err> {
        (*self).load()
    }

    fn persist(&self, lines: &[Line]) -> Result<(), Self::Err> {
        (*self).persist(lines)
    }
}

/// In-memory [`Storage`], both the test double and the fallback for
/// devices without durable local storage.
#[derive(Debug, Default)]
pub struct MemoryStorage(std::cell::RefCell<Vec<Line>>);

impl Storage for MemoryStorage {
    type Err = Infallible;

    fn load(&self) -> Result<Vec<Line>, Self::Err> {
        Ok(self.0.borrow().clone())
    }

    fn persist(&self, lines: &[Line]) -> Result<(), Self::Err> {
        *self.0.borrow_mut() = lines.to_vec();
        Ok(())
    }
}

/// Error that can never happen.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("infallible")]
pub enum Infallible {}

#[cfg(test)]
mod spec {
    use common::{DateTime, Money};

    use crate::domain::{
        menu_item::{self, Temperature},
        order::line::Quantity,
        MenuItem,
    };

    use super::{Cart, Key, MemoryStorage};

    fn latte() -> MenuItem {
        MenuItem {
            id: menu_item::Id::new(),
            name: menu_item::Name::new("Latte").unwrap(),
            description: None,
            price: Money::new(480).unwrap(),
            image_url: None,
            is_available: true,
            has_temperature: true,
            sort_order: 1.into(),
            created_at: DateTime::now().coerce(),
        }
    }

    fn qty(n: u32) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn accumulates_same_key_into_one_line() {
        let item = latte();
        let mut cart = Cart::restore(MemoryStorage::default()).unwrap();

        cart.add_item(&item, qty(1), Some(Temperature::Hot)).unwrap();
        cart.add_item(&item, qty(2), Some(Temperature::Hot)).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, qty(3));
        assert_eq!(cart.lines()[0].total_price, Money::new(1440).unwrap());
    }

    #[test]
    fn distinct_temperatures_yield_distinct_lines() {
        let item = latte();
        let mut cart = Cart::restore(MemoryStorage::default()).unwrap();

        cart.add_item(&item, qty(1), Some(Temperature::Hot)).unwrap();
        cart.add_item(&item, qty(1), Some(Temperature::Ice)).unwrap();
        cart.add_item(&item, qty(1), None).unwrap();

        assert_eq!(cart.lines().len(), 3);
        assert_eq!(cart.total_item_count(), 3);
    }

    #[test]
    fn zero_quantity_removes_the_line() {
        let item = latte();
        let mut cart = Cart::restore(MemoryStorage::default()).unwrap();

        cart.add_item(&item, qty(2), None).unwrap();
        let key = cart.lines()[0].key;

        cart.update_quantity(key, None).unwrap();

        assert!(cart.lines().is_empty());
        assert_eq!(cart.total_amount(), Money::ZERO);
    }

    #[test]
    fn update_recomputes_from_the_captured_unit_price() {
        let mut item = latte();
        let mut cart = Cart::restore(MemoryStorage::default()).unwrap();

        cart.add_item(&item, qty(1), None).unwrap();
        let key = cart.lines()[0].key;

        // A catalog price change must not leak into the open cart.
        item.price = Money::new(980).unwrap();
        cart.update_quantity(key, Some(qty(2))).unwrap();

        assert_eq!(cart.lines()[0].total_price, Money::new(960).unwrap());
    }

    #[test]
    fn removal_of_absent_line_is_a_no_op() {
        let item = latte();
        let mut cart = Cart::restore(MemoryStorage::default()).unwrap();
        cart.add_item(&item, qty(1), None).unwrap();

        cart.remove_item(Key::new(menu_item::Id::new(), None)).unwrap();

        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn totals_sum_over_all_lines() {
        let item = latte();
        let mut cart = Cart::restore(MemoryStorage::default()).unwrap();

        cart.add_item(&item, qty(2), Some(Temperature::Hot)).unwrap();
        cart.add_item(&item, qty(1), Some(Temperature::Ice)).unwrap();

        assert_eq!(cart.total_amount(), Money::new(1440).unwrap());
        assert_eq!(cart.total_item_count(), 3);
    }

    #[test]
    fn survives_a_reload_through_storage() {
        let storage = MemoryStorage::default();
        let item = latte();

        {
            let mut cart = Cart::restore(&storage).unwrap();
            cart.add_item(&item, qty(2), None).unwrap();
        }

        let restored = Cart::restore(&storage).unwrap();
        assert_eq!(restored.lines().len(), 1);
        assert_eq!(restored.total_item_count(), 2);
    }

    #[test]
    fn clears_after_submission() {
        let item = latte();
        let mut cart = Cart::restore(MemoryStorage::default()).unwrap();
        cart.add_item(&item, qty(2), None).unwrap();

        cart.clear().unwrap();

        assert!(cart.lines().is_empty());
        assert_eq!(cart.total_item_count(), 0);
    }
}
