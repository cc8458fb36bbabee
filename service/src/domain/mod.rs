//! Domain layer.

pub mod cart;
pub mod menu_item;
pub mod order;

pub use self::{cart::Cart, menu_item::MenuItem, order::Order};
