//! Read models.

pub mod menu_item;
pub mod order;
