//! [`Command`] definition.

pub mod advance_order_status;
pub mod checkout;
pub mod confirm_payment;
pub mod create_menu_item;
pub mod create_order;
pub mod delete_menu_item;
pub mod set_menu_item_availability;
pub mod set_order_status;
pub mod update_menu_item;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    advance_order_status::AdvanceOrderStatus, checkout::Checkout,
    confirm_payment::ConfirmPayment, create_menu_item::CreateMenuItem,
    create_order::CreateOrder, delete_menu_item::DeleteMenuItem,
    set_menu_item_availability::SetMenuItemAvailability,
    set_order_status::SetOrderStatus, update_menu_item::UpdateMenuItem,
};
