//! REST API definitions.

pub mod menu;
pub mod order;
pub mod webhook;
pub mod ws;

use axum::{
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;

/// Builds the [`Router`] serving the whole HTTP API.
///
/// The [`Service`] is expected to be provided as an [`Extension`] layer.
///
/// [`Extension`]: axum::Extension
/// [`Service`]: crate::Service
pub fn router() -> Router {
    Router::new()
        .route("/menu", get(menu::list))
        .route("/orders", post(order::create))
        .route("/orders/:id", get(order::by_id))
        .route("/checkout", post(order::checkout))
        .route("/webhook/payment", post(webhook::payment))
        .route("/admin/menu", post(menu::create))
        .route("/admin/menu/:id", patch(menu::update).delete(menu::remove))
        .route("/admin/menu/:id/availability", patch(menu::set_availability))
        .route("/admin/orders", get(order::today))
        .route("/admin/orders/status", patch(order::set_status))
        .route("/admin/orders/advance", patch(order::advance))
        .route("/admin/orders/ws", get(ws::orders))
}

/// Generic acknowledgment body of a mutating operation.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Success {
    /// Always `true`.
    pub success: bool,
}

impl Default for Success {
    fn default() -> Self {
        Self { success: true }
    }
}
