//! Realtime staff order stream.

use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::Response,
    Extension,
};
use futures::{SinkExt as _, StreamExt as _};
use serde::Serialize;
use service::events::Event;
use tokio::sync::broadcast::error::RecvError;

use super::order::{Order, OrderWithLines};
use crate::Service;

/// Frame pushed to a subscribed staff session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum Frame {
    /// A new order was placed.
    Created {
        /// The created order with its lines.
        order: OrderWithLines,

        /// Whether the staff UI should play the new-order alert.
        alert: bool,
    },

    /// An existing order changed.
    Updated {
        /// Shallow updated order, to be merged into the held snapshot by
        /// its ID.
        order: Order,
    },
}

impl From<Event> for Frame {
    fn from(event: Event) -> Self {
        match event {
            Event::Created(order) => Self::Created {
                order: order.into(),
                alert: true,
            },
            Event::Updated(order) => Self::Updated {
                order: order.into(),
            },
        }
    }
}

/// Handles the `GET /admin/orders/ws` operation.
///
/// Best-effort stream: a lagging session silently loses events and is
/// expected to refetch the `GET /admin/orders` snapshot on reconnect.
pub async fn orders(
    Extension(service): Extension<Service>,
    ws: WebSocketUpgrade,
) -> Response {
    let events = service.events().subscribe();
    ws.on_upgrade(move |socket| stream_events(socket, events))
}

/// Forwards the subscribed [`Event`]s into the provided [`WebSocket`]
/// until either side goes away.
async fn stream_events(
    socket: WebSocket,
    mut events: tokio::sync::broadcast::Receiver<Event>,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let frame = match event {
                    Ok(event) => Frame::from(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(
                            "staff session lagged {skipped} events behind",
                        );
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                let Ok(text) = serde_json::to_string(&frame) else {
                    continue;
                };
                if sink.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            message = stream.next() => {
                match message {
                    // Inbound content is ignored, the stream is one-way.
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                }
            }
        }
    }
}
