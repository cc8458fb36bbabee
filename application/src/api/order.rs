//! Order operations.

use axum::{extract::Path, Extension, Json};
use common::Money;
use serde::{Deserialize, Serialize};
use service::{
    command,
    domain::{
        menu_item,
        order::{self, line},
    },
    query::{order as by_order, orders},
    read, Command as _,
};

use crate::{error, Error, Service};

/// Wire shape of an [`order::Order`].
///
/// The customer messaging identifier and the payment session reference
/// never leave the backend.
#[derive(Debug, Serialize)]
pub struct Order {
    /// ID of the order.
    pub id: order::Id,

    /// Display number of the order.
    pub number: order::Number,

    /// Name of the ordering customer.
    pub customer_name: order::CustomerName,

    /// Email address of the ordering customer, if provided.
    pub customer_email: Option<order::CustomerEmail>,

    /// Phone number of the ordering customer, if provided.
    pub customer_phone: Option<order::CustomerPhone>,

    /// Current status of the order.
    pub status: order::Status,

    /// Total amount of the order, in the smallest currency unit.
    pub total_amount: Money,

    /// Freeform notes of the order, if any.
    pub notes: Option<order::Notes>,

    /// When the order should be picked up, if requested.
    #[serde(with = "common::datetime::serde::rfc3339::option")]
    pub pickup_time: Option<order::PickupDateTime>,

    /// When the order was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: order::CreationDateTime,

    /// When the order was last updated.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub updated_at: order::UpdateDateTime,
}

impl From<order::Order> for Order {
    fn from(o: order::Order) -> Self {
        let order::Order {
            id,
            number,
            customer_name,
            customer_email,
            customer_phone,
            customer_messaging_id: _,
            status,
            total_amount,
            notes,
            pickup_time,
            payment_session_id: _,
            created_at,
            updated_at,
        } = o;

        Self {
            id,
            number,
            customer_name,
            customer_email,
            customer_phone,
            status,
            total_amount,
            notes,
            pickup_time,
            created_at,
            updated_at,
        }
    }
}

/// Wire shape of an [`order::Line`].
#[derive(Debug, Serialize)]
pub struct Line {
    /// ID of the line.
    pub id: line::Id,

    /// ID of the source menu item.
    pub menu_item_id: menu_item::Id,

    /// Name of the menu item at order time.
    pub menu_item_name: menu_item::Name,

    /// Ordered quantity.
    pub quantity: line::Quantity,

    /// Price of one unit at order time.
    pub unit_price: Money,

    /// Chosen temperature variant, if the menu item required one.
    pub temperature: Option<line::Temperature>,

    /// Chosen free-form options.
    pub options: Vec<line::SelectedOption>,
}

impl From<order::Line> for Line {
    fn from(l: order::Line) -> Self {
        let order::Line {
            id,
            order_id: _,
            menu_item_id,
            menu_item_name,
            quantity,
            unit_price,
            temperature,
            options,
            created_at: _,
        } = l;

        Self {
            id,
            menu_item_id,
            menu_item_name,
            quantity,
            unit_price,
            temperature,
            options,
        }
    }
}

/// Wire shape of an [`order::Order`] together with its [`order::Line`]s.
#[derive(Debug, Serialize)]
pub struct OrderWithLines {
    /// The order itself.
    #[serde(flatten)]
    pub order: Order,

    /// Lines of the order.
    pub lines: Vec<Line>,
}

impl From<read::order::WithLines> for OrderWithLines {
    fn from(w: read::order::WithLines) -> Self {
        Self {
            order: w.order.into(),
            lines: w.lines.into_iter().map(Into::into).collect(),
        }
    }
}

/// Body of the `POST /orders` and `POST /checkout` operations.
///
/// Names, prices and the total are the ones the cart captured; they are
/// persisted as given, without re-reading the catalog.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Name of the ordering customer.
    customer_name: String,

    /// Email address of the ordering customer, if provided.
    #[serde(default)]
    customer_email: Option<String>,

    /// Phone number of the ordering customer, if provided.
    #[serde(default)]
    customer_phone: Option<String>,

    /// Messaging platform identifier of the ordering customer, if
    /// provided.
    #[serde(default)]
    customer_messaging_id: Option<String>,

    /// Desired pickup time, if chosen.
    ///
    /// Either an `HH:MM` wall clock time of the current day, or a full
    /// RFC 3339 timestamp.
    #[serde(default)]
    pickup_time: Option<String>,

    /// Freeform notes, if provided.
    #[serde(default)]
    notes: Option<String>,

    /// Total amount of the order, in the smallest currency unit, as
    /// computed by the cart.
    total_amount: i64,

    /// Ordered items.
    items: Vec<ItemRequest>,
}

/// Single ordered position of a [`CreateOrderRequest`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemRequest {
    /// ID of the ordered menu item.
    menu_item_id: menu_item::Id,

    /// Name of the ordered menu item, as the cart captured it.
    menu_item_name: String,

    /// Ordered quantity.
    quantity: u32,

    /// Price of one unit, in the smallest currency unit, as the cart
    /// captured it.
    unit_price: i64,

    /// Chosen temperature variant, if the menu item requires one.
    #[serde(default)]
    temperature: Option<line::Temperature>,

    /// Chosen free-form options.
    #[serde(default)]
    options: Vec<line::SelectedOption>,
}

impl CreateOrderRequest {
    /// Parses this request into a [`command::CreateOrder`] starting in the
    /// provided [`order::Status`].
    fn into_command(
        self,
        initial_status: order::Status,
    ) -> Result<command::CreateOrder, Error> {
        let Self {
            customer_name,
            customer_email,
            customer_phone,
            customer_messaging_id,
            pickup_time,
            notes,
            total_amount,
            items,
        } = self;

        Ok(command::CreateOrder {
            customer_name: order::CustomerName::new(customer_name)
                .ok_or_else(|| Error::validation("Invalid `customerName`"))?,
            customer_email: customer_email
                .map(|v| {
                    order::CustomerEmail::new(v).ok_or_else(|| {
                        Error::validation("Invalid `customerEmail`")
                    })
                })
                .transpose()?,
            customer_phone: customer_phone
                .map(|v| {
                    order::CustomerPhone::new(v).ok_or_else(|| {
                        Error::validation("Invalid `customerPhone`")
                    })
                })
                .transpose()?,
            customer_messaging_id: customer_messaging_id.map(Into::into),
            pickup_time: pickup_time
                .map(|v| {
                    parse_pickup_time(&v).ok_or_else(|| {
                        Error::validation("Invalid `pickupTime`")
                    })
                })
                .transpose()?,
            notes: notes.map(Into::into),
            initial_status,
            total_amount: Money::new(total_amount).ok_or_else(|| {
                Error::validation("Invalid `totalAmount`")
            })?,
            items: items
                .into_iter()
                .map(ItemRequest::into_command)
                .collect::<Result<_, _>>()?,
        })
    }
}

impl ItemRequest {
    /// Parses this item into a [`command::create_order::Item`].
    fn into_command(self) -> Result<command::create_order::Item, Error> {
        let Self {
            menu_item_id,
            menu_item_name,
            quantity,
            unit_price,
            temperature,
            options,
        } = self;

        Ok(command::create_order::Item {
            menu_item_id,
            menu_item_name: menu_item::Name::new(menu_item_name)
                .ok_or_else(|| Error::validation("Invalid `menuItemName`"))?,
            quantity: line::Quantity::new(quantity).ok_or_else(|| {
                Error::validation("`quantity` must be positive")
            })?,
            unit_price: Money::new(unit_price)
                .ok_or_else(|| Error::validation("Invalid `unitPrice`"))?,
            temperature,
            options,
        })
    }
}

/// Parses a `pickupTime` request value.
///
/// A bare `HH:MM` pair selects that wall clock time of the current day; a
/// full RFC 3339 timestamp is accepted as well.
fn parse_pickup_time(value: &str) -> Option<order::PickupDateTime> {
    if let Ok(dt) = order::PickupDateTime::from_rfc3339(value) {
        return Some(dt);
    }
    let (hour, minute) = value.split_once(':')?;
    order::PickupDateTime::today_at(hour.parse().ok()?, minute.parse().ok()?)
}

/// Response of a successful `POST /orders` operation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Placed {
    /// Always `true`.
    pub success: bool,

    /// Display number of the created order.
    pub order_number: order::Number,

    /// ID of the created order.
    pub order_id: order::Id,
}

/// Handles the `POST /orders` operation.
///
/// This is the pay-at-counter flow: the created order is confirmed right
/// away, with no payment session involved.
pub async fn create(
    Extension(service): Extension<Service>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<Placed>, Error> {
    let cmd = req.into_command(order::Status::Confirmed)?;
    let created = service.execute(cmd).await.map_err(error::log)?;

    Ok(Json(Placed {
        success: true,
        order_number: created.order.number,
        order_id: created.order.id,
    }))
}

/// Response of a successful `POST /checkout` operation.
#[derive(Debug, Serialize)]
pub struct CheckoutRedirect {
    /// URL of the hosted payment session to redirect the customer to.
    pub url: String,
}

/// Handles the `POST /checkout` operation.
///
/// The order is committed pending and stays so until the payment
/// provider's webhook confirms it.
pub async fn checkout(
    Extension(service): Extension<Service>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<CheckoutRedirect>, Error> {
    let cmd = command::Checkout(req.into_command(order::Status::Pending)?);
    let session = service.execute(cmd).await.map_err(error::log)?;

    Ok(Json(CheckoutRedirect {
        url: session.payment_url,
    }))
}

/// Handles the `GET /orders/{id}` operation.
pub async fn by_id(
    Extension(service): Extension<Service>,
    Path(id): Path<order::Id>,
) -> Result<Json<OrderWithLines>, Error> {
    service
        .execute(by_order::ById::by(id))
        .await
        .map_err(error::log)?
        .map(|order| Json(order.into()))
        .ok_or_else(|| {
            Error::not_found(
                "ORDER_NOT_FOUND",
                format!("`Order(id: {id})` does not exist"),
            )
        })
}

/// Handles the `GET /admin/orders` operation.
///
/// Returns today's orders, newest first. The snapshot a staff session
/// renders before subscribing to the realtime stream.
pub async fn today(
    Extension(service): Extension<Service>,
) -> Result<Json<Vec<OrderWithLines>>, Error> {
    let list = service
        .execute(orders::Today::by(read::order::list::Today))
        .await
        .map_err(error::log)?;

    Ok(Json(list.into_iter().map(Into::into).collect()))
}

/// Response of a successful order status update.
#[derive(Debug, Serialize)]
pub struct Updated {
    /// Always `true`.
    pub success: bool,

    /// Updated order.
    pub order: Order,
}

/// Body of the `PATCH /admin/orders/status` operation.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetStatusRequest {
    /// ID of the order to update.
    pub order_id: order::Id,

    /// Status to set.
    pub status: order::Status,
}

/// Handles the `PATCH /admin/orders/status` operation.
///
/// A direct set: no forward-only validation applies at this boundary, so
/// staff may cancel an order or correct a mis-tapped status.
pub async fn set_status(
    Extension(service): Extension<Service>,
    Json(req): Json<SetStatusRequest>,
) -> Result<Json<Updated>, Error> {
    let order = service
        .execute(command::SetOrderStatus {
            id: req.order_id,
            status: req.status,
        })
        .await
        .map_err(error::log)?;

    Ok(Json(Updated {
        success: true,
        order: order.into(),
    }))
}

/// Body of the `PATCH /admin/orders/advance` operation.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceRequest {
    /// ID of the order to advance.
    pub order_id: order::Id,
}

/// Handles the `PATCH /admin/orders/advance` operation.
///
/// Walks the forward chain one step: confirmed, preparing, ready,
/// completed.
pub async fn advance(
    Extension(service): Extension<Service>,
    Json(req): Json<AdvanceRequest>,
) -> Result<Json<Updated>, Error> {
    let order = service
        .execute(command::AdvanceOrderStatus::from(req.order_id))
        .await
        .map_err(error::log)?;

    Ok(Json(Updated {
        success: true,
        order: order.into(),
    }))
}

#[cfg(test)]
mod parse_pickup_time_spec {
    use super::parse_pickup_time;

    #[test]
    fn accepts_wall_clock_time_of_today() {
        let parsed = parse_pickup_time("14:30").unwrap();
        assert_eq!(parsed.hour_minute(), (14, 30));
    }

    #[test]
    fn accepts_rfc3339_timestamp() {
        let parsed = parse_pickup_time("2026-08-30T14:30:00Z").unwrap();
        assert_eq!(parsed.hour_minute(), (14, 30));
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_pickup_time("half past two").is_none());
        assert!(parse_pickup_time("25:00").is_none());
        assert!(parse_pickup_time("1430").is_none());
    }
}
