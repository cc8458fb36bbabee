//! Menu catalog operations.

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use common::Money;
use serde::{Deserialize, Serialize};
use service::{
    command, domain::menu_item, query::menu_items, read, Command as _,
};

use super::Success;
use crate::{error, Error, Service};

/// Wire shape of a [`menu_item::MenuItem`].
#[derive(Debug, Serialize)]
pub struct MenuItem {
    /// ID of the menu item.
    pub id: menu_item::Id,

    /// Display name of the menu item.
    pub name: menu_item::Name,

    /// Description of the menu item, if any.
    pub description: Option<menu_item::Description>,

    /// Price of the menu item, in the smallest currency unit.
    pub price: Money,

    /// Image of the menu item, if any.
    pub image_url: Option<menu_item::ImageUrl>,

    /// Whether the menu item can be ordered right now.
    pub is_available: bool,

    /// Whether a temperature choice is required when ordering.
    pub has_temperature: bool,

    /// Display position of the menu item in the catalog.
    pub sort_order: menu_item::SortOrder,

    /// When the menu item was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: menu_item::CreationDateTime,
}

impl From<menu_item::MenuItem> for MenuItem {
    fn from(item: menu_item::MenuItem) -> Self {
        let menu_item::MenuItem {
            id,
            name,
            description,
            price,
            image_url,
            is_available,
            has_temperature,
            sort_order,
            created_at,
        } = item;

        Self {
            id,
            name,
            description,
            price,
            image_url,
            is_available,
            has_temperature,
            sort_order,
            created_at,
        }
    }
}

/// Query string of the `GET /menu` operation.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct ListParams {
    /// Whether to return available menu items only.
    #[serde(default = "default_true")]
    pub available_only: bool,
}

/// Handles the `GET /menu` operation.
pub async fn list(
    Extension(service): Extension<Service>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<MenuItem>>, Error> {
    let items = service
        .execute(menu_items::List::by(read::menu_item::list::Filter {
            available_only: params.available_only,
        }))
        .await
        .map_err(error::log)?;

    Ok(Json(items.into_iter().map(Into::into).collect()))
}

/// Body of the `POST /admin/menu` and `PATCH /admin/menu/{id}` operations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertRequest {
    /// Display name of the menu item.
    name: String,

    /// Description of the menu item, if any.
    #[serde(default)]
    description: Option<String>,

    /// Price of the menu item, in the smallest currency unit.
    price: i64,

    /// Image of the menu item, if any.
    #[serde(default)]
    image_url: Option<String>,

    /// Whether the menu item can be ordered right away.
    #[serde(default = "default_true")]
    is_available: bool,

    /// Whether a temperature choice is required when ordering.
    #[serde(default)]
    has_temperature: bool,

    /// Display position of the menu item in the catalog.
    #[serde(default)]
    sort_order: i32,
}

impl TryFrom<UpsertRequest> for command::CreateMenuItem {
    type Error = Error;

    fn try_from(req: UpsertRequest) -> Result<Self, Error> {
        let UpsertRequest {
            name,
            description,
            price,
            image_url,
            is_available,
            has_temperature,
            sort_order,
        } = req;

        Ok(Self {
            name: menu_item::Name::new(name)
                .ok_or_else(|| Error::validation("Invalid `name`"))?,
            description: description.map(Into::into),
            price: Money::new(price)
                .filter(|p| p.is_positive())
                .ok_or_else(|| Error::validation("Invalid `price`"))?,
            image_url: image_url.map(Into::into),
            is_available,
            has_temperature,
            sort_order: sort_order.into(),
        })
    }
}

/// Handles the `POST /admin/menu` operation.
pub async fn create(
    Extension(service): Extension<Service>,
    Json(req): Json<UpsertRequest>,
) -> Result<Json<MenuItem>, Error> {
    let cmd = command::CreateMenuItem::try_from(req)?;
    let item = service.execute(cmd).await.map_err(error::log)?;

    Ok(Json(item.into()))
}

/// Handles the `PATCH /admin/menu/{id}` operation.
pub async fn update(
    Extension(service): Extension<Service>,
    Path(id): Path<menu_item::Id>,
    Json(req): Json<UpsertRequest>,
) -> Result<Json<MenuItem>, Error> {
    let command::CreateMenuItem {
        name,
        description,
        price,
        image_url,
        is_available,
        has_temperature,
        sort_order,
    } = req.try_into()?;

    let item = service
        .execute(command::UpdateMenuItem {
            id,
            name,
            description,
            price,
            image_url,
            is_available,
            has_temperature,
            sort_order,
        })
        .await
        .map_err(error::log)?;

    Ok(Json(item.into()))
}

/// Handles the `DELETE /admin/menu/{id}` operation.
pub async fn remove(
    Extension(service): Extension<Service>,
    Path(id): Path<menu_item::Id>,
) -> Result<Json<Success>, Error> {
    service
        .execute(command::DeleteMenuItem::from(id))
        .await
        .map_err(error::log)?;

    Ok(Json(Success::default()))
}

/// Body of the `PATCH /admin/menu/{id}/availability` operation.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetAvailabilityRequest {
    /// New availability of the menu item.
    pub is_available: bool,
}

/// Handles the `PATCH /admin/menu/{id}/availability` operation.
pub async fn set_availability(
    Extension(service): Extension<Service>,
    Path(id): Path<menu_item::Id>,
    Json(req): Json<SetAvailabilityRequest>,
) -> Result<Json<Success>, Error> {
    service
        .execute(command::SetMenuItemAvailability {
            id,
            is_available: req.is_available,
        })
        .await
        .map_err(error::log)?;

    Ok(Json(Success::default()))
}

/// Returns `true`.
fn default_true() -> bool {
    true
}
