//! Cart handlers. Every handler acts on the caller's own cart.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, AuthUser},
    },
    core::cart::{self, CartDetails},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

/// Body of `POST /api/cart/items`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    /// Product to add
    pub product_id: i64,
    /// Units to add
    pub quantity: i64,
}

/// Body of `PUT /api/cart/items/:item_id`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// New quantity; zero removes the line
    pub quantity: i64,
}

fn to_quantity(quantity: i64) -> Result<i32> {
    i32::try_from(quantity).map_err(|_| Error::InvalidQuantity { quantity })
}

pub(crate) async fn get_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CartDetails>> {
    Ok(Json(cart::get_cart(state.db.as_ref(), user.id).await?))
}

pub(crate) async fn clear_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CartDetails>> {
    Ok(Json(cart::clear(state.db.as_ref(), user.id).await?))
}

pub(crate) async fn add_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<AddItemRequest>,
) -> Result<Json<CartDetails>> {
    let quantity = to_quantity(body.quantity)?;
    Ok(Json(
        cart::add_item(state.db.as_ref(), user.id, body.product_id, quantity).await?,
    ))
}

pub(crate) async fn update_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<i64>,
    ApiJson(body): ApiJson<UpdateItemRequest>,
) -> Result<Json<CartDetails>> {
    let quantity = to_quantity(body.quantity)?;
    Ok(Json(
        cart::set_item_quantity(state.db.as_ref(), user.id, item_id, quantity).await?,
    ))
}

pub(crate) async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(item_id): Path<i64>,
) -> Result<Json<CartDetails>> {
    Ok(Json(cart::remove_item(state.db.as_ref(), user.id, item_id).await?))
}
