//! Catalog handlers.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, AuthUser},
    },
    core::product::{self, NewProduct, ProductChanges, ProductSummary},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

pub(crate) async fn list_products(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<ProductSummary>>> {
    let products = product::get_all_products(state.db.as_ref()).await?;
    Ok(Json(products.iter().map(ProductSummary::from).collect()))
}

pub(crate) async fn get_product(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(product_id): Path<i64>,
) -> Result<Json<ProductSummary>> {
    let model = product::get_product_by_id(state.db.as_ref(), product_id).await?;
    Ok(Json(ProductSummary::from(&model)))
}

pub(crate) async fn get_product_by_barcode(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(barcode): Path<String>,
) -> Result<Json<ProductSummary>> {
    let model = product::get_product_by_barcode(state.db.as_ref(), &barcode)
        .await?
        .ok_or(Error::ProductNotFound { name: barcode })?;
    Ok(Json(ProductSummary::from(&model)))
}

pub(crate) async fn create_product(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    ApiJson(body): ApiJson<NewProduct>,
) -> Result<(StatusCode, Json<ProductSummary>)> {
    let model = product::create_product(state.db.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(ProductSummary::from(&model))))
}

pub(crate) async fn update_product(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(product_id): Path<i64>,
    ApiJson(body): ApiJson<ProductChanges>,
) -> Result<Json<ProductSummary>> {
    let model = product::update_product(state.db.as_ref(), product_id, body).await?;
    Ok(Json(ProductSummary::from(&model)))
}

pub(crate) async fn delete_product(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(product_id): Path<i64>,
) -> Result<Json<Value>> {
    product::delete_product(state.db.as_ref(), product_id).await?;
    Ok(Json(json!({ "message": "Product deleted" })))
}
