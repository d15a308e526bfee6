//! Checkout and sale history handlers.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, AuthUser},
    },
    core::{
        checkout,
        sale::{self, SaleDetails},
    },
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/sales`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// `CASH`, `CARD` or `VOUCHER`; anything else is rejected by checkout
    #[serde(default)]
    pub payment_method: String,
}

/// Response of a successful checkout.
#[derive(Debug, Serialize)]
pub struct SaleCreated {
    /// Confirmation text
    pub message: &'static str,
    /// The committed sale
    pub sale: SaleDetails,
}

pub(crate) async fn create_sale(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<(StatusCode, Json<SaleCreated>)> {
    let sale = checkout::checkout(state.db.as_ref(), user.id, &body.payment_method).await?;
    Ok((
        StatusCode::CREATED,
        Json(SaleCreated {
            message: "Sale completed successfully",
            sale,
        }),
    ))
}

pub(crate) async fn list_sales(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<SaleDetails>>> {
    Ok(Json(sale::list_sales(state.db.as_ref()).await?))
}

pub(crate) async fn get_sale(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(sale_id): Path<i64>,
) -> Result<Json<SaleDetails>> {
    Ok(Json(sale::get_sale(state.db.as_ref(), sale_id).await?))
}
