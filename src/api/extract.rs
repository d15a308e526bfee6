//! Request extractors: the caller's identity and JSON bodies with uniform error bodies.

use super::AppState;
use crate::{
    core::user,
    entities,
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;

/// Header carrying the id of the user authenticated by the gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user making the request, resolved from [`USER_ID_HEADER`].
#[derive(Debug, Clone)]
pub struct AuthUser(pub entities::user::Model);

fn unauthorized(message: &str) -> Error {
    Error::Unauthorized {
        message: message.to_string(),
    }
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let raw = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| unauthorized("Authentication required"))?;
        let user_id: i64 = raw
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .ok_or_else(|| unauthorized("Invalid user identity"))?;

        match user::get_user(state.db.as_ref(), user_id).await {
            Ok(model) => Ok(Self(model)),
            Err(Error::UserNotFound { .. }) => Err(unauthorized("Unknown user")),
            Err(e) => Err(e),
        }
    }
}

/// `axum::Json` whose rejections become [`Error::Validation`].
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| Error::Validation {
                message: rejection.body_text(),
            })?;
        Ok(Self(value))
    }
}
