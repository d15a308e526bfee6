//! User handlers.

use crate::{
    api::{
        AppState,
        extract::{ApiJson, AuthUser},
    },
    core::user::{self, NewUser, UserChanges},
    entities::{self, Role},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

fn require_admin(current: &entities::user::Model) -> Result<()> {
    if current.role == Role::Admin {
        Ok(())
    } else {
        Err(Error::Forbidden {
            message: "Administrator access required".to_string(),
        })
    }
}

pub(crate) async fn list_users(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
) -> Result<Json<Vec<entities::user::Model>>> {
    Ok(Json(user::list_users(state.db.as_ref()).await?))
}

pub(crate) async fn me(AuthUser(current): AuthUser) -> Json<entities::user::Model> {
    Json(current)
}

/// Profile edits cover the login and display names; the role field is ignored.
pub(crate) async fn update_me(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    ApiJson(body): ApiJson<UserChanges>,
) -> Result<Json<entities::user::Model>> {
    let changes = UserChanges { role: None, ..body };
    Ok(Json(
        user::update_user(state.db.as_ref(), current.id, changes).await?,
    ))
}

/// Registration is open, as on a till that is set up by its first operator; the
/// single-admin rule is enforced by [`user::create_user`].
pub(crate) async fn create_user(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewUser>,
) -> Result<(StatusCode, Json<entities::user::Model>)> {
    let model = user::create_user(state.db.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(model)))
}

pub(crate) async fn update_user(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(user_id): Path<i64>,
    ApiJson(body): ApiJson<UserChanges>,
) -> Result<Json<entities::user::Model>> {
    require_admin(&current)?;
    Ok(Json(
        user::update_user(state.db.as_ref(), user_id, body).await?,
    ))
}

pub(crate) async fn delete_user(
    State(state): State<AppState>,
    AuthUser(current): AuthUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>> {
    require_admin(&current)?;
    user::delete_user(state.db.as_ref(), user_id).await?;
    Ok(Json(json!({ "message": "User deleted successfully" })))
}
