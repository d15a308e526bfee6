//! User business logic - Registration and lookup of the people operating the till.
//!
//! Credentials are handled by the authenticating gateway in front of this service, so a
//! user here is only an identity with a role. The shop has at most one administrator.

use crate::{
    entities::{Cart, CartItem, Role, Sale, User, cart, cart_item, sale, user},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Public descriptor of a user, embedded in sales and returned by profile lookups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// User id
    pub id: i64,
    /// Login name
    pub username: String,
    /// Admin or cashier
    pub role: Role,
}

impl From<&user::Model> for UserSummary {
    fn from(model: &user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username.clone(),
            role: model.role,
        }
    }
}

/// Input for [`create_user`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Login name, must be unique
    pub username: String,
    /// Optional display name
    #[serde(default)]
    pub full_name: Option<String>,
    /// Defaults to cashier
    #[serde(default)]
    pub role: Option<Role>,
}

/// Changes to apply with [`update_user`]; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    /// New login name, must stay unique
    #[serde(default)]
    pub username: Option<String>,
    /// New display name
    #[serde(default)]
    pub full_name: Option<String>,
    /// New role
    #[serde(default)]
    pub role: Option<Role>,
}

fn validate_username(username: &str) -> Result<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(Error::Validation {
            message: "Username cannot be empty".to_string(),
        });
    }
    Ok(username.to_string())
}

async fn admin_count<C>(db: &C) -> Result<u64>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Role.eq(Role::Admin))
        .count(db)
        .await
        .map_err(Into::into)
}

fn only_admin() -> Error {
    Error::Forbidden {
        message: "Cannot remove the only administrator.".to_string(),
    }
}

/// Creates a user after checking username uniqueness and the single-admin rule.
///
/// # Errors
/// Returns an error if:
/// - The username is empty or already taken ([`Error::Validation`])
/// - An admin is requested while one already exists ([`Error::Forbidden`])
/// - The database insert fails
pub async fn create_user<C>(db: &C, new_user: NewUser) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let username = validate_username(&new_user.username)?;

    let taken = User::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(Error::Validation {
            message: "Username already taken".to_string(),
        });
    }

    let role = new_user.role.unwrap_or(Role::Cashier);
    if role == Role::Admin {
        if admin_count(db).await? > 0 {
            return Err(Error::Forbidden {
                message: "Operation failed. An administrator already exists.".to_string(),
            });
        }
    }

    let model = user::ActiveModel {
        username: Set(username),
        full_name: Set(new_user.full_name),
        role: Set(role),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = model.id, username = %model.username, role = ?model.role, "user created");
    Ok(model)
}

/// Looks up a user by id.
///
/// # Errors
/// Returns [`Error::UserNotFound`] if no such user exists, or a database error.
pub async fn get_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })
}

/// Finds a user by username, used by startup seeding.
pub async fn get_user_by_username<C>(db: &C, username: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All users, newest first.
pub async fn list_users<C>(db: &C) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .order_by_desc(user::Column::CreatedAt)
        .order_by_desc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Updates a user's login name, display name or role.
///
/// # Errors
/// Returns an error if:
/// - The user does not exist ([`Error::UserNotFound`])
/// - The new username is empty or taken by another user ([`Error::Validation`])
/// - The change would create a second administrator or leave none ([`Error::Forbidden`])
/// - The database update fails
pub async fn update_user<C>(db: &C, user_id: i64, changes: UserChanges) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let current = get_user(db, user_id).await?;
    let mut model: user::ActiveModel = current.clone().into();

    if let Some(username) = changes.username {
        let username = validate_username(&username)?;
        let taken = User::find()
            .filter(user::Column::Username.eq(username.as_str()))
            .filter(user::Column::Id.ne(user_id))
            .one(db)
            .await?;
        if taken.is_some() {
            return Err(Error::Validation {
                message: "Username already taken".to_string(),
            });
        }
        model.username = Set(username);
    }
    if let Some(full_name) = changes.full_name {
        model.full_name = Set(Some(full_name));
    }
    if let Some(role) = changes.role.filter(|role| *role != current.role) {
        if current.role == Role::Admin {
            return Err(only_admin());
        }
        if admin_count(db).await? > 0 {
            return Err(Error::Forbidden {
                message: "Operation failed. An administrator already exists.".to_string(),
            });
        }
        model.role = Set(role);
    }

    let updated = model.update(db).await?;
    info!(user_id, username = %updated.username, role = ?updated.role, "user updated");
    Ok(updated)
}

/// Deletes a user together with their cart.
///
/// # Errors
/// Returns an error if:
/// - The user does not exist ([`Error::UserNotFound`])
/// - The user is the administrator ([`Error::Forbidden`])
/// - The user has recorded sales ([`Error::Validation`])
/// - The database operation fails
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let target = get_user(&txn, user_id).await?;
    if target.role == Role::Admin {
        return Err(only_admin());
    }

    let sales = Sale::find()
        .filter(sale::Column::UserId.eq(user_id))
        .count(&txn)
        .await?;
    if sales > 0 {
        return Err(Error::Validation {
            message: format!("User '{}' has recorded sales", target.username),
        });
    }

    if let Some(own_cart) = Cart::find()
        .filter(cart::Column::UserId.eq(user_id))
        .one(&txn)
        .await?
    {
        CartItem::delete_many()
            .filter(cart_item::Column::CartId.eq(own_cart.id))
            .exec(&txn)
            .await?;
        own_cart.delete(&txn).await?;
    }
    target.delete(&txn).await?;
    txn.commit().await?;

    info!(user_id, "user deleted");
    Ok(())
}
