//! HTTP interface - axum router over the core operations.
//!
//! Handlers are thin: they resolve the caller with [`extract::AuthUser`], call into
//! [`crate::core`], and let [`crate::errors::Error`] render itself as the response on failure.

pub mod error;
pub mod extract;
pub mod routes;

use axum::{
    Router,
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Connection pool
    pub db: Arc<DatabaseConnection>,
}

impl AppState {
    /// Wraps a database connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db: Arc::new(db) }
    }
}

async fn liveness() -> &'static str {
    "POS backend is running"
}

fn api_routes() -> Router<AppState> {
    use routes::{cart, products, sales, users};

    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/me", get(users::me).put(users::update_me))
        .route(
            "/users/:id",
            put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/products/barcode/:barcode",
            get(products::get_product_by_barcode),
        )
        .route(
            "/products/:id",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/cart", get(cart::get_cart).delete(cart::clear_cart))
        .route("/cart/items", post(cart::add_item))
        .route(
            "/cart/items/:item_id",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/sales", get(sales::list_sales).post(sales::create_sale))
        .route("/sales/:id", get(sales::get_sale))
}

/// Builds the application router with request tracing and permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(liveness))
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::stock, errors::Result, test_utils::*};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn request(method: &str, uri: &str, user_id: Option<i64>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(id) = user_id {
            builder = builder.header(extract::USER_ID_HEADER, id.to_string());
        }
        match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_state_clones_share_one_pool() -> Result<()> {
        let db = setup_test_db().await?;
        let state = AppState::new(db);
        let copy = state.clone();
        assert!(Arc::ptr_eq(&state.db, &copy.db));
        Ok(())
    }

    #[tokio::test]
    async fn test_liveness() -> Result<()> {
        let db = setup_test_db().await?;
        let app = router(AppState::new(db));

        let response = app.oneshot(request("GET", "/", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() -> Result<()> {
        let db = setup_test_db().await?;
        let app = router(AppState::new(db));

        let (status, body) = send(
            &app,
            request("POST", "/api/sales", None, Some(json!({ "paymentMethod": "CASH" }))),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["message"].is_string());

        let (status, _) = send(&app, request("GET", "/api/cart", Some(999), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_to_cart_then_checkout() -> Result<()> {
        let (db, user, product) = setup_with_product().await?;
        let state = AppState::new(db);
        let db = Arc::clone(&state.db);
        let app = router(state);

        let (status, cart) = send(
            &app,
            request(
                "POST",
                "/api/cart/items",
                Some(user.id),
                Some(json!({ "productId": product.id, "quantity": 2 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(cart["totalAmount"], "3.00");
        assert_eq!(cart["items"][0]["quantity"], 2);

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/sales",
                Some(user.id),
                Some(json!({ "paymentMethod": "CASH" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["message"], "Sale completed successfully");
        assert_eq!(body["sale"]["totalAmount"], "3.00");
        assert_eq!(body["sale"]["paymentMethod"], "CASH");
        assert_eq!(body["sale"]["user"]["username"], user.username.as_str());
        assert_eq!(body["sale"]["items"][0]["productName"], "Cola 330ml");
        assert_eq!(stock::available(db.as_ref(), product.id).await?, 8);

        let sale_id = body["sale"]["id"].as_i64().unwrap();
        let (status, fetched) = send(
            &app,
            request("GET", &format!("/api/sales/{sale_id}"), Some(user.id), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["id"], sale_id);

        let (_, cart) = send(&app, request("GET", "/api/cart", Some(user.id), None)).await;
        assert_eq!(cart["items"].as_array().map(Vec::len), Some(0));
        assert_eq!(cart["totalAmount"], "0.00");
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_is_bad_request() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let app = router(AppState::new(db));

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/sales",
                Some(user.id),
                Some(json!({ "paymentMethod": "CARD" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Cart is empty");
        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_invalid_payment_method() -> Result<()> {
        let (db, user, product) = setup_with_product().await?;
        crate::core::cart::add_item(&db, user.id, product.id, 1).await?;
        let state = AppState::new(db);
        let db = Arc::clone(&state.db);
        let app = router(state);

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/sales",
                Some(user.id),
                Some(json!({ "paymentMethod": "BITCOIN" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid payment method: 'BITCOIN'");
        assert_eq!(stock::available(db.as_ref(), product.id).await?, 10);
        Ok(())
    }

    #[tokio::test]
    async fn test_product_lookup_not_found() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let app = router(AppState::new(db));

        let (status, body) = send(
            &app,
            request("GET", "/api/products/barcode/000000", Some(user.id), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() -> Result<()> {
        let (db, user) = setup_with_user().await?;
        let app = router(AppState::new(db));

        let (status, body) = send(
            &app,
            request(
                "POST",
                "/api/cart/items",
                Some(user.id),
                Some(json!({ "productId": "cola" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
        Ok(())
    }

    #[tokio::test]
    async fn test_second_admin_is_forbidden() -> Result<()> {
        let db = setup_test_db().await?;
        let app = router(AppState::new(db));

        let admin = json!({ "username": "boss", "role": "admin" });
        let (status, created) = send(&app, request("POST", "/api/users", None, Some(admin))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["role"], "admin");

        let second = json!({ "username": "boss2", "role": "admin" });
        let (status, _) = send(&app, request("POST", "/api/users", None, Some(second))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let id = created["id"].as_i64().unwrap();
        let (status, me) = send(&app, request("GET", "/api/users/me", Some(id), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["username"], "boss");
        Ok(())
    }

    #[tokio::test]
    async fn test_user_management_routes() -> Result<()> {
        let (db, cashier) = setup_with_user().await?;
        let other = create_test_user(&db, "temp").await?;
        let app = router(AppState::new(db));

        let admin = json!({ "username": "boss", "role": "admin" });
        let (_, created) = send(&app, request("POST", "/api/users", None, Some(admin))).await;
        let admin_id = created["id"].as_i64().unwrap();

        // Profile edits apply to the caller and cannot change the role
        let (status, me) = send(
            &app,
            request(
                "PUT",
                "/api/users/me",
                Some(cashier.id),
                Some(json!({ "fullName": "Casey Cashier", "role": "admin" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["fullName"], "Casey Cashier");
        assert_eq!(me["role"], "cashier");

        // Managing other users needs the administrator
        let uri = format!("/api/users/{}", other.id);
        let (status, _) = send(&app, request("DELETE", &uri, Some(cashier.id), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, renamed) = send(
            &app,
            request("PUT", &uri, Some(admin_id), Some(json!({ "username": "renamed" }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(renamed["username"], "renamed");

        let (status, body) = send(&app, request("DELETE", &uri, Some(admin_id), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User deleted successfully");

        let (status, _) = send(&app, request("DELETE", &uri, Some(admin_id), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }
}
