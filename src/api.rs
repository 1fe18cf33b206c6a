//! HTTP surface: translates JSON requests into [`CartService`] operations
//! and domain errors into HTTP statuses.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;
use validator::Validate;

use crate::domain::aggregates::{CartView, Product};
use crate::domain::value_objects::Quantity;
use crate::service::CartService;
use crate::Error;

/// Builds the application router.
pub fn app(service: CartService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/products", get(list_products))
        .route("/carts", get(list_carts).post(create_cart))
        .route("/carts/:id", get(show_cart).delete(destroy_cart))
        .route("/carts/:id/add_product", post(add_product))
        .route("/carts/:id/remove_product", delete(remove_product))
        .route("/carts/:id/update_quantity", patch(update_quantity))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(service)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Error::CartNotFound | Error::ProductNotFound | Error::LineItemNotFound => {
                (StatusCode::NOT_FOUND, json!({ "error": self.to_string() }))
            }
            Error::InvalidQuantity(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": self.to_string() }),
            ),
            Error::Validation(errors) => (StatusCode::UNPROCESSABLE_ENTITY, json!(errors)),
            Error::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy", "service": "cartwheel" }))
}

async fn list_products(State(service): State<CartService>) -> Result<Json<Vec<Product>>, Error> {
    Ok(Json(service.products().await?))
}

async fn list_carts(State(service): State<CartService>) -> Result<Json<Vec<CartView>>, Error> {
    Ok(Json(service.list_carts().await?))
}

async fn create_cart(
    State(service): State<CartService>,
) -> Result<(StatusCode, Json<CartView>), Error> {
    Ok((StatusCode::CREATED, Json(service.create_cart().await?)))
}

async fn show_cart(
    State(service): State<CartService>,
    Path(id): Path<Uuid>,
) -> Result<Json<CartView>, Error> {
    Ok(Json(service.cart(id).await?))
}

async fn destroy_cart(
    State(service): State<CartService>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
    service.delete_cart(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddProductRequest {
    pub product_id: Uuid,
    /// Units to add; defaults to one.
    #[validate(range(min = 1))]
    pub quantity: Option<i64>,
}

async fn add_product(
    State(service): State<CartService>,
    Path(id): Path<Uuid>,
    Json(req): Json<AddProductRequest>,
) -> Result<Json<CartView>, Error> {
    req.validate()?;
    let quantity = Quantity::new(req.quantity.unwrap_or(1))?;
    Ok(Json(service.add_product(id, req.product_id, quantity).await?))
}

#[derive(Debug, Deserialize)]
pub struct RemoveProductRequest {
    pub product_id: Uuid,
}

async fn remove_product(
    State(service): State<CartService>,
    Path(id): Path<Uuid>,
    Json(req): Json<RemoveProductRequest>,
) -> Result<Json<CartView>, Error> {
    Ok(Json(service.remove_product(id, req.product_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub product_id: Uuid,
    /// Absolute new quantity; zero or below removes the line item.
    pub quantity: i64,
}

async fn update_quantity(
    State(service): State<CartService>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<CartView>, Error> {
    Ok(Json(
        service.set_quantity(id, req.product_id, req.quantity).await?,
    ))
}
