//! Wishlist item routes.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;

use wishbox_core::policy::Action;
use wishbox_core::types::{ProductId, WishlistId};

use crate::db::ItemRepository;
use crate::dto::ItemsPage;
use crate::error::AppError;
use crate::middleware::{Caller, require_record};
use crate::state::AppState;

use super::wishlists::load;

/// List the items of a wishlist.
///
/// GET /api/v2/wishlists/{id}/products
///
/// # Errors
///
/// Returns 404/401/403 per the access policy.
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Caller(caller): Caller,
    Path(id): Path<WishlistId>,
) -> Result<Json<ItemsPage>, AppError> {
    let record = load(&state, id).await?;
    require_record(&session, &caller, Action::Read, &record).await?;

    let items = ItemRepository::new(state.pool()).list(id).await?;
    Ok(Json(ItemsPage::new(&items)))
}

/// Add request body.
#[derive(Debug, Default, Deserialize)]
pub struct AddItem {
    /// Desired quantity, default 1. Zero is allowed.
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Current unit price, captured on the item.
    #[serde(default)]
    pub price: Option<Decimal>,
}

/// Add a product to a wishlist (or refresh its quantity).
///
/// POST /api/v2/wishlists/{id}/products/{product_id}
///
/// Returns the wishlist's full item listing, like the other item routes.
///
/// # Errors
///
/// Returns 404/401/403 per the access policy.
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Caller(caller): Caller,
    Path((id, product_id)): Path<(WishlistId, ProductId)>,
    body: Option<Json<AddItem>>,
) -> Result<Json<ItemsPage>, AppError> {
    let record = load(&state, id).await?;
    require_record(&session, &caller, Action::Write, &record).await?;

    let body = body.map(|Json(inner)| inner).unwrap_or_default();
    let quantity = body.quantity.unwrap_or(1);

    let repo = ItemRepository::new(state.pool());
    repo.upsert(id, product_id, quantity, body.price).await?;
    tracing::info!(wishlist_id = %id, product_id = %product_id, quantity, "item added");

    let items = repo.list(id).await?;
    Ok(Json(ItemsPage::new(&items)))
}

/// Removal parameters.
#[derive(Debug, Default, Deserialize)]
pub struct RemoveParams {
    /// Push the item into the caller's cart before removing it. If the cart
    /// gateway declines (or none is configured) the item stays.
    #[serde(default)]
    pub add_to_cart: bool,
}

/// Remove a product from a wishlist, optionally moving it to the cart.
///
/// DELETE /api/v2/wishlists/{id}/products/{product_id}
///
/// The cart call resolves the quantity from the stored item, defaulting to
/// 1 when the product is not actually on the list.
///
/// # Errors
///
/// Returns 404/401/403 per the access policy.
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Caller(caller): Caller,
    Path((id, product_id)): Path<(WishlistId, ProductId)>,
    Query(params): Query<RemoveParams>,
) -> Result<Json<ItemsPage>, AppError> {
    let record = load(&state, id).await?;
    require_record(&session, &caller, Action::Write, &record).await?;

    let repo = ItemRepository::new(state.pool());

    let mut can_remove = true;
    if params.add_to_cart {
        let quantity = repo
            .get(id, product_id)
            .await?
            .map_or(1, |item| item.quantity);

        can_remove = match state.cart() {
            Some(cart) => match cart.add_to_cart(caller.user_id(), product_id, quantity).await {
                Ok(()) => true,
                Err(error) => {
                    tracing::warn!(%error, product_id = %product_id, "cart gateway declined the item; keeping it");
                    false
                }
            },
            None => {
                tracing::warn!("move-to-cart requested but no cart gateway is configured");
                false
            }
        };
    }

    if can_remove {
        repo.remove(id, product_id).await?;
        tracing::info!(wishlist_id = %id, product_id = %product_id, "item removed");
    }

    let items = repo.list(id).await?;
    Ok(Json(ItemsPage::new(&items)))
}
