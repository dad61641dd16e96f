//! Wishlist collection and record routes.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;

use wishbox_core::caller::CallerContext;
use wishbox_core::criteria::FilterCriteria;
use wishbox_core::policy::Action;
use wishbox_core::query::WishlistQuery;
use wishbox_core::types::{ProductId, ShareToken, Slug, Visibility, WishlistId};
use wishbox_core::wishlist::Owner;

use crate::db::{ItemRepository, NewWishlist, WishlistRepository};
use crate::dto::{DeletedDto, WishlistDto};
use crate::error::AppError;
use crate::middleware::{Caller, require_export, require_identified, require_record};
use crate::state::AppState;

/// List the caller's wishlists.
///
/// GET /api/v2/wishlists
///
/// Accepts the full filter criteria in the query string; non-elevated
/// callers are always scoped to their own records regardless of what they
/// pass.
///
/// # Errors
///
/// Returns 401 for unidentified callers, 500 on storage failures.
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Caller(caller): Caller,
    Query(criteria): Query<FilterCriteria>,
) -> Result<Json<Vec<WishlistDto>>, AppError> {
    require_identified(&session, &caller).await?;

    let scoped = WishlistQuery::resolve(&criteria, &caller);
    let records = WishlistRepository::new(state.pool()).find(&scoped).await?;

    Ok(Json(records.iter().map(WishlistDto::from).collect()))
}

/// Export wishlists across all owners.
///
/// GET /api/v2/wishlists/export
///
/// The only route where caller-supplied `user_id`/`session_id` filters are
/// honored.
///
/// # Errors
///
/// Returns 401/403 without the export capability, 500 on storage failures.
pub async fn export(
    State(state): State<AppState>,
    session: Session,
    Caller(caller): Caller,
    Query(criteria): Query<FilterCriteria>,
) -> Result<Json<Vec<WishlistDto>>, AppError> {
    require_export(&session, &caller).await?;

    let scoped = WishlistQuery::resolve(&criteria, &caller);
    let records = WishlistRepository::new(state.pool()).find(&scoped).await?;

    Ok(Json(records.iter().map(WishlistDto::from).collect()))
}

/// Create request body.
#[derive(Debug, Deserialize)]
pub struct CreateWishlist {
    pub name: String,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Create a wishlist for the caller.
///
/// POST /api/v2/wishlists
///
/// The caller's first wishlist becomes their default.
///
/// # Errors
///
/// Returns 401 for unidentified callers, 422 for an unusable name, 409 when
/// the owner already has a wishlist with the same slug.
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Caller(caller): Caller,
    Json(body): Json<CreateWishlist>,
) -> Result<(StatusCode, Json<WishlistDto>), AppError> {
    require_identified(&session, &caller).await?;

    let name = body.name.trim();
    if name.is_empty() {
        return Err(
            wishbox_core::Error::InvalidArgument("name must not be empty".to_owned()).into(),
        );
    }

    let slug = Slug::new(body.slug.as_deref().unwrap_or(name));
    if slug.is_empty() {
        return Err(wishbox_core::Error::InvalidArgument(
            "name does not produce a usable slug".to_owned(),
        )
        .into());
    }

    let owner = owner_of(&caller)?;
    let repo = WishlistRepository::new(state.pool());
    let is_default = repo.count_for_owner(&owner).await? == 0;

    let created = repo
        .create(NewWishlist {
            owner,
            slug,
            name: name.to_owned(),
            share_token: ShareToken::generate(),
            visibility: body.visibility.unwrap_or(Visibility::Private),
            is_default,
        })
        .await?;

    tracing::info!(wishlist_id = %created.id, "wishlist created");

    Ok((StatusCode::CREATED, Json(WishlistDto::from(&created))))
}

/// Fetch a single wishlist.
///
/// GET /api/v2/wishlists/{id}
///
/// # Errors
///
/// Returns 404 for ids that resolve to no live record, 401/403 per the
/// access policy.
pub async fn get(
    State(state): State<AppState>,
    session: Session,
    Caller(caller): Caller,
    Path(id): Path<WishlistId>,
) -> Result<Json<WishlistDto>, AppError> {
    let record = load(&state, id).await?;
    require_record(&session, &caller, Action::Read, &record).await?;

    Ok(Json(WishlistDto::from(&record)))
}

/// Update request body.
#[derive(Debug, Deserialize)]
pub struct UpdateWishlist {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Replaces the full product list when present.
    #[serde(default)]
    pub product_ids: Option<Vec<ProductId>>,
}

/// Update a wishlist and/or replace its product list.
///
/// PUT /api/v2/wishlists/{id}
///
/// # Errors
///
/// Returns 422 when the body changes nothing, 404/401/403 per policy.
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Caller(caller): Caller,
    Path(id): Path<WishlistId>,
    Json(body): Json<UpdateWishlist>,
) -> Result<Json<WishlistDto>, AppError> {
    if body.name.is_none() && body.visibility.is_none() && body.product_ids.is_none() {
        return Err(wishbox_core::Error::InvalidArgument(
            "update requires a name, a visibility, or a product list".to_owned(),
        )
        .into());
    }

    let name = match &body.name {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                return Err(wishbox_core::Error::InvalidArgument(
                    "name must not be empty".to_owned(),
                )
                .into());
            }
            Some(trimmed)
        }
        None => None,
    };

    let record = load(&state, id).await?;
    require_record(&session, &caller, Action::Write, &record).await?;

    let repo = WishlistRepository::new(state.pool());
    if name.is_some() || body.visibility.is_some() {
        repo.update_meta(id, name, body.visibility).await?;
    }
    if let Some(products) = &body.product_ids {
        ItemRepository::new(state.pool()).replace(id, products).await?;
    }

    let updated = load(&state, id).await?;
    Ok(Json(WishlistDto::from(&updated)))
}

/// Delete a wishlist.
///
/// DELETE /api/v2/wishlists/{id}
///
/// # Errors
///
/// Returns 404/401/403 per policy.
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Caller(caller): Caller,
    Path(id): Path<WishlistId>,
) -> Result<Json<DeletedDto>, AppError> {
    let record = load(&state, id).await?;
    require_record(&session, &caller, Action::Write, &record).await?;

    WishlistRepository::new(state.pool()).delete(id).await?;
    tracing::info!(wishlist_id = %id, "wishlist deleted");

    Ok(Json(DeletedDto { id }))
}

/// Load a live record or fail with the uniform not-found outcome.
pub(super) async fn load(state: &AppState, id: WishlistId) -> Result<wishbox_core::Wishlist, AppError> {
    WishlistRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| wishbox_core::Error::NotFound(id).into())
}

fn owner_of(caller: &CallerContext) -> Result<Owner, AppError> {
    if let Some(id) = caller.user_id() {
        Ok(Owner::User(id))
    } else if let Some((token, expires_at)) = caller.active_session() {
        Ok(Owner::Session {
            token: token.clone(),
            expires_at,
        })
    } else {
        Err(wishbox_core::Error::Unauthenticated.into())
    }
}
