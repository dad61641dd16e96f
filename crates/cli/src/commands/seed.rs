//! Seed the database with demo users and wishlists.
//!
//! Intended for local development: creates two users, a handful of
//! wishlists across visibility states, and a few items. Capability grants
//! are session-scoped and arrive at handoff, so none are seeded.

use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use secrecy::SecretString;

use wishbox_api::db::{self, ItemRepository, NewWishlist, UserRepository, WishlistRepository};
use wishbox_core::caller::OwnerProfile;
use wishbox_core::types::{ProductId, SessionToken, ShareToken, Slug, UserId, Visibility};
use wishbox_core::wishlist::Owner;

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] wishbox_api::db::RepositoryError),
}

/// Seed demo data.
///
/// # Errors
///
/// Returns `SeedError` if the database is unreachable or any insert fails.
pub async fn run() -> Result<(), SeedError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("WISHBOX_DATABASE_URL")
        .map_err(|_| SeedError::MissingEnvVar("WISHBOX_DATABASE_URL"))?;
    let pool = db::create_pool(&SecretString::from(database_url)).await?;

    let users = UserRepository::new(&pool);
    let wishlists = WishlistRepository::new(&pool);
    let items = ItemRepository::new(&pool);

    let ada = UserId::new(5);
    users
        .upsert(
            ada,
            &OwnerProfile {
                email: "ada@example.com".to_owned(),
                login: "ada".to_owned(),
                first_name: "Ada".to_owned(),
                last_name: "Lovelace".to_owned(),
            },
        )
        .await?;

    let grace = UserId::new(7);
    users
        .upsert(
            grace,
            &OwnerProfile {
                email: "grace@example.com".to_owned(),
                login: "grace".to_owned(),
                first_name: "Grace".to_owned(),
                last_name: "Hopper".to_owned(),
            },
        )
        .await?;

    let birthday = wishlists
        .create(NewWishlist {
            owner: Owner::User(ada),
            slug: Slug::new("Birthday"),
            name: "Birthday".to_owned(),
            share_token: ShareToken::generate(),
            visibility: Visibility::Private,
            is_default: true,
        })
        .await?;

    let holiday = wishlists
        .create(NewWishlist {
            owner: Owner::User(ada),
            slug: Slug::new("Holiday Gear"),
            name: "Holiday Gear".to_owned(),
            share_token: ShareToken::generate(),
            visibility: Visibility::Public,
            is_default: false,
        })
        .await?;

    wishlists
        .create(NewWishlist {
            owner: Owner::User(grace),
            slug: Slug::new("Workshop"),
            name: "Workshop".to_owned(),
            share_token: ShareToken::generate(),
            visibility: Visibility::Shared,
            is_default: true,
        })
        .await?;

    wishlists
        .create(NewWishlist {
            owner: Owner::Session {
                token: SessionToken::mint(),
                expires_at: Utc::now() + TimeDelta::days(30),
            },
            slug: Slug::new("Guest Picks"),
            name: "Guest Picks".to_owned(),
            share_token: ShareToken::generate(),
            visibility: Visibility::Private,
            is_default: false,
        })
        .await?;

    items
        .upsert(birthday.id, ProductId::new(1001), 1, Some(Decimal::new(2450, 2)))
        .await?;
    items
        .upsert(birthday.id, ProductId::new(1002), 2, Some(Decimal::new(990, 2)))
        .await?;
    items.upsert(holiday.id, ProductId::new(2001), 1, None).await?;

    tracing::info!("Seed complete: 2 users, 4 wishlists, 3 items");
    Ok(())
}
