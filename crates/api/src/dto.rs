//! JSON DTOs returned by the REST surface.
//!
//! Domain objects never serialize directly; each response shape is mapped
//! explicitly so the wire format can hold still while the domain moves.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use wishbox_core::types::{ItemId, ProductId, UserId, Visibility, WishlistId};
use wishbox_core::wishlist::{Wishlist, WishlistItem};

/// One wishlist.
#[derive(Debug, Serialize)]
pub struct WishlistDto {
    pub id: WishlistId,
    /// Owner user id; absent for guest-owned wishlists.
    pub user_id: Option<UserId>,
    pub name: String,
    pub slug: String,
    /// The share token. Owners hand this out to grant read access to a
    /// `shared` wishlist. Guest session tokens are never exposed.
    pub token: String,
    pub visibility: Visibility,
    pub date_added: DateTime<Utc>,
    pub default: bool,
}

impl From<&Wishlist> for WishlistDto {
    fn from(wishlist: &Wishlist) -> Self {
        Self {
            id: wishlist.id,
            user_id: wishlist.owner.user_id(),
            name: wishlist.name.clone(),
            slug: wishlist.slug.as_str().to_owned(),
            token: wishlist.share_token.as_str().to_owned(),
            visibility: wishlist.visibility,
            date_added: wishlist.created_at,
            default: wishlist.is_default,
        }
    }
}

/// One wishlist item.
#[derive(Debug, Serialize)]
pub struct ItemDto {
    pub id: ItemId,
    pub wishlist_id: WishlistId,
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured when the product was added, if known.
    pub price: Option<Decimal>,
    pub date_added: DateTime<Utc>,
}

impl From<&WishlistItem> for ItemDto {
    fn from(item: &WishlistItem) -> Self {
        Self {
            id: item.id,
            wishlist_id: item.wishlist_id,
            product_id: item.product_id,
            quantity: item.quantity,
            price: item.price_at_add,
            date_added: item.added_at,
        }
    }
}

/// An item listing with its size, as the item endpoints return it.
#[derive(Debug, Serialize)]
pub struct ItemsPage {
    pub items: Vec<ItemDto>,
    pub size: usize,
}

impl ItemsPage {
    /// Map a full item listing.
    #[must_use]
    pub fn new(items: &[WishlistItem]) -> Self {
        let items: Vec<ItemDto> = items.iter().map(ItemDto::from).collect();
        let size = items.len();
        Self { items, size }
    }
}

/// Confirmation body for a deleted wishlist.
#[derive(Debug, Serialize)]
pub struct DeletedDto {
    pub id: WishlistId,
}
