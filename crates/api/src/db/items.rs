//! Wishlist item repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use wishbox_core::types::{ItemId, ProductId, WishlistId};
use wishbox_core::wishlist::WishlistItem;

use super::RepositoryError;

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    wishlist_id: i64,
    product_id: i64,
    quantity: i32,
    price_at_add: Option<Decimal>,
    added_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_domain(self) -> Result<WishlistItem, RepositoryError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "item {} has negative quantity {}",
                self.id, self.quantity
            ))
        })?;

        Ok(WishlistItem {
            id: ItemId::new(self.id),
            wishlist_id: WishlistId::new(self.wishlist_id),
            product_id: ProductId::new(self.product_id),
            quantity,
            price_at_add: self.price_at_add,
            added_at: self.added_at,
        })
    }
}

/// Repository for wishlist items.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the items of a wishlist, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, wishlist: WishlistId) -> Result<Vec<WishlistItem>, RepositoryError> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            "SELECT id, wishlist_id, product_id, quantity, price_at_add, added_at \
             FROM wishbox.wishlist_items \
             WHERE wishlist_id = $1 \
             ORDER BY added_at ASC",
        )
        .bind(wishlist.as_i64())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(ItemRow::into_domain).collect()
    }

    /// Look up one product entry in a wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        wishlist: WishlistId,
        product: ProductId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let row: Option<ItemRow> = sqlx::query_as(
            "SELECT id, wishlist_id, product_id, quantity, price_at_add, added_at \
             FROM wishbox.wishlist_items \
             WHERE wishlist_id = $1 AND product_id = $2",
        )
        .bind(wishlist.as_i64())
        .bind(product.as_i64())
        .fetch_optional(self.pool)
        .await?;

        row.map(ItemRow::into_domain).transpose()
    }

    /// Add a product to a wishlist, or refresh its quantity (and captured
    /// price, when supplied) if it is already there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(
        &self,
        wishlist: WishlistId,
        product: ProductId,
        quantity: u32,
        price_at_add: Option<Decimal>,
    ) -> Result<WishlistItem, RepositoryError> {
        let quantity = i32::try_from(quantity).unwrap_or(i32::MAX);

        let row: ItemRow = sqlx::query_as(
            "INSERT INTO wishbox.wishlist_items (wishlist_id, product_id, quantity, price_at_add) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (wishlist_id, product_id) DO UPDATE \
             SET quantity = EXCLUDED.quantity, \
                 price_at_add = COALESCE(EXCLUDED.price_at_add, wishlist_items.price_at_add) \
             RETURNING id, wishlist_id, product_id, quantity, price_at_add, added_at",
        )
        .bind(wishlist.as_i64())
        .bind(product.as_i64())
        .bind(quantity)
        .bind(price_at_add)
        .fetch_one(self.pool)
        .await?;

        row.into_domain()
    }

    /// Remove a product from a wishlist.
    ///
    /// # Returns
    ///
    /// Returns `true` if an item was removed, `false` if it wasn't there.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        wishlist: WishlistId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM wishbox.wishlist_items WHERE wishlist_id = $1 AND product_id = $2")
                .bind(wishlist.as_i64())
                .bind(product.as_i64())
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Replace the full product list of a wishlist. New entries get
    /// quantity 1 and no captured price.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// replacement is transactional.
    pub async fn replace(
        &self,
        wishlist: WishlistId,
        products: &[ProductId],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM wishbox.wishlist_items WHERE wishlist_id = $1")
            .bind(wishlist.as_i64())
            .execute(&mut *tx)
            .await?;

        for product in products {
            sqlx::query(
                "INSERT INTO wishbox.wishlist_items (wishlist_id, product_id, quantity) \
                 VALUES ($1, $2, 1) \
                 ON CONFLICT (wishlist_id, product_id) DO NOTHING",
            )
            .bind(wishlist.as_i64())
            .bind(product.as_i64())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_negative_stored_quantity_is_corruption() {
        let row = ItemRow {
            id: 1,
            wishlist_id: 10,
            product_id: 100,
            quantity: -2,
            price_at_add: None,
            added_at: Utc::now(),
        };
        assert!(matches!(
            row.into_domain(),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_row_maps_to_domain() {
        let row = ItemRow {
            id: 1,
            wishlist_id: 10,
            product_id: 100,
            quantity: 3,
            price_at_add: Some(Decimal::new(1999, 2)),
            added_at: Utc::now(),
        };
        let item = row.into_domain().expect("valid row");
        assert_eq!(item.quantity, 3);
        assert_eq!(item.product_id, ProductId::new(100));
        assert_eq!(item.price_at_add, Some(Decimal::new(1999, 2)));
    }
}
