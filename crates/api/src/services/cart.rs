//! Cart gateway client.
//!
//! "Remove with move to cart" hands the item to the commerce platform's cart
//! service before deleting it. The cart itself is not ours: this client makes
//! the one call and reports whether it was accepted. When the gateway is not
//! configured or rejects the call, the caller keeps the item.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use wishbox_core::types::{ProductId, UserId};

/// Errors from the cart gateway call.
#[derive(Debug, Error)]
pub enum CartError {
    /// The request could not be sent or the response not read.
    #[error("cart request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway answered with a non-success status.
    #[error("cart gateway rejected the item (status {status})")]
    Rejected { status: StatusCode },
}

#[derive(Debug, Serialize)]
struct AddToCartRequest {
    product_id: ProductId,
    quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,
}

/// HTTP client for the cart gateway.
#[derive(Debug, Clone)]
pub struct CartClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl CartClient {
    /// Build a client for the given gateway endpoint.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(endpoint: Url) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self { http, endpoint })
    }

    /// Push a product into the caller's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Http` on transport failures and
    /// `CartError::Rejected` when the gateway refuses the item.
    pub async fn add_to_cart(
        &self,
        user_id: Option<UserId>,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&AddToCartRequest {
                product_id,
                quantity,
                user_id,
            })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(CartError::Rejected { status })
        }
    }
}
