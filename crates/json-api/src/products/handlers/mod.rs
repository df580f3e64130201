//! Product Handlers

pub(crate) mod create;
pub(crate) mod get;

use serde::{Deserialize, Serialize};
use turnstile_app::products::Product;

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProductResponse {
    pub id: i64,
    pub title: String,

    /// Price in minor currency units.
    pub price: u64,
    pub version: i32,
    pub created_at: String,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id.into_inner(),
            title: product.title,
            price: product.price,
            version: product.version,
            created_at: product.created_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ProductEnvelope {
    pub product: ProductResponse,
}

impl From<Product> for ProductEnvelope {
    fn from(product: Product) -> Self {
        Self {
            product: product.into(),
        }
    }
}
