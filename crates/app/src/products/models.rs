//! Product Models

use jiff::Timestamp;
use serde::Serialize;

use crate::{
    ids::TypedId,
    validator::Validator,
};

const MAX_TITLE_BYTES: usize = 500;

pub type ProductId = TypedId<Product>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,

    /// Price in minor currency units.
    pub price: u64,
    pub version: i32,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub title: String,
    pub price: u64,
}

pub fn validate_new_product(v: &mut Validator, product: &NewProduct) {
    v.check(!product.title.is_empty(), "title", "must be provided");
    v.check(
        product.title.len() <= MAX_TITLE_BYTES,
        "title",
        "must not be more than 500 bytes long",
    );
    v.check(product.price > 0, "price", "must be a positive integer");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_price_are_required() {
        let mut v = Validator::new();

        validate_new_product(
            &mut v,
            &NewProduct {
                title: String::new(),
                price: 0,
            },
        );

        assert_eq!(v.errors().get("title"), Some("must be provided"));
        assert_eq!(v.errors().get("price"), Some("must be a positive integer"));
    }

    #[test]
    fn valid_product_passes() {
        let mut v = Validator::new();

        validate_new_product(
            &mut v,
            &NewProduct {
                title: "Widget".to_string(),
                price: 1_99,
            },
        );

        assert!(v.is_valid(), "title and price are fine");
    }
}
