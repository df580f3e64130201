//! Product Errors

use tracing::error;
use turnstile_app::products::ProductsError;

use crate::errors::ApiError;

pub(crate) fn into_api_error(error: ProductsError) -> ApiError {
    match error {
        ProductsError::NotFound => ApiError::NotFound,
        ProductsError::InvalidData => ApiError::BadRequest("invalid product payload".to_string()),
        ProductsError::Sql(source) => {
            error!("products storage failure: {source}");

            ApiError::Internal
        }
        ProductsError::InvalidPrice(source) => {
            error!("stored product price out of range: {source}");

            ApiError::Internal
        }
    }
}
