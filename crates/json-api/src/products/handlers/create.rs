//! Create Product Handler

use std::sync::Arc;

use salvo::{http::header::LOCATION, prelude::*};
use serde::Deserialize;
use tracing::info;
use turnstile_app::{
    products::{NewProduct, validate_new_product},
    validator::Validator,
};

use crate::{
    errors::ApiError,
    extensions::*,
    products::{handlers::ProductEnvelope, into_api_error},
    state::State,
};

/// Create Product Request
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct CreateProductRequest {
    pub title: String,
    pub price: u64,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(request: CreateProductRequest) -> Self {
        NewProduct {
            title: request.title,
            price: request.price,
        }
    }
}

/// Create Product Handler
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let product: NewProduct = req.json_body::<CreateProductRequest>().await?.into();

    let mut v = Validator::new();

    validate_new_product(&mut v, &product);

    v.finish()?;

    let product = state
        .app
        .products
        .insert_product(product)
        .await
        .map_err(into_api_error)?;

    info!(product_id = %product.id, "product created");

    res.add_header(LOCATION, format!("/v1/products/{}", product.id), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(product.into()))
}
