//! Get Product Handler

use std::sync::Arc;

use salvo::prelude::*;
use turnstile_app::products::ProductId;

use crate::{
    errors::ApiError,
    extensions::*,
    products::{handlers::ProductEnvelope, into_api_error},
    state::State,
};

/// Get Product Handler
///
/// Returns a product. Ids that are not positive integers are 404s.
#[handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<ProductEnvelope>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let id = req
        .param::<i64>("id")
        .filter(|id| *id > 0)
        .map(ProductId::new)
        .ok_or(ApiError::NotFound)?;

    let product = state
        .app
        .products
        .get_product(id)
        .await
        .map_err(into_api_error)?;

    Ok(Json(product.into()))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;
    use turnstile_app::{
        clock::SystemClock,
        context::AppContext,
        products::{MockProductsRepository, Product, ProductsError},
    };

    use crate::test_helpers::state_with_app;

    use super::*;

    fn make_service(products: MockProductsRepository) -> Service {
        let app = AppContext {
            products: Arc::new(products),
            ..AppContext::memory(Arc::new(SystemClock))
        };

        Service::new(
            Router::new()
                .hoop(inject(state_with_app(app)))
                .push(Router::with_path("v1/products/{id}").get(handler)),
        )
    }

    fn make_product(id: ProductId) -> Product {
        Product {
            id,
            title: "Widget".to_string(),
            price: 1_99,
            version: 1,
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn test_get_returns_200() -> TestResult {
        let mut products = MockProductsRepository::new();
        let id = ProductId::new(7);

        products
            .expect_get_product()
            .once()
            .withf(move |requested| *requested == id)
            .return_once(move |_| Ok(make_product(id)));

        products.expect_insert_product().never();

        let mut res = TestClient::get("http://example.com/v1/products/7")
            .send(&make_service(products))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));

        let body: ProductEnvelope = res.take_json().await?;

        assert_eq!(body.product.id, 7);
        assert_eq!(body.product.title, "Widget");
        assert_eq!(body.product.price, 1_99);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_product_returns_404() {
        let mut products = MockProductsRepository::new();

        products
            .expect_get_product()
            .once()
            .return_once(|_| Err(ProductsError::NotFound));

        products.expect_insert_product().never();

        let res = TestClient::get("http://example.com/v1/products/7")
            .send(&make_service(products))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_non_positive_or_garbage_ids_return_404() {
        for id in ["0", "-3", "abc"] {
            let mut products = MockProductsRepository::new();

            products.expect_get_product().never();
            products.expect_insert_product().never();

            let res = TestClient::get(format!("http://example.com/v1/products/{id}"))
                .send(&make_service(products))
                .await;

            assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND), "{id}");
        }
    }
}
