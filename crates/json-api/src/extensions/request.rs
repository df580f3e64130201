//! Request body helpers.

use salvo::Request;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::ApiError;

/// Decode JSON request bodies into 400s instead of salvo's bare errors.
pub(crate) trait RequestExt {
    async fn json_body<T: DeserializeOwned>(&mut self) -> Result<T, ApiError>;
}

impl RequestExt for Request {
    async fn json_body<T: DeserializeOwned>(&mut self) -> Result<T, ApiError> {
        self.parse_json::<T>().await.map_err(|error| {
            debug!("rejected request body: {error}");

            ApiError::BadRequest("body contains badly-formed JSON".to_string())
        })
    }
}
