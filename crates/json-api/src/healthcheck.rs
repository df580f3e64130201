//! Healthcheck Handler

use std::sync::Arc;

use salvo::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{errors::ApiError, extensions::*, state::State};

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SystemInfo {
    pub environment: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct HealthResponse {
    pub status: String,
    pub system_info: SystemInfo,
}

/// Reports that the server is up, with its environment and version.
#[handler]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<HealthResponse>, ApiError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    Ok(Json(HealthResponse {
        status: "available".to_string(),
        system_info: SystemInfo {
            environment: state.environment.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    }))
}
