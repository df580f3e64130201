//! Shared response bodies.

use serde::{Deserialize, Serialize};

/// `{"message": ...}` acknowledgement.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
