//! Per-route authorization hoops. Each expects [`super::authenticate`] to
//! have run first.

use std::sync::Arc;

use salvo::prelude::*;
use tokio::time::timeout;
use tracing::error;
use turnstile_app::users::User;

use crate::{errors::ApiError, extensions::*, pipeline::IdentityExt, state::State};

fn authenticated(depot: &Depot) -> Result<&User, ApiError> {
    depot.user().ok_or(ApiError::AuthenticationRequired)
}

fn activated(depot: &Depot) -> Result<&User, ApiError> {
    let user = authenticated(depot)?;

    if !user.activated {
        return Err(ApiError::InactiveAccount);
    }

    Ok(user)
}

async fn guard(
    check: Result<(), ApiError>,
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    match check {
        Ok(()) => {
            ctrl.call_next(req, depot, res).await;
        }
        Err(error) => {
            res.render(error);

            ctrl.skip_rest();
        }
    }
}

/// 401 unless the request carries a valid authentication token.
#[handler]
pub(crate) async fn require_authenticated(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let check = authenticated(depot).map(|_user| ());

    guard(check, req, depot, res, ctrl).await;
}

/// As [`require_authenticated`], then 403 unless the account is activated.
#[handler]
pub(crate) async fn require_activated(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let check = activated(depot).map(|_user| ());

    guard(check, req, depot, res, ctrl).await;
}

/// As [`require_activated`], then 403 unless the user holds `code`.
#[derive(Debug, Clone)]
pub(crate) struct RequirePermission {
    code: &'static str,
}

impl RequirePermission {
    pub(crate) fn new(code: &'static str) -> Self {
        Self { code }
    }

    async fn check(&self, depot: &Depot) -> Result<(), ApiError> {
        let user_id = activated(depot)?.id;
        let state = depot.obtain_or_500::<Arc<State>>()?;

        let permissions = match timeout(
            state.storage_deadline,
            state.app.permissions.load_for_user(user_id),
        )
        .await
        {
            Err(_elapsed) => {
                error!(user_id = %user_id, "permission lookup exceeded the storage deadline");

                return Err(ApiError::Unavailable);
            }
            Ok(result) => result.or_500("failed to load permissions")?,
        };

        if !permissions.includes(self.code) {
            return Err(ApiError::NotPermitted);
        }

        Ok(())
    }
}

#[handler]
impl RequirePermission {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let check = self.check(depot).await;

        guard(check, req, depot, res, ctrl).await;
    }
}
