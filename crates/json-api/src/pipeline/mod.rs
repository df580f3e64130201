//! Request pipeline hoops, outermost first: panic containment, CORS,
//! authentication and per-route authorization. Rate limiting lives in
//! [`crate::limiter`].

mod authentication;
mod authorize;
mod cors;
mod recover;

use salvo::Depot;
use turnstile_app::users::User;

pub(crate) use authentication::authenticate;
pub(crate) use authorize::{RequirePermission, require_activated, require_authenticated};
pub(crate) use cors::Cors;
pub(crate) use recover::RecoverPanic;

/// Who the current request is acting as.
#[derive(Debug, Clone, Default)]
pub(crate) enum Identity {
    #[default]
    Anonymous,
    User(Box<User>),
}

impl Identity {
    pub(crate) fn user(&self) -> Option<&User> {
        match self {
            Self::Anonymous => None,
            Self::User(user) => Some(user),
        }
    }
}

pub(crate) trait IdentityExt {
    fn identity(&self) -> Option<&Identity>;

    /// The authenticated user, if any.
    fn user(&self) -> Option<&User> {
        self.identity().and_then(Identity::user)
    }
}

impl IdentityExt for Depot {
    fn identity(&self) -> Option<&Identity> {
        self.obtain::<Identity>().ok()
    }
}
