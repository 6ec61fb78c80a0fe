//! Caller identity resolution for endpoints open to anonymous callers.
//!
//! Resolution order: a valid bearer token yields [`Identity::User`]; a bearer
//! that fails validation yields [`Identity::Anonymous`] without consulting
//! the trial cookie. Otherwise a valid `trial_token` cookie yields
//! [`Identity::Trial`], and an invalid one is scheduled for removal.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use breedid_core::trial::TRIAL_COOKIE_NAME;
use breedid_core::types::DbId;

use super::auth::{authorization_header, user_from_token, AuthUser};
use crate::auth::trial_token;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User(AuthUser),
    Trial { trial_id: DbId },
    Anonymous,
}

/// The caller's identity plus the cookie jar to return with the response.
///
/// Handlers must include `jar` in their response so that cookie removals and
/// newly issued trial cookies reach the client.
#[derive(Debug)]
pub struct ResolvedIdentity {
    pub identity: Identity,
    pub jar: CookieJar,
    /// An invalid trial cookie was presented and `jar` removes it.
    pub discarded_cookie: bool,
}

impl ResolvedIdentity {
    fn keep(identity: Identity, jar: CookieJar) -> Self {
        Self {
            identity,
            jar,
            discarded_cookie: false,
        }
    }
}

impl FromRequestParts<AppState> for ResolvedIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);

        if let Some(header) = authorization_header(parts) {
            let identity = header
                .strip_prefix("Bearer ")
                .and_then(|token| user_from_token(token, state).ok())
                .map(Identity::User)
                .unwrap_or(Identity::Anonymous);
            return Ok(Self::keep(identity, jar));
        }

        let Some(cookie) = jar.get(TRIAL_COOKIE_NAME) else {
            return Ok(Self::keep(Identity::Anonymous, jar));
        };

        match trial_token::verify(cookie.value(), &state.config.jwt.secret) {
            Ok(claims) => Ok(Self::keep(
                Identity::Trial {
                    trial_id: claims.trial_id,
                },
                jar,
            )),
            Err(e) => {
                tracing::debug!(error = %e, "Discarding invalid trial cookie");
                Ok(ResolvedIdentity {
                    identity: Identity::Anonymous,
                    jar: jar.remove(trial_token::removal_cookie()),
                    discarded_cookie: true,
                })
            }
        }
    }
}
