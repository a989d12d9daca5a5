//! [`Context`]-related definitions.

use axum::{async_trait, extract::FromRequestParts};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use service::{
    command::{self, Command as _},
    domain::user::{self, session},
};

use crate::{define_error, AsError, Error};

/// Name of the cookie carrying a [`session::Token`].
pub const SESSION_COOKIE: &str = "auth_token";

/// Policy of the [`SESSION_COOKIE`] issued to clients.
#[derive(Clone, Copy, Debug, Default)]
pub struct SessionCookie {
    /// Indicates whether the cookie is marked `Secure`.
    pub secure: bool,
}

/// Request context.
#[derive(Debug)]
pub struct Context<S> {
    /// [`Service`] instance.
    ///
    /// [`Service`]: service::Service
    service: S,

    /// Cookies of the HTTP request.
    cookies: CookieJar,

    /// [`SessionCookie`] policy to remember sessions with.
    session_cookie: SessionCookie,
}

impl<S> Context<S> {
    /// Returns [`Service`] instance of this [`Context`].
    ///
    /// [`Service`]: service::Service
    #[must_use]
    pub const fn service(&self) -> &S {
        &self.service
    }

    /// Returns the cookies of this [`Context`] with the provided
    /// [`session::Token`] remembered in them, so the client presents it back
    /// on subsequent requests.
    #[must_use]
    pub fn remember_session(self, token: &session::Token) -> CookieJar {
        self.cookies.add(
            Cookie::build((SESSION_COOKIE, token.to_string()))
                .path("/")
                .http_only(true)
                .secure(self.session_cookie.secure)
                .same_site(SameSite::Lax),
        )
    }

    /// Authenticates the current HTTP request by its [`SESSION_COOKIE`],
    /// returning ID of the authenticated [`User`].
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - the current HTTP request carries no [`session::Token`];
    /// - the provided [`session::Token`] is malformed or expired.
    ///
    /// [`User`]: service::domain::User
    pub async fn current_user(&self) -> Result<user::Id, Error>
    where
        S: crate::Backend,
    {
        let token = self
            .cookies
            .get(SESSION_COOKIE)
            .map(|c| c.value().trim())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::from(AuthError::AuthorizationRequired))?;

        self.service
            .execute(command::AuthorizeUserSession {
                token: session::Token::from(token.to_owned()),
            })
            .await
            .map(|s| s.user_id)
            .map_err(AsError::into_error)
    }
}

#[async_trait]
impl<S, St> FromRequestParts<St> for Context<S>
where
    S: Clone + Send + Sync + 'static,
    St: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &St,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<S>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        let session_cookie = parts
            .extensions
            .get::<SessionCookie>()
            .copied()
            .unwrap_or_default();

        Ok(Self {
            service,
            cookies: CookieJar::from_headers(&parts.headers),
            session_cookie,
        })
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Token(
                session::VerifyError::Malformed | session::VerifyError::Expired,
            ) => Some(AuthError::AuthorizationRequired.into()),
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,
    }
}
