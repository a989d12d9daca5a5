//! [`User`]-related HTTP API.
//!
//! [`User`]: service::domain::User

use axum::{extract::rejection::JsonRejection, Json};
use axum_extra::extract::CookieJar;
use derive_more::Debug;
use secrecy::SecretBox;
use serde::Deserialize;
use service::{command, domain::user, Command as _};
use tracing as log;

use crate::{define_error, AsError, Backend, Context, Error};

/// Credentials of a [`User`] in a request body.
///
/// [`User`]: service::domain::User
#[derive(Clone, Debug, Deserialize)]
pub struct Credentials {
    /// Login of the [`User`], surrounding whitespace is ignored.
    ///
    /// [`User`]: service::domain::User
    pub login: String,

    /// Password of the [`User`].
    ///
    /// [`User`]: service::domain::User
    #[debug(skip)]
    pub password: String,
}

impl Credentials {
    /// Validates these [`Credentials`].
    ///
    /// # Errors
    ///
    /// If the login is blank or too long, or the password is empty.
    fn validate(
        self,
    ) -> Result<(user::Login, SecretBox<user::Password>), Error> {
        let login = user::Login::new(&self.login)
            .ok_or(CredentialsError::InvalidLogin)?;
        let password = user::Password::new(self.password)
            .ok_or(CredentialsError::EmptyPassword)?;
        Ok((login, SecretBox::new(Box::new(password))))
    }
}

/// Registers a new [`User`] and starts a session for them.
///
/// # Errors
///
/// Possible error codes:
/// - `BAD_REQUEST` - request body is not valid JSON [`Credentials`];
/// - `INVALID_LOGIN` - login is blank or too long;
/// - `EMPTY_PASSWORD` - password is empty;
/// - `LOGIN_OCCUPIED` - login is occupied by another [`User`].
///
/// [`User`]: service::domain::User
#[tracing::instrument(
    skip_all,
    fields(http.route = "/api/user/register", login = tracing::field::Empty),
)]
pub async fn register<S: Backend>(
    ctx: Context<S>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<CookieJar, Error> {
    let Json(credentials) = body.map_err(AsError::into_error)?;
    let (login, password) = credentials.validate()?;
    _ = tracing::Span::current()
        .record("login", tracing::field::display(&login));

    let user = ctx
        .service()
        .execute(command::CreateUser { login, password })
        .await
        .map_err(AsError::into_error)?;
    let output = ctx
        .service()
        .execute(command::CreateUserSession::ByUserId(user.id))
        .await
        .map_err(AsError::into_error)?;

    log::info!(user.id = %user.id, "`User` registered");

    Ok(ctx.remember_session(&output.token))
}

/// Logs a [`User`] in by their [`Credentials`] and starts a session for them.
///
/// # Errors
///
/// Possible error codes:
/// - `BAD_REQUEST` - request body is not valid JSON [`Credentials`];
/// - `INVALID_LOGIN` - login is blank or too long;
/// - `EMPTY_PASSWORD` - password is empty;
/// - `WRONG_CREDENTIALS` - credentials don't match any [`User`].
///
/// [`User`]: service::domain::User
#[tracing::instrument(
    skip_all,
    fields(http.route = "/api/user/login", login = tracing::field::Empty),
)]
pub async fn login<S: Backend>(
    ctx: Context<S>,
    body: Result<Json<Credentials>, JsonRejection>,
) -> Result<CookieJar, Error> {
    let Json(credentials) = body.map_err(AsError::into_error)?;
    let (login, password) = credentials.validate()?;
    _ = tracing::Span::current()
        .record("login", tracing::field::display(&login));

    let output = ctx
        .service()
        .execute(command::CreateUserSession::ByCredentials { login, password })
        .await
        .map_err(AsError::into_error)?;

    log::debug!(user.id = %output.session.user_id, "`User` logged in");

    Ok(ctx.remember_session(&output.token))
}

define_error! {
    enum CredentialsError {
        #[code = "INVALID_LOGIN"]
        #[status = BAD_REQUEST]
        #[message = "Login must be non-blank and at most 255 bytes long"]
        InvalidLogin,

        #[code = "EMPTY_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "Password must not be empty"]
        EmptyPassword,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "Login is occupied by another `User`"]
                LoginOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LoginOccupied(_) => Some(Error::LoginOccupied.into()),
            Self::PasswordHash(_) | Self::HashingTask(_) => None,
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = UNAUTHORIZED]
                #[message = "Provided credentials don't match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::WrongCredentials => Some(Error::WrongCredentials.into()),
            Self::PasswordCheck(_) | Self::CheckingTask(_) | Self::Issue(_) => {
                None
            }
        }
    }
}
