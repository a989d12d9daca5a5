//! Application provides API for interacting with the [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
mod context;
pub mod error;

use axum::{routing::post, Extension, Router};
use service::{command, domain, infra::database, query, Command, Query};
use tower_http::timeout::TimeoutLayer;
use tracerr::Traced;
// Used in binary.
use axum_client_ip as _;
use refinery as _;
use tokio as _;
use tracing_subscriber as _;
// Used in integration tests.
#[cfg(test)]
use http_body_util as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tower as _;

pub use self::{
    args::Args,
    config::Config,
    context::{Context, SessionCookie, SESSION_COOKIE},
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::Postgres>;

/// [`Service`] capable of serving the whole HTTP API.
///
/// [`Service`]: service::Service
pub trait Backend:
    Command<
        command::CreateUser,
        Ok = domain::User,
        Err = Traced<command::create_user::ExecutionError>,
    > + Command<
        command::CreateUserSession,
        Ok = command::create_user_session::Output,
        Err = Traced<command::create_user_session::ExecutionError>,
    > + Command<
        command::AuthorizeUserSession,
        Ok = domain::user::Session,
        Err = Traced<command::authorize_user_session::ExecutionError>,
    > + Command<
        command::SubmitOrder,
        Ok = command::submit_order::Output,
        Err = Traced<command::submit_order::ExecutionError>,
    > + Query<
        query::orders::ByOwner,
        Ok = Vec<domain::Order>,
        Err = Traced<database::Error>,
    > + Clone
    + Send
    + Sync
    + 'static
{
}

impl<T> Backend for T where
    T: Command<
            command::CreateUser,
            Ok = domain::User,
            Err = Traced<command::create_user::ExecutionError>,
        > + Command<
            command::CreateUserSession,
            Ok = command::create_user_session::Output,
            Err = Traced<command::create_user_session::ExecutionError>,
        > + Command<
            command::AuthorizeUserSession,
            Ok = domain::user::Session,
            Err = Traced<command::authorize_user_session::ExecutionError>,
        > + Command<
            command::SubmitOrder,
            Ok = command::submit_order::Output,
            Err = Traced<command::submit_order::ExecutionError>,
        > + Query<
            query::orders::ByOwner,
            Ok = Vec<domain::Order>,
            Err = Traced<database::Error>,
        > + Clone
        + Send
        + Sync
        + 'static
{
}

/// Builds the HTTP API [`Router`] over the provided [`Backend`], applying the
/// request deadline and the session cookie policy of the provided
/// [`config::Server`].
pub fn router<S: Backend>(service: S, server: &config::Server) -> Router {
    Router::new()
        .route("/api/user/register", post(api::user::register::<S>))
        .route("/api/user/login", post(api::user::login::<S>))
        .route(
            "/api/user/orders",
            post(api::order::upload::<S>).get(api::order::list::<S>),
        )
        .layer(Extension(service))
        .layer(Extension(SessionCookie {
            secure: server.secure_cookies,
        }))
        .layer(TimeoutLayer::new(server.request_timeout))
}
