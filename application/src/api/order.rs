//! [`Order`]-related HTTP API.

use axum::{
    body::Bytes,
    response::{IntoResponse as _, Response},
    Json,
};
use axum_extra::{headers::ContentType, TypedHeader};
use common::DateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use service::{
    command::{self, submit_order},
    domain::{self, order},
    query, Command as _,
};
use tracing as log;

use crate::{define_error, AsError, Backend, Context, Error};

/// [`Order`] as listed to its owner.
///
/// [`Order`]: domain::Order
#[derive(Clone, Debug, Serialize)]
pub struct Order {
    /// Number of the [`Order`].
    ///
    /// [`Order`]: domain::Order
    pub number: String,

    /// Processing status of the [`Order`].
    ///
    /// [`Order`]: domain::Order
    pub status: String,

    /// Loyalty points accrued for the [`Order`], if any.
    ///
    /// [`Order`]: domain::Order
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub accrual: Option<Decimal>,

    /// [`DateTime`] when the [`Order`] was uploaded.
    ///
    /// [`Order`]: domain::Order
    #[serde(serialize_with = "common::datetime::serde::rfc3339::serialize")]
    pub uploaded_at: DateTime,
}

impl From<domain::Order> for Order {
    fn from(order: domain::Order) -> Self {
        Self {
            number: order.number.to_string(),
            status: order.status.to_string(),
            accrual: order.accrual.map(Into::into),
            uploaded_at: order.uploaded_at.coerce(),
        }
    }
}

/// Uploads an [`Order`] number in a `text/plain` body on behalf of the
/// authenticated [`User`].
///
/// Responds with `202 Accepted` once the [`Order`] is newly accepted, and with
/// `200 OK` if the same [`User`] has uploaded it already.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` - no valid session;
/// - `INVALID_CONTENT_TYPE` - request body is not `text/plain`;
/// - `INVALID_ORDER_NUMBER_FORMAT` - number is not digits only;
/// - `INVALID_ORDER_NUMBER` - number fails Luhn checksum;
/// - `ORDER_OWNED_BY_ANOTHER_USER` - number is uploaded by another [`User`].
///
/// [`Order`]: domain::Order
/// [`User`]: domain::User
#[tracing::instrument(
    skip_all,
    fields(http.route = "/api/user/orders", user.id = tracing::field::Empty),
)]
pub async fn upload<S: Backend>(
    ctx: Context<S>,
    content_type: Option<TypedHeader<ContentType>>,
    body: Bytes,
) -> Result<http::StatusCode, Error> {
    let user_id = ctx.current_user().await?;
    _ = tracing::Span::current()
        .record("user.id", tracing::field::display(user_id));

    if !content_type.is_some_and(|TypedHeader(ct)| is_plain_text(&ct)) {
        return Err(OrderError::InvalidContentType.into());
    }

    let output = ctx
        .service()
        .execute(command::SubmitOrder {
            user_id,
            number: String::from_utf8_lossy(&body).into_owned(),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(match output {
        submit_order::Output::Accepted => http::StatusCode::ACCEPTED,
        submit_order::Output::AlreadySubmitted => http::StatusCode::OK,
    })
}

/// Lists all the [`Order`]s uploaded by the authenticated [`User`], the most
/// recently uploaded first.
///
/// Responds with `204 No Content` if there are none.
///
/// # Errors
///
/// Possible error codes:
/// - `AUTHORIZATION_REQUIRED` - no valid session.
///
/// [`Order`]: domain::Order
/// [`User`]: domain::User
#[tracing::instrument(
    skip_all,
    fields(http.route = "/api/user/orders", user.id = tracing::field::Empty),
)]
pub async fn list<S: Backend>(ctx: Context<S>) -> Result<Response, Error> {
    let user_id = ctx.current_user().await?;
    _ = tracing::Span::current()
        .record("user.id", tracing::field::display(user_id));

    let orders = ctx
        .service()
        .execute(query::orders::ByOwner::by(user_id))
        .await
        .map_err(AsError::into_error)?;
    log::debug!(count = orders.len(), "`Order`s listed");

    if orders.is_empty() {
        return Ok(http::StatusCode::NO_CONTENT.into_response());
    }
    Ok(Json(orders.into_iter().map(Order::from).collect::<Vec<_>>())
        .into_response())
}

/// Indicates whether the provided [`ContentType`] is `text/plain`, with any
/// parameters.
fn is_plain_text(content_type: &ContentType) -> bool {
    content_type
        .to_string()
        .split(';')
        .next()
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("text/plain"))
}

define_error! {
    enum OrderError {
        #[code = "INVALID_CONTENT_TYPE"]
        #[status = BAD_REQUEST]
        #[message = "`Order` number must be sent as `text/plain`"]
        InvalidContentType,
    }
}

impl AsError for command::submit_order::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_ORDER_NUMBER_FORMAT"]
                #[status = BAD_REQUEST]
                #[message = "`Order` number must consist of digits only"]
                Format,

                #[code = "INVALID_ORDER_NUMBER"]
                #[status = UNPROCESSABLE_ENTITY]
                #[message = "`Order` number fails Luhn checksum"]
                Checksum,

                #[code = "ORDER_OWNED_BY_ANOTHER_USER"]
                #[status = CONFLICT]
                #[message = "`Order` has been uploaded by another `User`"]
                OwnedByAnotherUser,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidNumber(order::NumberError::Format) => {
                Some(Error::Format.into())
            }
            Self::InvalidNumber(order::NumberError::Checksum) => {
                Some(Error::Checksum.into())
            }
            Self::OwnedByAnotherUser(_) => Some(Error::OwnedByAnotherUser.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use axum_extra::headers::ContentType;

    use super::is_plain_text;

    #[test]
    fn detects_plain_text() {
        assert!(is_plain_text(&ContentType::text()));
        assert!(is_plain_text(&ContentType::text_utf8()));
        assert!(!is_plain_text(&ContentType::json()));
        assert!(!is_plain_text(&ContentType::html()));
    }
}
