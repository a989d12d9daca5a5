//! [`Order`] definitions.

pub mod number;

use common::{define_kind, unit::Upload, DateTimeOf};
use derive_more::{Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

pub use self::number::{Number, NumberError};

/// Order uploaded by a [`User`] for loyalty points accrual.
#[derive(Clone, Debug)]
pub struct Order {
    /// [`Number`] of this [`Order`].
    pub number: Number,

    /// ID of the [`User`] who uploaded this [`Order`] first.
    pub owner_id: user::Id,

    /// Processing [`Status`] of this [`Order`].
    pub status: Status,

    /// [`Accrual`] for this [`Order`], once calculated.
    pub accrual: Option<Accrual>,

    /// [`DateTime`] when this [`Order`] was uploaded.
    ///
    /// [`DateTime`]: common::DateTime
    pub uploaded_at: UploadDateTime,
}

/// [`Order`] to be created.
#[derive(Clone, Debug)]
pub struct New {
    /// [`Number`] of the new [`Order`].
    pub number: Number,

    /// ID of the [`User`] uploading the new [`Order`].
    pub owner_id: user::Id,
}

/// Ownership of an [`Order`] after attempting to create it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Ownership {
    /// ID of the [`User`] owning the [`Order`].
    pub owner_id: user::Id,

    /// Indicates whether the [`Order`] has been created by the attempt.
    pub created: bool,
}

define_kind! {
    #[doc = "Processing status of an `Order`."]
    enum Status {
        #[doc = "Uploaded, but not processed yet."]
        New,

        #[doc = "Accrual is being calculated."]
        Processing,

        #[doc = "Rejected, no accrual will be made."]
        Invalid,

        #[doc = "Accrual has been calculated."]
        Processed,
    }
}

/// Loyalty points accrued for an [`Order`].
#[derive(Clone, Copy, Debug, Display, Eq, From, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Accrual(Decimal);

/// [`DateTime`] of an [`Order`] upload.
///
/// [`DateTime`]: common::DateTime
pub type UploadDateTime = DateTimeOf<(Order, Upload)>;
