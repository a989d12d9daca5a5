//! [`Command`] for submitting an [`Order`].

use common::operations::Insert;
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::{order::Number, Order, User};
use crate::{
    domain::{order, user},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for submitting an [`Order`] on behalf of a [`User`].
///
/// Idempotent: the first [`User`] submitting a [`Number`] owns it forever.
#[derive(Clone, Debug)]
pub struct SubmitOrder {
    /// ID of the [`User`] submitting the [`Order`].
    pub user_id: user::Id,

    /// Raw [`Number`] of the [`Order`], possibly surrounded by whitespace.
    pub number: String,
}

/// Outcome of [`SubmitOrder`] [`Command`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Output {
    /// New [`Order`] has been accepted for processing.
    Accepted,

    /// [`Order`] has been already submitted by the same [`User`].
    AlreadySubmitted,
}

impl<Db> Command<SubmitOrder> for Service<Db>
where
    Db: Database<
            Insert<order::New>,
            Ok = order::Ownership,
            Err = Traced<database::Error>,
        > + Sync,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: SubmitOrder) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitOrder { user_id, number } = cmd;

        let number = order::Number::new(number.trim())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let ownership = self
            .database()
            .execute(Insert(order::New {
                number: number.clone(),
                owner_id: user_id,
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        match ownership {
            order::Ownership { created: true, .. } => {
                log::debug!(%number, %user_id, "new `Order` accepted");
                Ok(Output::Accepted)
            }
            order::Ownership { owner_id, .. } if owner_id == user_id => {
                Ok(Output::AlreadySubmitted)
            }
            order::Ownership { .. } => {
                Err(tracerr::new!(E::OwnedByAnotherUser(number)))
            }
        }
    }
}

/// Error of [`SubmitOrder`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Number`] is invalid.
    #[display("Invalid `Order` number: {_0}")]
    #[from]
    InvalidNumber(order::NumberError),

    /// [`Order`] has been already submitted by another [`User`].
    #[display("`Order(number: {_0})` belongs to another `User`")]
    OwnedByAnotherUser(#[error(not(source))] order::Number),
}
