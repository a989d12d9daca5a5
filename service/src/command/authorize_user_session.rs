//! [`Command`] for authorizing a [`User`].

use common::DateTime;
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] by a [`session::Token`].
///
/// Touches no storage: the [`Session`] is trusted as long as its
/// [`session::Token`] verifies.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db: Sync> Command<AuthorizeUserSession> for Service<Db> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        token
            .verify(&self.config().session_secret, DateTime::now())
            .map_err(tracerr::from_and_wrap!(=> E))
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`session::Token`] cannot be verified.
    #[display("Invalid `Session` token: {_0}")]
    Token(session::VerifyError),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::{DateTime, Handler as _};

    use crate::{
        domain::user::{self, session},
        infra::Memory,
        test_service,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    #[tokio::test]
    async fn authorizes_valid_token() {
        let svc = test_service(Memory::default());
        let (token, session) = session::Token::issue(
            &svc.config().session_secret,
            user::Id::from(3),
            DateTime::now(),
            Duration::from_secs(60),
        )
        .unwrap();

        let authorized =
            svc.execute(AuthorizeUserSession { token }).await.unwrap();

        assert_eq!(authorized, session);
    }

    #[tokio::test]
    async fn refuses_expired_token() {
        let svc = test_service(Memory::default());
        let (token, _) = session::Token::issue(
            &svc.config().session_secret,
            user::Id::from(3),
            DateTime::from_unix_timestamp(1_000).unwrap(),
            Duration::from_secs(60),
        )
        .unwrap();

        let err = svc.execute(AuthorizeUserSession { token }).await.unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::Token(session::VerifyError::Expired),
            ),
            "{err}",
        );
    }

    #[tokio::test]
    async fn refuses_garbage() {
        let svc = test_service(Memory::default());

        let err = svc
            .execute(AuthorizeUserSession {
                token: session::Token::from("garbage".to_owned()),
            })
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::Token(session::VerifyError::Malformed),
            ),
            "{err}",
        );
    }
}
