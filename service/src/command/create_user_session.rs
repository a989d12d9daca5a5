//! [`Command`] for creating a [`Session`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task::{self, JoinError};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Login, Password};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`].
#[derive(Clone, Debug, From)]
pub enum CreateUserSession {
    /// Create a new [`Session`] by [`User`] credentials.
    ByCredentials {
        /// [`Login`] of a [`User`].
        login: user::Login,

        /// [`Password`] of a [`User`].
        password: SecretBox<user::Password>,
    },

    /// Create a new [`Session`] for the [`User`] with the provided ID, whose
    /// identity is already proven (right after registration, for example).
    ByUserId(user::Id),
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`session::Token`] of the created [`Session`].
    pub token: session::Token,

    /// Created [`Session`] itself.
    pub session: Session,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Login>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Sync,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user_id = match cmd {
            Cmd::ByCredentials { login, password } => {
                let user = self
                    .database()
                    .execute(Select(By::new(login)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::WrongCredentials)
                    .map_err(tracerr::wrap!())?;

                let User {
                    id, password_hash, ..
                } = user;
                task::spawn_blocking(move || {
                    password_hash.check(password.expose_secret())
                })
                .await
                .map_err(tracerr::from_and_wrap!(=> E))?
                .map_err(|e| match e {
                    user::CheckError::Mismatch => E::WrongCredentials,
                    user::CheckError::Malformed(_) => E::PasswordCheck(e),
                })
                .map_err(tracerr::wrap!())?;

                id
            }
            Cmd::ByUserId(user_id) => user_id,
        };

        let (token, session) = session::Token::issue(
            &self.config().session_secret,
            user_id,
            DateTime::now(),
            self.config().session_ttl,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output { token, session })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Stored [`user::PasswordHash`] cannot be checked.
    #[display("Cannot check `Password`: {_0}")]
    PasswordCheck(user::CheckError),

    /// Password checking task failed to complete.
    #[display("`Password` checking task failed: {_0}")]
    #[from]
    CheckingTask(JoinError),

    /// [`session::Token`] cannot be issued.
    #[display("Cannot issue `Session` token: {_0}")]
    #[from]
    Issue(session::IssueError),

    /// [`CreateUserSession::ByCredentials`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use common::{operations::Insert, DateTime, Handler as _};
    use secrecy::SecretBox;

    use crate::{
        domain::user,
        infra::Memory,
        test_service,
    };

    use super::{CreateUserSession, ExecutionError};

    async fn register(db: &Memory, login: &str, password: &str) -> user::Id {
        db.execute(Insert(user::New {
            login: user::Login::new(login).unwrap(),
            password_hash: user::PasswordHash::new(
                &user::Password::new(password).unwrap(),
            )
            .unwrap(),
        }))
        .await
        .unwrap()
        .unwrap()
    }

    fn by_credentials(login: &str, password: &str) -> CreateUserSession {
        CreateUserSession::ByCredentials {
            login: user::Login::new(login).unwrap(),
            password: SecretBox::new(Box::new(
                user::Password::new(password).unwrap(),
            )),
        }
    }

    #[tokio::test]
    async fn issues_token_for_valid_credentials() {
        let db = Memory::default();
        let id = register(&db, "alice", "secret-1").await;
        let svc = test_service(db);

        let out = svc.execute(by_credentials("alice", "secret-1")).await.unwrap();

        assert_eq!(out.session.user_id, id);
        assert_eq!(
            out.token.verify(&svc.config().session_secret, DateTime::now()),
            Ok(out.session),
        );
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_login_look_the_same() {
        let db = Memory::default();
        _ = register(&db, "alice", "secret-1").await;
        let svc = test_service(db);

        for (login, password) in [("alice", "secret-2"), ("nobody", "secret-1")] {
            let err = svc
                .execute(by_credentials(login, password))
                .await
                .unwrap_err();

            assert!(
                matches!(err.as_ref(), ExecutionError::WrongCredentials),
                "{err}",
            );
        }
    }

    #[tokio::test]
    async fn issues_token_by_user_id() {
        let svc = test_service(Memory::default());

        let out = svc
            .execute(CreateUserSession::ByUserId(user::Id::from(9)))
            .await
            .unwrap();

        assert_eq!(out.session.user_id, user::Id::from(9));
        assert_eq!(
            out.session.expires_at.unix_timestamp()
                - out.session.issued_at.unix_timestamp(),
            i64::try_from(svc.config().session_ttl.as_secs()).unwrap(),
        );
    }
}
