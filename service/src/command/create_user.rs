//! [`Command`] for creating a new [`User`].

use common::operations::Insert;
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task::{self, JoinError};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::user::{Login, Password};
use crate::{
    domain::{user, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Login`] of a new [`User`].
    pub login: user::Login,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: Database<
            Insert<user::New>,
            Ok = Option<user::Id>,
            Err = Traced<database::Error>,
        > + Sync,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser { login, password } = cmd;

        let password_hash = task::spawn_blocking(move || {
            user::PasswordHash::new(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let id = self
            .database()
            .execute(Insert(user::New {
                login: login.clone(),
                password_hash: password_hash.clone(),
            }))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| E::LoginOccupied(login.clone()))
            .map_err(tracerr::wrap!())?;

        log::debug!(%id, %login, "new `User` created");

        Ok(User {
            id,
            login,
            password_hash,
        })
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Password`] cannot be hashed.
    #[display("Cannot hash `Password`: {_0}")]
    #[from]
    PasswordHash(user::HashError),

    /// Hashing task failed to complete.
    #[display("`Password` hashing task failed: {_0}")]
    #[from]
    HashingTask(JoinError),

    /// [`user::Login`] is already occupied.
    #[display("`{_0}` login is occupied")]
    LoginOccupied(#[error(not(source))] user::Login),
}

#[cfg(test)]
mod spec {
    use common::Handler as _;
    use secrecy::SecretBox;

    use crate::{
        domain::user,
        infra::Memory,
        test_service,
    };

    use super::{CreateUser, ExecutionError};

    fn create_user(login: &str, password: &str) -> CreateUser {
        CreateUser {
            login: user::Login::new(login).unwrap(),
            password: SecretBox::new(Box::new(
                user::Password::new(password).unwrap(),
            )),
        }
    }

    #[tokio::test]
    async fn creates_user_with_hashed_password() {
        let svc = test_service(Memory::default());

        let user = svc.execute(create_user("alice", "secret-1")).await.unwrap();

        assert!(user.id.is_valid());
        assert_eq!(user.login.as_ref(), "alice");
        assert_ne!(user.password_hash.to_string(), "secret-1");
        assert!(user
            .password_hash
            .check(&user::Password::new("secret-1").unwrap())
            .is_ok());
    }

    #[tokio::test]
    async fn refuses_occupied_login() {
        let svc = test_service(Memory::default());
        let first = svc.execute(create_user("bob", "pass-1")).await.unwrap();

        let err = svc
            .execute(create_user("bob", "pass-2"))
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::LoginOccupied(l) if l.as_ref() == "bob"),
            "{err}",
        );
        let other = svc.execute(create_user("carol", "pass-1")).await.unwrap();
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn refuses_too_long_password() {
        let svc = test_service(Memory::default());

        let err = svc
            .execute(create_user("dave", &"x".repeat(73)))
            .await
            .unwrap_err();

        assert!(
            matches!(
                err.as_ref(),
                ExecutionError::PasswordHash(user::HashError::PasswordTooLong(73)),
            ),
            "{err}",
        );
    }
}
