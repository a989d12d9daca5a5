//! [`User`] definitions.

pub mod session;

use derive_more::{AsRef, Display, Error, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};

pub use self::session::Session;

/// Platform user.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`Login`] of this [`User`].
    pub login: Login,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,
}

/// [`User`] to be created, before the storage assigns its [`Id`].
#[derive(Clone, Debug)]
pub struct New {
    /// [`Login`] of the new [`User`].
    pub login: Login,

    /// [`PasswordHash`] of the new [`User`].
    pub password_hash: PasswordHash,
}

/// ID of a [`User`].
///
/// Assigned by the storage, so any valid [`Id`] is positive.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(i64);

impl Id {
    /// Indicates whether this [`Id`] may identify an existing [`User`].
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

/// Login of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Login(String);

impl Login {
    /// Maximum length of a [`Login`] in bytes.
    pub const MAX_LEN: usize = 255;

    /// Creates a new [`Login`] out of the given `login` with its surrounding
    /// whitespace trimmed, if the result is valid.
    #[must_use]
    pub fn new(login: impl AsRef<str>) -> Option<Self> {
        let login = login.as_ref().trim();
        (!login.is_empty() && login.len() <= Self::MAX_LEN)
            .then(|| Self(login.to_owned()))
    }
}

/// Password of a [`User`].
#[derive(AsRef, Clone, Debug, Eq, PartialEq)]
#[as_ref(str)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`] if the given `password` is not empty.
    ///
    /// Its length is checked against [`PasswordHash::MAX_PASSWORD_LEN`] only
    /// once hashing is attempted.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        (!password.is_empty()).then_some(Self(password))
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [bcrypt] hash of a [`User`]'s [`Password`].
///
/// [bcrypt]: https://wikipedia.org/wiki/Bcrypt
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Maximum length of a [`Password`] in bytes accepted by [bcrypt].
    ///
    /// [bcrypt]: https://wikipedia.org/wiki/Bcrypt
    pub const MAX_PASSWORD_LEN: usize = 72;

    /// Hashes the provided [`Password`] with a random salt, so hashing the
    /// same [`Password`] twice gives different [`PasswordHash`]es.
    ///
    /// This is CPU-heavy, so should be run outside of async executor threads.
    ///
    /// # Errors
    ///
    /// - [`HashError::PasswordTooLong`] if the [`Password`] is longer than
    ///   [`PasswordHash::MAX_PASSWORD_LEN`] bytes;
    /// - [`HashError::Bcrypt`] if [bcrypt] itself fails.
    ///
    /// [bcrypt]: https://wikipedia.org/wiki/Bcrypt
    pub fn new(password: &Password) -> Result<Self, HashError> {
        let len = password.0.len();
        if len > Self::MAX_PASSWORD_LEN {
            return Err(HashError::PasswordTooLong(len));
        }
        bcrypt::hash(&password.0, bcrypt::DEFAULT_COST)
            .map(Self)
            .map_err(HashError::Bcrypt)
    }

    /// Checks whether the provided [`Password`] matches this [`PasswordHash`].
    ///
    /// This is CPU-heavy, so should be run outside of async executor threads.
    ///
    /// # Errors
    ///
    /// - [`CheckError::Mismatch`] if the [`Password`] doesn't match;
    /// - [`CheckError::Malformed`] if this [`PasswordHash`] is not a valid
    ///   [bcrypt] hash.
    ///
    /// [bcrypt]: https://wikipedia.org/wiki/Bcrypt
    pub fn check(&self, password: &Password) -> Result<(), CheckError> {
        // `bcrypt` silently truncates longer inputs.
        if password.0.len() > Self::MAX_PASSWORD_LEN {
            return Err(CheckError::Mismatch);
        }
        match bcrypt::verify(&password.0, &self.0) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CheckError::Mismatch),
            Err(e) => Err(CheckError::Malformed(e)),
        }
    }
}

/// Error of creating a [`PasswordHash`].
#[derive(Debug, Display, Error)]
pub enum HashError {
    /// [`Password`] exceeds [`PasswordHash::MAX_PASSWORD_LEN`].
    #[display(
        "`Password` of {_0} bytes exceeds {} bytes limit",
        PasswordHash::MAX_PASSWORD_LEN
    )]
    PasswordTooLong(#[error(not(source))] usize),

    /// [bcrypt] failure.
    ///
    /// [bcrypt]: https://wikipedia.org/wiki/Bcrypt
    #[display("Failed to hash `Password`: {_0}")]
    Bcrypt(bcrypt::BcryptError),
}

/// Error of checking a [`Password`] against a [`PasswordHash`].
#[derive(Debug, Display, Error)]
pub enum CheckError {
    /// [`Password`] doesn't match the [`PasswordHash`].
    #[display("`Password` doesn't match")]
    Mismatch,

    /// [`PasswordHash`] is corrupted.
    #[display("Malformed `PasswordHash`: {_0}")]
    Malformed(bcrypt::BcryptError),
}

#[cfg(test)]
mod spec {
    use super::{CheckError, HashError, Login, Password, PasswordHash};

    fn password(s: &str) -> Password {
        Password::new(s).unwrap()
    }

    #[test]
    fn login_is_trimmed() {
        assert_eq!(Login::new("  alice \n").unwrap().as_ref(), "alice");
        assert!(Login::new("   ").is_none());
        assert!(Login::new("").is_none());
        assert!(Login::new("a".repeat(Login::MAX_LEN + 1)).is_none());
    }

    #[test]
    fn empty_password_is_invalid() {
        assert!(Password::new("").is_none());
        assert!(Password::new(" ").is_some());
    }

    #[test]
    fn hash_matches_its_password() {
        let hash = PasswordHash::new(&password("strong-password-123")).unwrap();

        assert_ne!(hash.to_string(), "strong-password-123");
        assert!(hash.check(&password("strong-password-123")).is_ok());
    }

    #[test]
    fn hashes_are_salted() {
        let first = PasswordHash::new(&password("same-password")).unwrap();
        let second = PasswordHash::new(&password("same-password")).unwrap();

        assert_ne!(first, second);
        assert!(first.check(&password("same-password")).is_ok());
        assert!(second.check(&password("same-password")).is_ok());
    }

    #[test]
    fn rejects_too_long_password() {
        let limit = PasswordHash::MAX_PASSWORD_LEN;

        assert!(matches!(
            PasswordHash::new(&password(&"a".repeat(limit + 1))),
            Err(HashError::PasswordTooLong(len)) if len == limit + 1,
        ));
        assert!(PasswordHash::new(&password(&"a".repeat(limit))).is_ok());
    }

    #[test]
    fn wrong_password_is_mismatch() {
        let hash = PasswordHash::new(&password("correct-password")).unwrap();

        assert!(matches!(
            hash.check(&password("wrong-password")),
            Err(CheckError::Mismatch),
        ));
    }

    #[test]
    fn truncated_tail_is_mismatch() {
        let limit = PasswordHash::MAX_PASSWORD_LEN;
        let hash = PasswordHash::new(&password(&"a".repeat(limit))).unwrap();

        assert!(matches!(
            hash.check(&password(&"a".repeat(limit + 1))),
            Err(CheckError::Mismatch),
        ));
    }

    #[test]
    fn corrupted_hash_is_malformed() {
        let hash = PasswordHash("invalid-hash".to_owned());

        assert!(matches!(
            hash.check(&password("any-password")),
            Err(CheckError::Malformed(_)),
        ));
    }
}
