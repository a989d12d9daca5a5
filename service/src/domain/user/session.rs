//! [`Session`] definitions.

use std::{sync::Arc, time::Duration};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::{
    unit::{Expiration, Issue},
    DateTime, DateTimeOf,
};
use derive_more::{AsRef, Debug, Display, Error, From};
use hmac::{Hmac, Mac as _};
use secrecy::{ExposeSecret as _, SecretSlice};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user;

/// [HMAC]-[SHA-256] used for signing [`Token`]s.
///
/// [HMAC]: https://wikipedia.org/wiki/HMAC
/// [SHA-256]: https://wikipedia.org/wiki/SHA-2
type HmacSha256 = Hmac<Sha256>;

/// User session.
///
/// Exists only inside a signed [`Token`], nothing is stored server-side.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Session {
    /// ID of the [`User`] this [`Session`] belongs to.
    #[serde(rename = "uid")]
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Session`] was issued.
    #[serde(rename = "iat", with = "common::datetime::serde::unix_timestamp")]
    pub issued_at: IssueDateTime,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

/// [`DateTime`] of a [`Session`] issuing.
pub type IssueDateTime = DateTimeOf<(Session, Issue)>;

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, Expiration)>;

/// Secret key signing [`Token`]s.
#[derive(Clone, Debug)]
pub struct Secret(Arc<SecretSlice<u8>>);

impl Secret {
    /// Minimum length of a [`Secret`] in bytes accepted for issuing [`Token`]s.
    pub const MIN_LEN: usize = 32;

    /// Creates a new [`Secret`] out of the provided raw `key`.
    #[must_use]
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self(Arc::new(key.into().into()))
    }

    /// Indicates whether this [`Secret`] is at least [`Secret::MIN_LEN`] bytes
    /// long.
    #[must_use]
    pub fn is_long_enough(&self) -> bool {
        self.0.expose_secret().len() >= Self::MIN_LEN
    }

    /// Returns an [`HmacSha256`] keyed with this [`Secret`] and fed with the
    /// provided `payload`.
    fn sign(&self, payload: &str) -> HmacSha256 {
        let mut mac = HmacSha256::new_from_slice(self.0.expose_secret())
            .expect("HMAC accepts keys of any size");
        mac.update(payload.as_bytes());
        mac
    }
}

/// Access token of a [`Session`].
///
/// Its contents are not trusted until [`Token::verify()`]ed. The wire format
/// is `<payload>.<signature>`, where `payload` is the base64url-encoded
/// (without padding) JSON of a [`Session`], and `signature` is the
/// base64url-encoded [`HmacSha256`] of `payload`.
#[derive(AsRef, Clone, Debug, Display, Eq, From, PartialEq)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Minimum lifetime of a [`Token`].
    ///
    /// [`Session`]s are precise to whole seconds only.
    pub const MIN_TTL: Duration = Duration::from_secs(1);

    /// Issues a new [`Token`] for the [`User`] with the provided [`user::Id`],
    /// valid for the `ttl` since `now`.
    ///
    /// Both `now` and the expiration are truncated to whole seconds, as
    /// carried in the [`Token`].
    ///
    /// # Errors
    ///
    /// - [`IssueError::InvalidSubject`] if the [`user::Id`] is not positive;
    /// - [`IssueError::TtlTooShort`] if the `ttl` is shorter than
    ///   [`Token::MIN_TTL`];
    /// - [`IssueError::TtlOverflow`] if the expiration is out of the supported
    ///   [`DateTime`] range;
    /// - [`IssueError::SecretTooShort`] if the [`Secret`] is shorter than
    ///   [`Secret::MIN_LEN`];
    /// - [`IssueError::Serialization`] if the [`Session`] fails to serialize.
    pub fn issue(
        secret: &Secret,
        user_id: user::Id,
        now: DateTime,
        ttl: Duration,
    ) -> Result<(Self, Session), IssueError> {
        if !user_id.is_valid() {
            return Err(IssueError::InvalidSubject(user_id));
        }
        if ttl < Self::MIN_TTL {
            return Err(IssueError::TtlTooShort);
        }
        if !secret.is_long_enough() {
            return Err(IssueError::SecretTooShort);
        }

        let now = now.trunc_to_seconds();
        let expires_at = now
            .checked_add(ttl)
            .ok_or(IssueError::TtlOverflow)?
            .trunc_to_seconds();
        let session = Session {
            user_id,
            issued_at: now.coerce(),
            expires_at: expires_at.coerce(),
        };
        let payload = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&session).map_err(IssueError::Serialization)?,
        );
        let signature =
            URL_SAFE_NO_PAD.encode(secret.sign(&payload).finalize().into_bytes());

        Ok((Self(format!("{payload}.{signature}")), session))
    }

    /// Verifies this [`Token`] against the provided [`Secret`] at `now`,
    /// returning the [`Session`] it carries.
    ///
    /// Signature is checked in constant time, and before the payload is even
    /// decoded.
    ///
    /// # Errors
    ///
    /// - [`VerifyError::Malformed`] if this [`Token`] has wrong structure or
    ///   signature, or carries an invalid [`Session`];
    /// - [`VerifyError::Expired`] if the [`Session`] is expired at `now`.
    pub fn verify(
        &self,
        secret: &Secret,
        now: DateTime,
    ) -> Result<Session, VerifyError> {
        let mut parts = self.0.split('.');
        let (Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(VerifyError::Malformed);
        };
        if payload.is_empty() || signature.is_empty() {
            return Err(VerifyError::Malformed);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| VerifyError::Malformed)?;
        secret
            .sign(payload)
            .verify_slice(&signature)
            .map_err(|_| VerifyError::Malformed)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| VerifyError::Malformed)?;
        let session: Session = serde_json::from_slice(&payload)
            .map_err(|_| VerifyError::Malformed)?;
        if !session.user_id.is_valid() {
            return Err(VerifyError::Malformed);
        }

        if now.unix_timestamp() >= session.expires_at.unix_timestamp() {
            return Err(VerifyError::Expired);
        }
        Ok(session)
    }
}

/// Error of [`Token::issue()`].
#[derive(Debug, Display, Error)]
pub enum IssueError {
    /// [`user::Id`] cannot be a [`Session`] subject.
    #[display("`User(id: {_0})` cannot own a `Session`")]
    InvalidSubject(#[error(not(source))] user::Id),

    /// TTL is shorter than [`Token::MIN_TTL`].
    #[display("`Session` TTL must be at least 1 second")]
    TtlTooShort,

    /// Expiration is out of the supported [`DateTime`] range.
    #[display("`Session` TTL is too long")]
    TtlOverflow,

    /// [`Secret`] is too short.
    #[display("`Session` secret must be at least {} bytes", Secret::MIN_LEN)]
    SecretTooShort,

    /// [`Session`] failed to serialize.
    #[display("Failed to serialize `Session`: {_0}")]
    Serialization(serde_json::Error),
}

/// Error of [`Token::verify()`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum VerifyError {
    /// [`Token`] is malformed or its signature doesn't match.
    #[display("Malformed `Session` token")]
    Malformed,

    /// [`Session`] has expired.
    #[display("`Session` has expired")]
    Expired,
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use common::DateTime;
    use hmac::Mac as _;

    use super::{IssueError, Secret, Session, Token, VerifyError};
    use crate::domain::user;

    const TTL: Duration = Duration::from_secs(3600);

    fn secret() -> Secret {
        Secret::new("0123456789abcdef0123456789abcdef")
    }

    fn at(timestamp: i64) -> DateTime {
        DateTime::from_unix_timestamp(timestamp).unwrap()
    }

    fn issue(user_id: i64, now: i64) -> Token {
        Token::issue(&secret(), user::Id::from(user_id), at(now), TTL)
            .unwrap()
            .0
    }

    #[test]
    fn verifies_issued_token() {
        let (token, session) =
            Token::issue(&secret(), user::Id::from(42), at(1_000), TTL)
                .unwrap();

        assert_eq!(session.user_id, user::Id::from(42));
        assert_eq!(session.issued_at.unix_timestamp(), 1_000);
        assert_eq!(session.expires_at.unix_timestamp(), 4_600);
        assert_eq!(token.verify(&secret(), at(1_001)), Ok(session));
    }

    #[test]
    fn payload_is_plain_json() {
        let token = issue(7, 100);
        let payload = token.as_ref().split('.').next().unwrap();

        let json = URL_SAFE_NO_PAD.decode(payload).unwrap();
        assert_eq!(
            String::from_utf8(json).unwrap(),
            r#"{"uid":7,"iat":100,"exp":3700}"#,
        );
    }

    #[test]
    fn expires_exactly_at_expiration() {
        let token = issue(1, 0);

        assert!(token.verify(&secret(), at(3_599)).is_ok());
        assert_eq!(
            token.verify(&secret(), at(3_600)),
            Err(VerifyError::Expired),
        );
        assert_eq!(
            token.verify(&secret(), at(100_000)),
            Err(VerifyError::Expired),
        );
    }

    #[test]
    fn rejects_foreign_secret() {
        let token = issue(1, 0);
        let other = Secret::new("fedcba9876543210fedcba9876543210");

        assert_eq!(token.verify(&other, at(1)), Err(VerifyError::Malformed));
    }

    #[test]
    fn rejects_any_flipped_signature_bit() {
        let token = issue(5, 0);
        let (payload, signature) = token.as_ref().split_once('.').unwrap();
        let signature = URL_SAFE_NO_PAD.decode(signature).unwrap();

        for byte in 0..signature.len() {
            for bit in 0..8 {
                let mut tampered = signature.clone();
                tampered[byte] ^= 1 << bit;
                let tampered = Token::from(format!(
                    "{payload}.{}",
                    URL_SAFE_NO_PAD.encode(&tampered),
                ));

                assert_eq!(
                    tampered.verify(&secret(), at(1)),
                    Err(VerifyError::Malformed),
                    "flipped bit {bit} of byte {byte}",
                );
            }
        }
    }

    #[test]
    fn rejects_forged_payload() {
        let token = issue(5, 0);
        let signature = token.as_ref().split_once('.').unwrap().1;
        let forged = URL_SAFE_NO_PAD.encode(r#"{"uid":6,"iat":0,"exp":3600}"#);

        assert_eq!(
            Token::from(format!("{forged}.{signature}")).verify(&secret(), at(1)),
            Err(VerifyError::Malformed),
        );
    }

    #[test]
    fn rejects_malformed_structure() {
        let token = issue(5, 0);
        let (payload, signature) = token.as_ref().split_once('.').unwrap();

        for malformed in [
            String::new(),
            "garbage".to_owned(),
            format!("{payload}."),
            format!(".{signature}"),
            format!("{payload}.{signature}.extra"),
            format!("{payload}.!!!"),
            format!("{payload}{signature}"),
        ] {
            assert_eq!(
                Token::from(malformed.clone()).verify(&secret(), at(1)),
                Err(VerifyError::Malformed),
                "token: {malformed:?}",
            );
        }
    }

    #[test]
    fn rejects_signed_garbage_payload() {
        let secret = secret();
        for json in ["not json", r#"{"uid":0,"iat":0,"exp":3600}"#, "{}"] {
            let payload = URL_SAFE_NO_PAD.encode(json);
            let signature = URL_SAFE_NO_PAD
                .encode(secret.sign(&payload).finalize().into_bytes());

            assert_eq!(
                Token::from(format!("{payload}.{signature}"))
                    .verify(&secret, at(1)),
                Err(VerifyError::Malformed),
                "payload: {json}",
            );
        }
    }

    #[test]
    fn refuses_invalid_issue_arguments() {
        assert!(matches!(
            Token::issue(&secret(), user::Id::from(0), at(0), TTL),
            Err(IssueError::InvalidSubject(_)),
        ));
        assert!(matches!(
            Token::issue(&secret(), user::Id::from(-1), at(0), TTL),
            Err(IssueError::InvalidSubject(_)),
        ));
        assert!(matches!(
            Token::issue(&secret(), user::Id::from(1), at(0), Duration::ZERO),
            Err(IssueError::TtlTooShort),
        ));
        assert!(matches!(
            Token::issue(&Secret::new("short"), user::Id::from(1), at(0), TTL),
            Err(IssueError::SecretTooShort),
        ));
    }

    #[test]
    fn issued_session_matches_verified_one_at_sub_second_now() {
        let now = at(1_000) + Duration::from_micros(864_073);

        let (token, session) =
            Token::issue(&secret(), user::Id::from(2), now, TTL).unwrap();

        assert_eq!(session.issued_at.unix_timestamp(), 1_000);
        assert_eq!(session.expires_at.unix_timestamp(), 4_600);
        assert_eq!(token.verify(&secret(), now), Ok(session));
    }

    #[test]
    fn refuses_sub_second_ttl() {
        let now = at(1_000) + Duration::from_millis(900);

        assert!(matches!(
            Token::issue(
                &secret(),
                user::Id::from(1),
                now,
                Duration::from_millis(500),
            ),
            Err(IssueError::TtlTooShort),
        ));

        let (token, _) =
            Token::issue(&secret(), user::Id::from(1), now, Token::MIN_TTL)
                .unwrap();
        assert!(token.verify(&secret(), now).is_ok());
    }

    #[test]
    fn refuses_overflowing_ttl() {
        assert!(matches!(
            Token::issue(
                &secret(),
                user::Id::from(1),
                DateTime::now(),
                Duration::from_secs(400_000 * 365 * 24 * 3600),
            ),
            Err(IssueError::TtlOverflow),
        ));
        assert!(matches!(
            Token::issue(&secret(), user::Id::from(1), at(0), Duration::MAX),
            Err(IssueError::TtlOverflow),
        ));
    }

    #[test]
    fn session_roundtrips_through_json() {
        let session = Session {
            user_id: user::Id::from(3),
            issued_at: at(10).coerce(),
            expires_at: at(20).coerce(),
        };

        let json = serde_json::to_string(&session).unwrap();
        assert_eq!(serde_json::from_str::<Session>(&json).unwrap(), session);
    }
}
