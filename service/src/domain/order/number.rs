//! [`Number`] definitions.

use derive_more::{AsRef, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};

#[cfg(doc)]
use crate::domain::Order;

/// Number of an [`Order`].
///
/// Always a non-empty string of ASCII digits passing the [Luhn] checksum.
///
/// [Luhn]: https://wikipedia.org/wiki/Luhn_algorithm
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`] out of the provided `number`, as is.
    ///
    /// # Errors
    ///
    /// - [`NumberError::Format`] if the `number` is empty or has a non-digit;
    /// - [`NumberError::Checksum`] if the `number` fails the [Luhn] checksum.
    ///
    /// [Luhn]: https://wikipedia.org/wiki/Luhn_algorithm
    pub fn new(number: impl Into<String>) -> Result<Self, NumberError> {
        let number = number.into();
        if !is_all_digits(&number) {
            return Err(NumberError::Format);
        }
        if !passes_luhn(&number) {
            return Err(NumberError::Checksum);
        }
        Ok(Self(number))
    }
}

/// Error of parsing a [`Number`].
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum NumberError {
    /// [`Number`] is empty or contains a non-digit.
    #[display("`Order` number must consist of digits only")]
    Format,

    /// [`Number`] fails the [Luhn] checksum.
    ///
    /// [Luhn]: https://wikipedia.org/wiki/Luhn_algorithm
    #[display("`Order` number fails Luhn checksum")]
    Checksum,
}

/// Indicates whether the provided string is non-empty and consists of ASCII
/// digits only.
#[must_use]
pub fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Indicates whether the provided string passes the [Luhn] checksum.
///
/// Empty strings and strings with non-digits never pass. No length limit is
/// imposed.
///
/// [Luhn]: https://wikipedia.org/wiki/Luhn_algorithm
#[must_use]
pub fn passes_luhn(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    let mut sum = 0;
    for (i, c) in s.chars().rev().enumerate() {
        let Some(mut digit) = c.to_digit(10) else {
            return false;
        };
        if i % 2 == 1 {
            digit *= 2;
            if digit > 9 {
                digit -= 9;
            }
        }
        sum = (sum + digit) % 10;
    }
    sum == 0
}

#[cfg(test)]
mod spec {
    use super::{is_all_digits, passes_luhn, Number, NumberError};

    #[test]
    fn checks_digits() {
        assert!(is_all_digits("0"));
        assert!(is_all_digits("12345678903"));

        assert!(!is_all_digits(""));
        assert!(!is_all_digits(" 123"));
        assert!(!is_all_digits("12a3"));
        assert!(!is_all_digits("-123"));
        assert!(!is_all_digits("１２３"));
    }

    #[test]
    fn checks_luhn() {
        for valid in ["0", "18", "79927398713", "12345678903", "4561261212345467"]
        {
            assert!(passes_luhn(valid), "{valid}");
        }
        for invalid in ["", "1", "79927398710", "12345678901", "4561261212345464"]
        {
            assert!(!passes_luhn(invalid), "{invalid}");
        }
    }

    #[test]
    fn luhn_rejects_non_digits() {
        assert!(!passes_luhn("0a"));
        assert!(!passes_luhn("7992 7398 713"));
    }

    #[test]
    fn luhn_has_no_length_limit() {
        assert!(passes_luhn(&"0".repeat(10_000)));
        assert!(passes_luhn(&format!("{}18", "0".repeat(10_000))));
    }

    #[test]
    fn parses_number() {
        assert_eq!(
            Number::new("79927398713").unwrap().as_ref(),
            "79927398713",
        );
        assert_eq!(Number::new(""), Err(NumberError::Format));
        assert_eq!(Number::new("7992739871a"), Err(NumberError::Format));
        assert_eq!(Number::new(" 79927398713"), Err(NumberError::Format));
        assert_eq!(Number::new("79927398710"), Err(NumberError::Checksum));
    }
}
