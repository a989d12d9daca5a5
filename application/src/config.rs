//! [`Config`]-related definitions.

use std::time;

use common::DateTime;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Debug, Display, Error};
use serde::Deserialize;
use service::domain::user::session;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,

    /// Deadline for handling a single HTTP request, answered with
    /// `408 Request Timeout` once elapsed.
    #[default(time::Duration::from_secs(15))]
    #[serde(with = "humantime_serde")]
    pub request_timeout: time::Duration,

    /// Deadline for draining in-flight HTTP requests on shutdown.
    #[default(time::Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: time::Duration,

    /// Indicates whether the session cookie is marked `Secure`, so is sent
    /// over HTTPS only.
    pub secure_cookies: bool,
}

impl Server {
    /// Overrides [`Server::host`] and [`Server::port`] with the provided
    /// `host:port` address.
    ///
    /// # Errors
    ///
    /// If the provided `address` has no valid port.
    pub fn set_address(&mut self, address: &str) -> Result<(), AddressError> {
        let (host, port) = address.rsplit_once(':').ok_or(AddressError)?;
        self.port = port.parse().map_err(|_| AddressError)?;
        if !host.is_empty() {
            host.clone_into(&mut self.host);
        }
        Ok(())
    }
}

/// Error of parsing a `host:port` address.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("address must be in `host:port` form")]
pub struct AddressError;

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// Secret signing session tokens.
    ///
    /// Must be at least [`session::Secret::MIN_LEN`] bytes long.
    #[debug(skip)]
    pub session_secret: String,

    /// Lifetime of session tokens.
    #[default(time::Duration::from_secs(24 * 60 * 60))]
    #[serde(with = "humantime_serde")]
    pub session_ttl: time::Duration,
}

impl TryFrom<Service> for service::Config {
    type Error = ServiceConfigError;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            session_secret,
            session_ttl,
        } = value;

        let session_secret = session::Secret::new(session_secret);
        if !session_secret.is_long_enough() {
            return Err(ServiceConfigError::SessionSecretTooShort);
        }
        if session_ttl < session::Token::MIN_TTL {
            return Err(ServiceConfigError::SessionTtlTooShort);
        }
        if DateTime::now().checked_add(session_ttl).is_none() {
            return Err(ServiceConfigError::SessionTtlTooLong);
        }
        Ok(Self {
            session_secret,
            session_ttl,
        })
    }
}

/// Error of an invalid [`Service`] configuration.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ServiceConfigError {
    /// [`Service::session_secret`] is too short.
    #[display(
        "`service.session_secret` must be at least {} bytes long",
        session::Secret::MIN_LEN
    )]
    SessionSecretTooShort,

    /// [`Service::session_ttl`] is too short.
    #[display("`service.session_ttl` must be at least 1s")]
    SessionTtlTooShort,

    /// [`Service::session_ttl`] reaches beyond the supported dates.
    #[display("`service.session_ttl` is too long")]
    SessionTtlTooLong,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Connection URI, taking precedence over the separate connection
    /// parameters.
    pub uri: Option<String>,

    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[debug(skip)]
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,

    /// Deadline of every database operation.
    #[default(time::Duration::from_secs(5))]
    #[serde(with = "humantime_serde")]
    pub timeout: time::Duration,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        use service::infra::postgres::{PoolConfig, Timeouts};

        let Postgres {
            uri,
            host,
            port,
            user,
            password,
            dbname,
            timeout,
        } = value;

        let mut conf = Self {
            connect_timeout: Some(timeout),
            options: Some(format!(
                "-c statement_timeout={}",
                timeout.as_millis(),
            )),
            pool: Some(PoolConfig {
                timeouts: Timeouts {
                    wait: Some(timeout),
                    create: Some(timeout),
                    recycle: Some(timeout),
                },
                ..PoolConfig::default()
            }),
            ..Self::default()
        };
        if let Some(uri) = uri {
            conf.url = Some(uri);
        } else {
            conf.host = Some(host);
            conf.port = Some(port);
            conf.user = Some(user);
            conf.password = Some(password);
            conf.dbname = Some(dbname);
        }
        conf
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{Postgres, Server, Service, ServiceConfigError};

    #[test]
    fn overrides_address() {
        let mut server = Server::default();

        server.set_address("localhost:9090").unwrap();
        assert_eq!((server.host.as_str(), server.port), ("localhost", 9090));

        server.set_address(":7070").unwrap();
        assert_eq!((server.host.as_str(), server.port), ("localhost", 7070));

        assert!(server.set_address("localhost").is_err());
        assert!(server.set_address("localhost:port").is_err());
    }

    #[test]
    fn refuses_short_session_secret() {
        let short = Service {
            session_secret: "short".to_owned(),
            ..Service::default()
        };
        assert!(service::Config::try_from(short).is_err());
        assert!(service::Config::try_from(Service::default()).is_err());

        let long = Service {
            session_secret: "x".repeat(32),
            session_ttl: Duration::from_secs(60),
        };
        let conf = service::Config::try_from(long).unwrap();
        assert_eq!(conf.session_ttl, Duration::from_secs(60));
    }

    #[test]
    fn refuses_unusable_session_ttl() {
        let with_ttl = |session_ttl| Service {
            session_secret: "x".repeat(32),
            session_ttl,
        };

        for (ttl, expected) in [
            (Duration::ZERO, ServiceConfigError::SessionTtlTooShort),
            (Duration::from_millis(500), ServiceConfigError::SessionTtlTooShort),
            (
                Duration::from_secs(400_000 * 365 * 24 * 3600),
                ServiceConfigError::SessionTtlTooLong,
            ),
        ] {
            let err = service::Config::try_from(with_ttl(ttl)).unwrap_err();
            assert_eq!(err.to_string(), expected.to_string(), "{ttl:?}");
        }
        assert!(service::Config::try_from(with_ttl(Duration::from_secs(1))).is_ok());
    }

    #[test]
    fn server_defaults() {
        let server = Server::default();

        assert_eq!(server.request_timeout, Duration::from_secs(15));
        assert_eq!(server.shutdown_timeout, Duration::from_secs(10));
        assert!(!server.secure_cookies);
    }

    #[test]
    fn uri_takes_precedence() {
        let conf = service::infra::postgres::Config::from(Postgres {
            uri: Some("postgres://u:p@db:5433/loyalty".to_owned()),
            ..Postgres::default()
        });

        assert_eq!(conf.url.as_deref(), Some("postgres://u:p@db:5433/loyalty"));
        assert!(conf.host.is_none());
        assert_eq!(conf.options.as_deref(), Some("-c statement_timeout=5000"));
    }
}
