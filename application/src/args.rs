//! [`Args`] definitions.

use clap::Parser;

/// Server of the loyalty points system.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Address to run the server on, in `host:port` form.
    ///
    /// Overrides the configuration file and `CONF.` variables.
    #[arg(short = 'a', long, env = "RUN_ADDRESS")]
    pub address: Option<String>,

    /// Postgres connection URI.
    ///
    /// Overrides the configuration file and `CONF.` variables.
    #[arg(short = 'd', long, env = "DATABASE_URI")]
    pub database_uri: Option<String>,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::Args;

    #[test]
    fn parses_overrides() {
        let args =
            Args::try_parse_from(["app", "-a", "127.0.0.1:9000", "-d", "postgres://db"])
                .unwrap();

        assert_eq!(args.config, "config.toml");
        assert_eq!(args.address.as_deref(), Some("127.0.0.1:9000"));
        assert_eq!(args.database_uri.as_deref(), Some("postgres://db"));
    }
}
