//! Remote member API options.

use anyhow::{anyhow, Context, Result};
use clap::{Arg, Command};
use std::time::Duration;
use url::Url;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_API_TIMEOUT: &str = "api-timeout";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long(ARG_API_URL)
                .help("Base URL of the member API, example: https://api.example.com")
                .env("API_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_API_TIMEOUT)
                .long(ARG_API_TIMEOUT)
                .help("Timeout in seconds for requests to the member API")
                .default_value("10")
                .env("MEMBER_PORTAL_API_TIMEOUT")
                .value_parser(clap::value_parser!(u64).range(1..=300)),
        )
}

#[derive(Debug, Clone)]
pub struct Options {
    pub url: String,
    pub timeout: Duration,
}

impl Options {
    /// # Errors
    /// Returns an error if the URL is missing or is not an `http(s)` URL.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let url = matches
            .get_one::<String>(ARG_API_URL)
            .cloned()
            .context("missing required argument: --api-url")?;

        let parsed = Url::parse(&url).with_context(|| format!("invalid API_URL: {url}"))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(anyhow!("API_URL must be an http(s) URL with a host: {url}"));
        }

        let timeout = matches.get_one::<u64>(ARG_API_TIMEOUT).copied().unwrap_or(10);

        Ok(Self {
            url,
            timeout: Duration::from_secs(timeout),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(args: &[&str]) -> clap::ArgMatches {
        with_args(Command::new("test")).get_matches_from(args)
    }

    #[test]
    fn parses_url_and_timeout() -> Result<()> {
        temp_env::with_vars(
            [
                ("API_URL", None::<&str>),
                ("MEMBER_PORTAL_API_TIMEOUT", None::<&str>),
            ],
            || {
                let options = Options::parse(&matches(&[
                    "test",
                    "--api-url",
                    "https://api.example.com/v1",
                    "--api-timeout",
                    "3",
                ]))?;
                assert_eq!(options.url, "https://api.example.com/v1");
                assert_eq!(options.timeout, Duration::from_secs(3));
                Ok(())
            },
        )
    }

    #[test]
    fn rejects_non_http_urls() {
        temp_env::with_vars([("API_URL", None::<&str>)], || {
            for url in ["ftp://api.example.com", "api.example.com", "unix:/tmp/api.sock"] {
                let result = Options::parse(&matches(&["test", "--api-url", url]));
                assert!(result.is_err(), "{url} should be rejected");
            }
        });
    }

    #[test]
    fn reads_env() -> Result<()> {
        temp_env::with_vars(
            [
                ("API_URL", Some("http://member-api:3000")),
                ("MEMBER_PORTAL_API_TIMEOUT", Some("30")),
            ],
            || {
                let options = Options::parse(&matches(&["test"]))?;
                assert_eq!(options.url, "http://member-api:3000");
                assert_eq!(options.timeout, Duration::from_secs(30));
                Ok(())
            },
        )
    }
}
