//! Map parsed CLI arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{api, ARG_PORT};
use anyhow::Result;

/// # Errors
/// Returns an error if required arguments are missing or invalid.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let api_opts = api::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        api_url: api_opts.url,
        api_timeout: api_opts.timeout,
    }))
}
