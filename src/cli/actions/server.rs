use crate::{api, member::MemberApi};
use anyhow::{Context, Result};
use std::{sync::Arc, time::Duration};
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub api_url: String,
    pub api_timeout: Duration,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the member API client cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!(
        "Starting server: port={} api_url={} api_timeout={:?}",
        args.port, args.api_url, args.api_timeout
    );

    let member_api = MemberApi::new(&args.api_url, Some(args.api_timeout))
        .context("Failed to build member API client")?;

    api::new(args.port, Arc::new(member_api)).await
}
