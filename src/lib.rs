//! # Member Portal (join & login actions)
//!
//! `member-portal` runs the server side of the member web application's
//! account forms. It never stores members itself: every account operation is
//! delegated to the remote member API configured through `API_URL`.
//!
//! ## Submission pipeline
//!
//! Each form submission runs one sequential pipeline:
//!
//! 1. **Normalize** the raw `(key, value)` pairs into a [`member::SubmittedForm`]
//!    using the form's [`member::FormSchema`] (date canonicalization, flag
//!    coercion, repeatable fields).
//! 2. **Validate** the record, collecting every violation into a
//!    [`member::ErrorMap`] keyed by field name.
//! 3. **Call** the member API only when local validation passed. A remote
//!    rejection replaces the local error map wholesale.
//! 4. **Persist** the session token (login only) in the `token` cookie.
//! 5. **Dispatch** either the error map or a redirect, never both.
//!
//! Transport failures towards the member API are not swallowed: they surface
//! as [`member::ActionError`] and are reported to the browser as `502`.

pub mod api;
pub mod cli;
pub mod member;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
