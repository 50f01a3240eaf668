//! Join, login and current-user actions.
//!
//! Each action ends in exactly one [`ActionOutcome`]: the error map to show
//! next to the form, or the redirect to follow. Failures reaching the member
//! API are returned as [`ActionError`].

use super::client::{JoinReply, LoginReply, MemberApi};
use super::errors::{ActionError, ErrorMap};
use super::form::{first_values, normalize};
use super::schema::{JOIN_FORM, LOGIN_FORM};
use super::session::{SessionCookie, SessionStore, SESSION_COOKIE_NAME};
use super::validate::{login_credentials, validate};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use url::{Position, Url};
use utoipa::IntoParams;

pub const JOIN_REDIRECT: &str = "/member/login";
pub const LOGIN_REDIRECT: &str = "/";
/// Layout whose cached rendering is dropped after a login.
pub const ROOT_LAYOUT: &str = "/";

const LOCAL_ORIGIN: &str = "http://portal.invalid/";

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RedirectParams {
    /// Same-site path to go to after the action succeeds.
    #[serde(rename = "redirectUrl")]
    pub redirect_url: Option<String>,
}

impl RedirectParams {
    #[must_use]
    pub fn new(redirect_url: impl Into<String>) -> Self {
        Self {
            redirect_url: Some(redirect_url.into()),
        }
    }

    /// The requested target when it is a same-site path, `default` otherwise.
    ///
    /// The returned path is percent-encoded and safe to put in `Location`.
    #[must_use]
    pub fn resolve(&self, default: &str) -> String {
        match self.redirect_url.as_deref().map(str::trim) {
            Some(target) if !target.is_empty() => local_path(target).unwrap_or_else(|| {
                warn!("Ignoring redirect target outside the site: {:?}", target);
                default.to_string()
            }),
            _ => default.to_string(),
        }
    }
}

/// Resolve `target` against a placeholder origin and keep it only if it stays
/// on that origin. Backslashes count as slashes, as browsers treat them.
fn local_path(target: &str) -> Option<String> {
    if !target.starts_with('/') || target.chars().any(char::is_control) {
        return None;
    }

    let origin = Url::parse(LOCAL_ORIGIN).ok()?;
    let resolved = origin.join(target).ok()?;
    if resolved.origin() != origin.origin() {
        return None;
    }

    Some(resolved[Position::BeforePath..].to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// Add a browser history entry.
    Push,
    /// Replace the current history entry.
    Replace,
}

impl RedirectMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Replace => "replace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    pub mode: RedirectMode,
    /// Layout path whose cached rendering must be invalidated first.
    pub revalidate: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Invalid(ErrorMap),
    Redirect(Redirect),
}

impl ActionOutcome {
    #[must_use]
    pub fn errors(&self) -> Option<&ErrorMap> {
        match self {
            Self::Invalid(errors) => Some(errors),
            Self::Redirect(_) => None,
        }
    }

    #[must_use]
    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Invalid(_) => None,
            Self::Redirect(redirect) => Some(redirect),
        }
    }
}

/// Register a member.
///
/// Local validation runs first; the member API is only called for a clean
/// form. On success the browser goes to the login page or `redirectUrl`.
///
/// # Errors
/// Returns an error if the member API is unreachable or answers garbage.
#[instrument(skip_all)]
pub async fn process_join<I, K, V>(
    api: &MemberApi,
    params: &RedirectParams,
    pairs: I,
) -> Result<ActionOutcome, ActionError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let redirect_url = params.resolve(JOIN_REDIRECT);
    debug!("join redirect: {}", redirect_url);

    let form = normalize(&JOIN_FORM, pairs);
    let errors = validate(&JOIN_FORM, &form);
    if errors.has_errors() {
        debug!("join form invalid: {} field(s)", errors.len());
        return Ok(ActionOutcome::Invalid(errors));
    }

    match api.join(&form).await {
        Ok(JoinReply::Created) => Ok(ActionOutcome::Redirect(Redirect {
            location: redirect_url,
            mode: RedirectMode::Push,
            revalidate: None,
        })),
        Ok(JoinReply::Rejected(errors)) => Ok(ActionOutcome::Invalid(errors)),
        Err(err) => {
            error!("Member join failed: {err}");
            Err(err)
        }
    }
}

/// Authenticate a member and store the session token in `session`.
///
/// # Errors
/// Returns an error if the member API is unreachable or answers garbage.
#[instrument(skip_all)]
pub async fn process_login<S, I, K, V>(
    api: &MemberApi,
    session: &mut S,
    params: &RedirectParams,
    pairs: I,
) -> Result<ActionOutcome, ActionError>
where
    S: SessionStore + ?Sized,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let redirect_url = params.resolve(LOGIN_REDIRECT);

    let form = normalize(&LOGIN_FORM, first_values(pairs));
    let credentials = match login_credentials(&form) {
        Ok(credentials) => credentials,
        Err(errors) => return Ok(ActionOutcome::Invalid(errors)),
    };

    match api.login(&credentials).await {
        Ok(LoginReply::Authenticated(token)) => {
            session.set(SessionCookie::session(token));
            Ok(ActionOutcome::Redirect(Redirect {
                location: redirect_url,
                mode: RedirectMode::Replace,
                revalidate: Some(ROOT_LAYOUT),
            }))
        }
        Ok(LoginReply::Rejected(errors)) => Ok(ActionOutcome::Invalid(errors)),
        Err(err) => {
            error!("Member login failed: {err}");
            Err(err)
        }
    }
}

/// Profile of the signed-in member, `None` without a session or on any failure.
#[instrument(skip_all)]
pub async fn fetch_user_info<S>(api: &MemberApi, session: &S) -> Option<Value>
where
    S: SessionStore + ?Sized,
{
    let token = session
        .get(SESSION_COOKIE_NAME)
        .filter(|token| !token.is_empty())?;

    match api.current_user(token).await {
        Ok(user) => user,
        Err(err) => {
            error!("Failed to fetch current user: {err}");
            None
        }
    }
}
