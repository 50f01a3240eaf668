//! HTTP handlers for the member actions.
//!
//! Handlers only translate between HTTP and [`crate::member`]: an
//! [`ActionOutcome`] becomes either `400` with the error map or `303` with the
//! redirect, and an [`ActionError`] becomes `502`.

pub mod health;
pub mod join;
pub mod login;
pub mod me;

use crate::member::{
    errors::GLOBAL_FIELD, ActionError, ActionOutcome, ErrorKind, ErrorMap, Redirect,
    SessionCookie,
};
use axum::{
    http::{
        header::{CACHE_CONTROL, LOCATION, SET_COOKIE},
        HeaderMap, HeaderName, HeaderValue, StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use utoipa::ToSchema;

pub const REDIRECT_MODE_HEADER: HeaderName = HeaderName::from_static("x-redirect-mode");
pub const REVALIDATE_HEADER: HeaderName = HeaderName::from_static("x-revalidate-path");
pub const CLEAR_SITE_DATA: HeaderName = HeaderName::from_static("clear-site-data");

pub const REMOTE_UNAVAILABLE_MESSAGE: &str =
    "The member service is unavailable. Please try again later.";
pub const REMOTE_PROTOCOL_MESSAGE: &str =
    "The member service returned an unexpected reply. Please try again later.";

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Field name to messages; `global` holds messages not tied to a field.
    pub errors: ErrorMap,
    /// Set when the member API could not be used at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Turn an action outcome into the response, attaching `cookies` to redirects.
pub(crate) fn outcome_response(outcome: ActionOutcome, cookies: &[SessionCookie]) -> Response {
    match outcome {
        ActionOutcome::Invalid(errors) => {
            debug!("Form rejected: {:?}", errors.fields().collect::<Vec<_>>());
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { errors, kind: None }),
            )
                .into_response()
        }
        ActionOutcome::Redirect(redirect) => redirect_response(&redirect, cookies),
    }
}

fn redirect_response(redirect: &Redirect, cookies: &[SessionCookie]) -> Response {
    let mut headers = HeaderMap::new();

    match HeaderValue::from_str(&redirect.location) {
        Ok(location) => {
            headers.insert(LOCATION, location);
        }
        Err(err) => {
            error!("Invalid redirect location {}: {}", redirect.location, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    headers.insert(
        REDIRECT_MODE_HEADER,
        HeaderValue::from_static(redirect.mode.as_str()),
    );

    if let Some(path) = redirect.revalidate {
        headers.insert(REVALIDATE_HEADER, HeaderValue::from_static(path));
        headers.insert(CLEAR_SITE_DATA, HeaderValue::from_static("\"cache\""));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    for cookie in cookies {
        match cookie.header_value() {
            Ok(value) => {
                headers.append(SET_COOKIE, value);
            }
            Err(err) => {
                error!("Failed to build {} cookie: {}", cookie.name(), err);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    (StatusCode::SEE_OTHER, headers).into_response()
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let message = match kind {
            ErrorKind::RemoteUnavailable => REMOTE_UNAVAILABLE_MESSAGE,
            ErrorKind::RemoteProtocol => REMOTE_PROTOCOL_MESSAGE,
        };

        (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                errors: ErrorMap::new().with(GLOBAL_FIELD, message),
                kind: Some(kind.as_str().to_string()),
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::{RedirectMode, SessionToken};
    use anyhow::Result;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Result<serde_json::Value> {
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    #[tokio::test]
    async fn invalid_outcome_is_bad_request() -> Result<()> {
        let outcome = ActionOutcome::Invalid(ErrorMap::new().with("email", "missing"));
        let response = outcome_response(outcome, &[]);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(LOCATION).is_none());
        assert_eq!(
            body_json(response).await?,
            serde_json::json!({"errors": {"email": ["missing"]}})
        );
        Ok(())
    }

    #[test]
    fn push_redirect_has_no_cache_headers() {
        let outcome = ActionOutcome::Redirect(Redirect {
            location: "/member/login".to_string(),
            mode: RedirectMode::Push,
            revalidate: None,
        });
        let response = outcome_response(outcome, &[]);
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let headers = response.headers();
        assert_eq!(
            headers.get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/member/login")
        );
        assert_eq!(
            headers.get(REDIRECT_MODE_HEADER).and_then(|v| v.to_str().ok()),
            Some("push")
        );
        assert!(headers.get(CLEAR_SITE_DATA).is_none());
        assert!(headers.get(SET_COOKIE).is_none());
    }

    #[test]
    fn replace_redirect_carries_cookie_and_revalidation() {
        let outcome = ActionOutcome::Redirect(Redirect {
            location: "/".to_string(),
            mode: RedirectMode::Replace,
            revalidate: Some("/"),
        });
        let cookies = [SessionCookie::session(SessionToken::new("abc123"))];
        let response = outcome_response(outcome, &cookies);
        let headers = response.headers();
        assert_eq!(
            headers.get(REDIRECT_MODE_HEADER).and_then(|v| v.to_str().ok()),
            Some("replace")
        );
        assert_eq!(
            headers.get(REVALIDATE_HEADER).and_then(|v| v.to_str().ok()),
            Some("/")
        );
        assert_eq!(
            headers.get(CLEAR_SITE_DATA).and_then(|v| v.to_str().ok()),
            Some("\"cache\"")
        );
        assert_eq!(
            headers.get(SET_COOKIE).and_then(|v| v.to_str().ok()),
            Some("token=abc123; Path=/; SameSite=None; HttpOnly; Secure")
        );
    }

    #[tokio::test]
    async fn protocol_error_is_bad_gateway() -> Result<()> {
        let response = ActionError::MalformedResponse("eof".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await?;
        assert_eq!(body["kind"], "remote_protocol");
        assert_eq!(body["errors"][GLOBAL_FIELD][0], REMOTE_PROTOCOL_MESSAGE);
        Ok(())
    }
}
