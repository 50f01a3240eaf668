//! HTTP client for the remote member API.

use super::errors::{ActionError, ErrorMap};
use super::form::SubmittedForm;
use super::session::{is_cookie_value, SessionToken};
use crate::APP_USER_AGENT;
use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const JOIN_REJECTED: &str = "Registration was rejected by the member service.";
const LOGIN_REJECTED: &str = "Login failed. Check your email and password.";

#[derive(Debug, Clone)]
pub struct Credentials {
    email: String,
    password: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: SecretString::from(password.into()),
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinReply {
    Created,
    Rejected(ErrorMap),
}

#[derive(Debug, Clone)]
pub enum LoginReply {
    Authenticated(SessionToken),
    Rejected(ErrorMap),
}

/// Envelope shared by member API replies.
#[derive(Debug, Default, Deserialize)]
struct ApiReply {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    message: Option<Value>,
}

impl ApiReply {
    fn succeeded(&self) -> bool {
        is_truthy(&self.success)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[derive(Debug, Clone)]
pub struct MemberApi {
    client: Client,
    base_url: String,
}

impl MemberApi {
    /// Build a client for the member API rooted at `api_url`.
    ///
    /// # Errors
    /// Returns an error if `api_url` is not an http(s) URL or the HTTP client
    /// cannot be built.
    pub fn new(api_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let url = Url::parse(api_url).with_context(|| format!("Invalid API URL: {api_url}"))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(anyhow!("Unsupported API URL scheme: {scheme}")),
        }

        let mut builder = Client::builder().user_agent(APP_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("Failed to build HTTP client")?,
            base_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// `POST /member/join`. Only `201 Created` counts as success.
    ///
    /// # Errors
    /// Returns an error if the API is unreachable or a rejection body is not JSON.
    #[instrument(skip_all, fields(api = %self.base_url))]
    pub async fn join(&self, form: &SubmittedForm) -> Result<JoinReply, ActionError> {
        let response = self
            .client
            .post(self.endpoint("/member/join"))
            .json(form)
            .send()
            .await
            .map_err(ActionError::RemoteUnavailable)?;

        let status = response.status();
        if status == StatusCode::CREATED {
            debug!("Member created");
            return Ok(JoinReply::Created);
        }

        let reply = read_reply(response).await?;
        debug!("Member join rejected: {}", status);

        Ok(JoinReply::Rejected(ErrorMap::from_remote(
            reply.message.as_ref(),
            JOIN_REJECTED,
        )))
    }

    /// `POST /member/login`. Success needs `200` and a truthy `success` flag;
    /// the reply's `data` is the session token.
    ///
    /// # Errors
    /// Returns an error if the API is unreachable, the body is not JSON, or a
    /// successful reply carries no token.
    #[instrument(skip_all, fields(api = %self.base_url))]
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginReply, ActionError> {
        let payload = json!({
            "email": credentials.email(),
            "password": credentials.password().expose_secret(),
        });

        let response = self
            .client
            .post(self.endpoint("/member/login"))
            .json(&payload)
            .send()
            .await
            .map_err(ActionError::RemoteUnavailable)?;

        let status = response.status();
        let reply = read_reply(response).await?;

        if status == StatusCode::OK && reply.succeeded() {
            let token = reply.data.as_str().ok_or_else(|| {
                ActionError::MalformedResponse("login reply without session token".to_string())
            })?;
            if !is_cookie_value(token) {
                return Err(ActionError::MalformedResponse(
                    "session token is not a valid cookie value".to_string(),
                ));
            }

            debug!("Member authenticated");
            return Ok(LoginReply::Authenticated(SessionToken::new(token)));
        }

        debug!("Member login rejected: {}", status);

        Ok(LoginReply::Rejected(ErrorMap::from_remote(
            reply.message.as_ref(),
            LOGIN_REJECTED,
        )))
    }

    /// `GET /member` with the session token as bearer credentials.
    ///
    /// Returns `None` unless the API answers `200` with a truthy `success`.
    ///
    /// # Errors
    /// Returns an error if the API is unreachable or the body is not JSON.
    #[instrument(skip_all, fields(api = %self.base_url))]
    pub async fn current_user(&self, token: &str) -> Result<Option<Value>, ActionError> {
        let response = self
            .client
            .get(self.endpoint("/member"))
            .bearer_auth(token)
            .send()
            .await
            .map_err(ActionError::RemoteUnavailable)?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!("Current user lookup returned {}", status);
            return Ok(None);
        }

        let reply = read_reply(response).await?;
        if reply.succeeded() && !reply.data.is_null() {
            Ok(Some(reply.data))
        } else {
            Ok(None)
        }
    }
}

async fn read_reply(response: Response) -> Result<ApiReply, ActionError> {
    let body = response
        .bytes()
        .await
        .map_err(ActionError::RemoteUnavailable)?;

    Ok(serde_json::from_slice(&body)?)
}
