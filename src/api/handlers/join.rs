use super::{outcome_response, ErrorResponse};
use crate::member::{process_join, MemberApi, RedirectParams};
use axum::{
    extract::{Extension, Form, Query},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Join form as posted by the browser. Only used for the `OpenAPI` document,
/// the handler reads the raw pairs so repeated keys survive.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub confirm_password: String,
    pub phone_number: String,
    pub gender: String,
    /// Any of `YYYY-MM-DD`, `YYYY/MM/DD`, `YYYY.MM.DD` or RFC 3339.
    pub birth_dt: String,
    pub required_terms1: bool,
    pub required_terms2: bool,
    pub required_terms3: bool,
    /// Repeat the key once per accepted optional term.
    pub optional_terms: Option<Vec<String>>,
    pub zip_code: String,
    pub address: String,
    pub address_sub: Option<String>,
}

#[utoipa::path(
    post,
    path = "/member/join",
    params(RedirectParams),
    request_body(content = JoinRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Member created, follow `Location`"),
        (status = 400, description = "Local validation failed or the member API rejected the form", body = ErrorResponse),
        (status = 502, description = "Member API unreachable or replied with garbage", body = ErrorResponse),
    ),
    tag = "member"
)]
pub async fn join(
    Extension(api): Extension<Arc<MemberApi>>,
    Query(params): Query<RedirectParams>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    match process_join(&api, &params, pairs).await {
        Ok(outcome) => outcome_response(outcome, &[]),
        Err(err) => err.into_response(),
    }
}
