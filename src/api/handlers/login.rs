use super::{outcome_response, ErrorResponse};
use crate::member::{process_login, CookieJar, MemberApi, RedirectParams};
use axum::{
    extract::{Extension, Form, Query},
    http::HeaderMap,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/member/login",
    params(RedirectParams),
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Signed in; sets the `token` cookie and asks the browser to drop cached pages"),
        (status = 400, description = "Missing credentials or rejected by the member API", body = ErrorResponse),
        (status = 502, description = "Member API unreachable or replied with garbage", body = ErrorResponse),
    ),
    tag = "member"
)]
pub async fn login(
    Extension(api): Extension<Arc<MemberApi>>,
    headers: HeaderMap,
    Query(params): Query<RedirectParams>,
    Form(pairs): Form<Vec<(String, String)>>,
) -> Response {
    let mut jar = CookieJar::from_headers(&headers);

    match process_login(&api, &mut jar, &params, pairs).await {
        Ok(outcome) => outcome_response(outcome, jar.pending()),
        Err(err) => err.into_response(),
    }
}
