use crate::member::{fetch_user_info, CookieJar, MemberApi};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

#[utoipa::path(
    get,
    path = "/member",
    responses(
        (status = 200, description = "Profile of the signed-in member, as returned by the member API", content_type = "application/json"),
        (status = 204, description = "No session, or the member API did not return a profile"),
    ),
    tag = "member"
)]
pub async fn me(Extension(api): Extension<Arc<MemberApi>>, headers: HeaderMap) -> Response {
    let jar = CookieJar::from_headers(&headers);

    match fetch_user_info(&api, &jar).await {
        Some(user) => (StatusCode::OK, Json(user)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
