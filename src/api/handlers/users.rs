//! Account endpoints: registration, login, profile reads and
//! identity-scoped mutation.

use axum::{
    extract::{Extension, Multipart, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;
use uuid::Uuid;

use super::error_response;
use crate::{
    account::{
        store::PublicProfile, AccountError, AccountService, IdentitySummary, LoginGrant,
        ProfileEdit,
    },
    api::auth::require_auth,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    name: String,
    email: String,
    password: String,
    password2: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EditDetailsRequest {
    name: String,
    email: String,
    current_password: String,
    new_password: String,
    confirm_new_password: String,
}

#[utoipa::path(
    post,
    path = "/users/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = IdentitySummary),
        (status = 409, description = "Email already exists"),
        (status = 422, description = "Missing or malformed fields"),
    ),
    tag = "users"
)]
pub async fn register(
    service: Extension<Arc<AccountService>>,
    payload: Option<Json<RegisterRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service
        .register(
            &payload.name,
            &payload.email,
            &payload.password,
            &payload.password2,
        )
        .await
    {
        Ok(summary) => (StatusCode::CREATED, Json(summary)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session token issued", body = LoginGrant),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "users"
)]
pub async fn login(
    service: Extension<Arc<AccountService>>,
    payload: Option<Json<LoginRequest>>,
) -> Response {
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    match service.login(&payload.email, &payload.password).await {
        Ok(grant) => (StatusCode::OK, Json(grant)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Public profile", body = PublicProfile),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 404, description = "User not found"),
    ),
    tag = "users"
)]
pub async fn profile(
    Path(id): Path<String>,
    headers: HeaderMap,
    service: Extension<Arc<AccountService>>,
) -> Response {
    if let Err(err) = require_auth(&headers, service.tokens()) {
        return error_response(&err);
    }

    // Unparseable ids behave like unknown ids.
    let Ok(id) = Uuid::parse_str(id.trim()) else {
        return error_response(&AccountError::NotFound);
    };

    match service.profile(id).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/users/edit-details",
    request_body = EditDetailsRequest,
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Profile updated", body = PublicProfile),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 409, description = "Email already exists"),
        (status = 422, description = "Missing fields or wrong current password"),
    ),
    tag = "users"
)]
pub async fn edit_details(
    headers: HeaderMap,
    service: Extension<Arc<AccountService>>,
    payload: Option<Json<EditDetailsRequest>>,
) -> Response {
    let identity = match require_auth(&headers, service.tokens()) {
        Ok(identity) => identity,
        Err(err) => return error_response(&err),
    };
    let Some(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response();
    };

    let edit = ProfileEdit {
        name: payload.name,
        email: payload.email,
        current_password: payload.current_password,
        new_password: payload.new_password,
        confirm_new_password: payload.confirm_new_password,
    };

    match service.edit_details(&identity, edit).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    post,
    path = "/users/change-avatar",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Avatar replaced", body = PublicProfile),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 422, description = "Missing or oversize upload"),
    ),
    tag = "users"
)]
pub async fn change_avatar(
    headers: HeaderMap,
    service: Extension<Arc<AccountService>>,
    mut multipart: Multipart,
) -> Response {
    let identity = match require_auth(&headers, service.tokens()) {
        Ok(identity) => identity,
        Err(err) => return error_response(&err),
    };

    let missing_image = || AccountError::Validation("Please choose an image.".to_string());

    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("avatar") {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    match field.bytes().await {
                        Ok(bytes) => upload = Some((file_name, bytes)),
                        Err(err) => {
                            debug!("failed to read avatar field: {err}");
                            return error_response(&missing_image());
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(err) => {
                debug!("failed to parse multipart body: {err}");
                return error_response(&missing_image());
            }
        }
    }

    let Some((file_name, bytes)) = upload else {
        return error_response(&missing_image());
    };

    match service.change_avatar(&identity, &file_name, &bytes).await {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(&err),
    }
}

#[utoipa::path(
    get,
    path = "/users/authors",
    responses(
        (status = 200, description = "All authors, password hashes stripped", body = [PublicProfile]),
    ),
    tag = "users"
)]
pub async fn authors(service: Extension<Arc<AccountService>>) -> Response {
    match service.authors().await {
        Ok(authors) => (StatusCode::OK, Json(authors)).into_response(),
        Err(err) => error_response(&err),
    }
}
