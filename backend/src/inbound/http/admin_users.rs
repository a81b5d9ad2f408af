//! `admin-delete-user` edge function.

use actix_web::{HttpRequest, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ApiResult;
use super::auth::authenticate;
use super::state::HttpState;
use crate::domain::{Error, UserId};

/// Request body for `POST /functions/v1/admin-delete-user`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    /// Account to delete.
    #[schema(format = "uuid")]
    pub user_id: String,
}

/// Successful deletion.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteUserResponse {
    /// Always `true`.
    pub success: bool,
}

/// Delete an account. The caller must hold the admin role.
#[utoipa::path(
    post,
    path = "/functions/v1/admin-delete-user",
    tags = ["edge-functions"],
    request_body = DeleteUserRequest,
    responses(
        (status = 200, description = "Account deleted", body = DeleteUserResponse),
        (status = 400, description = "Invalid user id or self-deletion", body = super::error::FailureBody),
        (status = 401, description = "Missing or invalid token", body = super::error::FailureBody),
        (status = 403, description = "Caller is not an admin", body = super::error::FailureBody),
        (status = 404, description = "No such account", body = super::error::FailureBody)
    ),
    security(("BearerToken" = []))
)]
#[post("/functions/v1/admin-delete-user")]
pub async fn admin_delete_user(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<DeleteUserRequest>,
) -> ApiResult<web::Json<DeleteUserResponse>> {
    let caller = authenticate(&request, state.tokens.as_ref()).await?;
    let target = UserId::new(&payload.user_id)
        .map_err(|err| Error::invalid_request(format!("userId: {err}")))?;
    state.admin_users.delete_user(&caller, &target).await?;
    Ok(web::Json(DeleteUserResponse { success: true }))
}
