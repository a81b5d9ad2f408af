//! `process-referral` edge function.

use actix_web::{HttpRequest, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ApiResult;
use super::auth::authenticate;
use super::state::HttpState;

/// Request body for `POST /functions/v1/process-referral`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReferralRequest {
    /// Code shared by the referrer.
    #[schema(example = "QUEST-42")]
    pub referral_code: String,
}

/// Successful redemption.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessReferralResponse {
    /// Always `true`.
    pub success: bool,
    /// XP credited to the caller.
    pub xp_awarded: u32,
}

/// Redeem a referral code for the authenticated caller.
#[utoipa::path(
    post,
    path = "/functions/v1/process-referral",
    tags = ["edge-functions"],
    request_body = ProcessReferralRequest,
    responses(
        (status = 200, description = "Referral credited", body = ProcessReferralResponse),
        (status = 400, description = "Malformed code", body = super::error::FailureBody),
        (status = 401, description = "Missing or invalid token", body = super::error::FailureBody),
        (status = 409, description = "Code refused", body = super::error::FailureBody),
        (status = 503, description = "Platform unavailable", body = super::error::FailureBody)
    ),
    security(("BearerToken" = []))
)]
#[post("/functions/v1/process-referral")]
pub async fn process_referral(
    state: web::Data<HttpState>,
    request: HttpRequest,
    payload: web::Json<ProcessReferralRequest>,
) -> ApiResult<web::Json<ProcessReferralResponse>> {
    let referee = authenticate(&request, state.tokens.as_ref()).await?;
    let xp_awarded = state
        .referrals
        .redeem(&referee, &payload.referral_code)
        .await?;
    Ok(web::Json(ProcessReferralResponse {
        success: true,
        xp_awarded,
    }))
}
