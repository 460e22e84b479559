//! Admin and liveness handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use gatehouse_types::admission::UsageStatus;
use gatehouse_types::identity::{ConversationKey, LocationId, UserId};
use gatehouse_types::tier::Tier;

use crate::http::error::AppError;
use crate::state::AppState;

/// `GET /health` — liveness probe.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/v1/admin/breaker/clear` — close the circuit breaker now.
pub async fn clear_breaker(State(state): State<AppState>) -> StatusCode {
    state.breaker.clear();
    StatusCode::NO_CONTENT
}

#[derive(Debug, Deserialize)]
pub struct SetTierBody {
    pub tier: String,
}

#[derive(Debug, Serialize)]
pub struct TierResponse {
    pub user: UserId,
    pub tier: Tier,
}

/// `PUT /api/v1/admin/tiers/{user}` — persist a tier override.
pub async fn set_tier(
    State(state): State<AppState>,
    Path(user): Path<u64>,
    Json(body): Json<SetTierBody>,
) -> Result<Json<TierResponse>, AppError> {
    let tier: Tier = body
        .tier
        .parse()
        .map_err(|e: String| AppError::Validation(e))?;
    let user = UserId(user);
    state.plans.set_tier(user, tier).await?;
    Ok(Json(TierResponse { user, tier }))
}

/// `GET /api/v1/admin/tiers/{user}` — effective tier for a user.
pub async fn get_tier(
    State(state): State<AppState>,
    Path(user): Path<u64>,
) -> Json<TierResponse> {
    let user = UserId(user);
    let tier = state.plans.tier_for(user).await;
    Json(TierResponse { user, tier })
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub user: UserId,
    pub tier: Tier,
    #[serde(flatten)]
    pub usage: UsageStatus,
}

/// `GET /api/v1/admin/usage/{user}` — rolling-window usage snapshot.
pub async fn get_usage(
    State(state): State<AppState>,
    Path(user): Path<u64>,
) -> Json<UsageResponse> {
    let user = UserId(user);
    let tier = state.plans.tier_for(user).await;
    let usage = state.controller.usage_status(user, tier);
    Json(UsageResponse { user, tier, usage })
}

/// `GET /api/v1/admin/wizard/{user}` — whether an intake session is live.
pub async fn get_wizard_session(
    State(state): State<AppState>,
    Path(user): Path<u64>,
) -> Json<Value> {
    let active = state.wizard.has_session(UserId(user));
    Json(json!({ "user": user, "active": active }))
}

/// `DELETE /api/v1/admin/memory/{user}/{location}` — drop a conversation's
/// history.
pub async fn clear_memory(
    State(state): State<AppState>,
    Path((user, location)): Path<(u64, u64)>,
) -> StatusCode {
    state
        .memory
        .clear(ConversationKey::new(UserId(user), LocationId(location)));
    StatusCode::NO_CONTENT
}
