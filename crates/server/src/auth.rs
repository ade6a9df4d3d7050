//! Login and registration endpoints.

use api_types::auth::{Credentials, LoginResponse, Registered};
use axum::{Json, extract::State, http::StatusCode};

use crate::{
    ServerError,
    farm::map_farm,
    server::{ServerState, today},
};

pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Credentials>,
) -> Result<Json<LoginResponse>, ServerError> {
    let outcome = state
        .engine
        .login(&payload.username, &payload.password, today())
        .await?;

    Ok(Json(LoginResponse {
        id: outcome.user_id,
        username: outcome.username,
        today_logged: outcome.today_logged,
        leaves_earned_today: outcome.leaves_earned_today,
        total_login_days: outcome.total_login_days,
        farm: map_farm(outcome.farm),
    }))
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Credentials>,
) -> Result<(StatusCode, Json<Registered>), ServerError> {
    let user_id = state
        .engine
        .register(&payload.username, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(Registered { user_id })))
}
