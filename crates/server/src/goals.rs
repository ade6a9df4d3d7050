//! Goals API endpoints.

use api_types::goal::{GoalList, GoalView, GoalsUpdate};
use axum::{
    Json,
    extract::{Path, State},
};
use engine::{GoalUpdate, MoneyCents};

use crate::{ServerError, server::ServerState};

fn map_goals(goals: Vec<engine::Goal>) -> GoalList {
    GoalList {
        goals: goals
            .into_iter()
            .map(|goal| GoalView {
                id: goal.id,
                category_id: goal.category_id,
                category_name: goal.category_name,
                money: goal.amount.to_major(),
            })
            .collect(),
    }
}

pub async fn list(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<GoalList>, ServerError> {
    let goals = state.engine.goals(user_id).await?;
    Ok(Json(map_goals(goals)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<GoalsUpdate>,
) -> Result<Json<GoalList>, ServerError> {
    let updates = payload
        .goals
        .into_iter()
        .map(|goal| {
            Ok(GoalUpdate {
                category_id: goal.category_id,
                amount: MoneyCents::from_major(goal.money)?,
            })
        })
        .collect::<Result<Vec<_>, engine::EngineError>>()?;

    let goals = state.engine.update_goals(user_id, &updates).await?;
    Ok(Json(map_goals(goals)))
}
