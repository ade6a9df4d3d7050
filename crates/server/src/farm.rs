//! Farm API endpoints.

use api_types::farm::{
    AntAdded, AntList, AntView, FarmView, LeavesChange, LeavesUpdated, OwnedAntsView,
};
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};

pub(crate) fn map_farm(farm: engine::Farm) -> FarmView {
    FarmView {
        ants_count: farm.ants_count,
        leaves_count: farm.leaves_count,
        bonus_leaves_earned: farm.bonus_leaves_earned,
        ants: farm
            .ants
            .into_iter()
            .map(|owned| OwnedAntsView {
                ant_id: owned.ant_id,
                name: owned.name,
                quantity: owned.quantity,
            })
            .collect(),
    }
}

pub async fn get(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<FarmView>, ServerError> {
    let farm = state.engine.farm(user_id).await?;
    Ok(Json(map_farm(farm)))
}

pub async fn add_ant(
    State(state): State<ServerState>,
    Path((user_id, ant_id)): Path<(i32, i32)>,
) -> Result<Json<AntAdded>, ServerError> {
    let added = state.engine.add_ant(user_id, ant_id).await?;
    Ok(Json(AntAdded {
        ant_id: added.ant_id,
        ant_name: added.ant_name,
        new_quantity: added.quantity,
    }))
}

pub async fn adjust_leaves(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
    Json(payload): Json<LeavesChange>,
) -> Result<Json<LeavesUpdated>, ServerError> {
    let adjustment = state.engine.adjust_leaves(user_id, payload.leaves).await?;
    Ok(Json(LeavesUpdated {
        previous_leaves: adjustment.previous_leaves,
        leaves_change: adjustment.leaves_change,
        new_leaves: adjustment.new_leaves,
    }))
}

pub async fn ants(State(state): State<ServerState>) -> Result<Json<AntList>, ServerError> {
    let ants = state
        .engine
        .ants()
        .await?
        .into_iter()
        .map(|ant| AntView {
            id: ant.id,
            name: ant.name,
        })
        .collect();
    Ok(Json(AntList { ants }))
}
