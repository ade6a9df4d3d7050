//! Categories API endpoint.

use api_types::category::{CategoryList, CategoryView};
use axum::{Json, extract::State};

use crate::{ServerError, server::ServerState};

pub async fn list(State(state): State<ServerState>) -> Result<Json<CategoryList>, ServerError> {
    let categories = state
        .engine
        .categories()
        .await?
        .into_iter()
        .map(|category| CategoryView {
            id: category.id,
            name: category.name,
        })
        .collect();
    Ok(Json(CategoryList { categories }))
}
