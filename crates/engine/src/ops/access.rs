//! Lookups shared by the operations.
//!
//! Every helper takes the connection explicitly so it can run either on the
//! pool or inside an open transaction.

use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, prelude::*, sea_query::Expr};

use crate::{
    Category, EngineError, Farm, OwnedAnts, ResultEngine, ant_farm, ants, categories, farm, users,
};

use super::Engine;

impl Engine {
    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i32,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("user {user_id}")))
    }

    /// A user without a farm row breaks the registration invariant; it is
    /// reported as such instead of being treated as an empty farm.
    pub(super) async fn require_farm<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i32,
    ) -> ResultEngine<farm::Model> {
        farm::Entity::find()
            .filter(farm::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or(EngineError::MissingFarm(user_id))
    }

    /// Total number of ants owned by a user, across all types.
    pub(super) async fn ants_owned<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i32,
    ) -> ResultEngine<i64> {
        let total: Option<Option<i64>> = ant_farm::Entity::find()
            .select_only()
            .column_as(Expr::col(ant_farm::Column::Quantity).sum(), "total")
            .filter(ant_farm::Column::UserId.eq(user_id))
            .into_tuple()
            .one(db)
            .await?;
        Ok(total.flatten().unwrap_or(0))
    }

    /// The category catalog ordered by id.
    pub(super) async fn catalog<C: ConnectionTrait>(&self, db: &C) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .order_by_asc(categories::Column::Id)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Category::from).collect())
    }

    pub(super) async fn farm_snapshot<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: i32,
    ) -> ResultEngine<Farm> {
        let farm = self.require_farm(db, user_id).await?;

        let owned: Vec<(ant_farm::Model, Option<ants::Model>)> = ant_farm::Entity::find()
            .filter(ant_farm::Column::UserId.eq(user_id))
            .find_also_related(ants::Entity)
            .all(db)
            .await?;

        let mut ants: Vec<OwnedAnts> = owned
            .into_iter()
            .filter_map(|(row, ant)| {
                ant.map(|ant| OwnedAnts {
                    ant_id: row.ant_id,
                    name: ant.name,
                    quantity: row.quantity,
                })
            })
            .collect();
        ants.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(Farm {
            user_id,
            ants_count: ants.iter().map(|a| a.quantity).sum(),
            leaves_count: farm.leaves_count,
            bonus_leaves_earned: farm.bonus_leaves_earned,
            ants,
        })
    }
}
