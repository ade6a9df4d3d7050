use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use serde::Serialize;

use crate::{
    Ant, EngineError, Farm, LeavesAdjustment, ResultEngine, ant_farm, ants, farm,
};

use super::{Engine, with_tx};

/// An ant handed to a user and how many of that type they now own.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AntAdded {
    pub ant_id: i32,
    pub ant_name: String,
    pub quantity: i64,
}

impl Engine {
    /// Return the farm snapshot of a user.
    pub async fn farm(&self, user_id: i32) -> ResultEngine<Farm> {
        self.require_user(&self.database, user_id).await?;
        self.farm_snapshot(&self.database, user_id).await
    }

    /// The ant catalog, ordered by id.
    pub async fn ants(&self) -> ResultEngine<Vec<Ant>> {
        let models = ants::Entity::find()
            .order_by_asc(ants::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Ant::from).collect())
    }

    /// Give one ant of type `ant_id` to the user.
    ///
    /// The ownership row is created on the first ant of a type, then its
    /// quantity grows by one. `farm.ants_count` is rewritten from the
    /// ownership rows in the same transaction.
    pub async fn add_ant(&self, user_id: i32, ant_id: i32) -> ResultEngine<AntAdded> {
        with_tx!(self, |db_tx| {
            let ant = ants::Entity::find_by_id(ant_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(format!("ant {ant_id}")))?;
            self.require_user(&db_tx, user_id).await?;
            self.require_farm(&db_tx, user_id).await?;

            let owned = ant_farm::Entity::find()
                .filter(ant_farm::Column::UserId.eq(user_id))
                .filter(ant_farm::Column::AntId.eq(ant_id))
                .one(&db_tx)
                .await?;

            let quantity = match owned {
                Some(row) => {
                    let quantity = row.quantity + 1;
                    let mut active: ant_farm::ActiveModel = row.into();
                    active.quantity = ActiveValue::Set(quantity);
                    active.update(&db_tx).await?;
                    quantity
                }
                None => {
                    ant_farm::ActiveModel {
                        user_id: ActiveValue::Set(user_id),
                        ant_id: ActiveValue::Set(ant_id),
                        quantity: ActiveValue::Set(1),
                        ..Default::default()
                    }
                    .insert(&db_tx)
                    .await?;
                    1
                }
            };

            self.sync_ants_count(&db_tx, user_id).await?;

            tracing::debug!(user_id, ant_id, quantity, "ant added");
            Ok(AntAdded {
                ant_id,
                ant_name: ant.name,
                quantity,
            })
        })
    }

    /// Apply a signed change to the leaf balance.
    ///
    /// A change that would leave the balance below zero is rejected with
    /// [`EngineError::InsufficientLeaves`] and nothing is written.
    pub async fn adjust_leaves(&self, user_id: i32, change: i64) -> ResultEngine<LeavesAdjustment> {
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let farm = self.require_farm(&db_tx, user_id).await?;
            let adjustment = LeavesAdjustment::apply(farm.leaves_count, change)?;
            self.store_leaves(&db_tx, user_id, &adjustment).await?;

            tracing::debug!(
                user_id,
                previous = adjustment.previous_leaves,
                new = adjustment.new_leaves,
                "leaves adjusted"
            );
            Ok(adjustment)
        })
    }

    /// Writes the new balance only if it still equals the one the adjustment
    /// was computed from.
    async fn store_leaves(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i32,
        adjustment: &LeavesAdjustment,
    ) -> ResultEngine<()> {
        let result = farm::Entity::update_many()
            .col_expr(farm::Column::LeavesCount, Expr::value(adjustment.new_leaves))
            .filter(farm::Column::UserId.eq(user_id))
            .filter(farm::Column::LeavesCount.eq(adjustment.previous_leaves))
            .exec(db_tx)
            .await?;
        if result.rows_affected == 0 {
            self.require_farm(db_tx, user_id).await?;
            return Err(EngineError::Conflict(format!(
                "leaves balance of user {user_id} changed while adjusting it"
            )));
        }
        Ok(())
    }

    async fn sync_ants_count(&self, db_tx: &DatabaseTransaction, user_id: i32) -> ResultEngine<()> {
        let total = self.ants_owned(db_tx, user_id).await?;
        farm::Entity::update_many()
            .col_expr(farm::Column::AntsCount, Expr::value(total))
            .filter(farm::Column::UserId.eq(user_id))
            .exec(db_tx)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_engine;

    #[tokio::test]
    async fn stale_balance_is_a_conflict_and_keeps_the_newer_value() {
        let engine = test_engine().await;
        let user_id = engine.register("alice", "secret").await.unwrap();
        let stale = LeavesAdjustment::apply(0, 10).unwrap();
        engine.adjust_leaves(user_id, 7).await.unwrap();

        let db_tx = engine.database.begin().await.unwrap();
        let err = engine.store_leaves(&db_tx, user_id, &stale).await.unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
        drop(db_tx);

        assert_eq!(engine.farm(user_id).await.unwrap().leaves_count, 7);
    }

    #[tokio::test]
    async fn store_without_farm_is_missing_farm() {
        let engine = test_engine().await;
        let user_id = engine.register("alice", "secret").await.unwrap();
        farm::Entity::delete_many()
            .filter(farm::Column::UserId.eq(user_id))
            .exec(&engine.database)
            .await
            .unwrap();

        let db_tx = engine.database.begin().await.unwrap();
        let adjustment = LeavesAdjustment::apply(0, 10).unwrap();
        let err = engine.store_leaves(&db_tx, user_id, &adjustment).await.unwrap_err();
        assert_eq!(err, EngineError::MissingFarm(user_id));
    }
}
