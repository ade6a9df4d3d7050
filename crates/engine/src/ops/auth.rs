use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, SqlErr, TransactionTrait,
    prelude::*, sea_query::Expr,
};

use crate::{
    Accrual, DailyBonus, EngineError, LoginOutcome, ResultEngine, farm, goals, users,
    util::normalize_required_name,
};

use super::{Engine, with_tx};

impl Engine {
    /// Creates a user together with its farm and one zeroed goal per catalog
    /// category.
    ///
    /// The three inserts share a transaction: either the user exists with its
    /// farm and full set of goals, or nothing was written.
    pub async fn register(&self, username: &str, password: &str) -> ResultEngine<i32> {
        let username = normalize_required_name(username, "username")?;
        if password.is_empty() {
            return Err(EngineError::InvalidName(
                "password must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let exists = users::Entity::find()
                .filter(users::Column::Username.eq(username.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(username));
            }

            let user = self.insert_user(&db_tx, &username, password).await?;

            farm::ActiveModel {
                user_id: ActiveValue::Set(user.id),
                ants_count: ActiveValue::Set(0),
                leaves_count: ActiveValue::Set(0),
                bonus_leaves_earned: ActiveValue::Set(0),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            for category in self.catalog(&db_tx).await? {
                goals::ActiveModel {
                    user_id: ActiveValue::Set(user.id),
                    category_id: ActiveValue::Set(category.id),
                    amount_minor: ActiveValue::Set(0),
                    ..Default::default()
                }
                .insert(&db_tx)
                .await?;
            }

            tracing::info!(user_id = user.id, "registered user {username}");
            Ok(user.id)
        })
    }

    /// Checks credentials and pays the daily login bonus.
    ///
    /// `today` is the caller's calendar date. The first login of each day
    /// grants [`Accrual::Granted`] leaves; later logins on the same day grant
    /// nothing. The day is claimed with a conditional update on
    /// `users.last_login_date`, so two concurrent logins cannot both be paid.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        today: NaiveDate,
    ) -> ResultEngine<LoginOutcome> {
        let username = normalize_required_name(username, "username")?;
        if password.is_empty() {
            return Err(EngineError::InvalidName(
                "password must not be empty".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let user = users::Entity::find()
                .filter(users::Column::Username.eq(username.clone()))
                .one(&db_tx)
                .await?
                .filter(|user| user.password == password)
                .ok_or(EngineError::InvalidCredentials)?;

            let farm = self.require_farm(&db_tx, user.id).await?;
            let ants_owned = self.ants_owned(&db_tx, user.id).await?;

            let accrual = Accrual::evaluate(
                user.last_login_date,
                today,
                farm.bonus_leaves_earned,
                ants_owned,
            );
            let accrual = self.settle_accrual(&db_tx, user.id, today, accrual).await?;

            let farm = self.farm_snapshot(&db_tx, user.id).await?;
            Ok(LoginOutcome {
                user_id: user.id,
                username: user.username,
                today_logged: accrual.today_logged(),
                leaves_earned_today: accrual.leaves_earned_today(),
                total_login_days: farm.bonus_leaves_earned,
                farm,
            })
        })
    }

    /// Inserts the user row. A unique violation on the username means another
    /// registration won the race after the existence check.
    async fn insert_user(
        &self,
        db_tx: &DatabaseTransaction,
        username: &str,
        password: &str,
    ) -> ResultEngine<users::Model> {
        users::ActiveModel {
            username: ActiveValue::Set(username.to_string()),
            password: ActiveValue::Set(password.to_string()),
            last_login_date: ActiveValue::Set(None),
            ..Default::default()
        }
        .insert(db_tx)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                EngineError::ExistingKey(username.to_string())
            }
            _ => EngineError::Database(err),
        })
    }

    /// Claims the day and pays a granted bonus.
    ///
    /// When the day was claimed by another login since `accrual` was
    /// evaluated, nothing is paid and [`Accrual::AlreadyClaimed`] is returned.
    async fn settle_accrual(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i32,
        today: NaiveDate,
        accrual: Accrual,
    ) -> ResultEngine<Accrual> {
        let Accrual::Granted(bonus) = accrual else {
            return Ok(accrual);
        };
        if !self.claim_day(db_tx, user_id, today).await? {
            tracing::debug!(user_id, "day already claimed by another login");
            return Ok(Accrual::AlreadyClaimed);
        }
        self.pay_bonus(db_tx, user_id, bonus).await?;
        tracing::debug!(
            user_id,
            leaves = bonus.leaves_earned_today,
            streak = bonus.new_bonus_streak,
            "daily bonus granted"
        );
        Ok(accrual)
    }

    /// Moves `last_login_date` to `today` unless it already is `today`.
    ///
    /// Returns `false` when another login claimed the day first.
    async fn claim_day(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i32,
        today: NaiveDate,
    ) -> ResultEngine<bool> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::LastLoginDate, Expr::value(today))
            .filter(users::Column::Id.eq(user_id))
            .filter(
                Condition::any()
                    .add(users::Column::LastLoginDate.is_null())
                    .add(users::Column::LastLoginDate.ne(today)),
            )
            .exec(db_tx)
            .await?;
        Ok(result.rows_affected == 1)
    }

    async fn pay_bonus(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: i32,
        bonus: DailyBonus,
    ) -> ResultEngine<()> {
        let result = farm::Entity::update_many()
            .col_expr(
                farm::Column::BonusLeavesEarned,
                Expr::value(bonus.new_bonus_streak),
            )
            .col_expr(
                farm::Column::LeavesCount,
                Expr::col(farm::Column::LeavesCount).add(bonus.leaves_earned_today),
            )
            .filter(farm::Column::UserId.eq(user_id))
            .exec(db_tx)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::MissingFarm(user_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::test_engine;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn day_claimed_after_evaluation_pays_nothing() {
        let engine = test_engine().await;
        let user_id = engine.register("alice", "secret").await.unwrap();
        let today = day(2025, 10, 29);

        let accrual = Accrual::evaluate(None, today, 0, 0);
        assert!(matches!(accrual, Accrual::Granted(_)));

        let db_tx = engine.database.begin().await.unwrap();
        // A concurrent login takes the day first.
        assert!(engine.claim_day(&db_tx, user_id, today).await.unwrap());
        assert!(!engine.claim_day(&db_tx, user_id, today).await.unwrap());

        let settled = engine
            .settle_accrual(&db_tx, user_id, today, accrual)
            .await
            .unwrap();
        assert_eq!(settled, Accrual::AlreadyClaimed);
        assert!(settled.today_logged());
        assert_eq!(settled.leaves_earned_today(), 0);

        let farm = engine.require_farm(&db_tx, user_id).await.unwrap();
        assert_eq!(farm.leaves_count, 0);
        assert_eq!(farm.bonus_leaves_earned, 0);
    }

    #[tokio::test]
    async fn unclaimed_day_is_paid_once() {
        let engine = test_engine().await;
        let user_id = engine.register("alice", "secret").await.unwrap();
        let today = day(2025, 10, 29);
        let accrual = Accrual::evaluate(None, today, 0, 0);

        let db_tx = engine.database.begin().await.unwrap();
        let settled = engine
            .settle_accrual(&db_tx, user_id, today, accrual)
            .await
            .unwrap();
        assert_eq!(settled, accrual);
        let again = engine
            .settle_accrual(&db_tx, user_id, today, accrual)
            .await
            .unwrap();
        assert_eq!(again, Accrual::AlreadyClaimed);

        let farm = engine.require_farm(&db_tx, user_id).await.unwrap();
        assert_eq!(farm.leaves_count, 1);
        assert_eq!(farm.bonus_leaves_earned, 1);
    }

    #[tokio::test]
    async fn duplicate_username_insert_is_an_existing_key() {
        let engine = test_engine().await;
        engine.register("alice", "secret").await.unwrap();

        // Skips the existence check, as a registration racing the first would.
        let db_tx = engine.database.begin().await.unwrap();
        let err = engine
            .insert_user(&db_tx, "alice", "other")
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::ExistingKey("alice".to_string()));
    }
}
