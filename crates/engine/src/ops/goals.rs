use std::collections::HashSet;

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*, sea_query::Expr};

use crate::{
    Category, EngineError, Goal, GoalUpdate, MoneyCents, ResultEngine, categories, goals,
};

use super::{Engine, with_tx};

impl Engine {
    /// The weekly goals of a user, one per catalog category, ordered by
    /// category id.
    ///
    /// A user created by [`Engine::register`] always has the full set; fewer
    /// rows are reported as [`EngineError::IncompleteGoals`].
    pub async fn goals(&self, user_id: i32) -> ResultEngine<Vec<Goal>> {
        self.require_user(&self.database, user_id).await?;

        let rows: Vec<(goals::Model, Option<categories::Model>)> = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id))
            .order_by_asc(goals::Column::CategoryId)
            .find_also_related(categories::Entity)
            .all(&self.database)
            .await?;

        let expected = self.catalog(&self.database).await?.len();
        if rows.len() < expected {
            return Err(EngineError::IncompleteGoals {
                user_id,
                found: rows.len(),
                expected,
            });
        }

        Ok(rows
            .into_iter()
            .map(|(goal, category)| Goal {
                id: goal.id,
                user_id: goal.user_id,
                category_id: goal.category_id,
                category_name: category.map(|c| c.name).unwrap_or_default(),
                amount: MoneyCents::new(goal.amount_minor),
            })
            .collect())
    }

    /// Replace every goal of a user at once.
    ///
    /// `updates` must name each catalog category exactly once. Negative
    /// amounts are stored as zero.
    pub async fn update_goals(&self, user_id: i32, updates: &[GoalUpdate]) -> ResultEngine<Vec<Goal>> {
        let updated: ResultEngine<()> = with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            let catalog = self.catalog(&db_tx).await?;
            validate_goal_set(updates, &catalog)?;

            for update in updates {
                let amount = update.amount.max_zero();
                let result = goals::Entity::update_many()
                    .col_expr(goals::Column::AmountMinor, Expr::value(amount.cents()))
                    .filter(goals::Column::UserId.eq(user_id))
                    .filter(goals::Column::CategoryId.eq(update.category_id))
                    .exec(&db_tx)
                    .await?;
                if result.rows_affected == 0 {
                    return Err(EngineError::IncompleteGoals {
                        user_id,
                        found: 0,
                        expected: catalog.len(),
                    });
                }
            }

            tracing::debug!(user_id, "goals updated");
            Ok(())
        });
        updated?;

        self.goals(user_id).await
    }

    /// The category catalog ordered by name.
    pub async fn categories(&self) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .order_by_asc(categories::Column::Name)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Category::from).collect())
    }
}

fn validate_goal_set(updates: &[GoalUpdate], catalog: &[Category]) -> ResultEngine<()> {
    if updates.len() != catalog.len() {
        return Err(EngineError::InvalidGoals(format!(
            "expected {} goals, got {}",
            catalog.len(),
            updates.len()
        )));
    }

    let known: HashSet<i32> = catalog.iter().map(|c| c.id).collect();
    let mut seen = HashSet::new();
    for update in updates {
        if !known.contains(&update.category_id) {
            return Err(EngineError::InvalidGoals(format!(
                "unknown category {}",
                update.category_id
            )));
        }
        if !seen.insert(update.category_id) {
            return Err(EngineError::InvalidGoals(format!(
                "category {} listed twice",
                update.category_id
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Category> {
        ["food", "drinks", "subscriptions", "small_payment", "transport", "others"]
            .into_iter()
            .zip(1..)
            .map(|(name, id)| Category {
                id,
                name: name.to_string(),
            })
            .collect()
    }

    fn update(category_id: i32, cents: i64) -> GoalUpdate {
        GoalUpdate {
            category_id,
            amount: MoneyCents::new(cents),
        }
    }

    #[test]
    fn full_set_is_accepted() {
        let updates: Vec<_> = (1..=6).map(|id| update(id, 1000)).collect();
        assert!(validate_goal_set(&updates, &catalog()).is_ok());
    }

    #[test]
    fn short_set_is_rejected() {
        let updates: Vec<_> = (1..=5).map(|id| update(id, 1000)).collect();
        assert!(matches!(
            validate_goal_set(&updates, &catalog()),
            Err(EngineError::InvalidGoals(_))
        ));
    }

    #[test]
    fn duplicate_and_unknown_categories_are_rejected() {
        let mut updates: Vec<_> = (1..=5).map(|id| update(id, 1000)).collect();
        updates.push(update(5, 10));
        assert!(validate_goal_set(&updates, &catalog()).is_err());

        updates.pop();
        updates.push(update(42, 10));
        assert!(validate_goal_set(&updates, &catalog()).is_err());
    }
}
