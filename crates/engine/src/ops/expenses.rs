use std::collections::HashMap;

use chrono::NaiveDate;
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::Serialize;

use crate::{
    CategorySpending, EngineError, Expense, MoneyCents, NewExpense, ResultEngine, Week,
    WeeklySummary, categories, expenses, goals, util::normalize_optional_text,
};

use super::{Engine, with_tx};

/// The expenses of one user dated inside a week, newest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct WeeklyExpenses {
    pub period: Week,
    pub expenses: Vec<Expense>,
}

impl Engine {
    /// Record a manually entered expense. A missing date means `today`.
    pub async fn create_expense(&self, expense: NewExpense, today: NaiveDate) -> ResultEngine<Expense> {
        if expense.amount.is_negative() {
            return Err(EngineError::InvalidAmount(format!(
                "expense amount must not be negative: {}",
                expense.amount
            )));
        }
        let description = normalize_optional_text(expense.description.as_deref());
        let date = expense.date.unwrap_or(today);

        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, expense.user_id).await?;
            let category = categories::Entity::find_by_id(expense.category_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!("category {}", expense.category_id))
                })?;

            let model = expenses::ActiveModel {
                user_id: ActiveValue::Set(expense.user_id),
                category_id: ActiveValue::Set(category.id),
                amount_minor: ActiveValue::Set(expense.amount.cents()),
                description: ActiveValue::Set(description),
                date: ActiveValue::Set(date),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::debug!(expense_id = model.id, user_id = model.user_id, "expense recorded");
            Ok(model.into_expense(category.name))
        })
    }

    /// Delete an expense by id.
    pub async fn delete_expense(&self, expense_id: i32) -> ResultEngine<()> {
        let result = expenses::Entity::delete_by_id(expense_id)
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(format!("expense {expense_id}")));
        }
        tracing::debug!(expense_id, "expense deleted");
        Ok(())
    }

    /// Every expense of the user dated in the week containing `today`.
    pub async fn weekly_expenses(&self, user_id: i32, today: NaiveDate) -> ResultEngine<WeeklyExpenses> {
        self.require_user(&self.database, user_id).await?;
        let period = Week::containing(today);

        let rows: Vec<(expenses::Model, Option<categories::Model>)> = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::Date.between(period.from, period.to))
            .order_by_desc(expenses::Column::Date)
            .order_by_desc(expenses::Column::Id)
            .find_also_related(categories::Entity)
            .all(&self.database)
            .await?;

        let expenses = rows
            .into_iter()
            .map(|(expense, category)| {
                let name = category.map(|c| c.name).unwrap_or_default();
                expense.into_expense(name)
            })
            .collect();

        Ok(WeeklyExpenses { period, expenses })
    }

    /// Spending against goals for the week containing `today`.
    ///
    /// Every catalog category is listed, with zero spending when the user has
    /// no expense in it. Categories are ordered by name.
    pub async fn weekly_summary(&self, user_id: i32, today: NaiveDate) -> ResultEngine<WeeklySummary> {
        self.require_user(&self.database, user_id).await?;
        let period = Week::containing(today);

        let mut catalog = self.catalog(&self.database).await?;
        catalog.sort_by(|a, b| a.name.cmp(&b.name));

        let goals: HashMap<i32, i64> = goals::Entity::find()
            .filter(goals::Column::UserId.eq(user_id))
            .all(&self.database)
            .await?
            .into_iter()
            .map(|goal| (goal.category_id, goal.amount_minor))
            .collect();
        if goals.len() < catalog.len() {
            return Err(EngineError::IncompleteGoals {
                user_id,
                found: goals.len(),
                expected: catalog.len(),
            });
        }

        let week_expenses = expenses::Entity::find()
            .filter(expenses::Column::UserId.eq(user_id))
            .filter(expenses::Column::Date.between(period.from, period.to))
            .all(&self.database)
            .await?;
        let mut spent: HashMap<i32, MoneyCents> = HashMap::new();
        for expense in week_expenses {
            let total = spent.entry(expense.category_id).or_default();
            *total = total.checked_add(MoneyCents::new(expense.amount_minor))?;
        }

        let per_category = catalog
            .into_iter()
            .map(|category| CategorySpending {
                spent: spent.get(&category.id).copied().unwrap_or(MoneyCents::ZERO),
                goal: MoneyCents::new(goals.get(&category.id).copied().unwrap_or(0)),
                category_id: category.id,
                category_name: category.name,
            })
            .collect();

        WeeklySummary::new(period, per_category)
    }
}
