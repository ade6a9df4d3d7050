//! Weekly windows and the spending-vs-budget summary.

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::{MoneyCents, ResultEngine};

/// A Monday..Sunday window, both ends inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Week {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl Week {
    /// Returns the ISO week (Monday first) that contains `date`.
    pub fn containing(date: NaiveDate) -> Self {
        let offset = u64::from(date.weekday().num_days_from_monday());
        let from = date - Days::new(offset);
        let to = from + Days::new(6);
        Self { from, to }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Spending and budget of one category in a week.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategorySpending {
    pub category_id: i32,
    pub category_name: String,
    pub spent: MoneyCents,
    pub goal: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeeklySummary {
    pub period: Week,
    pub total_spent: MoneyCents,
    pub total_budget: MoneyCents,
    /// `total_spent / total_budget * 100`, or 0 without a budget.
    pub expended_pct: f64,
    /// `max(0, 100 - expended_pct)`.
    pub saved_pct: f64,
    pub per_category: Vec<CategorySpending>,
}

impl WeeklySummary {
    /// Fails with `InvalidAmount` when a total does not fit in `i64` cents.
    pub fn new(period: Week, per_category: Vec<CategorySpending>) -> ResultEngine<Self> {
        let total_spent = MoneyCents::checked_sum(per_category.iter().map(|c| c.spent))?;
        let total_budget = MoneyCents::checked_sum(per_category.iter().map(|c| c.goal))?;

        let expended_pct = if total_budget.is_positive() {
            round2(total_spent.cents() as f64 / total_budget.cents() as f64 * 100.0)
        } else {
            0.0
        };
        let saved_pct = round2((100.0 - expended_pct).max(0.0));

        Ok(Self {
            period,
            total_spent,
            total_budget,
            expended_pct,
            saved_pct,
            per_category,
        })
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
