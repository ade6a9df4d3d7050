//! Request and response bodies of the HTTP API.
//!
//! Money travels as decimal major units (`12.5` means 12 units and 50 cents);
//! the server converts to and from integer cents.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Body of every error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// A Monday..Sunday window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub mod auth {
    use super::*;
    use crate::farm::FarmView;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Credentials {
        pub username: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Registered {
        pub user_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub id: i32,
        pub username: String,
        /// `true` when today's bonus had already been paid before this login.
        pub today_logged: bool,
        pub leaves_earned_today: i64,
        pub total_login_days: i64,
        pub farm: FarmView,
    }
}

pub mod farm {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OwnedAntsView {
        pub ant_id: i32,
        pub name: String,
        pub quantity: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FarmView {
        pub ants_count: i64,
        pub leaves_count: i64,
        pub bonus_leaves_earned: i64,
        pub ants: Vec<OwnedAntsView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AntAdded {
        pub ant_id: i32,
        pub ant_name: String,
        pub new_quantity: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AntView {
        pub id: i32,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AntList {
        pub ants: Vec<AntView>,
    }

    /// Signed change applied to the leaf balance.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeavesChange {
        pub leaves: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LeavesUpdated {
        pub previous_leaves: i64,
        pub leaves_change: i64,
        pub new_leaves: i64,
    }
}

pub mod expense {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub user_id: i32,
        pub category_id: i32,
        pub amount: f64,
        pub description: Option<String>,
        /// Defaults to the server's date.
        pub date: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseCreated {
        pub expense_id: i32,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: i32,
        pub category_id: i32,
        pub category_name: String,
        pub amount: f64,
        pub description: String,
        pub date: NaiveDate,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeeklyExpenses {
        pub period: Period,
        pub expenses: Vec<ExpenseView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategorySpending {
        pub category_id: i32,
        pub category_name: String,
        pub spent: f64,
        pub goal: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WeeklySummary {
        pub period: Period,
        pub total_spent: f64,
        pub total_budget: f64,
        pub expended_pct: f64,
        pub saved_pct: f64,
        pub per_category: Vec<CategorySpending>,
    }

    /// Answer of the receipt upload endpoint.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptRecorded {
        pub expense_id: i32,
        pub store: String,
        pub amount: f64,
        pub category_id: i32,
        pub category_name: String,
        pub date: NaiveDate,
    }
}

pub mod goal {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalView {
        pub id: i32,
        pub category_id: i32,
        pub category_name: String,
        pub money: f64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalList {
        pub goals: Vec<GoalView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalSet {
        pub category_id: i32,
        #[serde(default)]
        pub money: f64,
    }

    /// Bulk replacement of all goals of a user.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct GoalsUpdate {
        pub goals: Vec<GoalSet>,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: i32,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryList {
        pub categories: Vec<CategoryView>,
    }
}
