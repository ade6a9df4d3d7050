//! Ant farm engine.
//!
//! Owns the row store: users and their farms, the ant and category catalogs,
//! weekly goals and the expense ledger. Every write that touches more than
//! one row runs inside a single database transaction.

pub use ants::Ant;
pub use categories::Category;
pub use error::EngineError;
pub use expenses::{Expense, NewExpense};
pub use farm::{Farm, LeavesAdjustment, OwnedAnts};
pub use goals::{Goal, GoalUpdate};
pub use money::MoneyCents;
pub use ops::{AntAdded, Engine, EngineBuilder, WeeklyExpenses};
pub use receipts::{
    Classification, ClassifierError, RawClassification, ReceiptClassifier, ReceiptFields,
};
pub use rewards::{Accrual, DailyBonus, LEAVES_PER_ANT, LoginOutcome};
pub use week::{CategorySpending, Week, WeeklySummary};

mod ant_farm;
mod ants;
pub mod categories;
mod error;
mod expenses;
mod farm;
mod goals;
mod money;
mod ops;
pub mod receipts;
mod rewards;
mod users;
mod util;
mod week;

type ResultEngine<T> = Result<T, EngineError>;
