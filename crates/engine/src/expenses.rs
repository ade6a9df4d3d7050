//! The spending ledger.

use chrono::NaiveDate;
use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::MoneyCents;

/// An expense joined with its category name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Expense {
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub category_name: String,
    pub amount: MoneyCents,
    pub description: String,
    pub date: NaiveDate,
}

/// Input for [`Engine::create_expense`](crate::Engine::create_expense).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewExpense {
    pub user_id: i32,
    pub category_id: i32,
    pub amount: MoneyCents,
    pub description: Option<String>,
    /// Defaults to the caller's "today" when absent.
    pub date: Option<NaiveDate>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub amount_minor: i64,
    pub description: String,
    pub date: NaiveDate,
}

impl Model {
    pub(crate) fn into_expense(self, category_name: String) -> Expense {
        Expense {
            id: self.id,
            user_id: self.user_id,
            category_id: self.category_id,
            category_name,
            amount: MoneyCents::new(self.amount_minor),
            description: self.description,
            date: self.date,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
