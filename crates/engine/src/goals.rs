//! Weekly budget per user and category.

use sea_orm::entity::prelude::*;
use serde::Serialize;

use crate::MoneyCents;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Goal {
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub category_name: String,
    pub amount: MoneyCents,
}

/// One entry of a bulk goal update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GoalUpdate {
    pub category_id: i32,
    pub amount: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "goal")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub category_id: i32,
    pub amount_minor: i64,
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
