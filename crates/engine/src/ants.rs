//! Ant catalog (static reference data seeded by the migrations).

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Ant {
    pub id: i32,
    pub name: String,
}

impl From<Model> for Ant {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ant_farm::Entity")]
    Owned,
}

impl Related<super::ant_farm::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owned.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
