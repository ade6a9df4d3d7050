//! Seeds the static catalogs: the six spending categories and the ant types.
//!
//! Category ids are part of the API contract (clients send them back when
//! updating goals), so they are inserted explicitly instead of relying on
//! auto-increment.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Category {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum Ants {
    Table,
    Id,
    Name,
}

const CATEGORIES: [(i32, &str); 6] = [
    (1, "food"),
    (2, "drinks"),
    (3, "subscriptions"),
    (4, "small_payment"),
    (5, "transport"),
    (6, "others"),
];

const ANTS: [(i32, &str); 8] = [
    (1, "worker"),
    (2, "soldier"),
    (3, "forager"),
    (4, "nurse"),
    (5, "builder"),
    (6, "scout"),
    (7, "harvester"),
    (8, "queen"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut categories = Query::insert();
        categories
            .into_table(Category::Table)
            .columns([Category::Id, Category::Name]);
        for (id, name) in CATEGORIES {
            categories.values_panic([id.into(), name.into()]);
        }
        manager.exec_stmt(categories).await?;

        let mut ants = Query::insert();
        ants.into_table(Ants::Table).columns([Ants::Id, Ants::Name]);
        for (id, name) in ANTS {
            ants.values_panic([id.into(), name.into()]);
        }
        manager.exec_stmt(ants).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(Ants::Table).to_owned())
            .await?;
        manager
            .exec_stmt(Query::delete().from_table(Category::Table).to_owned())
            .await?;
        Ok(())
    }
}
