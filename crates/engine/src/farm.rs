//! The module contains the `Farm` snapshot and the `farm` table.

use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A user's farm as shown to clients.
///
/// `ants_count` is always the sum of `ants[*].quantity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Farm {
    pub user_id: i32,
    pub ants_count: i64,
    pub leaves_count: i64,
    /// Number of distinct days the user logged in.
    pub bonus_leaves_earned: i64,
    pub ants: Vec<OwnedAnts>,
}

/// How many ants of one type a user owns.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OwnedAnts {
    pub ant_id: i32,
    pub name: String,
    pub quantity: i64,
}

/// Result of a leaf balance change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct LeavesAdjustment {
    pub previous_leaves: i64,
    pub leaves_change: i64,
    pub new_leaves: i64,
}

impl LeavesAdjustment {
    /// Applies `change` to `balance`.
    ///
    /// The balance is never allowed to go negative: the error carries the
    /// current balance and requested change so the caller can report the
    /// shortfall.
    pub fn apply(balance: i64, change: i64) -> crate::ResultEngine<Self> {
        let new_leaves = balance.checked_add(change).ok_or_else(|| {
            crate::EngineError::InvalidAmount(format!("leaves change {change} overflows"))
        })?;
        if new_leaves < 0 {
            return Err(crate::EngineError::InsufficientLeaves { balance, change });
        }
        Ok(Self {
            previous_leaves: balance,
            leaves_change: change,
            new_leaves,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "farm")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub ants_count: i64,
    pub leaves_count: i64,
    pub bonus_leaves_earned: i64,
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
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineError;

    #[test]
    fn spending_more_than_the_balance_is_rejected() {
        let err = LeavesAdjustment::apply(30, -50).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientLeaves {
                balance: 30,
                change: -50
            }
        );
    }

    #[test]
    fn spending_within_the_balance_succeeds() {
        let adjustment = LeavesAdjustment::apply(80, -50).unwrap();
        assert_eq!(adjustment.previous_leaves, 80);
        assert_eq!(adjustment.leaves_change, -50);
        assert_eq!(adjustment.new_leaves, 30);
    }

    #[test]
    fn spending_the_whole_balance_reaches_zero() {
        assert_eq!(LeavesAdjustment::apply(50, -50).unwrap().new_leaves, 0);
    }

    #[test]
    fn overflow_is_an_invalid_amount() {
        assert!(matches!(
            LeavesAdjustment::apply(i64::MAX, 1),
            Err(EngineError::InvalidAmount(_))
        ));
    }
}
