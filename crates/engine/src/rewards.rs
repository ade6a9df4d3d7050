//! Daily login rewards.
//!
//! The first login of every calendar day grants leaves:
//!
//! ```text
//! new_bonus_streak    = bonus_leaves_earned + 1
//! ants_bonus          = ants_owned * LEAVES_PER_ANT
//! leaves_earned_today = new_bonus_streak + ants_bonus
//! ```
//!
//! `bonus_leaves_earned` counts distinct login days (it never resets), so the
//! reward grows by one leaf per day the user has ever shown up, plus a flat
//! amount per ant owned. Days are compared by calendar date only: logging in
//! at 23:59 and again at 00:01 yields two grants.

use chrono::NaiveDate;
use serde::Serialize;

use crate::Farm;

/// Leaves produced per owned ant on each rewarded login.
pub const LEAVES_PER_ANT: i64 = 2;

/// The bonus granted on the first login of a day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DailyBonus {
    pub ants_bonus: i64,
    pub new_bonus_streak: i64,
    pub leaves_earned_today: i64,
}

/// Outcome of evaluating a login against the last rewarded day.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Accrual {
    /// First login of the day (or first login ever): the bonus is owed.
    Granted(DailyBonus),
    /// The bonus for today was already claimed.
    AlreadyClaimed,
}

impl Accrual {
    pub fn evaluate(
        last_login_date: Option<NaiveDate>,
        today: NaiveDate,
        bonus_leaves_earned: i64,
        ants_owned: i64,
    ) -> Self {
        if last_login_date == Some(today) {
            return Self::AlreadyClaimed;
        }

        let ants_bonus = ants_owned.saturating_mul(LEAVES_PER_ANT);
        let new_bonus_streak = bonus_leaves_earned.saturating_add(1);
        Self::Granted(DailyBonus {
            ants_bonus,
            new_bonus_streak,
            leaves_earned_today: new_bonus_streak.saturating_add(ants_bonus),
        })
    }

    pub fn leaves_earned_today(&self) -> i64 {
        match self {
            Self::Granted(bonus) => bonus.leaves_earned_today,
            Self::AlreadyClaimed => 0,
        }
    }

    /// `true` when today's bonus had already been claimed before this login.
    pub fn today_logged(&self) -> bool {
        matches!(self, Self::AlreadyClaimed)
    }
}

/// What a successful login reports back.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoginOutcome {
    pub user_id: i32,
    pub username: String,
    pub today_logged: bool,
    pub leaves_earned_today: i64,
    /// Distinct days the user has logged in, including today.
    pub total_login_days: i64,
    pub farm: Farm,
}
