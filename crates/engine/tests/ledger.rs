use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Classification, ClassifierError, Engine, EngineError, GoalUpdate, MoneyCents, NewExpense,
    RawClassification, ReceiptClassifier, ReceiptFields,
};
use migration::MigratorTrait;

async fn engine_with_user() -> (Engine, DatabaseConnection, i32) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    let user_id = engine.register("alice", "secret").await.unwrap();
    (engine, db, user_id)
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_expense(user_id: i32, category_id: i32, cents: i64, date: NaiveDate) -> NewExpense {
    NewExpense {
        user_id,
        category_id,
        amount: MoneyCents::new(cents),
        description: Some("  coffee ".to_string()),
        date: Some(date),
    }
}

async fn expense_rows(db: &DatabaseConnection) -> i64 {
    let backend = db.get_database_backend();
    let row = db
        .query_one(Statement::from_string(
            backend,
            "SELECT COUNT(*) AS n FROM expenses",
        ))
        .await
        .unwrap()
        .unwrap();
    row.try_get("", "n").unwrap()
}

/// Classifier answering with a fixed response and remembering the MIME types
/// it was called with.
struct FakeClassifier {
    answer: Result<Classification, ClassifierError>,
    calls: Mutex<Vec<String>>,
}

impl FakeClassifier {
    fn answering(answer: Result<Classification, ClassifierError>) -> Self {
        Self {
            answer,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn from_json(json: &str) -> Self {
        let raw = RawClassification::from_text(json).unwrap();
        Self::answering(Ok(raw.into_classification()))
    }

    fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ReceiptClassifier for FakeClassifier {
    async fn classify(
        &self,
        _image: &[u8],
        mime_type: &str,
    ) -> Result<Classification, ClassifierError> {
        self.calls.lock().unwrap().push(mime_type.to_string());
        self.answer.clone()
    }
}

#[tokio::test]
async fn create_expense_defaults_date_and_trims_description() {
    let (engine, _db, user_id) = engine_with_user().await;
    let today = day(2025, 10, 29);

    let expense = engine
        .create_expense(
            NewExpense {
                date: None,
                ..new_expense(user_id, 2, 350, today)
            },
            today,
        )
        .await
        .unwrap();

    assert_eq!(expense.date, today);
    assert_eq!(expense.description, "coffee");
    assert_eq!(expense.category_name, "drinks");
    assert_eq!(expense.amount.cents(), 350);
}

#[tokio::test]
async fn create_expense_validates_input() {
    let (engine, _db, user_id) = engine_with_user().await;
    let today = day(2025, 10, 29);

    assert!(matches!(
        engine
            .create_expense(new_expense(user_id, 2, -1, today), today)
            .await
            .unwrap_err(),
        EngineError::InvalidAmount(_)
    ));
    assert!(matches!(
        engine
            .create_expense(new_expense(user_id, 42, 100, today), today)
            .await
            .unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert!(matches!(
        engine
            .create_expense(new_expense(999, 1, 100, today), today)
            .await
            .unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
}

#[tokio::test]
async fn delete_expense_removes_row_and_reports_unknown_ids() {
    let (engine, db, user_id) = engine_with_user().await;
    let today = day(2025, 10, 29);
    let expense = engine
        .create_expense(new_expense(user_id, 1, 100, today), today)
        .await
        .unwrap();

    engine.delete_expense(expense.id).await.unwrap();
    assert_eq!(expense_rows(&db).await, 0);
    assert_eq!(
        engine.delete_expense(expense.id).await.unwrap_err(),
        EngineError::KeyNotFound(format!("expense {}", expense.id))
    );
}

#[tokio::test]
async fn weekly_expenses_only_include_the_current_week() {
    let (engine, _db, user_id) = engine_with_user().await;
    let today = day(2025, 10, 29);

    for date in [day(2025, 10, 26), day(2025, 10, 27), day(2025, 11, 2), day(2025, 11, 3)] {
        engine
            .create_expense(new_expense(user_id, 1, 100, date), today)
            .await
            .unwrap();
    }

    let weekly = engine.weekly_expenses(user_id, today).await.unwrap();
    assert_eq!(weekly.period.from, day(2025, 10, 27));
    assert_eq!(weekly.period.to, day(2025, 11, 2));
    let dates: Vec<_> = weekly.expenses.iter().map(|e| e.date).collect();
    assert_eq!(dates, vec![day(2025, 11, 2), day(2025, 10, 27)]);
}

#[tokio::test]
async fn summary_without_budget_is_fully_saved() {
    let (engine, _db, user_id) = engine_with_user().await;

    let summary = engine.weekly_summary(user_id, day(2025, 10, 29)).await.unwrap();
    assert_eq!(summary.total_budget, MoneyCents::ZERO);
    assert_eq!(summary.total_spent, MoneyCents::ZERO);
    assert_eq!(summary.expended_pct, 0.0);
    assert_eq!(summary.saved_pct, 100.0);
    assert_eq!(summary.per_category.len(), 6);
}

#[tokio::test]
async fn summary_with_overflowing_totals_is_an_invalid_amount() {
    let (engine, _db, user_id) = engine_with_user().await;
    let today = day(2025, 10, 29);
    let huge = MoneyCents::from_major(5e16).unwrap();

    for category_id in [1, 2] {
        let mut expense = new_expense(user_id, category_id, 0, today);
        expense.amount = huge;
        engine.create_expense(expense, today).await.unwrap();
    }

    let err = engine.weekly_summary(user_id, today).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    // Same overflow within a single category.
    let (engine, _db, user_id) = engine_with_user().await;
    for _ in 0..2 {
        let mut expense = new_expense(user_id, 3, 0, today);
        expense.amount = huge;
        engine.create_expense(expense, today).await.unwrap();
    }
    let err = engine.weekly_summary(user_id, today).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn summary_lists_every_category_by_name() {
    let (engine, _db, user_id) = engine_with_user().await;
    let today = day(2025, 10, 29);

    let updates: Vec<_> = (1..=6)
        .map(|category_id| GoalUpdate {
            category_id,
            amount: MoneyCents::new(if category_id == 1 { 30_000 } else { 0 }),
        })
        .collect();
    engine.update_goals(user_id, &updates).await.unwrap();
    engine
        .create_expense(new_expense(user_id, 1, 10_000, today), today)
        .await
        .unwrap();
    // Last week's spending is not counted.
    engine
        .create_expense(new_expense(user_id, 1, 5_000, day(2025, 10, 20)), today)
        .await
        .unwrap();

    let summary = engine.weekly_summary(user_id, today).await.unwrap();
    let names: Vec<_> = summary
        .per_category
        .iter()
        .map(|c| c.category_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec!["drinks", "food", "others", "small_payment", "subscriptions", "transport"]
    );
    let food = &summary.per_category[1];
    assert_eq!(food.spent.cents(), 10_000);
    assert_eq!(food.goal.cents(), 30_000);
    assert_eq!(summary.expended_pct, 33.33);
    assert_eq!(summary.saved_pct, 66.67);
}

#[tokio::test]
async fn summary_and_goals_report_incomplete_goal_rows() {
    let (engine, db, user_id) = engine_with_user().await;
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "DELETE FROM goal WHERE user_id = ? AND category_id = 6",
        vec![user_id.into()],
    ))
    .await
    .unwrap();

    let expected = EngineError::IncompleteGoals {
        user_id,
        found: 5,
        expected: 6,
    };
    assert_eq!(engine.goals(user_id).await.unwrap_err(), expected);
    assert_eq!(
        engine
            .weekly_summary(user_id, day(2025, 10, 29))
            .await
            .unwrap_err(),
        expected
    );
}

#[tokio::test]
async fn update_goals_replaces_all_and_clamps_negatives() {
    let (engine, _db, user_id) = engine_with_user().await;
    let updates: Vec<_> = (1..=6)
        .map(|category_id| GoalUpdate {
            category_id,
            amount: MoneyCents::new(i64::from(category_id) * 1_000 - 2_500),
        })
        .collect();

    let goals = engine.update_goals(user_id, &updates).await.unwrap();
    let amounts: Vec<_> = goals.iter().map(|g| g.amount.cents()).collect();
    assert_eq!(amounts, vec![0, 0, 500, 1_500, 2_500, 3_500]);
    assert_eq!(goals[3].category_name, "small_payment");
}

#[tokio::test]
async fn update_goals_rejects_partial_sets_without_writing() {
    let (engine, _db, user_id) = engine_with_user().await;
    let updates: Vec<_> = (1..=5)
        .map(|category_id| GoalUpdate {
            category_id,
            amount: MoneyCents::new(1_000),
        })
        .collect();

    assert!(matches!(
        engine.update_goals(user_id, &updates).await.unwrap_err(),
        EngineError::InvalidGoals(_)
    ));
    let goals = engine.goals(user_id).await.unwrap();
    assert!(goals.iter().all(|g| g.amount.cents() == 0));
}

#[tokio::test]
async fn categories_are_ordered_by_name() {
    let (engine, _db, _user_id) = engine_with_user().await;
    let categories = engine.categories().await.unwrap();
    assert_eq!(categories.len(), 6);
    assert_eq!(categories.first().unwrap().name, "drinks");
    assert_eq!(categories.last().unwrap().name, "transport");
}

#[tokio::test]
async fn receipt_with_unknown_category_lands_in_others() {
    let (engine, _db, user_id) = engine_with_user().await;
    let today = day(2025, 10, 29);
    let classifier = FakeClassifier::from_json(
        r#"{"store": "Kiosk", "date": "2020-01-01", "amount": 12.5, "category_id": 99}"#,
    );

    let expense = engine
        .record_receipt(user_id, b"jpeg", "image/jpeg", &classifier, today)
        .await
        .unwrap();
    assert_eq!(expense.category_id, 6);
    assert_eq!(expense.category_name, "others");
    assert_eq!(expense.amount.cents(), 1250);
    assert_eq!(expense.description, "Kiosk");
    assert_eq!(expense.date, today);
    assert_eq!(classifier.calls(), 1);
}

#[tokio::test]
async fn receipt_category_name_is_matched_loosely() {
    let (engine, _db, user_id) = engine_with_user().await;
    let classifier = FakeClassifier::answering(Ok(Classification::Receipt(ReceiptFields {
        store: None,
        amount: MoneyCents::new(400),
        category_id: None,
        category_name: Some("Small Payment".to_string()),
        printed_date: None,
    })));

    let expense = engine
        .record_receipt(user_id, b"png", "image/png", &classifier, day(2025, 10, 29))
        .await
        .unwrap();
    assert_eq!(expense.category_id, 4);
    assert_eq!(expense.description, "receipt");
}

#[tokio::test]
async fn rejected_receipt_writes_nothing() {
    let (engine, db, user_id) = engine_with_user().await;
    let classifier = FakeClassifier::from_json(r#"{"error": "unreadable_image"}"#);

    assert_eq!(
        engine
            .record_receipt(user_id, b"jpeg", "image/jpeg", &classifier, day(2025, 10, 29))
            .await
            .unwrap_err(),
        EngineError::ReceiptRejected("unreadable_image".to_string())
    );
    assert_eq!(expense_rows(&db).await, 0);
}

#[tokio::test]
async fn receipt_failures_are_reported_before_writing() {
    let (engine, db, user_id) = engine_with_user().await;
    let today = day(2025, 10, 29);

    let zero = FakeClassifier::from_json(r#"{"store": "Kiosk", "amount": 0}"#);
    assert_eq!(
        engine
            .record_receipt(user_id, b"jpeg", "image/jpeg", &zero, today)
            .await
            .unwrap_err(),
        EngineError::ReceiptRejected("invalid_amount".to_string())
    );

    let down = FakeClassifier::answering(Err(ClassifierError::Upstream {
        status: 503,
        message: "overloaded".to_string(),
    }));
    assert!(matches!(
        engine
            .record_receipt(user_id, b"jpeg", "image/jpeg", &down, today)
            .await
            .unwrap_err(),
        EngineError::Classifier(_)
    ));

    let unused = FakeClassifier::from_json(r#"{"amount": 10}"#);
    assert!(matches!(
        engine
            .record_receipt(user_id, b"", "image/jpeg", &unused, today)
            .await
            .unwrap_err(),
        EngineError::ReceiptRejected(_)
    ));
    assert!(matches!(
        engine
            .record_receipt(999, b"jpeg", "image/jpeg", &unused, today)
            .await
            .unwrap_err(),
        EngineError::KeyNotFound(_)
    ));
    assert_eq!(unused.calls(), 0);
    assert_eq!(expense_rows(&db).await, 0);
}
