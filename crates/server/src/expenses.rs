//! Expenses API endpoints, including receipt uploads.

use api_types::{
    Period,
    expense::{
        CategorySpending, ExpenseCreated, ExpenseNew, ExpenseView, ReceiptRecorded,
        WeeklyExpenses, WeeklySummary,
    },
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use engine::{MoneyCents, NewExpense, Week};

use crate::{
    ServerError,
    server::{ServerState, today},
};

fn map_period(week: Week) -> Period {
    Period {
        from: week.from,
        to: week.to,
    }
}

fn map_expense(expense: engine::Expense) -> ExpenseView {
    ExpenseView {
        id: expense.id,
        category_id: expense.category_id,
        category_name: expense.category_name,
        amount: expense.amount.to_major(),
        description: expense.description,
        date: expense.date,
    }
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<ExpenseNew>,
) -> Result<(StatusCode, Json<ExpenseCreated>), ServerError> {
    let expense = NewExpense {
        user_id: payload.user_id,
        category_id: payload.category_id,
        amount: MoneyCents::from_major(payload.amount)?,
        description: payload.description,
        date: payload.date,
    };
    let expense = state.engine.create_expense(expense, today()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ExpenseCreated {
            expense_id: expense.id,
        }),
    ))
}

pub async fn remove(
    State(state): State<ServerState>,
    Path(expense_id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_expense(expense_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn weekly(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<WeeklyExpenses>, ServerError> {
    let weekly = state.engine.weekly_expenses(user_id, today()).await?;
    Ok(Json(WeeklyExpenses {
        period: map_period(weekly.period),
        expenses: weekly.expenses.into_iter().map(map_expense).collect(),
    }))
}

pub async fn summary(
    State(state): State<ServerState>,
    Path(user_id): Path<i32>,
) -> Result<Json<WeeklySummary>, ServerError> {
    let summary = state.engine.weekly_summary(user_id, today()).await?;
    Ok(Json(WeeklySummary {
        period: map_period(summary.period),
        total_spent: summary.total_spent.to_major(),
        total_budget: summary.total_budget.to_major(),
        expended_pct: summary.expended_pct,
        saved_pct: summary.saved_pct,
        per_category: summary
            .per_category
            .into_iter()
            .map(|c| CategorySpending {
                category_id: c.category_id,
                category_name: c.category_name,
                spent: c.spent.to_major(),
                goal: c.goal.to_major(),
            })
            .collect(),
    }))
}

/// Receipt upload: multipart form with a `user_id` text field and an `image`
/// file field.
pub async fn analyze(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<ReceiptRecorded>), ServerError> {
    let mut user_id: Option<i32> = None;
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError::Generic(format!("invalid multipart body: {err}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("user_id") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| ServerError::Generic(format!("invalid user_id: {err}")))?;
                let id = text
                    .trim()
                    .parse()
                    .map_err(|_| ServerError::Generic(format!("invalid user_id: {text}")))?;
                user_id = Some(id);
            }
            Some("image") => {
                let mime_type = field.content_type().unwrap_or("image/jpeg").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| ServerError::Generic(format!("invalid image: {err}")))?;
                image = Some((bytes.to_vec(), mime_type));
            }
            _ => {}
        }
    }

    let user_id = user_id.ok_or_else(|| ServerError::Generic("missing user_id".to_string()))?;
    let (image, mime_type) =
        image.ok_or_else(|| ServerError::Generic("missing image".to_string()))?;

    let expense = state
        .engine
        .record_receipt(
            user_id,
            &image,
            &mime_type,
            state.classifier.as_ref(),
            today(),
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ReceiptRecorded {
            expense_id: expense.id,
            store: expense.description,
            amount: expense.amount.to_major(),
            category_id: expense.category_id,
            category_name: expense.category_name,
            date: expense.date,
        }),
    ))
}
