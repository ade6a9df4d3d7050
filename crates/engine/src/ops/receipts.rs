use chrono::NaiveDate;
use sea_orm::{ActiveValue, TransactionTrait, prelude::*};

use crate::{
    Classification, EngineError, Expense, ReceiptClassifier, ResultEngine, expenses,
    receipts::INVALID_AMOUNT_REASON,
};

use super::{Engine, with_tx};

impl Engine {
    /// Classify a receipt image and record it as an expense dated `today`.
    ///
    /// The classifier runs before any transaction is opened. A rejected or
    /// failed classification writes nothing.
    pub async fn record_receipt(
        &self,
        user_id: i32,
        image: &[u8],
        mime_type: &str,
        classifier: &dyn ReceiptClassifier,
        today: NaiveDate,
    ) -> ResultEngine<Expense> {
        if image.is_empty() {
            return Err(EngineError::ReceiptRejected("empty image".to_string()));
        }
        self.require_user(&self.database, user_id).await?;

        tracing::debug!(user_id, bytes = image.len(), mime_type, "classifying receipt");
        let fields = match classifier.classify(image, mime_type).await {
            Ok(Classification::Receipt(fields)) => fields,
            Ok(Classification::Rejected { reason }) => {
                tracing::warn!(user_id, %reason, "receipt rejected");
                return Err(EngineError::ReceiptRejected(reason));
            }
            Err(err) => {
                tracing::error!(user_id, "receipt classifier failed: {err}");
                return Err(EngineError::Classifier(err.to_string()));
            }
        };
        if !fields.amount.is_positive() {
            return Err(EngineError::ReceiptRejected(
                INVALID_AMOUNT_REASON.to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let catalog = self.catalog(&db_tx).await?;
            let category_id = fields.resolve_category(&catalog);
            let category_name = catalog
                .iter()
                .find(|c| c.id == category_id)
                .map(|c| c.name.clone())
                .ok_or_else(|| EngineError::KeyNotFound(format!("category {category_id}")))?;

            let model = expenses::ActiveModel {
                user_id: ActiveValue::Set(user_id),
                category_id: ActiveValue::Set(category_id),
                amount_minor: ActiveValue::Set(fields.amount.cents()),
                description: ActiveValue::Set(fields.description()),
                date: ActiveValue::Set(today),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            tracing::info!(
                expense_id = model.id,
                user_id,
                category_id,
                amount = %fields.amount,
                "receipt recorded"
            );
            Ok(model.into_expense(category_name))
        })
    }
}
