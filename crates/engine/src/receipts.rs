//! Receipt classification contract.
//!
//! The image-understanding service lives outside the engine. It is reached
//! through [`ReceiptClassifier`], whose answer is a tagged [`Classification`]:
//! either the extracted fields or the reason the receipt was rejected. The
//! loosely typed JSON the model produces is decoded by [`RawClassification`]
//! and never reaches the ledger directly.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::{Category, MoneyCents, categories::OTHERS_CATEGORY_ID, util::catalog_key};

/// Reason used when the model returns no usable amount.
pub const INVALID_AMOUNT_REASON: &str = "invalid_amount";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClassifierError {
    #[error("classifier not configured")]
    NotConfigured,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("classifier answered {status}: {message}")]
    Upstream { status: u16, message: String },
    #[error("malformed classifier response: {0}")]
    Malformed(String),
}

/// Fields extracted from a readable receipt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReceiptFields {
    pub store: Option<String>,
    pub amount: MoneyCents,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    /// Date printed on the receipt, if the model reported one. Informational
    /// only: recorded expenses always use the server's date.
    pub printed_date: Option<String>,
}

impl ReceiptFields {
    /// Picks the catalog category for this receipt.
    ///
    /// A known id wins, then a known name; anything else falls back to
    /// "others".
    pub fn resolve_category(&self, catalog: &[Category]) -> i32 {
        if let Some(id) = self.category_id
            && catalog.iter().any(|c| c.id == id)
        {
            return id;
        }

        if let Some(name) = self.category_name.as_deref() {
            let key = catalog_key(name);
            if let Some(category) = catalog.iter().find(|c| catalog_key(&c.name) == key) {
                return category.id;
            }
        }

        OTHERS_CATEGORY_ID
    }

    /// Description stored on the expense.
    pub fn description(&self) -> String {
        self.store
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("receipt")
            .to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Classification {
    Receipt(ReceiptFields),
    Rejected { reason: String },
}

/// The external image-understanding service.
#[async_trait]
pub trait ReceiptClassifier: Send + Sync {
    async fn classify(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Classification, ClassifierError>;
}

/// The JSON object the model is asked to produce.
///
/// Every field is optional and loosely typed because the producer is a
/// language model; [`RawClassification::into_classification`] does the
/// validation.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawClassification {
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub category_id: Option<Value>,
    #[serde(default)]
    pub category_name: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl RawClassification {
    /// Parses the model's text answer, tolerating a Markdown code fence
    /// around the JSON object.
    pub fn from_text(text: &str) -> Result<Self, ClassifierError> {
        let trimmed = text.trim();
        let body = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.trim_end().strip_suffix("```"))
            .unwrap_or(trimmed)
            .trim();

        serde_json::from_str(body).map_err(|err| ClassifierError::Malformed(err.to_string()))
    }

    pub fn into_classification(self) -> Classification {
        if let Some(reason) = self.error.as_ref().and_then(error_reason) {
            return Classification::Rejected { reason };
        }

        let Some(amount) = self.amount.as_ref().and_then(parse_amount) else {
            return Classification::Rejected {
                reason: INVALID_AMOUNT_REASON.to_string(),
            };
        };
        if !amount.is_positive() {
            return Classification::Rejected {
                reason: INVALID_AMOUNT_REASON.to_string(),
            };
        }

        Classification::Receipt(ReceiptFields {
            store: self.store,
            amount,
            category_id: self.category_id.as_ref().and_then(parse_category_id),
            category_name: self.category_name,
            printed_date: self.date,
        })
    }
}

fn error_reason(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Bool(false) => None,
        other => Some(other.to_string()),
    }
}

fn parse_amount(value: &Value) -> Option<MoneyCents> {
    match value {
        Value::Number(n) => MoneyCents::from_major(n.as_f64()?).ok(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn parse_category_id(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|v| i32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
