use chrono::{DateTime, Utc};

use crate::{Category, EngineError, MoneyCents, TransactionType};

mod list;
mod write;

pub use list::{
    DEFAULT_LIMIT, DEFAULT_PAGE, SortField, SortOrder, TransactionPage, TransactionQuery,
    parse_positive,
};

/// Input of [`Engine::create_transaction`](crate::Engine::create_transaction).
#[derive(Clone, Debug)]
pub struct NewTransaction {
    pub amount: MoneyCents,
    pub kind: TransactionType,
    pub category: Option<Category>,
    pub description: String,
    /// Defaults to the engine clock when absent.
    pub occurred_at: Option<DateTime<Utc>>,
}

/// Partial update of the mutable transaction fields.
///
/// `None` leaves a field untouched; `category: Some(None)` clears it.
#[derive(Clone, Debug, Default)]
pub struct TransactionPatch {
    pub amount: Option<MoneyCents>,
    pub kind: Option<TransactionType>,
    pub category: Option<Option<Category>>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl TransactionPatch {
    fn is_empty(&self) -> bool {
        self.amount.is_none()
            && self.kind.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.occurred_at.is_none()
    }
}

fn not_found() -> EngineError {
    EngineError::KeyNotFound("Transaction not found".to_string())
}

fn forbidden() -> EngineError {
    EngineError::Forbidden("Unauthorized".to_string())
}
