use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{Clock, EngineError, ResultEngine, SystemClock};

mod dashboard;
mod transactions;
mod users;

pub use dashboard::{
    CategoryTotal, Dashboard, KpiTotals, MonthlyTotal, RECENT_TRANSACTIONS, RecentTransaction,
    bucket_by_month,
};
pub use transactions::{
    DEFAULT_LIMIT, DEFAULT_PAGE, NewTransaction, SortField, SortOrder, TransactionPage,
    TransactionPatch, TransactionQuery, parse_positive,
};

/// bcrypt cost bounds; `bcrypt::hash` rejects anything outside them.
const MIN_COST: u32 = 4;
const MAX_COST: u32 = 31;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    clock: Arc<dyn Clock>,
    password_cost: u32,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Current instant according to the configured clock.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    clock: Option<Arc<dyn Clock>>,
    password_cost: Option<u32>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Override the clock (defaults to [`SystemClock`]).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> EngineBuilder {
        self.clock = Some(clock);
        self
    }

    /// bcrypt cost used when hashing new passwords (defaults to
    /// `bcrypt::DEFAULT_COST`).
    pub fn password_cost(mut self, cost: u32) -> EngineBuilder {
        self.password_cost = Some(cost);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        let password_cost = self.password_cost.unwrap_or(bcrypt::DEFAULT_COST);
        if !(MIN_COST..=MAX_COST).contains(&password_cost) {
            return Err(EngineError::InvalidInput(format!(
                "password cost must be between {MIN_COST} and {MAX_COST}"
            )));
        }

        Ok(Engine {
            database: self.database,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            password_cost,
        })
    }
}
