//! Domain layer of the finance tracker.
//!
//! [`Engine`] owns the database connection and exposes three groups of
//! operations:
//!
//! - users: registration and credential checks;
//! - transactions: owner-scoped CRUD and the paged, filtered list query;
//! - dashboard: KPI totals, category breakdown, monthly trend and recent
//!   transactions, optionally restricted to a [`DurationWindow`].

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{
    CategoryTotal, DEFAULT_LIMIT, DEFAULT_PAGE, Dashboard, Engine, EngineBuilder, KpiTotals,
    MonthlyTotal, NewTransaction, RECENT_TRANSACTIONS, RecentTransaction, SortField, SortOrder,
    TransactionPage, TransactionPatch, TransactionQuery, bucket_by_month, parse_positive,
};
pub use transactions::{Category, Transaction, TransactionType};
pub use users::User;
pub use window::DurationWindow;

mod clock;
mod error;
mod money;
mod ops;
mod transactions;
mod users;
mod window;

type ResultEngine<T> = Result<T, EngineError>;
