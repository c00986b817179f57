use chrono::{DateTime, Utc};
use uuid::Uuid;

use sea_orm::{
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    prelude::*,
    sea_query::{Expr, LikeExpr},
};

use crate::{
    Category, ResultEngine, Transaction, TransactionType,
    transactions::{self, fold_case},
};

use super::super::Engine;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// LIMIT and OFFSET are bound as signed 64-bit integers.
const MAX_SQL_ROWS: u64 = i64::MAX as u64;

/// Parses a paging value, falling back to `default` for anything that is
/// not a positive integer.
pub fn parse_positive(value: Option<&str>, default: u64) -> u64 {
    value
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// Columns a client may sort by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    Date,
    Amount,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Returns `None` for anything outside the allow-list.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "date" => Some(Self::Date),
            "amount" => Some(Self::Amount),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    fn column(self) -> transactions::Column {
        match self {
            Self::Date => transactions::Column::OccurredAt,
            Self::Amount => transactions::Column::AmountMinor,
            Self::CreatedAt => transactions::Column::CreatedAt,
            Self::UpdatedAt => transactions::Column::UpdatedAt,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `asc` or `desc`; anything else is `desc`.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    fn order(self) -> Order {
        match self {
            Self::Asc => Order::Asc,
            Self::Desc => Order::Desc,
        }
    }
}

/// Filters, ordering and paging for [`Engine::list_transactions`].
#[derive(Clone, Debug)]
pub struct TransactionQuery {
    /// 1-based page number.
    pub page: u64,
    pub limit: u64,
    pub kind: Option<TransactionType>,
    pub category: Option<Category>,
    /// Inclusive bounds; applied only when both are set.
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    /// Case-insensitive substring of the description.
    pub search: Option<String>,
    /// `None` means the default ordering: date, newest first.
    pub sort_by: Option<SortField>,
    pub sort_order: SortOrder,
}

impl Default for TransactionQuery {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            kind: None,
            category: None,
            start_date: None,
            end_date: None,
            search: None,
            sort_by: None,
            sort_order: SortOrder::Desc,
        }
    }
}

impl TransactionQuery {
    fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_SQL_ROWS)
    }

    fn offset(&self) -> u64 {
        self.page
            .max(1)
            .saturating_sub(1)
            .saturating_mul(self.limit())
            .min(MAX_SQL_ROWS)
    }

    /// Primary sort column and direction. Without an explicit sort field the
    /// requested order is ignored and the list is newest first.
    fn ordering(&self) -> (transactions::Column, Order) {
        match self.sort_by {
            Some(field) => (field.column(), self.sort_order.order()),
            None => (transactions::Column::OccurredAt, Order::Desc),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    /// Size of the whole filtered set, not just this page.
    pub total: u64,
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(self, query: &TransactionQuery) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(mut self, query: &TransactionQuery) -> Self {
        if let Some(kind) = query.kind {
            self = self.filter(transactions::Column::Kind.eq(kind.as_str()));
        }
        if let Some(category) = query.category {
            self = self.filter(transactions::Column::Category.eq(category.as_str()));
        }
        if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
            self = self
                .filter(transactions::Column::OccurredAt.gte(start))
                .filter(transactions::Column::OccurredAt.lte(end));
        }
        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            let pattern = format!("%{}%", escape_like(&fold_case(search)));
            self = self.filter(
                Expr::col(transactions::Column::DescriptionFolded)
                    .like(LikeExpr::new(pattern).escape('\\')),
            );
        }
        self
    }
}

impl Engine {
    /// Lists one page of the user's transactions matching `query`, plus the
    /// number of matches across all pages.
    ///
    /// Rows that tie on the sort column are ordered by id in the same
    /// direction, so consecutive pages never overlap or skip rows.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        query: &TransactionQuery,
    ) -> ResultEngine<TransactionPage> {
        let base = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id.to_string()))
            .apply_tx_filters(query);

        let total = base.clone().count(&self.database).await?;

        let (column, order) = query.ordering();
        let models = base
            .order_by(column, order.clone())
            .order_by(transactions::Column::Id, order)
            .offset(query.offset())
            .limit(query.limit())
            .all(&self.database)
            .await?;

        tracing::debug!(
            %user_id,
            page = query.page,
            limit = query.limit,
            total,
            "listed transactions"
        );

        let transactions = models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(TransactionPage {
            transactions,
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_values_fall_back_to_defaults() {
        assert_eq!(parse_positive(Some("3"), DEFAULT_PAGE), 3);
        assert_eq!(parse_positive(Some(" 25 "), DEFAULT_LIMIT), 25);
        assert_eq!(parse_positive(Some("abc"), DEFAULT_PAGE), 1);
        assert_eq!(parse_positive(Some("0"), DEFAULT_LIMIT), 10);
        assert_eq!(parse_positive(Some("-2"), DEFAULT_LIMIT), 10);
        assert_eq!(parse_positive(None, DEFAULT_LIMIT), 10);
    }

    #[test]
    fn sort_field_is_restricted_to_allow_list() {
        assert_eq!(SortField::parse("amount"), Some(SortField::Amount));
        assert_eq!(SortField::parse("createdAt"), Some(SortField::CreatedAt));
        assert_eq!(SortField::parse("description"), None);
        assert_eq!(SortField::parse("user_id"), None);
    }

    #[test]
    fn unknown_sort_field_ignores_requested_order() {
        let query = TransactionQuery {
            sort_by: None,
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        assert_eq!(
            query.ordering(),
            (transactions::Column::OccurredAt, Order::Desc)
        );
    }

    #[test]
    fn offset_follows_page_and_limit() {
        let query = TransactionQuery {
            page: 3,
            limit: 20,
            ..Default::default()
        };
        assert_eq!(query.offset(), 40);
        assert_eq!(TransactionQuery::default().offset(), 0);
    }

    #[test]
    fn huge_paging_values_stay_within_sql_range() {
        let query = TransactionQuery {
            page: u64::MAX,
            limit: u64::MAX,
            ..Default::default()
        };
        assert_eq!(query.limit(), i64::MAX as u64);
        assert_eq!(query.offset(), i64::MAX as u64);

        let query = TransactionQuery {
            page: u64::MAX,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), i64::MAX as u64);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
