use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use uuid::Uuid;

use sea_orm::{
    QueryFilter, QueryOrder, QuerySelect, Select,
    prelude::*,
    sea_query::{Alias, Expr, SimpleExpr},
};

use crate::{
    Category, DurationWindow, MoneyCents, ResultEngine, Transaction, TransactionType,
    transactions,
};

use super::Engine;

/// Number of entries in [`Dashboard::recent_transactions`].
pub const RECENT_TRANSACTIONS: u64 = 5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KpiTotals {
    pub income: MoneyCents,
    pub expenses: MoneyCents,
    /// `income - expenses`; may be negative.
    pub balance: MoneyCents,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    pub kind: TransactionType,
    pub category: Category,
    pub total: MoneyCents,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthlyTotal {
    /// First day of the calendar month (UTC).
    pub month: NaiveDate,
    pub kind: TransactionType,
    pub total: MoneyCents,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecentTransaction {
    pub id: Uuid,
    pub amount: MoneyCents,
    pub kind: TransactionType,
    pub category: Option<Category>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl From<Transaction> for RecentTransaction {
    fn from(tx: Transaction) -> Self {
        Self {
            id: tx.id,
            amount: tx.amount,
            kind: tx.kind,
            category: tx.category,
            description: tx.description,
            occurred_at: tx.occurred_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dashboard {
    pub window: DurationWindow,
    /// Lower bound shared by every aggregation below.
    pub since: Option<DateTime<Utc>>,
    pub kpis: KpiTotals,
    pub category_breakdown: Vec<CategoryTotal>,
    pub monthly_trend: Vec<MonthlyTotal>,
    pub recent_transactions: Vec<RecentTransaction>,
}

/// Groups amounts by the calendar month (UTC) of their date and by type.
///
/// The map iterates in ascending month order.
pub fn bucket_by_month<I>(rows: I) -> BTreeMap<(NaiveDate, TransactionType), MoneyCents>
where
    I: IntoIterator<Item = (DateTime<Utc>, TransactionType, MoneyCents)>,
{
    let mut buckets = BTreeMap::new();
    for (occurred_at, kind, amount) in rows {
        let Some(month) = NaiveDate::from_ymd_opt(occurred_at.year(), occurred_at.month(), 1)
        else {
            continue;
        };
        *buckets.entry((month, kind)).or_insert(MoneyCents::ZERO) += amount;
    }
    buckets
}

fn scoped(user_id: Uuid, since: Option<DateTime<Utc>>) -> Select<transactions::Entity> {
    let query =
        transactions::Entity::find().filter(transactions::Column::UserId.eq(user_id.to_string()));
    match since {
        Some(since) => query.filter(transactions::Column::OccurredAt.gte(since)),
        None => query,
    }
}

fn sum_amount() -> SimpleExpr {
    // Postgres sums BIGINT into NUMERIC.
    Expr::expr(transactions::Column::AmountMinor.sum()).cast_as(Alias::new("BIGINT"))
}

impl Engine {
    pub async fn kpi_totals(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> ResultEngine<KpiTotals> {
        let rows: Vec<(String, i64)> = scoped(user_id, since)
            .select_only()
            .column(transactions::Column::Kind)
            .column_as(sum_amount(), "total")
            .group_by(transactions::Column::Kind)
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut totals = KpiTotals::default();
        for (kind, total) in rows {
            match TransactionType::try_from(kind.as_str())? {
                TransactionType::Income => totals.income = MoneyCents::new(total),
                TransactionType::Expense => totals.expenses = MoneyCents::new(total),
            }
        }
        totals.balance = totals.income - totals.expenses;
        Ok(totals)
    }

    /// Totals per (type, category), sorted by type then category.
    /// Uncategorized transactions are left out.
    pub async fn category_breakdown(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<CategoryTotal>> {
        let rows: Vec<(String, String, i64)> = scoped(user_id, since)
            .filter(transactions::Column::Category.is_not_null())
            .select_only()
            .column(transactions::Column::Kind)
            .column(transactions::Column::Category)
            .column_as(sum_amount(), "total")
            .group_by(transactions::Column::Kind)
            .group_by(transactions::Column::Category)
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut breakdown = rows
            .into_iter()
            .map(|(kind, category, total)| {
                Ok(CategoryTotal {
                    kind: TransactionType::try_from(kind.as_str())?,
                    category: Category::try_from(category.as_str())?,
                    total: MoneyCents::new(total),
                })
            })
            .collect::<ResultEngine<Vec<_>>>()?;
        breakdown.sort_by_key(|entry| (entry.kind, entry.category));
        Ok(breakdown)
    }

    /// Totals per (month, type) in ascending month order.
    pub async fn monthly_trend(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<MonthlyTotal>> {
        let rows: Vec<(DateTimeUtc, String, i64)> = scoped(user_id, since)
            .select_only()
            .column(transactions::Column::OccurredAt)
            .column(transactions::Column::Kind)
            .column(transactions::Column::AmountMinor)
            .into_tuple()
            .all(&self.database)
            .await?;

        let rows = rows
            .into_iter()
            .map(|(occurred_at, kind, amount)| {
                Ok((
                    occurred_at,
                    TransactionType::try_from(kind.as_str())?,
                    MoneyCents::new(amount),
                ))
            })
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(bucket_by_month(rows)
            .into_iter()
            .map(|((month, kind), total)| MonthlyTotal { month, kind, total })
            .collect())
    }

    /// The latest [`RECENT_TRANSACTIONS`] transactions, newest first.
    pub async fn recent_transactions(
        &self,
        user_id: Uuid,
        since: Option<DateTime<Utc>>,
    ) -> ResultEngine<Vec<RecentTransaction>> {
        scoped(user_id, since)
            .order_by_desc(transactions::Column::OccurredAt)
            .order_by_desc(transactions::Column::Id)
            .limit(RECENT_TRANSACTIONS)
            .all(&self.database)
            .await?
            .into_iter()
            .map(|model| Transaction::try_from(model).map(RecentTransaction::from))
            .collect()
    }

    /// Computes every dashboard aggregate over the same window.
    ///
    /// The cutoff is resolved once from the engine clock, then the four
    /// queries run concurrently; the first failure fails the whole call.
    pub async fn dashboard(&self, user_id: Uuid, window: DurationWindow) -> ResultEngine<Dashboard> {
        let since = window.start(self.clock.now());
        tracing::debug!(%user_id, window = window.as_str(), ?since, "building dashboard");

        let (kpis, category_breakdown, monthly_trend, recent_transactions) = tokio::try_join!(
            self.kpi_totals(user_id, since),
            self.category_breakdown(user_id, since),
            self.monthly_trend(user_id, since),
            self.recent_transactions(user_id, since),
        )?;

        Ok(Dashboard {
            window,
            since,
            kpis,
            category_breakdown,
            monthly_trend,
            recent_transactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn buckets_group_by_month_and_type() {
        let buckets = bucket_by_month([
            (at(2024, 2, 28), TransactionType::Expense, MoneyCents::new(500)),
            (at(2024, 1, 3), TransactionType::Income, MoneyCents::new(10_000)),
            (at(2024, 1, 31), TransactionType::Income, MoneyCents::new(2_500)),
            (at(2024, 1, 15), TransactionType::Expense, MoneyCents::new(1_200)),
        ]);

        let jan = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let entries: Vec<_> = buckets.into_iter().collect();
        assert_eq!(
            entries,
            vec![
                ((jan, TransactionType::Income), MoneyCents::new(12_500)),
                ((jan, TransactionType::Expense), MoneyCents::new(1_200)),
                ((feb, TransactionType::Expense), MoneyCents::new(500)),
            ]
        );
    }

    #[test]
    fn buckets_split_years() {
        let buckets = bucket_by_month([
            (at(2023, 12, 31), TransactionType::Expense, MoneyCents::new(100)),
            (at(2024, 12, 1), TransactionType::Expense, MoneyCents::new(200)),
        ]);
        assert_eq!(buckets.len(), 2);
        assert_eq!(
            buckets.keys().next().map(|(month, _)| *month),
            NaiveDate::from_ymd_opt(2023, 12, 1)
        );
    }

    #[test]
    fn empty_input_has_no_buckets() {
        assert!(bucket_by_month(Vec::new()).is_empty());
    }
}
