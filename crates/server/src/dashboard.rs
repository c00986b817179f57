//! Dashboard API endpoint

use api_types::dashboard::{
    CategoryTotal, DashboardQuery, DashboardResponse, KpiData, MonthlyTotal, RecentTransaction,
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use engine::{DurationWindow, User};

use crate::{
    ServerError,
    server::ServerState,
    transactions::{map_category, map_kind},
};

/// Handle requests for the dashboard aggregates
pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, ServerError> {
    let window = DurationWindow::parse(query.duration.as_deref());
    let dashboard = state.engine.dashboard(user.id, window).await?;

    Ok(Json(DashboardResponse {
        kpi_data: KpiData {
            income: dashboard.kpis.income.to_major(),
            expenses: dashboard.kpis.expenses.to_major(),
            balance: dashboard.kpis.balance.to_major(),
        },
        category_breakdown: dashboard
            .category_breakdown
            .into_iter()
            .map(|entry| CategoryTotal {
                kind: map_kind(entry.kind),
                category: map_category(entry.category),
                total: entry.total.to_major(),
            })
            .collect(),
        monthly_trend: dashboard
            .monthly_trend
            .into_iter()
            .map(|entry| MonthlyTotal {
                month: entry.month,
                kind: map_kind(entry.kind),
                total: entry.total.to_major(),
            })
            .collect(),
        recent_transactions: dashboard
            .recent_transactions
            .into_iter()
            .map(|tx| RecentTransaction {
                id: tx.id,
                amount: tx.amount.to_major(),
                kind: map_kind(tx.kind),
                category: tx.category.map(map_category),
                description: tx.description,
                date: tx.occurred_at,
            })
            .collect(),
    }))
}
