//! Transactions API endpoints

use api_types::{
    Category as ApiCategory, TransactionType as ApiKind, date,
    transaction::{
        TransactionDeleted, TransactionListResponse, TransactionNew,
        TransactionQuery as ApiQuery, TransactionUpdate, TransactionView,
    },
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{
    Category, DEFAULT_LIMIT, DEFAULT_PAGE, EngineError, MoneyCents, NewTransaction, SortField,
    SortOrder, Transaction, TransactionPatch, TransactionQuery, TransactionType, User,
    parse_positive,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub(crate) fn map_kind(kind: TransactionType) -> ApiKind {
    match kind {
        TransactionType::Income => ApiKind::Income,
        TransactionType::Expense => ApiKind::Expense,
    }
}

fn engine_kind(kind: ApiKind) -> TransactionType {
    match kind {
        ApiKind::Income => TransactionType::Income,
        ApiKind::Expense => TransactionType::Expense,
    }
}

pub(crate) fn map_category(category: Category) -> ApiCategory {
    match category {
        Category::Rent => ApiCategory::Rent,
        Category::Shopping => ApiCategory::Shopping,
        Category::Food => ApiCategory::Food,
        Category::Entertainment => ApiCategory::Entertainment,
        Category::Health => ApiCategory::Health,
        Category::Groceries => ApiCategory::Groceries,
        Category::Travel => ApiCategory::Travel,
        Category::Misc => ApiCategory::Misc,
        Category::Salary => ApiCategory::Salary,
        Category::Freelance => ApiCategory::Freelance,
        Category::Investment => ApiCategory::Investment,
        Category::Bonus => ApiCategory::Bonus,
        Category::Gift => ApiCategory::Gift,
        Category::OtherIncome => ApiCategory::OtherIncome,
    }
}

fn engine_category(category: ApiCategory) -> Category {
    match category {
        ApiCategory::Rent => Category::Rent,
        ApiCategory::Shopping => Category::Shopping,
        ApiCategory::Food => Category::Food,
        ApiCategory::Entertainment => Category::Entertainment,
        ApiCategory::Health => Category::Health,
        ApiCategory::Groceries => Category::Groceries,
        ApiCategory::Travel => Category::Travel,
        ApiCategory::Misc => Category::Misc,
        ApiCategory::Salary => Category::Salary,
        ApiCategory::Freelance => Category::Freelance,
        ApiCategory::Investment => Category::Investment,
        ApiCategory::Bonus => Category::Bonus,
        ApiCategory::Gift => Category::Gift,
        ApiCategory::OtherIncome => Category::OtherIncome,
    }
}

fn view(tx: Transaction) -> TransactionView {
    TransactionView {
        id: tx.id,
        user_id: tx.user_id,
        amount: tx.amount.to_major(),
        kind: map_kind(tx.kind),
        category: tx.category.map(map_category),
        description: tx.description,
        date: tx.occurred_at,
        created_at: tx.created_at,
        updated_at: tx.updated_at,
    }
}

/// Path ids that are not UUIDs cannot name an existing transaction.
fn parse_id(id: &str) -> Result<Uuid, ServerError> {
    Uuid::parse_str(id)
        .map_err(|_| EngineError::KeyNotFound("Transaction not found".to_string()).into())
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_query(query: &ApiQuery) -> Result<TransactionQuery, ServerError> {
    let kind = non_empty(query.kind.as_deref())
        .map(TransactionType::try_from)
        .transpose()?;
    let category = non_empty(query.category.as_deref())
        .map(Category::try_from)
        .transpose()?;
    let parse_date = |raw: Option<&str>, label: &str| {
        non_empty(raw)
            .map(|raw| {
                date::parse(raw)
                    .ok_or_else(|| ServerError::Generic(format!("invalid {label}: {raw}")))
            })
            .transpose()
    };

    Ok(TransactionQuery {
        page: parse_positive(query.page.as_deref(), DEFAULT_PAGE),
        limit: parse_positive(query.limit.as_deref(), DEFAULT_LIMIT),
        kind,
        category,
        start_date: parse_date(query.start_date.as_deref(), "startDate")?,
        end_date: parse_date(query.end_date.as_deref(), "endDate")?,
        search: non_empty(query.search.as_deref()).map(str::to_string),
        sort_by: query.sort_by.as_deref().and_then(SortField::parse),
        sort_order: SortOrder::parse(query.sort_order.as_deref()),
    })
}

pub async fn create(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let new = NewTransaction {
        amount: MoneyCents::from_amount(payload.amount)?,
        kind: engine_kind(payload.kind),
        category: payload.category.map(engine_category),
        description: payload.description,
        occurred_at: payload.date,
    };
    let tx = state.engine.create_transaction(user.id, new).await?;

    Ok((StatusCode::CREATED, Json(view(tx))))
}

pub async fn list(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Query(query): Query<ApiQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let query = parse_query(&query)?;
    let page = state.engine.list_transactions(user.id, &query).await?;

    Ok(Json(TransactionListResponse {
        transactions: page.transactions.into_iter().map(view).collect(),
        total: page.total,
    }))
}

pub async fn get(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(user.id, parse_id(&id)?).await?;
    Ok(Json(view(tx)))
}

pub async fn update(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let id = parse_id(&id)?;
    let patch = TransactionPatch {
        amount: payload.amount.map(MoneyCents::from_amount).transpose()?,
        kind: payload.kind.map(engine_kind),
        category: payload.category.map(|c| c.map(engine_category)),
        description: payload.description,
        occurred_at: payload.date,
    };

    let tx = state.engine.update_transaction(user.id, id, patch).await?;
    Ok(Json(view(tx)))
}

pub async fn delete(
    Extension(user): Extension<User>,
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> Result<Json<TransactionDeleted>, ServerError> {
    state
        .engine
        .delete_transaction(user.id, parse_id(&id)?)
        .await?;

    Ok(Json(TransactionDeleted {
        message: "Transaction deleted successfully".to_string(),
    }))
}
