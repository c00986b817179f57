use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Direction of a money movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Income,
    Expense,
}

/// Transaction category as sent over the wire (`"FOOD"`, `"OTHER_INCOME"`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Rent,
    Shopping,
    Food,
    Entertainment,
    Health,
    Groceries,
    Travel,
    Misc,
    Salary,
    Freelance,
    Investment,
    Bonus,
    Gift,
    OtherIncome,
}

/// Date parsing shared by request bodies and query strings.
///
/// Accepts RFC3339 timestamps and plain `YYYY-MM-DD` dates (midnight UTC).
pub mod date {
    use super::*;

    pub fn parse(value: &str) -> Option<DateTime<Utc>> {
        let value = value.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
    }

    pub fn deserialize_option<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            Some(raw) => parse(&raw)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}"))),
            None => Ok(None),
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub mod user {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterUser {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginUser {
        pub email: String,
        pub password: String,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserView {
        pub id: Uuid,
        pub name: String,
        pub email: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterResponse {
        pub user: UserView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub user: UserView,
        pub token: String,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        /// Decimal amount, must be >= 0. Rounded to cents by the server.
        pub amount: f64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub category: Option<Category>,
        #[serde(default)]
        pub description: String,
        /// RFC3339 timestamp or `YYYY-MM-DD`. Defaults to now when absent.
        #[serde(default, deserialize_with = "date::deserialize_option")]
        pub date: Option<DateTime<Utc>>,
    }

    /// Partial update. Absent fields are left untouched; `"category": null`
    /// clears the category.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub amount: Option<f64>,
        #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
        pub kind: Option<TransactionType>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub category: Option<Option<Category>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<String>,
        #[serde(
            default,
            deserialize_with = "date::deserialize_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub date: Option<DateTime<Utc>>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionView {
        pub id: Uuid,
        pub user_id: Uuid,
        pub amount: f64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub category: Option<Category>,
        pub description: String,
        pub date: DateTime<Utc>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }

    /// Query string of `GET /api/transactions`.
    ///
    /// Everything is kept as raw text: malformed paging values fall back to
    /// defaults instead of rejecting the request.
    #[derive(Debug, Default, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct TransactionQuery {
        #[serde(skip_serializing_if = "Option::is_none")]
        pub page: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub limit: Option<String>,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        pub kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub category: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub start_date: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub end_date: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sort_by: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub sort_order: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub search: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        /// Number of transactions matching the filters, across all pages.
        pub total: u64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionDeleted {
        pub message: String,
    }
}

pub mod dashboard {
    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct DashboardQuery {
        /// `1month`, `3months`, `6months` or `all`.
        #[serde(skip_serializing_if = "Option::is_none")]
        pub duration: Option<String>,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct KpiData {
        pub income: f64,
        pub expenses: f64,
        pub balance: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct CategoryTotal {
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub category: Category,
        pub total: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct MonthlyTotal {
        /// First day of the month.
        pub month: NaiveDate,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub total: f64,
    }

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct RecentTransaction {
        pub id: Uuid,
        pub amount: f64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub category: Option<Category>,
        pub description: String,
        pub date: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DashboardResponse {
        pub kpi_data: KpiData,
        pub category_breakdown: Vec<CategoryTotal>,
        pub monthly_trend: Vec<MonthlyTotal>,
        pub recent_transactions: Vec<RecentTransaction>,
    }
}

pub mod receipt {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LineItem {
        pub description: String,
        pub quantity: f64,
        pub unit_price: f64,
        pub total_amount: f64,
    }

    /// Unsaved transaction proposal built from an OCR extraction.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ReceiptDraft {
        pub amount: f64,
        #[serde(rename = "type")]
        pub kind: TransactionType,
        pub category: Category,
        pub description: String,
        pub date: DateTime<Utc>,
        pub merchant_name: String,
        pub line_items: Vec<LineItem>,
        pub currency: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptUploadResponse {
        pub success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub data: Option<ReceiptDraft>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub error: Option<String>,
    }
}
