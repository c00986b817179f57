//! Transaction primitives.
//!
//! A `Transaction` is a single income or expense owned by exactly one user.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{EngineError, MoneyCents};

/// Case folding applied to descriptions when stored and to search terms,
/// so matching does not depend on the database's `LOWER()`.
pub(crate) fn fold_case(value: &str) -> String {
    value.to_lowercase()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransactionType {
    Income,
    Expense,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl TryFrom<&str> for TransactionType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            other => Err(EngineError::InvalidInput(format!(
                "invalid transaction type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
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

impl Category {
    pub const ALL: [Category; 14] = [
        Self::Rent,
        Self::Shopping,
        Self::Food,
        Self::Entertainment,
        Self::Health,
        Self::Groceries,
        Self::Travel,
        Self::Misc,
        Self::Salary,
        Self::Freelance,
        Self::Investment,
        Self::Bonus,
        Self::Gift,
        Self::OtherIncome,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rent => "RENT",
            Self::Shopping => "SHOPPING",
            Self::Food => "FOOD",
            Self::Entertainment => "ENTERTAINMENT",
            Self::Health => "HEALTH",
            Self::Groceries => "GROCERIES",
            Self::Travel => "TRAVEL",
            Self::Misc => "MISC",
            Self::Salary => "SALARY",
            Self::Freelance => "FREELANCE",
            Self::Investment => "INVESTMENT",
            Self::Bonus => "BONUS",
            Self::Gift => "GIFT",
            Self::OtherIncome => "OTHER_INCOME",
        }
    }
}

impl TryFrom<&str> for Category {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == value)
            .ok_or_else(|| EngineError::InvalidInput(format!("invalid category: {value}")))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TransactionType,
    pub amount: MoneyCents,
    pub category: Option<Category>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub category: Option<String>,
    pub description: String,
    /// [`fold_case`] of `description`, used by search.
    pub description_folded: String,
    pub occurred_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount.cents()),
            category: ActiveValue::Set(tx.category.map(|c| c.as_str().to_string())),
            description: ActiveValue::Set(tx.description.clone()),
            description_folded: ActiveValue::Set(fold_case(&tx.description)),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            created_at: ActiveValue::Set(tx.created_at),
            updated_at: ActiveValue::Set(tx.updated_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("Transaction not found".to_string()))?,
            user_id: Uuid::parse_str(&model.user_id)
                .map_err(|_| EngineError::KeyNotFound("user not exists".to_string()))?,
            kind: TransactionType::try_from(model.kind.as_str())?,
            amount: MoneyCents::new(model.amount_minor),
            category: model
                .category
                .as_deref()
                .map(Category::try_from)
                .transpose()?,
            description: model.description,
            occurred_at: model.occurred_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
