use sea_orm::{ActiveValue, Condition, QueryFilter, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction,
    transactions::{self, fold_case},
};

use super::super::Engine;
use super::{NewTransaction, TransactionPatch, forbidden, not_found};

fn owned_by(id: Uuid, user_id: Uuid) -> Condition {
    Condition::all()
        .add(transactions::Column::Id.eq(id.to_string()))
        .add(transactions::Column::UserId.eq(user_id.to_string()))
}

impl Engine {
    /// Records a new transaction for `user_id`.
    pub async fn create_transaction(
        &self,
        user_id: Uuid,
        new: NewTransaction,
    ) -> ResultEngine<Transaction> {
        let now = self.clock.now();
        let tx = Transaction {
            id: Uuid::new_v4(),
            user_id,
            kind: new.kind,
            amount: new.amount,
            category: new.category,
            description: new.description.trim().to_string(),
            occurred_at: new.occurred_at.unwrap_or(now),
            created_at: now,
            updated_at: now,
        };

        transactions::ActiveModel::from(&tx)
            .insert(&self.database)
            .await?;

        tracing::info!(
            %user_id,
            transaction_id = %tx.id,
            kind = tx.kind.as_str(),
            amount = %tx.amount,
            "created transaction"
        );
        Ok(tx)
    }

    /// Returns a transaction owned by `user_id`.
    pub async fn transaction(&self, user_id: Uuid, id: Uuid) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(not_found)?;
        if model.user_id != user_id.to_string() {
            return Err(forbidden());
        }
        Transaction::try_from(model)
    }

    /// Applies `patch` to a transaction owned by `user_id` and returns the
    /// updated record.
    ///
    /// The write is a single `UPDATE` scoped by id and owner, so a
    /// transaction belonging to someone else is never modified.
    pub async fn update_transaction(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> ResultEngine<Transaction> {
        if patch.is_empty() {
            return self.transaction(user_id, id).await;
        }

        let mut changes = transactions::ActiveModel {
            updated_at: ActiveValue::Set(self.clock.now()),
            ..Default::default()
        };
        if let Some(amount) = patch.amount {
            changes.amount_minor = ActiveValue::Set(amount.cents());
        }
        if let Some(kind) = patch.kind {
            changes.kind = ActiveValue::Set(kind.as_str().to_string());
        }
        if let Some(category) = patch.category {
            changes.category = ActiveValue::Set(category.map(|c| c.as_str().to_string()));
        }
        if let Some(description) = patch.description {
            let description = description.trim().to_string();
            changes.description_folded = ActiveValue::Set(fold_case(&description));
            changes.description = ActiveValue::Set(description);
        }
        if let Some(occurred_at) = patch.occurred_at {
            changes.occurred_at = ActiveValue::Set(occurred_at);
        }

        let result = transactions::Entity::update_many()
            .set(changes)
            .filter(owned_by(id, user_id))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(self.missing_or_foreign(id).await);
        }

        tracing::info!(%user_id, transaction_id = %id, "updated transaction");
        self.transaction(user_id, id).await
    }

    /// Deletes a transaction owned by `user_id`.
    pub async fn delete_transaction(&self, user_id: Uuid, id: Uuid) -> ResultEngine<()> {
        let result = transactions::Entity::delete_many()
            .filter(owned_by(id, user_id))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(self.missing_or_foreign(id).await);
        }

        tracing::info!(%user_id, transaction_id = %id, "deleted transaction");
        Ok(())
    }

    /// Explains why a write scoped by id and owner touched no rows.
    async fn missing_or_foreign(&self, id: Uuid) -> EngineError {
        match transactions::Entity::find_by_id(id.to_string())
            .one(&self.database)
            .await
        {
            Ok(Some(_)) => forbidden(),
            Ok(None) => not_found(),
            Err(err) => err.into(),
        }
    }
}
