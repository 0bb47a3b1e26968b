use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind, categories, transactions,
};

use super::{Engine, normalize_required_text, with_tx};

/// Filters for listing transactions.
///
/// `from` is inclusive and `to` is exclusive (`[from, to)`), both in UTC.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// If present, only transactions of this kind are returned.
    pub kind: Option<TransactionKind>,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from >= to
    {
        return Err(EngineError::InvalidInput(
            "invalid range: from must be < to".to_string(),
        ));
    }
    Ok(())
}

/// Partial update for a transaction. `None` fields keep their prior values.
#[derive(Clone, Debug, Default)]
pub struct TransactionUpdate {
    pub category_id: Option<Uuid>,
    pub kind: Option<TransactionKind>,
    pub amount_minor: Option<i64>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
}

impl Engine {
    /// Records a new transaction under one of the user's categories.
    pub async fn create_transaction(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        description: &str,
        occurred_at: DateTime<Utc>,
    ) -> ResultEngine<Transaction> {
        let transaction = Transaction::new(
            user_id,
            category_id,
            kind,
            amount_minor,
            description,
            occurred_at,
        )?;

        with_tx!(self, |db_tx| {
            self.require_category(&db_tx, user_id, category_id).await?;
            transactions::ActiveModel::from(&transaction)
                .insert(&db_tx)
                .await?;
            Ok(transaction)
        })
    }

    /// Returns a single transaction by id.
    pub async fn transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("transaction".to_string()))?;
        if model.user_id != user_id {
            return Err(EngineError::Forbidden(
                "transaction belongs to another user".to_string(),
            ));
        }
        Transaction::try_from(model)
    }

    /// Lists the user's transactions, most recent first.
    ///
    /// Each row carries the display name of its category, when the category
    /// still exists.
    pub async fn list_transactions(
        &self,
        user_id: Uuid,
        filter: TransactionListFilter,
    ) -> ResultEngine<Vec<(Transaction, Option<String>)>> {
        validate_list_filter(&filter)?;

        let mut query = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id));
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::OccurredAt.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::OccurredAt.lt(to));
        }
        if let Some(kind) = filter.kind {
            query = query.filter(transactions::Column::Kind.eq(kind.as_str()));
        }

        let rows = query
            .order_by_desc(transactions::Column::OccurredAt)
            .find_also_related(categories::Entity)
            .all(&self.database)
            .await?;

        let mut out = Vec::with_capacity(rows.len());
        for (model, category) in rows {
            out.push((Transaction::try_from(model)?, category.map(|c| c.name)));
        }
        Ok(out)
    }

    /// Updates a transaction. Changing the category re-checks ownership of
    /// the new target.
    pub async fn update_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        update: TransactionUpdate,
    ) -> ResultEngine<Transaction> {
        if let Some(amount_minor) = update.amount_minor
            && amount_minor <= 0
        {
            return Err(EngineError::InvalidInput(
                "amount_minor must be > 0".to_string(),
            ));
        }
        let description = update
            .description
            .as_deref()
            .map(|value| normalize_required_text(value, "description"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;

            if let Some(category_id) = update.category_id
                && category_id != model.category_id
            {
                self.require_category(&db_tx, user_id, category_id).await?;
            }

            let mut active: transactions::ActiveModel = model.into();
            if let Some(category_id) = update.category_id {
                active.category_id = ActiveValue::Set(category_id);
            }
            if let Some(kind) = update.kind {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            if let Some(amount_minor) = update.amount_minor {
                active.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(description) = description {
                active.description = ActiveValue::Set(description);
            }
            if let Some(occurred_at) = update.occurred_at {
                active.occurred_at = ActiveValue::Set(occurred_at);
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            Transaction::try_from(active.update(&db_tx).await?)
        })
    }

    /// Deletes a transaction. Transactions are never removed as a side
    /// effect of anything else.
    pub async fn delete_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            transactions::Entity::delete_by_id(transaction_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })
    }
}
