use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Category, CategoryRole, EngineError, ResultEngine, TransactionKind, categories,
    error::is_unique_violation, transactions,
};

use super::{Engine, normalize_required_text, with_tx};

/// Fixed starter catalog seeded at registration.
///
/// One entry per kind carries the fallback role; `delete_category` retargets
/// transactions to it and recreates it from this table when it is missing.
const DEFAULT_CATALOG: &[(&str, TransactionKind, CategoryRole, i32)] = &[
    ("Salary", TransactionKind::Income, CategoryRole::None, 1),
    ("Investments", TransactionKind::Income, CategoryRole::None, 2),
    ("Freelance", TransactionKind::Income, CategoryRole::None, 3),
    ("Other Income", TransactionKind::Income, CategoryRole::Fallback, 4),
    ("Food", TransactionKind::Expense, CategoryRole::None, 1),
    ("Transport", TransactionKind::Expense, CategoryRole::None, 2),
    ("Utilities", TransactionKind::Expense, CategoryRole::None, 3),
    ("Home", TransactionKind::Expense, CategoryRole::None, 4),
    ("Health", TransactionKind::Expense, CategoryRole::None, 5),
    ("Entertainment", TransactionKind::Expense, CategoryRole::None, 6),
    ("Education", TransactionKind::Expense, CategoryRole::None, 7),
    ("Other Expenses", TransactionKind::Expense, CategoryRole::Fallback, 8),
];

fn fallback_catalog_entry(kind: TransactionKind) -> (&'static str, i32) {
    // The catalog is a constant with exactly one fallback per kind.
    DEFAULT_CATALOG
        .iter()
        .find(|(_, entry_kind, role, _)| *entry_kind == kind && *role == CategoryRole::Fallback)
        .map(|(name, _, _, order)| (*name, *order))
        .unwrap_or(("Other", 0))
}

/// Partial update for a category. `None` fields keep their prior values.
#[derive(Clone, Debug, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub kind: Option<TransactionKind>,
    pub sort_order: Option<i32>,
}

impl Engine {
    /// Lists the user's categories, ordered by sort order then recency.
    pub async fn list_categories(&self, user_id: Uuid) -> ResultEngine<Vec<Category>> {
        let models = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .order_by_asc(categories::Column::SortOrder)
            .order_by_desc(categories::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Category::try_from).collect()
    }

    /// Creates a user-defined category.
    ///
    /// User-defined categories never carry the default flag or the fallback
    /// role; those belong to the seeded catalog alone.
    pub async fn create_category(
        &self,
        user_id: Uuid,
        name: &str,
        kind: TransactionKind,
        sort_order: Option<i32>,
    ) -> ResultEngine<Category> {
        let category = Category::new(
            user_id,
            name.to_string(),
            kind,
            CategoryRole::None,
            false,
            sort_order.unwrap_or(0),
        )?;

        with_tx!(self, |db_tx| {
            self.require_unique_name(&db_tx, user_id, &category.name, None)
                .await?;
            insert_category(&db_tx, &category).await?;
            Ok(category)
        })
    }

    /// Renames, retypes or reorders a category. Unspecified fields keep
    /// their prior values.
    pub async fn update_category(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        update: CategoryUpdate,
    ) -> ResultEngine<Category> {
        let new_name = update
            .name
            .as_deref()
            .map(|name| normalize_required_text(name, "category name"))
            .transpose()?;

        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, user_id, category_id).await?;

            if let Some(name) = &new_name
                && *name != model.name
            {
                self.require_unique_name(&db_tx, user_id, name, Some(category_id))
                    .await?;
            }
            let effective_name = new_name.clone().unwrap_or_else(|| model.name.clone());

            let mut active: categories::ActiveModel = model.into();
            if let Some(name) = new_name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(kind) = update.kind {
                active.kind = ActiveValue::Set(kind.as_str().to_string());
            }
            if let Some(sort_order) = update.sort_order {
                active.sort_order = ActiveValue::Set(sort_order);
            }
            active.updated_at = ActiveValue::Set(Utc::now());

            let model = match active.update(&db_tx).await {
                Ok(model) => model,
                Err(err) if is_unique_violation(&err) => {
                    return Err(EngineError::DuplicateName(effective_name));
                }
                Err(err) => return Err(err.into()),
            };
            Category::try_from(model)
        })
    }

    /// Shows or hides a category. Default categories cannot be hidden.
    pub async fn set_category_visibility(
        &self,
        user_id: Uuid,
        category_id: Uuid,
        visible: bool,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, user_id, category_id).await?;
            if model.is_default && !visible {
                return Err(EngineError::InvalidOperation(
                    "default categories cannot be hidden".to_string(),
                ));
            }

            let mut active: categories::ActiveModel = model.into();
            active.is_visible = ActiveValue::Set(visible);
            active.updated_at = ActiveValue::Set(Utc::now());
            Category::try_from(active.update(&db_tx).await?)
        })
    }

    /// Deletes a category after retargeting its transactions to the
    /// fallback category of the same kind.
    ///
    /// The reassignment and the row deletion commit together, so a
    /// transaction can never be left referencing a category that no longer
    /// exists, even if the operation fails halfway. Returns the number of
    /// transactions rewritten.
    pub async fn delete_category(&self, user_id: Uuid, category_id: Uuid) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, user_id, category_id).await?;
            if model.is_default {
                return Err(EngineError::InvalidOperation(
                    "default categories cannot be deleted".to_string(),
                ));
            }
            let kind = TransactionKind::try_from(model.kind.as_str())?;

            let fallback = self.fallback_category(&db_tx, user_id, kind).await?;

            let reassigned = transactions::Entity::update_many()
                .col_expr(transactions::Column::CategoryId, Expr::value(fallback.id))
                .col_expr(transactions::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(transactions::Column::UserId.eq(user_id))
                .filter(transactions::Column::CategoryId.eq(category_id))
                .exec(&db_tx)
                .await?
                .rows_affected;

            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;

            Ok(reassigned)
        })
    }

    /// Seeds the fixed starter catalog for a newly created user.
    ///
    /// Not idempotent: a second call for the same user hits the name
    /// uniqueness constraint and seeds nothing.
    pub async fn create_default_categories(&self, user_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.seed_default_categories(&db_tx, user_id).await?;
            Ok(())
        })
    }

    pub(super) async fn seed_default_categories(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
    ) -> ResultEngine<()> {
        for (name, kind, role, sort_order) in DEFAULT_CATALOG {
            let category =
                Category::new(user_id, (*name).to_string(), *kind, *role, true, *sort_order)?;
            insert_category(db_tx, &category).await?;
        }
        Ok(())
    }

    /// Returns the user's fallback category for `kind`, creating it on
    /// demand.
    ///
    /// Bootstrapped accounts always have one; accounts that predate the
    /// default catalog get it lazily here.
    async fn fallback_category(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        kind: TransactionKind,
    ) -> ResultEngine<Category> {
        if let Some(model) = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::Role.eq(CategoryRole::Fallback.as_str()))
            .one(db_tx)
            .await?
        {
            return Category::try_from(model);
        }

        let (name, sort_order) = fallback_catalog_entry(kind);
        let category = Category::new(
            user_id,
            name.to_string(),
            kind,
            CategoryRole::Fallback,
            true,
            sort_order,
        )?;
        insert_category(db_tx, &category).await?;
        Ok(category)
    }

    async fn require_unique_name(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: Uuid,
        name: &str,
        excluding: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::UserId.eq(user_id))
            .filter(categories::Column::Name.eq(name));
        if let Some(id) = excluding {
            query = query.filter(categories::Column::Id.ne(id));
        }
        if query.one(db_tx).await?.is_some() {
            return Err(EngineError::DuplicateName(name.to_string()));
        }
        Ok(())
    }
}

async fn insert_category(db_tx: &DatabaseTransaction, category: &Category) -> ResultEngine<()> {
    match categories::ActiveModel::from(category).insert(db_tx).await {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => {
            Err(EngineError::DuplicateName(category.name.clone()))
        }
        Err(err) => Err(err.into()),
    }
}
