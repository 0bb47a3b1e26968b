//! Category registry per user.
//!
//! Categories classify transactions by kind (income or expense). The ones
//! seeded at registration are flagged default: they can never be deleted nor
//! hidden, and one per kind carries the fallback role that deletion uses as
//! its reassignment target.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, TransactionKind};

/// Structural role of a category.
///
/// Stored explicitly instead of being inferred from the display name, so a
/// future rename feature cannot silently detach the reassignment target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryRole {
    None,
    Fallback,
}

impl CategoryRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Fallback => "fallback",
        }
    }
}

impl TryFrom<&str> for CategoryRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "none" => Ok(Self::None),
            "fallback" => Ok(Self::Fallback),
            other => Err(EngineError::InvalidInput(format!(
                "invalid category role: {other}"
            ))),
        }
    }
}

/// A named bucket (income or expense) into which transactions are
/// classified, scoped to one user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: TransactionKind,
    pub is_default: bool,
    pub role: CategoryRole,
    pub sort_order: i32,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn new(
        user_id: Uuid,
        name: String,
        kind: TransactionKind,
        role: CategoryRole,
        is_default: bool,
        sort_order: i32,
    ) -> ResultEngine<Self> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::InvalidInput(
                "category name must not be empty".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            kind,
            is_default,
            role,
            sort_order,
            is_visible: true,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub kind: String,
    pub is_default: bool,
    pub role: String,
    pub sort_order: i32,
    pub is_visible: bool,
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
    Users,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Category> for ActiveModel {
    fn from(category: &Category) -> Self {
        Self {
            id: ActiveValue::Set(category.id),
            user_id: ActiveValue::Set(category.user_id),
            name: ActiveValue::Set(category.name.clone()),
            kind: ActiveValue::Set(category.kind.as_str().to_string()),
            is_default: ActiveValue::Set(category.is_default),
            role: ActiveValue::Set(category.role.as_str().to_string()),
            sort_order: ActiveValue::Set(category.sort_order),
            is_visible: ActiveValue::Set(category.is_visible),
            created_at: ActiveValue::Set(category.created_at),
            updated_at: ActiveValue::Set(category.updated_at),
        }
    }
}

impl TryFrom<Model> for Category {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            is_default: model.is_default,
            role: CategoryRole::try_from(model.role.as_str())?,
            sort_order: model.sort_order,
            is_visible: model.is_visible,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
