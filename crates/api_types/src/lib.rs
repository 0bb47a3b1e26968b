use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a money movement; categories carry the same kind to say
/// which movements they classify.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Returns the canonical kind string used by the engine/database.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

pub mod user {
    use super::*;

    /// Request body for creating an account.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct RegisterUser {
        pub email: String,
        pub password: String,
    }

    /// Request body for logging in.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginUser {
        pub email: String,
        pub password: String,
    }

    /// Response body for both register and login: the identity plus a
    /// bearer token for subsequent requests.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AuthResponse {
        pub id: Uuid,
        pub email: String,
        pub token: String,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryCreate {
        pub name: String,
        pub kind: TransactionKind,
        pub sort_order: Option<i32>,
    }

    /// Partial update; omitted fields keep their stored values.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        pub kind: Option<TransactionKind>,
        pub sort_order: Option<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryVisibility {
        pub is_visible: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub kind: TransactionKind,
        pub is_default: bool,
        pub sort_order: i32,
        pub is_visible: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
    }

    /// Response for a successful deletion.
    ///
    /// `reassigned_count` is the number of transactions that were rewritten
    /// to the fallback category before the deletion.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryDeleted {
        pub message: String,
        pub reassigned_count: u64,
    }
}

pub mod transaction {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreate {
        pub category_id: Uuid,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub description: String,
        /// Defaults to the current time when omitted.
        pub occurred_at: Option<DateTime<Utc>>,
    }

    /// Partial update; omitted fields keep their stored values.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub category_id: Option<Uuid>,
        pub kind: Option<TransactionKind>,
        pub amount_minor: Option<i64>,
        pub description: Option<String>,
        pub occurred_at: Option<DateTime<Utc>>,
    }

    /// Query parameters for listing. `from` is inclusive, `to` exclusive.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListParams {
        pub from: Option<DateTime<Utc>>,
        pub to: Option<DateTime<Utc>>,
        pub kind: Option<TransactionKind>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub category_id: Uuid,
        /// Display name of the category, when it still exists.
        pub category_name: Option<String>,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub description: String,
        pub occurred_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
    }
}
