use sea_orm::{DatabaseTransaction, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, categories, transactions};

use super::Engine;

/// Generates a `require_*` accessor that resolves an entity by id and
/// enforces ownership: absent rows are `NotFound`, rows owned by another
/// user are `Forbidden`.
macro_rules! impl_require_owned {
    ($fn_name:ident, $module:ident, $label:literal) => {
        pub(super) async fn $fn_name(
            &self,
            db_tx: &DatabaseTransaction,
            user_id: Uuid,
            id: Uuid,
        ) -> ResultEngine<$module::Model> {
            let model = $module::Entity::find_by_id(id)
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound($label.to_string()))?;
            if model.user_id != user_id {
                return Err(EngineError::Forbidden(
                    concat!($label, " belongs to another user").to_string(),
                ));
            }
            Ok(model)
        }
    };
}

impl Engine {
    impl_require_owned!(require_category, categories, "category");
    impl_require_owned!(require_transaction, transactions, "transaction");
}
