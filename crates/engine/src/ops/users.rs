use chrono::Utc;
use sea_orm::{ActiveValue, QueryFilter, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, User, error::is_unique_violation, users};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Creates a user account and seeds its default category catalog.
    ///
    /// Both writes share one DB transaction: a seeding failure rolls the
    /// user row back, so callers never observe a partially-seeded account.
    pub async fn register_user(&self, email: &str, password_hash: &str) -> ResultEngine<User> {
        let email = normalize_email(email)?;

        with_tx!(self, |db_tx| {
            if users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&db_tx)
                .await?
                .is_some()
            {
                return Err(EngineError::DuplicateEmail(email));
            }

            let now = Utc::now();
            let user = User {
                id: Uuid::new_v4(),
                email: email.clone(),
                created_at: now,
            };
            let active = users::ActiveModel {
                id: ActiveValue::Set(user.id),
                email: ActiveValue::Set(email.clone()),
                password_hash: ActiveValue::Set(password_hash.to_string()),
                created_at: ActiveValue::Set(now),
                updated_at: ActiveValue::Set(now),
            };
            match active.insert(&db_tx).await {
                Ok(_) => {}
                Err(err) if is_unique_violation(&err) => {
                    return Err(EngineError::DuplicateEmail(email));
                }
                Err(err) => return Err(err.into()),
            }

            self.seed_default_categories(&db_tx, user.id).await?;
            Ok(user)
        })
    }
}

fn normalize_email(email: &str) -> ResultEngine<String> {
    let email = normalize_required_text(email, "email")?.to_lowercase();
    if !email.contains('@') {
        return Err(EngineError::InvalidInput(format!(
            "invalid email address: {email}"
        )));
    }
    Ok(email)
}
