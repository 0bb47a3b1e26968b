use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{CategoryRole, CategoryUpdate, Engine, EngineError, TransactionKind, User};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    (engine, db)
}

async fn register(engine: &Engine, email: &str) -> User {
    engine.register_user(email, "hash").await.unwrap()
}

/// Inserts a bare user row, bypassing the engine: simulates an account
/// created before the default catalog existed.
async fn insert_unseeded_user(db: &DatabaseConnection, email: &str) -> Uuid {
    let user_id = Uuid::new_v4();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (id, email, password_hash, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
        vec![
            user_id.as_bytes().to_vec().into(),
            email.into(),
            "hash".into(),
            Utc::now().into(),
            Utc::now().into(),
        ],
    ))
    .await
    .unwrap();
    user_id
}

#[tokio::test]
async fn registration_seeds_default_catalog() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let categories = engine.list_categories(user.id).await.unwrap();
    assert_eq!(categories.len(), 12);
    assert!(categories.iter().all(|c| c.is_default && c.is_visible));
    assert_eq!(
        categories
            .iter()
            .filter(|c| c.kind == TransactionKind::Income)
            .count(),
        4
    );
    assert_eq!(
        categories
            .iter()
            .filter(|c| c.kind == TransactionKind::Expense)
            .count(),
        8
    );

    for kind in [TransactionKind::Income, TransactionKind::Expense] {
        let fallbacks: Vec<_> = categories
            .iter()
            .filter(|c| c.kind == kind && c.role == CategoryRole::Fallback)
            .collect();
        assert_eq!(fallbacks.len(), 1, "exactly one fallback per kind");
    }
}

#[tokio::test]
async fn reseeding_fails_and_seeds_nothing() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let err = engine.create_default_categories(user.id).await.unwrap_err();
    assert!(matches!(err, EngineError::DuplicateName(_)));

    // The failed pass must not leave any partial rows behind.
    assert_eq!(engine.list_categories(user.id).await.unwrap().len(), 12);
}

#[tokio::test]
async fn registration_normalizes_email_and_rejects_duplicates() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "  Bob@Example.COM ").await;
    assert_eq!(user.email, "bob@example.com");

    let err = engine
        .register_user("bob@example.com", "other-hash")
        .await
        .unwrap_err();
    assert_eq!(
        err,
        EngineError::DuplicateEmail("bob@example.com".to_string())
    );
}

#[tokio::test]
async fn duplicate_name_rejected_regardless_of_kind() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    engine
        .create_category(user.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();

    let err = engine
        .create_category(user.id, "Gym", TransactionKind::Income, None)
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::DuplicateName("Gym".to_string()));
}

#[tokio::test]
async fn same_name_allowed_for_different_users() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;

    engine
        .create_category(alice.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();
    engine
        .create_category(bob.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();
}

#[tokio::test]
async fn rename_collision_leaves_category_unchanged() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let gym = engine
        .create_category(user.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();

    // "Salary" is part of the seeded catalog.
    let err = engine
        .update_category(
            user.id,
            gym.id,
            CategoryUpdate {
                name: Some("Salary".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::DuplicateName("Salary".to_string()));

    let categories = engine.list_categories(user.id).await.unwrap();
    let unchanged = categories.iter().find(|c| c.id == gym.id).unwrap();
    assert_eq!(unchanged.name, "Gym");
}

#[tokio::test]
async fn update_preserves_unspecified_fields() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let category = engine
        .create_category(user.id, "Side Project", TransactionKind::Expense, Some(42))
        .await
        .unwrap();

    let updated = engine
        .update_category(
            user.id,
            category.id,
            CategoryUpdate {
                kind: Some(TransactionKind::Income),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Side Project");
    assert_eq!(updated.kind, TransactionKind::Income);
    assert_eq!(updated.sort_order, 42);
}

#[tokio::test]
async fn renaming_to_the_same_name_is_a_no_op_collision() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let gym = engine
        .create_category(user.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();

    // Renaming a category to its current name must not collide with itself.
    let updated = engine
        .update_category(
            user.id,
            gym.id,
            CategoryUpdate {
                name: Some("Gym".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Gym");
}

#[tokio::test]
async fn operations_on_foreign_categories_are_forbidden() {
    let (engine, _db) = engine_with_db().await;
    let alice = register(&engine, "alice@example.com").await;
    let bob = register(&engine, "bob@example.com").await;

    let gym = engine
        .create_category(alice.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();

    let err = engine
        .update_category(
            bob.id,
            gym.id,
            CategoryUpdate {
                name: Some("Mine".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine.delete_category(bob.id, gym.id).await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .delete_category(alice.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn default_categories_cannot_be_hidden_or_deleted() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let categories = engine.list_categories(user.id).await.unwrap();
    let fallback = categories
        .iter()
        .find(|c| c.name == "Other Expenses")
        .unwrap();

    let err = engine
        .set_category_visibility(user.id, fallback.id, false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));

    let err = engine.delete_category(user.id, fallback.id).await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidOperation(_)));

    // Untouched by the failed attempts.
    let categories = engine.list_categories(user.id).await.unwrap();
    let fallback = categories
        .iter()
        .find(|c| c.name == "Other Expenses")
        .unwrap();
    assert!(fallback.is_visible);
}

#[tokio::test]
async fn custom_categories_can_toggle_visibility() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let gym = engine
        .create_category(user.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();

    let hidden = engine
        .set_category_visibility(user.id, gym.id, false)
        .await
        .unwrap();
    assert!(!hidden.is_visible);

    let shown = engine
        .set_category_visibility(user.id, gym.id, true)
        .await
        .unwrap();
    assert!(shown.is_visible);
}

#[tokio::test]
async fn deletion_reassigns_transactions_to_fallback() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let gym = engine
        .create_category(user.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();

    for description in ["Membership", "Protein", "Gloves"] {
        engine
            .create_transaction(
                user.id,
                gym.id,
                TransactionKind::Expense,
                1500,
                description,
                Utc::now(),
            )
            .await
            .unwrap();
    }

    let reassigned = engine.delete_category(user.id, gym.id).await.unwrap();
    assert_eq!(reassigned, 3);

    let categories = engine.list_categories(user.id).await.unwrap();
    assert!(categories.iter().all(|c| c.id != gym.id));

    let transactions = engine
        .list_transactions(user.id, Default::default())
        .await
        .unwrap();
    assert_eq!(transactions.len(), 3);
    assert!(
        transactions
            .iter()
            .all(|(_, name)| name.as_deref() == Some("Other Expenses"))
    );
}

#[tokio::test]
async fn deletion_of_unreferenced_category_reports_zero() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let gym = engine
        .create_category(user.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();

    let reassigned = engine.delete_category(user.id, gym.id).await.unwrap();
    assert_eq!(reassigned, 0);
}

#[tokio::test]
async fn deletion_only_touches_the_doomed_category_transactions() {
    let (engine, _db) = engine_with_db().await;
    let user = register(&engine, "alice@example.com").await;

    let gym = engine
        .create_category(user.id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();
    let books = engine
        .create_category(user.id, "Books", TransactionKind::Expense, None)
        .await
        .unwrap();

    engine
        .create_transaction(
            user.id,
            gym.id,
            TransactionKind::Expense,
            1500,
            "Membership",
            Utc::now(),
        )
        .await
        .unwrap();
    engine
        .create_transaction(
            user.id,
            books.id,
            TransactionKind::Expense,
            2000,
            "Novel",
            Utc::now(),
        )
        .await
        .unwrap();

    let reassigned = engine.delete_category(user.id, gym.id).await.unwrap();
    assert_eq!(reassigned, 1);

    let transactions = engine
        .list_transactions(user.id, Default::default())
        .await
        .unwrap();
    let novel = transactions
        .iter()
        .find(|(tx, _)| tx.description == "Novel")
        .unwrap();
    assert_eq!(novel.0.category_id, books.id);
}

#[tokio::test]
async fn missing_fallback_is_created_on_demand() {
    let (engine, db) = engine_with_db().await;
    let user_id = insert_unseeded_user(&db, "early@example.com").await;

    let gym = engine
        .create_category(user_id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();
    engine
        .create_transaction(
            user_id,
            gym.id,
            TransactionKind::Expense,
            1500,
            "Membership",
            Utc::now(),
        )
        .await
        .unwrap();

    let reassigned = engine.delete_category(user_id, gym.id).await.unwrap();
    assert_eq!(reassigned, 1);

    let categories = engine.list_categories(user_id).await.unwrap();
    let fallback = categories
        .iter()
        .find(|c| c.role == CategoryRole::Fallback)
        .unwrap();
    assert_eq!(fallback.name, "Other Expenses");
    assert_eq!(fallback.kind, TransactionKind::Expense);
    assert!(fallback.is_default);
}

#[tokio::test]
async fn fallback_is_a_singleton_across_sequential_deletions() {
    let (engine, db) = engine_with_db().await;
    let user_id = insert_unseeded_user(&db, "early@example.com").await;

    let gym = engine
        .create_category(user_id, "Gym", TransactionKind::Expense, None)
        .await
        .unwrap();
    let books = engine
        .create_category(user_id, "Books", TransactionKind::Expense, None)
        .await
        .unwrap();

    engine.delete_category(user_id, gym.id).await.unwrap();
    engine.delete_category(user_id, books.id).await.unwrap();

    let categories = engine.list_categories(user_id).await.unwrap();
    let fallbacks: Vec<_> = categories
        .iter()
        .filter(|c| c.kind == TransactionKind::Expense && c.role == CategoryRole::Fallback)
        .collect();
    assert_eq!(fallbacks.len(), 1);
}
