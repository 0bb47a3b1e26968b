//! Core engine for Finanza, a personal finance tracking API.
//!
//! The engine owns the persistence model (users, categories, transactions)
//! and every mutation that must uphold the category lifecycle invariants:
//! per-user name uniqueness, default-category protection, and the
//! reassign-before-delete rule that keeps every transaction pointing at an
//! existing category.

pub use categories::{Category, CategoryRole};
pub use error::EngineError;
pub use ops::{CategoryUpdate, Engine, EngineBuilder, TransactionListFilter, TransactionUpdate};
pub use transactions::{Transaction, TransactionKind};
pub use users::User;

mod categories;
mod error;
mod ops;
mod transactions;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
