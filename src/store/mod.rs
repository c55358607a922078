// src/store/mod.rs

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    account::{Account, NewAccount, Role},
    author::Author,
    result::ResultSheet,
    test::{AuthorTestRow, NewTest, Test, TestChanges, TestSummary, TestWithQuestions},
};

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    /// An update or other keyed write matched no row.
    #[error("record not found")]
    RecordNotFound,

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    /// A unique key is already taken.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A row points at a parent that does not exist.
    #[error("broken reference: {0}")]
    BrokenReference(String),

    /// Raised by test doubles to simulate a store outage.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence operations the services depend on.
///
/// Lookups return `Ok(None)` for a missing key. Keyed updates return
/// `Err(StoreError::RecordNotFound)` when no row matched.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    async fn insert_account(&self, account: &NewAccount) -> StoreResult<Account>;

    async fn count_accounts_by_role(&self, role: Role) -> StoreResult<i64>;

    async fn count_authors(&self) -> StoreResult<i64>;

    async fn find_author_by_user(&self, user_id: i64) -> StoreResult<Option<Author>>;

    async fn count_published_tests(&self) -> StoreResult<i64>;

    async fn insert_test(&self, test: &NewTest) -> StoreResult<Test>;

    /// Merges `changes` and sets `is_published = true` in a single write.
    async fn publish_test(&self, id: i64, changes: &TestChanges) -> StoreResult<Test>;

    async fn find_test(&self, id: i64) -> StoreResult<Option<Test>>;

    async fn list_test_summaries(&self) -> StoreResult<Vec<TestSummary>>;

    async fn list_tests_by_category(&self, category: &str) -> StoreResult<Vec<Test>>;

    async fn find_test_with_questions(&self, id: i64) -> StoreResult<Option<TestWithQuestions>>;

    async fn list_author_tests(&self, author_id: i64) -> StoreResult<Vec<AuthorTestRow>>;

    async fn find_result_sheet(&self, result_id: i64) -> StoreResult<Option<ResultSheet>>;
}
