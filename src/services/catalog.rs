// src/services/catalog.rs

use std::sync::Arc;

use crate::{
    error::{Entity, ServiceError},
    models::test::{
        AuthorTestRow, AuthorTestView, NewTest, Test, TestChanges, TestDetails, TestSummary,
        TestWithQuestions,
    },
    store::{DataStore, StoreError},
};

/// Creating, publishing and browsing tests.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn DataStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Inserts a new, unpublished test.
    pub async fn create_test(&self, new_test: &NewTest) -> Result<Test, ServiceError> {
        self.store.insert_test(new_test).await.map_err(|e| {
            tracing::error!(author_id = new_test.author_id, "Failed to create test: {:?}", e);
            ServiceError::CreateFailed {
                entity: Entity::Test,
                source: e.into(),
            }
        })
    }

    /// Applies `changes` and marks the test published in one update.
    /// Publishing an already published test succeeds.
    pub async fn publish_test(
        &self,
        test_id: i64,
        changes: &TestChanges,
    ) -> Result<Test, ServiceError> {
        let test = self
            .store
            .publish_test(test_id, changes)
            .await
            .map_err(|e| match e {
                StoreError::RecordNotFound => {
                    tracing::warn!(test_id, "Publish rejected: no test with this id");
                    ServiceError::not_found(Entity::Test, test_id)
                }
                other => {
                    tracing::error!(test_id, "Failed to publish test: {:?}", other);
                    ServiceError::UpdateFailed {
                        entity: Entity::Test,
                        key: test_id.to_string(),
                        source: other.into(),
                    }
                }
            })?;

        tracing::info!(test_id, "Test published");
        Ok(test)
    }

    pub async fn list_all_tests(&self) -> Result<Vec<TestSummary>, ServiceError> {
        self.store
            .list_test_summaries()
            .await
            .map_err(|e| {
                tracing::error!("Failed to list tests: {:?}", e);
                ServiceError::fetch_failed(Entity::Test, e)
            })
    }

    /// Lists tests whose category matches exactly.
    pub async fn list_tests_by_category(&self, category: &str) -> Result<Vec<Test>, ServiceError> {
        self.store
            .list_tests_by_category(category)
            .await
            .map_err(|e| {
                tracing::error!(category, "Failed to list tests by category: {:?}", e);
                ServiceError::fetch_failed(Entity::Test, e)
            })
    }

    pub async fn test_details(&self, test_id: i64) -> Result<TestDetails, ServiceError> {
        let test = self
            .store
            .find_test(test_id)
            .await
            .map_err(|e| {
                tracing::error!(test_id, "Error in test_details: {:?}", e);
                ServiceError::fetch_failed(Entity::Test, e)
            })?
            .ok_or_else(|| ServiceError::not_found(Entity::Test, test_id))?;

        Ok(TestDetails::from(test))
    }

    /// Loads a test with its author and questions.
    ///
    /// Unlike the other lookups, a missing test is `Ok(None)` rather than `NotFound`.
    pub async fn test_with_questions(
        &self,
        test_id: i64,
    ) -> Result<Option<TestWithQuestions>, ServiceError> {
        self.store
            .find_test_with_questions(test_id)
            .await
            .map_err(|e| ServiceError::fetch_failed(Entity::Test, e))
    }

    /// Raw rows for every test owned by the author linked to `user_id`.
    pub async fn author_test_rows(&self, user_id: i64) -> Result<Vec<AuthorTestRow>, ServiceError> {
        let author = self
            .store
            .find_author_by_user(user_id)
            .await
            .map_err(|e| ServiceError::fetch_failed(Entity::Author, e))?
            .ok_or_else(|| {
                tracing::warn!(user_id, "Author not found for this user");
                ServiceError::not_found(Entity::Author, user_id)
            })?;

        self.store.list_author_tests(author.id).await.map_err(|e| {
            tracing::error!(author_id = author.id, "Error listing author tests: {:?}", e);
            ServiceError::fetch_failed(Entity::Test, e)
        })
    }

    /// Author's tests in their dashboard view.
    pub async fn list_tests_by_author(
        &self,
        user_id: i64,
    ) -> Result<Vec<AuthorTestView>, ServiceError> {
        let rows = self.author_test_rows(user_id).await?;

        Ok(rows.into_iter().map(AuthorTestView::from_row).collect())
    }
}
