// src/services/results.rs

use std::sync::Arc;

use crate::{
    error::{Entity, ServiceError},
    models::result::TestResultSummary,
    store::DataStore,
};

#[derive(Clone)]
pub struct ResultService {
    store: Arc<dyn DataStore>,
}

impl ResultService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Loads a result and tallies its final answers into correct and wrong counts.
    pub async fn test_result(&self, result_id: i64) -> Result<TestResultSummary, ServiceError> {
        let sheet = self
            .store
            .find_result_sheet(result_id)
            .await
            .map_err(|e| {
                tracing::error!(result_id, "Error fetching test result: {:?}", e);
                ServiceError::fetch_failed(Entity::TestResult, e)
            })?
            .ok_or_else(|| ServiceError::not_found(Entity::TestResult, result_id))?;

        Ok(TestResultSummary::from(sheet))
    }
}
