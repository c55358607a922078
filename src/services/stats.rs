// src/services/stats.rs

use std::sync::Arc;

use crate::{
    error::ServiceError,
    models::{account::Role, stats::DashboardStats},
    store::DataStore,
};

#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn DataStore>,
}

impl StatsService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    /// Counts regular users, authors and published tests.
    ///
    /// The three counts run concurrently and are not read from one snapshot.
    /// If any of them fails the whole call fails.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, ServiceError> {
        let (total_users, total_authors, total_published_tests) = tokio::try_join!(
            self.store.count_accounts_by_role(Role::User),
            self.store.count_authors(),
            self.store.count_published_tests(),
        )
        .map_err(|e| {
            tracing::error!("Error fetching dashboard stats: {:?}", e);
            ServiceError::AggregationFailed(e.into())
        })?;

        Ok(DashboardStats {
            total_users,
            total_authors,
            total_published_tests,
        })
    }
}
