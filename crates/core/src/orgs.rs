//! Process-wide organization cache.
//!
//! Filled once at start-up from em-api and extended on lookup misses.
//! Entries never expire during a run.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::emapi::{EmApi, EmApiError, Organization};

/// Concurrency-safe mapping from organization id to organization.
#[derive(Debug, Default)]
pub struct OrgCache {
    orgs: RwLock<HashMap<i64, Organization>>,
}

impl OrgCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cache contents with every organization in the workspace.
    ///
    /// Fails when em-api cannot be reached or returns no organizations.
    pub async fn populate(&self, api: &dyn EmApi, workspace_id: i64) -> Result<usize, EmApiError> {
        let orgs = api.get_all_orgs(workspace_id).await?;
        if orgs.is_empty() {
            return Err(EmApiError::NotFound(format!(
                "no organizations in workspace {}",
                workspace_id
            )));
        }

        let fresh: HashMap<i64, Organization> = orgs
            .into_iter()
            .filter(|org| org.org_id > 0)
            .map(|org| (org.org_id, org))
            .collect();
        let count = fresh.len();

        *self.orgs.write().await = fresh;
        info!(count = count, "Populated organization cache");
        Ok(count)
    }

    pub async fn get(&self, org_id: i64) -> Option<Organization> {
        self.orgs.read().await.get(&org_id).cloned()
    }

    /// Add or replace an organization. Ids <= 0 are ignored.
    pub async fn insert(&self, org: Organization) {
        if org.org_id > 0 {
            self.orgs.write().await.insert(org.org_id, org);
        }
    }

    pub async fn len(&self) -> usize {
        self.orgs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orgs.read().await.is_empty()
    }

    /// Look up an organization, fetching and caching it on a miss.
    ///
    /// Returns `None` when the fetch fails; the failure is logged.
    pub async fn resolve(
        &self,
        api: &dyn EmApi,
        workspace_id: i64,
        org_id: i64,
    ) -> Option<Organization> {
        if let Some(org) = self.get(org_id).await {
            return Some(org);
        }

        debug!(org_id = org_id, "Organization not cached, fetching");
        match api.get_org(workspace_id, org_id).await {
            Ok(org) => {
                self.insert(org.clone()).await;
                Some(org)
            }
            Err(e) => {
                warn!(org_id = org_id, error = %e, "Failed to fetch organization");
                None
            }
        }
    }
}
