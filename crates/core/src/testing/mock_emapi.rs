//! Mock em-api for testing.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::emapi::{
    CollabRoom, EmApi, EmApiError, IncidentOrg, NewIncidentOrg, Organization, SessionUser, User,
    UserOrg,
};

/// A recorded room batch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedBatch {
    pub workspace_id: i64,
    pub incident_id: i64,
    pub userorg_id: i64,
    pub rooms: Vec<CollabRoom>,
}

/// A recorded incident-org post for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedIncidentOrgs {
    pub workspace_id: i64,
    pub incident_id: i64,
    pub orgs: Vec<NewIncidentOrg>,
}

/// Mock implementation of the EmApi trait.
///
/// Provides controllable behavior for testing:
/// - Configurable organizations, registrations, associations and users
/// - Per-endpoint failures
/// - Recorded calls, posted associations and room batches
///
/// Endpoint names match the metric labels of the real client, e.g.
/// `"registered_orgs"`, `"incident_orgs"`, `"rooms_batch"`.
///
/// # Example
///
/// ```rust,ignore
/// use nics_processors_core::testing::{fixtures, MockEmApi};
///
/// let api = MockEmApi::new();
/// api.set_orgs(vec![fixtures::org(1, "Fire Department", "FD", None)]).await;
/// api.register_orgs(10, vec![1]).await;
///
/// // ... run the provisioner ...
///
/// let batches = api.posted_batches().await;
/// assert_eq!(batches[0].rooms[0].name, "Working Map (FD)");
/// ```
#[derive(Debug, Default)]
pub struct MockEmApi {
    /// All known organizations.
    orgs: Arc<RwLock<Vec<Organization>>>,
    /// Incident id to ids of registered organizations.
    registered: Arc<RwLock<HashMap<i64, Vec<i64>>>>,
    /// Incident id to existing associations.
    incident_orgs: Arc<RwLock<HashMap<i64, Vec<IncidentOrg>>>>,
    /// Memberships returned for any username.
    user_orgs: Arc<RwLock<Vec<UserOrg>>>,
    /// Identity user returned by the session lookup.
    identity: Arc<RwLock<Option<SessionUser>>>,
    /// Usersession id to user id.
    session_users: Arc<RwLock<HashMap<i64, i64>>>,
    /// Org id to enabled user ids.
    enabled_users: Arc<RwLock<HashMap<i64, Vec<i64>>>>,
    /// Endpoints that fail.
    failing: Arc<RwLock<HashSet<String>>>,
    /// Every endpoint call, in order.
    calls: Arc<RwLock<Vec<String>>>,
    get_org_calls: Arc<RwLock<Vec<i64>>>,
    posted_incident_orgs: Arc<RwLock<Vec<RecordedIncidentOrgs>>>,
    posted_batches: Arc<RwLock<Vec<RecordedBatch>>>,
}

impl MockEmApi {
    /// Create a mock with no data. The identity user is user 1 with session 100.
    pub fn new() -> Self {
        Self {
            identity: Arc::new(RwLock::new(Some(SessionUser {
                user_id: 1,
                usersession_id: 100,
            }))),
            ..Default::default()
        }
    }

    pub async fn set_orgs(&self, orgs: Vec<Organization>) {
        *self.orgs.write().await = orgs;
    }

    /// Register organizations for an incident's type(s).
    pub async fn register_orgs(&self, incident_id: i64, org_ids: Vec<i64>) {
        self.registered.write().await.insert(incident_id, org_ids);
    }

    /// Set the existing associations of an incident.
    pub async fn set_incident_orgs(&self, incident_id: i64, org_ids: Vec<i64>) {
        let incident_orgs = org_ids
            .into_iter()
            .map(|orgid| IncidentOrg {
                orgid,
                incidentid: incident_id,
                userid: Some(1),
                created: Some(1_700_000_000_000),
            })
            .collect();
        self.incident_orgs
            .write()
            .await
            .insert(incident_id, incident_orgs);
    }

    pub async fn set_user_orgs(&self, user_orgs: Vec<UserOrg>) {
        *self.user_orgs.write().await = user_orgs;
    }

    pub async fn set_identity(&self, identity: Option<SessionUser>) {
        *self.identity.write().await = identity;
    }

    pub async fn set_session_user(&self, usersession_id: i64, user_id: i64) {
        self.session_users
            .write()
            .await
            .insert(usersession_id, user_id);
    }

    pub async fn set_enabled_users(&self, org_id: i64, user_ids: Vec<i64>) {
        self.enabled_users.write().await.insert(org_id, user_ids);
    }

    /// Make every call to an endpoint fail with HTTP 500.
    pub async fn fail_endpoint(&self, endpoint: &str) {
        self.failing.write().await.insert(endpoint.to_string());
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self, endpoint: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| c.as_str() == endpoint)
            .count()
    }

    pub async fn get_org_calls(&self) -> Vec<i64> {
        self.get_org_calls.read().await.clone()
    }

    pub async fn posted_incident_orgs(&self) -> Vec<RecordedIncidentOrgs> {
        self.posted_incident_orgs.read().await.clone()
    }

    pub async fn posted_batches(&self) -> Vec<RecordedBatch> {
        self.posted_batches.read().await.clone()
    }

    /// Record a call and fail it if the endpoint is configured to fail.
    async fn record(&self, endpoint: &str) -> Result<(), EmApiError> {
        self.calls.write().await.push(endpoint.to_string());
        if self.failing.read().await.contains(endpoint) {
            return Err(EmApiError::Status {
                status: 500,
                body: format!("mock failure: {}", endpoint),
            });
        }
        Ok(())
    }

    async fn find_org(&self, org_id: i64) -> Option<Organization> {
        self.orgs
            .read()
            .await
            .iter()
            .find(|o| o.org_id == org_id)
            .cloned()
    }
}

#[async_trait]
impl EmApi for MockEmApi {
    async fn get_user_orgs(
        &self,
        _workspace_id: i64,
        _username: &str,
    ) -> Result<Vec<UserOrg>, EmApiError> {
        self.record("user_orgs").await?;
        Ok(self.user_orgs.read().await.clone())
    }

    async fn get_user_with_session(
        &self,
        _workspace_id: i64,
        userorg_id: i64,
    ) -> Result<SessionUser, EmApiError> {
        self.record("user_with_session").await?;
        self.identity
            .read()
            .await
            .ok_or_else(|| EmApiError::NotFound(format!("user for userorg {}", userorg_id)))
    }

    async fn get_all_orgs(&self, _workspace_id: i64) -> Result<Vec<Organization>, EmApiError> {
        self.record("all_orgs").await?;
        Ok(self.orgs.read().await.clone())
    }

    async fn get_org(&self, _workspace_id: i64, org_id: i64) -> Result<Organization, EmApiError> {
        self.record("org").await?;
        self.get_org_calls.write().await.push(org_id);
        self.find_org(org_id)
            .await
            .ok_or_else(|| EmApiError::NotFound(format!("org {}", org_id)))
    }

    async fn get_orgs_registered_for_incident(
        &self,
        _workspace_id: i64,
        incident_id: i64,
    ) -> Result<Vec<Organization>, EmApiError> {
        self.record("registered_orgs").await?;
        let ids = self
            .registered
            .read()
            .await
            .get(&incident_id)
            .cloned()
            .unwrap_or_default();
        let mut orgs = Vec::new();
        for id in ids {
            if let Some(org) = self.find_org(id).await {
                orgs.push(org);
            }
        }
        Ok(orgs)
    }

    async fn get_incident_orgs(
        &self,
        _workspace_id: i64,
        incident_id: i64,
    ) -> Result<Vec<IncidentOrg>, EmApiError> {
        self.record("incident_orgs").await?;
        Ok(self
            .incident_orgs
            .read()
            .await
            .get(&incident_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn add_incident_orgs(
        &self,
        workspace_id: i64,
        incident_id: i64,
        orgs: &[NewIncidentOrg],
    ) -> Result<i64, EmApiError> {
        self.record("add_incident_orgs").await?;
        self.posted_incident_orgs
            .write()
            .await
            .push(RecordedIncidentOrgs {
                workspace_id,
                incident_id,
                orgs: orgs.to_vec(),
            });
        Ok(orgs.len() as i64)
    }

    async fn get_user_by_session(
        &self,
        _workspace_id: i64,
        usersession_id: i64,
    ) -> Result<User, EmApiError> {
        self.record("user_by_session").await?;
        let user_id = self
            .session_users
            .read()
            .await
            .get(&usersession_id)
            .copied()
            .ok_or_else(|| EmApiError::NotFound(format!("user for session {}", usersession_id)))?;
        Ok(User {
            user_id,
            currentusersessions: Vec::new(),
        })
    }

    async fn get_enabled_user_ids(
        &self,
        _workspace_id: i64,
        org_id: i64,
    ) -> Result<Vec<i64>, EmApiError> {
        self.record("enabled_users").await?;
        Ok(self
            .enabled_users
            .read()
            .await
            .get(&org_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn post_rooms_batch(
        &self,
        workspace_id: i64,
        incident_id: i64,
        userorg_id: i64,
        rooms: &[CollabRoom],
    ) -> Result<(), EmApiError> {
        self.record("rooms_batch").await?;
        self.posted_batches.write().await.push(RecordedBatch {
            workspace_id,
            incident_id,
            userorg_id,
            rooms: rooms.to_vec(),
        });
        Ok(())
    }
}
