//! em-api REST client abstraction.
//!
//! This module provides an `EmApi` trait covering the organization, user,
//! incident-org and collaboration room endpoints the provisioner needs,
//! with a reqwest-backed implementation.

mod client;
mod types;

pub use client::EmApiClient;
pub use types::*;

use async_trait::async_trait;

/// Calls against em-api. Every request acts as the configured identity user.
#[async_trait]
pub trait EmApi: Send + Sync {
    /// Org memberships of a user in a workspace.
    async fn get_user_orgs(
        &self,
        workspace_id: i64,
        username: &str,
    ) -> Result<Vec<UserOrg>, EmApiError>;

    /// The user behind a userorg, with its current session.
    async fn get_user_with_session(
        &self,
        workspace_id: i64,
        userorg_id: i64,
    ) -> Result<SessionUser, EmApiError>;

    /// Every organization in the workspace.
    async fn get_all_orgs(&self, workspace_id: i64) -> Result<Vec<Organization>, EmApiError>;

    /// A single organization by id.
    async fn get_org(&self, workspace_id: i64, org_id: i64) -> Result<Organization, EmApiError>;

    /// Organizations registered for the incident type(s) of an incident.
    async fn get_orgs_registered_for_incident(
        &self,
        workspace_id: i64,
        incident_id: i64,
    ) -> Result<Vec<Organization>, EmApiError>;

    /// Current incident-org associations of an incident.
    async fn get_incident_orgs(
        &self,
        workspace_id: i64,
        incident_id: i64,
    ) -> Result<Vec<IncidentOrg>, EmApiError>;

    /// Associate organizations with an incident. Returns the count reported by em-api.
    async fn add_incident_orgs(
        &self,
        workspace_id: i64,
        incident_id: i64,
        orgs: &[NewIncidentOrg],
    ) -> Result<i64, EmApiError>;

    /// The user owning a session, current or past.
    async fn get_user_by_session(
        &self,
        workspace_id: i64,
        usersession_id: i64,
    ) -> Result<User, EmApiError>;

    /// Ids of the enabled users of an organization.
    async fn get_enabled_user_ids(
        &self,
        workspace_id: i64,
        org_id: i64,
    ) -> Result<Vec<i64>, EmApiError>;

    /// Create collaboration rooms on an incident in one call.
    async fn post_rooms_batch(
        &self,
        workspace_id: i64,
        incident_id: i64,
        userorg_id: i64,
        rooms: &[CollabRoom],
    ) -> Result<(), EmApiError>;
}
