//! Request and response types for the em-api REST endpoints.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from em-api calls.
#[derive(Debug, Error)]
pub enum EmApiError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    /// Non-success HTTP status.
    #[error("em-api returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// An organization record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "orgId")]
    pub org_id: i64,
    #[serde(default)]
    pub name: String,
    /// Short name used in room titles when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(
        rename = "parentorgid",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_org_id: Option<i64>,
}

impl Organization {
    /// Prefix when non-empty, otherwise the full name.
    pub fn label(&self) -> &str {
        match self.prefix.as_deref() {
            Some(prefix) if !prefix.is_empty() => prefix,
            _ => &self.name,
        }
    }

    /// Parent organization id, if it refers to a real organization.
    pub fn parent_id(&self) -> Option<i64> {
        self.parent_org_id.filter(|id| *id > 0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizationsResponse {
    #[serde(default)]
    pub organizations: Vec<Organization>,
}

/// Membership of a user in an organization.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserOrg {
    pub orgid: i64,
    pub userorgid: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserOrgsResponse {
    #[serde(rename = "userOrgs", default)]
    pub user_orgs: Vec<UserOrg>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserSession {
    pub usersessionid: i64,
}

/// A user as returned by the user lookup endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(rename = "userId")]
    pub user_id: i64,
    #[serde(default)]
    pub currentusersessions: Vec<UserSession>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

/// A user together with the session rooms are created under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub usersession_id: i64,
}

/// An existing incident-org association.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IncidentOrg {
    pub orgid: i64,
    pub incidentid: i64,
    #[serde(default)]
    pub userid: Option<i64>,
    /// Creation time, epoch milliseconds.
    #[serde(default)]
    pub created: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncidentOrgsResponse {
    #[serde(rename = "incidentOrgs", default)]
    pub incident_orgs: Vec<IncidentOrg>,
}

/// An incident-org association to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewIncidentOrg {
    pub orgid: i64,
    pub incidentid: i64,
    pub userid: i64,
    /// Creation time, epoch seconds.
    pub created: i64,
}

impl NewIncidentOrg {
    pub fn new(orgid: i64, incidentid: i64, userid: i64) -> Self {
        Self {
            orgid,
            incidentid,
            userid,
            created: chrono::Utc::now().timestamp(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountResponse {
    #[serde(default)]
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnabledUser {
    pub userid: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnabledUsersResponse {
    #[serde(default)]
    pub data: Vec<EnabledUser>,
}

/// A collaboration room entity for batch creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollabRoom {
    pub incidentid: i64,
    pub usersessionid: i64,
    pub name: String,
    #[serde(
        rename = "adminUsers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub admin_users: Option<Vec<i64>>,
    #[serde(
        rename = "readWriteUsers",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub read_write_users: Option<Vec<i64>>,
}

impl CollabRoom {
    pub fn is_secure(&self) -> bool {
        self.admin_users.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_organization_label_prefers_prefix() {
        let org: Organization = serde_json::from_str(
            r#"{"orgId": 4, "name": "Fire Department", "prefix": "FD", "parentorgid": 2}"#,
        )
        .unwrap();
        assert_eq!(org.label(), "FD");
        assert_eq!(org.parent_id(), Some(2));
    }

    #[test]
    fn test_organization_label_falls_back_to_name() {
        let org: Organization =
            serde_json::from_str(r#"{"orgId": 4, "name": "Fire Department", "prefix": ""}"#)
                .unwrap();
        assert_eq!(org.label(), "Fire Department");
        assert_eq!(org.parent_id(), None);
    }

    #[test]
    fn test_organization_zero_parent_is_none() {
        let org: Organization =
            serde_json::from_str(r#"{"orgId": 4, "name": "X", "parentorgid": 0}"#).unwrap();
        assert_eq!(org.parent_id(), None);
    }

    #[test]
    fn test_collab_room_open_omits_user_lists() {
        let room = CollabRoom {
            incidentid: 10,
            usersessionid: 99,
            name: "Working Map (FD)".to_string(),
            admin_users: None,
            read_write_users: None,
        };
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"incidentid": 10, "usersessionid": 99, "name": "Working Map (FD)"})
        );
        assert!(!room.is_secure());
    }

    #[test]
    fn test_collab_room_secure_serializes_camel_case_lists() {
        let room = CollabRoom {
            incidentid: 10,
            usersessionid: 99,
            name: "Command (FD)".to_string(),
            admin_users: Some(vec![1]),
            read_write_users: Some(vec![5, 6]),
        };
        let json = serde_json::to_value(&room).unwrap();
        assert_eq!(json["adminUsers"], serde_json::json!([1]));
        assert_eq!(json["readWriteUsers"], serde_json::json!([5, 6]));
    }

    #[test]
    fn test_new_incident_org_uses_epoch_seconds() {
        let org = NewIncidentOrg::new(3, 10, 7);
        let now = chrono::Utc::now().timestamp();
        assert!((now - org.created).abs() < 5);
    }
}
