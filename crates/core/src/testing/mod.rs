//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits
//! (em-api and the mail transport), so processors can be exercised without a
//! running em-api or SMTP server.
//!
//! # Example
//!
//! ```rust,ignore
//! use nics_processors_core::testing::{fixtures, MockEmApi, MockMailer};
//!
//! let api = MockEmApi::new();
//! api.set_orgs(vec![fixtures::org(1, "Fire Department", "FD", None)]).await;
//! api.register_orgs(10, vec![1]).await;
//!
//! let mailer = MockMailer::new();
//! mailer.fail_next("connection refused").await;
//! ```

mod mock_emapi;
mod mock_mailer;

pub use mock_emapi::{MockEmApi, RecordedBatch, RecordedIncidentOrgs};
pub use mock_mailer::{MockMailer, SentMessage};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::emapi::{CollabRoom, Organization, UserOrg};

    /// Create an organization. An empty prefix means the org has none.
    pub fn org(id: i64, name: &str, prefix: &str, parent: Option<i64>) -> Organization {
        Organization {
            org_id: id,
            name: name.to_string(),
            prefix: if prefix.is_empty() {
                None
            } else {
                Some(prefix.to_string())
            },
            parent_org_id: parent,
        }
    }

    /// Create an unsecured room as the provisioner would build it.
    pub fn room(incident_id: i64, name: &str) -> CollabRoom {
        CollabRoom {
            incidentid: incident_id,
            usersessionid: 100,
            name: name.to_string(),
            admin_users: None,
            read_write_users: None,
        }
    }

    /// Membership of the identity user in an org.
    pub fn user_org(org_id: i64, userorg_id: i64) -> UserOrg {
        UserOrg {
            orgid: org_id,
            userorgid: userorg_id,
        }
    }

    /// Incident notification body.
    pub fn incident_notification(workspace_id: i64, incident_id: i64, usersession_id: i64) -> String {
        serde_json::json!({
            "workspaceid": workspace_id,
            "incidentid": incident_id,
            "usersessionid": usersession_id,
            "incidentname": "Ridge Fire",
        })
        .to_string()
    }

    /// Simple JSON email body.
    pub fn simple_email(to: &str, subject: &str, body: &str) -> String {
        serde_json::json!({
            "to": to,
            "from": "nics@example.org",
            "subject": subject,
            "body": body,
        })
        .to_string()
    }
}
