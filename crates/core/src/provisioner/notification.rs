use serde::Deserialize;

use super::ProvisionerError;

/// Incident lifecycle notification body.
///
/// Other fields (incident types, ...) are ignored. The name is only logged.
#[derive(Debug, Clone, Deserialize)]
pub struct IncidentNotification {
    #[serde(default)]
    pub workspaceid: Option<i64>,
    #[serde(default)]
    pub incidentid: Option<i64>,
    #[serde(default)]
    pub usersessionid: Option<i64>,
    #[serde(default)]
    pub incidentname: Option<String>,
}

/// Validated identifiers of an incident notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncidentIds {
    pub workspace_id: i64,
    pub incident_id: i64,
    pub usersession_id: i64,
}

impl IncidentNotification {
    pub fn parse(body: &str) -> Result<Self, ProvisionerError> {
        serde_json::from_str(body)
            .map_err(|e| ProvisionerError::InvalidNotification(e.to_string()))
    }

    /// Workspace, incident and session ids; each must be present and positive.
    pub fn ids(&self) -> Result<IncidentIds, ProvisionerError> {
        fn require(value: Option<i64>, field: &str) -> Result<i64, ProvisionerError> {
            match value {
                Some(v) if v > 0 => Ok(v),
                Some(v) => Err(ProvisionerError::InvalidNotification(format!(
                    "{} must be positive, got {}",
                    field, v
                ))),
                None => Err(ProvisionerError::InvalidNotification(format!(
                    "missing {}",
                    field
                ))),
            }
        }

        Ok(IncidentIds {
            workspace_id: require(self.workspaceid, "workspaceid")?,
            incident_id: require(self.incidentid, "incidentid")?,
            usersession_id: require(self.usersessionid, "usersessionid")?,
        })
    }
}
