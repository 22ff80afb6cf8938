use serde::Serialize;

use super::RouteKind;

/// Result of processing one notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// Routing key matched nothing; the notification was dropped.
    Unsupported,
    /// Registered organizations were associated with the incident.
    IncidentOrgsAdded { requested: usize, added: i64 },
    /// No organizations are registered for the incident type(s).
    NoRegisteredOrgs,
    /// A room batch was posted.
    RoomsSubmitted { rooms: usize },
    /// Nothing to create; no batch was posted.
    NoRoomsToCreate,
    /// Escalation found no associated organization with a parent.
    NoParentOrgs,
    /// Processing stopped on an error; the notification was dropped.
    Failed { reason: String },
}

impl ProcessOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ProcessOutcome::Failed { .. })
    }
}

/// Route and outcome of a processed notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessReport {
    pub route: RouteKind,
    pub outcome: ProcessOutcome,
}
