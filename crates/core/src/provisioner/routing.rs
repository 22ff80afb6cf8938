//! Routing key classification.

use regex_lite::Regex;
use serde::Serialize;

use crate::config::RoutingConfig;

use super::ProvisionerError;

/// The kind of incident notification a routing key denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    IncidentAdded,
    IncidentUpdated,
    IncidentOrgAdded,
    Escalation,
    Unsupported,
}

impl RouteKind {
    /// Returns the string representation for logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteKind::IncidentAdded => "incident_added",
            RouteKind::IncidentUpdated => "incident_updated",
            RouteKind::IncidentOrgAdded => "incident_org_added",
            RouteKind::Escalation => "escalation",
            RouteKind::Unsupported => "unsupported",
        }
    }
}

/// Exact topic or full-match pattern. Empty config values never match.
#[derive(Debug)]
struct KeyMatcher {
    topic: Option<String>,
    pattern: Option<Regex>,
}

impl KeyMatcher {
    fn new(topic: &str, pattern: &str) -> Result<Self, ProvisionerError> {
        let topic = (!topic.is_empty()).then(|| topic.to_string());
        let pattern = if pattern.is_empty() {
            None
        } else {
            let anchored = format!("^(?:{})$", pattern);
            Some(
                Regex::new(&anchored).map_err(|e| ProvisionerError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?,
            )
        };
        Ok(Self { topic, pattern })
    }

    fn matches(&self, key: &str) -> bool {
        self.topic.as_deref() == Some(key)
            || self.pattern.as_ref().is_some_and(|p| p.is_match(key))
    }
}

/// Classifies routing keys into [`RouteKind`]s.
///
/// Checked in order: incident added (regular or super), incident updated,
/// incident-org added, escalation marker.
#[derive(Debug)]
pub struct Router {
    incident_added: KeyMatcher,
    incident_added_super: KeyMatcher,
    incident_updated: KeyMatcher,
    incident_org_added: KeyMatcher,
    escalation_marker: String,
}

impl Router {
    pub fn new(config: &RoutingConfig) -> Result<Self, ProvisionerError> {
        Ok(Self {
            incident_added: KeyMatcher::new(
                &config.incident_added_topic,
                &config.incident_added_pattern,
            )?,
            incident_added_super: KeyMatcher::new(
                &config.incident_added_topic_super,
                &config.incident_added_pattern_super,
            )?,
            incident_updated: KeyMatcher::new(
                &config.incident_updated_topic,
                &config.incident_updated_pattern,
            )?,
            incident_org_added: KeyMatcher::new(
                &config.incident_org_added_topic,
                &config.incident_org_added_pattern,
            )?,
            escalation_marker: config.escalation_marker.clone(),
        })
    }

    pub fn classify(&self, routing_key: &str) -> RouteKind {
        if self.incident_added.matches(routing_key)
            || self.incident_added_super.matches(routing_key)
        {
            RouteKind::IncidentAdded
        } else if self.incident_updated.matches(routing_key) {
            RouteKind::IncidentUpdated
        } else if self.incident_org_added.matches(routing_key) {
            RouteKind::IncidentOrgAdded
        } else if !self.escalation_marker.is_empty()
            && routing_key.contains(&self.escalation_marker)
        {
            RouteKind::Escalation
        } else {
            RouteKind::Unsupported
        }
    }
}
