use std::sync::Arc;

use nics_processors_core::{Config, EmailDispatcher, IncidentOrgProvisioner, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    provisioner: Option<Arc<IncidentOrgProvisioner>>,
    dispatcher: Option<Arc<EmailDispatcher>>,
}

impl AppState {
    pub fn new(
        config: Config,
        provisioner: Option<Arc<IncidentOrgProvisioner>>,
        dispatcher: Option<Arc<EmailDispatcher>>,
    ) -> Self {
        Self {
            config,
            provisioner,
            dispatcher,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Room provisioner, if `[provisioner]` is configured.
    pub fn provisioner(&self) -> Option<&Arc<IncidentOrgProvisioner>> {
        self.provisioner.as_ref()
    }

    /// Email dispatcher, if `[smtp]` is configured.
    pub fn dispatcher(&self) -> Option<&Arc<EmailDispatcher>> {
        self.dispatcher.as_ref()
    }
}
