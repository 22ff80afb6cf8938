pub mod config;
pub mod email;
pub mod emapi;
pub mod metrics;
pub mod orgs;
pub mod provisioner;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, EmApiConfig,
    ProvisionerConfig, RoutingConfig, SanitizedConfig, ServerConfig, SmtpConfig,
};
pub use email::{
    DispatchOutcome, DispatchReport, EmailDispatcher, EmailError, EmailKind, Mailer, SmtpMailer,
};
pub use emapi::{EmApi, EmApiClient, EmApiError};
pub use orgs::OrgCache;
pub use provisioner::{
    IncidentOrgProvisioner, ProcessOutcome, ProcessReport, ProvisionerError, RouteKind, Router,
};
