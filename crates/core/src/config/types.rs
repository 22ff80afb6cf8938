use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Outbound mail settings. The email dispatcher is disabled when absent.
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    /// Collaboration room provisioning. Disabled when absent.
    #[serde(default)]
    pub provisioner: Option<ProvisionerConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8085
}

/// SMTP transport configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Upgrade the connection with STARTTLS.
    #[serde(default)]
    pub starttls: bool,
    /// Connect with implicit TLS (SMTPS). Ignored when `starttls` is set.
    #[serde(default)]
    pub ssl: bool,
    /// Authenticate with `username` / `password`.
    #[serde(default)]
    pub auth: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Connection and command timeout in seconds (default: 10)
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

fn default_smtp_port() -> u16 {
    25
}

fn default_smtp_timeout() -> u64 {
    10
}

/// Collaboration room provisioning configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProvisionerConfig {
    /// Rooms configuration document, as JSON:
    /// `{"rooms": [{"roomName": "Working Map", "isSecure": false}], "template": "%s (%s)"}`
    pub rooms: String,
    /// Create rooms for every org associated with the incident, not only the
    /// orgs registered for its incident type(s).
    #[serde(default)]
    pub create_rooms_regardless_of_registration: bool,
    /// Workspace used for start-up lookups (identity user, org list).
    #[serde(default = "default_bootstrap_workspace")]
    pub bootstrap_workspace_id: i64,
    pub emapi: EmApiConfig,
    #[serde(default)]
    pub routing: RoutingConfig,
}

fn default_bootstrap_workspace() -> i64 {
    1
}

/// em-api REST client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmApiConfig {
    /// Base URL (e.g., "http://localhost:8080/em-api/v1")
    pub url: String,
    /// Header naming the acting user on every request
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    /// Username of the service account rooms are created with
    pub identity_user: String,
    /// Org the identity user is a super user in
    pub identity_org_id: i64,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_identity_header() -> String {
    "CUSTOM-uid".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Routing keys and patterns used to classify incident notifications.
///
/// Topics are compared for equality, patterns must match the whole key.
/// Empty values never match.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutingConfig {
    #[serde(default)]
    pub incident_added_topic: String,
    #[serde(default)]
    pub incident_added_pattern: String,
    #[serde(default)]
    pub incident_added_topic_super: String,
    #[serde(default)]
    pub incident_added_pattern_super: String,
    #[serde(default)]
    pub incident_updated_topic: String,
    #[serde(default)]
    pub incident_updated_pattern: String,
    #[serde(default)]
    pub incident_org_added_topic: String,
    #[serde(default)]
    pub incident_org_added_pattern: String,
    /// Substring identifying escalation notifications
    #[serde(default = "default_escalation_marker")]
    pub escalation_marker: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            incident_added_topic: String::new(),
            incident_added_pattern: String::new(),
            incident_added_topic_super: String::new(),
            incident_added_pattern_super: String::new(),
            incident_updated_topic: String::new(),
            incident_updated_pattern: String::new(),
            incident_org_added_topic: String::new(),
            incident_org_added_pattern: String::new(),
            escalation_marker: default_escalation_marker(),
        }
    }
}

fn default_escalation_marker() -> String {
    "incidentEscalation".to_string()
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp: Option<SanitizedSmtpConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioner: Option<SanitizedProvisionerConfig>,
}

/// Sanitized SMTP config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSmtpConfig {
    pub host: String,
    pub port: u16,
    pub starttls: bool,
    pub ssl: bool,
    pub auth: bool,
    pub password_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvisionerConfig {
    pub emapi_url: String,
    pub identity_user: String,
    pub identity_org_id: i64,
    pub create_rooms_regardless_of_registration: bool,
    pub routing: RoutingConfig,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            smtp: config.smtp.as_ref().map(|s| SanitizedSmtpConfig {
                host: s.host.clone(),
                port: s.port,
                starttls: s.starttls,
                ssl: s.ssl,
                auth: s.auth,
                password_configured: s.password.as_deref().is_some_and(|p| !p.is_empty()),
            }),
            provisioner: config
                .provisioner
                .as_ref()
                .map(|p| SanitizedProvisionerConfig {
                    emapi_url: p.emapi.url.clone(),
                    identity_user: p.emapi.identity_user.clone(),
                    identity_org_id: p.emapi.identity_org_id,
                    create_rooms_regardless_of_registration: p
                        .create_rooms_regardless_of_registration,
                    routing: p.routing.clone(),
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[server]
host = "127.0.0.1"
port = 9000

[smtp]
host = "smtp.example.org"
port = 587
starttls = true
auth = true
username = "mailer"
password = "hunter2"

[provisioner]
rooms = '{"rooms": [{"roomName": "Command", "isSecure": true}]}'
create_rooms_regardless_of_registration = true

[provisioner.emapi]
url = "http://localhost:8080/em-api/v1"
identity_user = "processor@example.org"
identity_org_id = 3

[provisioner.routing]
incident_added_pattern = 'iweb\.NICS\.ws\.\d+\.newIncident'
incident_org_added_topic = "iweb.NICS.incidentorg.added"
"#;

    #[test]
    fn test_deserialize_full_config() {
        let config: Config = toml::from_str(FULL).unwrap();
        assert_eq!(config.server.port, 9000);

        let smtp = config.smtp.as_ref().unwrap();
        assert_eq!(smtp.port, 587);
        assert!(smtp.starttls);
        assert!(!smtp.ssl);
        assert_eq!(smtp.timeout_secs, 10);

        let provisioner = config.provisioner.as_ref().unwrap();
        assert!(provisioner.create_rooms_regardless_of_registration);
        assert_eq!(provisioner.bootstrap_workspace_id, 1);
        assert_eq!(provisioner.emapi.timeout_secs, 30);
        assert_eq!(
            provisioner.routing.incident_org_added_topic,
            "iweb.NICS.incidentorg.added"
        );
        assert_eq!(provisioner.routing.escalation_marker, "incidentEscalation");
        assert!(provisioner.routing.incident_updated_topic.is_empty());
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8085);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.smtp.is_none());
        assert!(config.provisioner.is_none());
    }

    #[test]
    fn test_smtp_requires_host() {
        let result: Result<Config, _> = toml::from_str("[smtp]\nport = 25\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let config: Config = toml::from_str(FULL).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        let smtp = sanitized.smtp.as_ref().unwrap();
        assert!(smtp.password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
        assert!(json.contains("processor@example.org"));
    }

    #[test]
    fn test_sanitized_config_without_sections() {
        let config: Config = toml::from_str("").unwrap();
        let sanitized = SanitizedConfig::from(&config);
        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("smtp"));
        assert!(!json.contains("provisioner"));
    }
}
