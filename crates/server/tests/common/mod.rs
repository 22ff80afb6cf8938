//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that builds the in-process router
//! with a mock em-api and a mock mailer injected, so the full ingress path
//! can be exercised without em-api or an SMTP server.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use nics_processors_core::{
    config::{EmApiConfig, ProvisionerConfig, RoutingConfig, SmtpConfig},
    testing::{MockEmApi, MockMailer},
    Config, EmApi, EmailDispatcher, IncidentOrgProvisioner, Mailer, OrgCache, ServerConfig,
};
use nics_processors_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use nics_processors_core::testing::fixtures;

pub const ROOMS: &str = r#"{"rooms": [{"roomName": "Working Map", "isSecure": false}]}"#;

/// Which processors the fixture enables.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub enable_provisioner: bool,
    pub enable_email: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enable_provisioner: true,
            enable_email: true,
        }
    }
}

/// Test fixture for API testing with mock dependencies.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock em-api - configure orgs and inspect posted batches
    pub api: Arc<MockEmApi>,
    /// Mock mailer - inspect sent messages
    pub mailer: Arc<MockMailer>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

fn provisioner_config() -> ProvisionerConfig {
    ProvisionerConfig {
        rooms: ROOMS.to_string(),
        create_rooms_regardless_of_registration: false,
        bootstrap_workspace_id: 1,
        emapi: EmApiConfig {
            url: "http://em-api.test/em-api/v1".to_string(),
            identity_header: "CUSTOM-uid".to_string(),
            identity_user: "nics-service@example.org".to_string(),
            identity_org_id: 1,
            timeout_secs: 5,
        },
        routing: RoutingConfig {
            incident_added_pattern: r"iweb\.NICS\.ws\.\d+\.newIncident".to_string(),
            incident_updated_pattern: r"iweb\.NICS\.ws\.\d+\.updateIncident".to_string(),
            ..RoutingConfig::default()
        },
    }
}

fn smtp_config() -> SmtpConfig {
    SmtpConfig {
        host: "smtp.example.org".to_string(),
        port: 25,
        starttls: false,
        ssl: false,
        auth: true,
        username: Some("mailer".to_string()),
        password: Some("hunter2".to_string()),
        timeout_secs: 10,
    }
}

impl TestFixture {
    /// Create a new test fixture with both processors enabled.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let api = Arc::new(MockEmApi::new());
        api.set_user_orgs(vec![fixtures::user_org(1, 77)]).await;
        api.set_orgs(vec![
            fixtures::org(1, "Fire Department", "FD", None),
            fixtures::org(2, "Police Department", "PD", Some(1)),
        ])
        .await;
        api.set_session_user(500, 42).await;

        let mailer = Arc::new(MockMailer::new());

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            smtp: test_config.enable_email.then(smtp_config),
            provisioner: test_config.enable_provisioner.then(provisioner_config),
        };

        let provisioner = match &config.provisioner {
            Some(provisioner_config) => Some(Arc::new(
                IncidentOrgProvisioner::bootstrap(
                    provisioner_config,
                    Arc::clone(&api) as Arc<dyn EmApi>,
                    Arc::new(OrgCache::new()),
                )
                .await
                .expect("Failed to bootstrap provisioner"),
            )),
            None => None,
        };

        let dispatcher = config.smtp.as_ref().map(|_| {
            Arc::new(EmailDispatcher::new(
                Arc::clone(&mailer) as Arc<dyn Mailer>
            ))
        });

        let state = Arc::new(AppState::new(config, provisioner, dispatcher));
        let router = create_router(state);

        Self {
            router,
            api,
            mailer,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, "application/json").await
    }

    /// Send a POST request with a raw body.
    pub async fn post_raw(&self, path: &str, body: &str, content_type: &str) -> TestResponse {
        self.request("POST", path, Some(body.to_string()), content_type)
            .await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<String>,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let text = String::from_utf8_lossy(&body_bytes).to_string();
        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body, text }
    }
}
