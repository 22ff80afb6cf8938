//! reqwest implementation of the em-api client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{header::ACCEPT, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::EmApiConfig;
use crate::metrics;

use super::{
    CollabRoom, CountResponse, EmApi, EmApiError, EnabledUsersResponse, IncidentOrg,
    IncidentOrgsResponse, NewIncidentOrg, Organization, OrganizationsResponse, SessionUser, User,
    UserOrg, UserOrgsResponse, UsersResponse,
};

/// em-api client sharing one pooled HTTP client across calls.
pub struct EmApiClient {
    client: Client,
    base_url: String,
    identity_header: String,
    identity_user: String,
}

impl EmApiClient {
    /// Create a new client from configuration.
    pub fn new(config: &EmApiConfig) -> Result<Self, EmApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmApiError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            identity_header: config.identity_header.clone(),
            identity_user: config.identity_user.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the identity header and JSON accept header.
    fn prepare(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(self.identity_header.as_str(), self.identity_user.as_str())
            .header(ACCEPT, "application/json")
    }

    /// Send a request and decode a JSON body, recording metrics under `endpoint`.
    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> Result<T, EmApiError> {
        let start = Instant::now();
        let result = self.execute_inner(request).await;

        metrics::EMAPI_REQUEST_DURATION
            .with_label_values(&[endpoint])
            .observe(start.elapsed().as_secs_f64());
        let label = if result.is_ok() { "success" } else { "error" };
        metrics::EMAPI_REQUESTS
            .with_label_values(&[endpoint, label])
            .inc();

        if let Err(e) = &result {
            debug!(endpoint = endpoint, error = %e, "em-api request failed");
        }
        result
    }

    async fn execute_inner<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, EmApiError> {
        let response = self.prepare(request).send().await.map_err(|e| {
            if e.is_timeout() {
                EmApiError::Timeout
            } else {
                EmApiError::ConnectionFailed(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmApiError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| EmApiError::InvalidResponse(e.to_string()))?;
        // Empty bodies decode as JSON null
        let body = if body.trim().is_empty() { "null" } else { &body };
        serde_json::from_str(body).map_err(|e| EmApiError::InvalidResponse(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
    ) -> Result<T, EmApiError> {
        self.execute(endpoint, self.client.get(self.url(path)))
            .await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        path: &str,
        query: &[(&str, i64)],
        body: &B,
    ) -> Result<T, EmApiError> {
        let request = self.client.post(self.url(path)).query(query).json(body);
        self.execute(endpoint, request).await
    }
}

#[async_trait]
impl EmApi for EmApiClient {
    async fn get_user_orgs(
        &self,
        workspace_id: i64,
        username: &str,
    ) -> Result<Vec<UserOrg>, EmApiError> {
        let request = self
            .client
            .get(self.url(&format!("/users/{}/userOrgs", workspace_id)))
            .query(&[("userName", username)]);
        let response: UserOrgsResponse = self.execute("user_orgs", request).await?;
        Ok(response.user_orgs)
    }

    async fn get_user_with_session(
        &self,
        workspace_id: i64,
        userorg_id: i64,
    ) -> Result<SessionUser, EmApiError> {
        let path = format!("/users/{}/userWithSession/userorg/{}", workspace_id, userorg_id);
        let response: UsersResponse = self.get("user_with_session", &path).await?;

        let user = response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| EmApiError::NotFound(format!("user for userorg {}", userorg_id)))?;
        let session = user.currentusersessions.first().ok_or_else(|| {
            EmApiError::NotFound(format!("current session for user {}", user.user_id))
        })?;

        Ok(SessionUser {
            user_id: user.user_id,
            usersession_id: session.usersessionid,
        })
    }

    async fn get_all_orgs(&self, workspace_id: i64) -> Result<Vec<Organization>, EmApiError> {
        let path = format!("/orgs/{}/all", workspace_id);
        let response: OrganizationsResponse = self.get("all_orgs", &path).await?;
        Ok(response.organizations)
    }

    async fn get_org(&self, workspace_id: i64, org_id: i64) -> Result<Organization, EmApiError> {
        let path = format!("/orgs/{}/org/id/{}", workspace_id, org_id);
        let response: OrganizationsResponse = self.get("org", &path).await?;
        response
            .organizations
            .into_iter()
            .next()
            .ok_or_else(|| EmApiError::NotFound(format!("org {}", org_id)))
    }

    async fn get_orgs_registered_for_incident(
        &self,
        workspace_id: i64,
        incident_id: i64,
    ) -> Result<Vec<Organization>, EmApiError> {
        let path = format!("/orgs/{}/incidenttype/{}/org", workspace_id, incident_id);
        let response: OrganizationsResponse = self.get("registered_orgs", &path).await?;
        Ok(response.organizations)
    }

    async fn get_incident_orgs(
        &self,
        workspace_id: i64,
        incident_id: i64,
    ) -> Result<Vec<IncidentOrg>, EmApiError> {
        let path = format!("/incidents/{}/orgs/{}", workspace_id, incident_id);
        let response: IncidentOrgsResponse = self.get("incident_orgs", &path).await?;
        Ok(response.incident_orgs)
    }

    async fn add_incident_orgs(
        &self,
        workspace_id: i64,
        incident_id: i64,
        orgs: &[NewIncidentOrg],
    ) -> Result<i64, EmApiError> {
        let path = format!("/incidents/{}/orgs/{}", workspace_id, incident_id);
        let response: CountResponse = self.post("add_incident_orgs", &path, &[], orgs).await?;
        Ok(response.count)
    }

    async fn get_user_by_session(
        &self,
        workspace_id: i64,
        usersession_id: i64,
    ) -> Result<User, EmApiError> {
        let current = format!("/users/{}/usersessionId/{}", workspace_id, usersession_id);
        let response: UsersResponse = match self.get("user_by_session", &current).await {
            Ok(response) => response,
            Err(e) => {
                // Sessions that already ended only resolve through the past-session lookup
                warn!(
                    usersession_id = usersession_id,
                    error = %e,
                    "Current session lookup failed, trying past sessions"
                );
                let past = format!(
                    "/users/{}/pastUsersessionId/{}",
                    workspace_id, usersession_id
                );
                self.get("user_by_past_session", &past).await?
            }
        };

        response
            .users
            .into_iter()
            .next()
            .ok_or_else(|| EmApiError::NotFound(format!("user for session {}", usersession_id)))
    }

    async fn get_enabled_user_ids(
        &self,
        workspace_id: i64,
        org_id: i64,
    ) -> Result<Vec<i64>, EmApiError> {
        let path = format!("/users/{}/enabled/{}", workspace_id, org_id);
        let response: EnabledUsersResponse = self.get("enabled_users", &path).await?;
        Ok(response.data.into_iter().map(|u| u.userid).collect())
    }

    async fn post_rooms_batch(
        &self,
        workspace_id: i64,
        incident_id: i64,
        userorg_id: i64,
        rooms: &[CollabRoom],
    ) -> Result<(), EmApiError> {
        let path = format!("/collabroom/{}/batch", incident_id);
        let query = [("userOrgId", userorg_id), ("workspaceId", workspace_id)];
        let _: serde_json::Value = self.post("rooms_batch", &path, &query, rooms).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> EmApiClient {
        EmApiClient::new(&EmApiConfig {
            url: format!("{}/em-api/v1/", server.uri()),
            identity_header: "CUSTOM-uid".to_string(),
            identity_user: "processor@example.org".to_string(),
            identity_org_id: 3,
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_requests_carry_identity_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/em-api/v1/orgs/1/all"))
            .and(header("CUSTOM-uid", "processor@example.org"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "organizations": [
                    {"orgId": 1, "name": "State", "prefix": "ST"},
                    {"orgId": 2, "name": "County", "prefix": "", "parentorgid": 1}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let orgs = client_for(&server).get_all_orgs(1).await.unwrap();
        assert_eq!(orgs.len(), 2);
        assert_eq!(orgs[1].parent_id(), Some(1));
        assert_eq!(orgs[1].label(), "County");
    }

    #[tokio::test]
    async fn test_get_user_orgs_sends_username() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/em-api/v1/users/1/userOrgs"))
            .and(query_param("userName", "processor@example.org"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "userOrgs": [{"orgid": 3, "userorgid": 44}, {"orgid": 5, "userorgid": 45}],
                "userId": 12
            })))
            .mount(&server)
            .await;

        let user_orgs = client_for(&server)
            .get_user_orgs(1, "processor@example.org")
            .await
            .unwrap();
        assert_eq!(user_orgs.len(), 2);
        assert_eq!(user_orgs[0].userorgid, 44);
    }

    #[tokio::test]
    async fn test_get_user_with_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/em-api/v1/users/1/userWithSession/userorg/44"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{"userId": 12, "currentusersessions": [{"usersessionid": 900}]}]
            })))
            .mount(&server)
            .await;

        let user = client_for(&server).get_user_with_session(1, 44).await.unwrap();
        assert_eq!(
            user,
            SessionUser {
                user_id: 12,
                usersession_id: 900
            }
        );
    }

    #[tokio::test]
    async fn test_get_user_with_session_without_session_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/em-api/v1/users/1/userWithSession/userorg/44"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "users": [{"userId": 12, "currentusersessions": []}]
            })))
            .mount(&server)
            .await;

        let result = client_for(&server).get_user_with_session(1, 44).await;
        assert!(matches!(result, Err(EmApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_non_success_status_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/em-api/v1/orgs/1/incidenttype/10/org"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = client_for(&server)
            .get_orgs_registered_for_incident(1, 10)
            .await;
        match result {
            Err(EmApiError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_user_by_session_falls_back_to_past_sessions() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/em-api/v1/users/1/usersessionId/25"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/em-api/v1/users/1/pastUsersessionId/25"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"users": [{"userId": 7}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let user = client_for(&server).get_user_by_session(1, 25).await.unwrap();
        assert_eq!(user.user_id, 7);
    }

    #[tokio::test]
    async fn test_add_incident_orgs_posts_body() {
        let server = MockServer::start().await;
        let orgs = vec![NewIncidentOrg {
            orgid: 4,
            incidentid: 10,
            userid: 7,
            created: 1_700_000_000,
        }];
        Mock::given(method("POST"))
            .and(path("/em-api/v1/incidents/1/orgs/10"))
            .and(body_json(json!([
                {"orgid": 4, "incidentid": 10, "userid": 7, "created": 1_700_000_000}
            ])))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let count = client_for(&server)
            .add_incident_orgs(1, 10, &orgs)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_post_rooms_batch_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/em-api/v1/collabroom/10/batch"))
            .and(query_param("userOrgId", "44"))
            .and(query_param("workspaceId", "1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let rooms = vec![CollabRoom {
            incidentid: 10,
            usersessionid: 900,
            name: "Working Map (FD)".to_string(),
            admin_users: None,
            read_write_users: None,
        }];
        client_for(&server)
            .post_rooms_batch(1, 10, 44, &rooms)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_enabled_user_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/em-api/v1/users/1/enabled/4"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"userid": 5}, {"userid": 6}]
            })))
            .mount(&server)
            .await;

        let ids = client_for(&server).get_enabled_user_ids(1, 4).await.unwrap();
        assert_eq!(ids, vec![5, 6]);
    }

    #[tokio::test]
    async fn test_get_org_empty_list_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/em-api/v1/orgs/1/org/id/99"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"organizations": []})))
            .mount(&server)
            .await;

        let result = client_for(&server).get_org(1, 99).await;
        assert!(matches!(result, Err(EmApiError::NotFound(_))));
    }
}
