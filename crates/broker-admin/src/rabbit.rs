//! RabbitMQ management API client
//!
//! Endpoints used:
//! - `GET/PUT/DELETE /api/vhosts/{vhost}`
//! - `GET/PUT/DELETE /api/users/{user}`
//! - `PUT /api/permissions/{vhost}/{user}`
//! - `GET /api/overview` (reachability)
//!
//! Path segments are percent-encoded, so a vhost named `a/b` is addressed as
//! `a%2Fb`.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::client::{AdminClient, Permissions};
use crate::error::{AdminError, Result};

/// Tag assigned to every user the broker creates
const USER_TAGS: &str = "management";

#[derive(Debug, Serialize)]
struct VhostSettings {
    tracing: bool,
}

#[derive(Serialize)]
struct UserSettings<'a> {
    password: &'a str,
    tags: &'a str,
}

/// Administrative client backed by the RabbitMQ management plugin
#[derive(Debug, Clone)]
pub struct RabbitAdmin {
    base_url: String,
    username: String,
    password: String,
    http_client: reqwest::Client,
}

impl RabbitAdmin {
    /// Create a client for the management API at `base_url`
    /// (e.g. `http://127.0.0.1:15672`).
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdminError::Config(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            password: password.into(),
            http_client,
        })
    }

    /// Base URL of the management API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Verify the management API is reachable and accepts our credentials
    pub async fn ping(&self) -> Result<()> {
        let url = self.endpoint(&["overview"]);
        debug!(method = "GET", url = %url, "Management request");

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            warn!(status = status.as_u16(), "Management API rejected reachability check");
            Err(AdminError::UnexpectedResponse {
                resource: "overview".into(),
                status: status.as_u16(),
            })
        }
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        let path: Vec<String> = segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/api/{}", self.base_url, path.join("/"))
    }

    async fn exists(&self, resource: &str, url: String) -> Result<bool> {
        debug!(method = "GET", url = %url, "Management request");

        let response = self
            .http_client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(AdminError::UnexpectedResponse {
                resource: resource.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        resource: &str,
        url: String,
        body: Option<&B>,
    ) -> Result<()> {
        debug!(method = %method, url = %url, "Management request");

        let mut request = self
            .http_client
            .request(method, &url)
            .basic_auth(&self.username, Some(&self.password));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        check_response(response.status(), resource)
    }
}

/// Map a mutating call's status onto the error taxonomy
fn check_response(status: StatusCode, resource: &str) -> Result<()> {
    match status {
        StatusCode::OK | StatusCode::CREATED | StatusCode::ACCEPTED | StatusCode::NO_CONTENT => {
            Ok(())
        }
        StatusCode::NOT_FOUND => Err(AdminError::NotFound(resource.to_string())),
        status => {
            warn!(resource, status = status.as_u16(), "Unexpected management API response");
            Err(AdminError::UnexpectedResponse {
                resource: resource.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl AdminClient for RabbitAdmin {
    async fn vhost_exists(&self, name: &str) -> Result<bool> {
        self.exists(&format!("vhost {}", name), self.endpoint(&["vhosts", name]))
            .await
    }

    async fn create_vhost(&self, name: &str, tracing: bool) -> Result<()> {
        let resource = format!("vhost {}", name);
        if self.vhost_exists(name).await? {
            return Err(AdminError::AlreadyExists(resource));
        }

        self.execute(
            Method::PUT,
            &resource,
            self.endpoint(&["vhosts", name]),
            Some(&VhostSettings { tracing }),
        )
        .await
    }

    async fn delete_vhost(&self, name: &str) -> Result<()> {
        self.execute::<()>(
            Method::DELETE,
            &format!("vhost {}", name),
            self.endpoint(&["vhosts", name]),
            None,
        )
        .await
    }

    async fn user_exists(&self, name: &str) -> Result<bool> {
        self.exists(&format!("user {}", name), self.endpoint(&["users", name]))
            .await
    }

    async fn create_user(&self, name: &str, password: &str) -> Result<()> {
        let resource = format!("user {}", name);
        if self.user_exists(name).await? {
            return Err(AdminError::AlreadyExists(resource));
        }

        self.execute(
            Method::PUT,
            &resource,
            self.endpoint(&["users", name]),
            Some(&UserSettings {
                password,
                tags: USER_TAGS,
            }),
        )
        .await
    }

    async fn delete_user(&self, name: &str) -> Result<()> {
        self.execute::<()>(
            Method::DELETE,
            &format!("user {}", name),
            self.endpoint(&["users", name]),
            None,
        )
        .await
    }

    async fn grant_all_permissions(&self, username: &str, vhost: &str) -> Result<()> {
        self.execute(
            Method::PUT,
            &format!("permissions of {} on {}", username, vhost),
            self.endpoint(&["permissions", vhost, username]),
            Some(&Permissions::unrestricted()),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // base64("guest:guest")
    const GUEST_AUTH: &str = "Basic Z3Vlc3Q6Z3Vlc3Q=";

    fn admin_for(server: &MockServer) -> RabbitAdmin {
        RabbitAdmin::new(server.uri(), "guest", "guest", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_create_vhost_checks_existence_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/vhosts/abc"))
            .and(header("authorization", GUEST_AUTH))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/vhosts/abc"))
            .and(body_json(serde_json::json!({ "tracing": false })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        admin_for(&server).create_vhost("abc", false).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_existing_vhost_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/vhosts/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "name": "abc" })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let result = admin_for(&server).create_vhost("abc", false).await;
        assert!(matches!(result, Err(AdminError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_create_user_is_tagged_management() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/m-abc"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/users/m-abc"))
            .and(body_json(serde_json::json!({ "password": "s3cret", "tags": "management" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        admin_for(&server).create_user("m-abc", "s3cret").await.unwrap();
    }

    #[tokio::test]
    async fn test_grant_all_permissions() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/permissions/abc/m-abc"))
            .and(body_json(serde_json::json!({ "configure": ".*", "write": ".*", "read": ".*" })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        admin_for(&server)
            .grant_all_permissions("m-abc", "abc")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_user_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/users/u-gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = admin_for(&server).delete_user("u-gone").await;
        assert!(matches!(result, Err(AdminError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/vhosts/abc"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let result = admin_for(&server).delete_vhost("abc").await;
        assert_eq!(
            result,
            Err(AdminError::UnexpectedResponse {
                resource: "vhost abc".into(),
                status: 500,
            })
        );
    }

    #[tokio::test]
    async fn test_exists_rejects_unexpected_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/users/m-abc"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = admin_for(&server).user_exists("m-abc").await;
        assert!(matches!(
            result,
            Err(AdminError::UnexpectedResponse { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn test_path_segments_are_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/vhosts/team%2Fone"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        admin_for(&server).delete_vhost("team/one").await.unwrap();
    }

    #[tokio::test]
    async fn test_ping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/overview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        admin_for(&server).ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let admin = RabbitAdmin::new(
            "http://127.0.0.1:1",
            "guest",
            "guest",
            Duration::from_millis(500),
        )
        .unwrap();

        let result = admin.ping().await;
        assert!(matches!(result, Err(AdminError::Transport(_))));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let admin = RabbitAdmin::new("http://localhost:15672/", "guest", "guest", Duration::from_secs(1))
            .unwrap();
        assert_eq!(admin.base_url(), "http://localhost:15672");
        assert_eq!(
            admin.endpoint(&["permissions", "abc", "m-abc"]),
            "http://localhost:15672/api/permissions/abc/m-abc"
        );
    }
}
