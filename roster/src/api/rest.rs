//! JSON-over-HTTP roster backend client
//!
//! Endpoints:
//! - `GET    {base}/teamMembers`
//! - `GET    {base}/teamMembers/{id}`
//! - `POST   {base}/teamMembers`
//! - `PUT    {base}/teamMembers/{id}/update`
//! - `DELETE {base}/teamMembers/{id}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ApiError, RosterApi};
use crate::config::ApiConfig;
use crate::domain::{MemberId, NewMember, TeamMember, UpdatePayload};

const COLLECTION: &str = "teamMembers";

/// Message used when a failed response carries no readable `error` field
const UNKNOWN_ERROR: &str = "Unknown error";

/// Pull the backend's `error` field out of a failed response body
pub(crate) fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .filter(|msg| !msg.trim().is_empty())
        .unwrap_or_else(|| UNKNOWN_ERROR.to_string())
}

pub struct RestApi {
    base_url: Url,
    http: Client,
    timeout: Duration,
}

impl RestApi {
    /// Create a new client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(?config, "from_config: called");
        let base_url = Url::parse(config.base_url.trim()).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!("{} cannot be a base URL", base_url)));
        }

        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(ApiError::Network)?;

        Ok(Self {
            base_url,
            http,
            timeout,
        })
    }

    /// Build `{base}/teamMembers[/{id}][/{suffix}]` with each segment percent-encoded
    pub(crate) fn endpoint(&self, id: Option<&MemberId>, suffix: Option<&str>) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().push(COLLECTION);
            if let Some(id) = id {
                segments.push(id.as_str());
            }
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        debug!(%url, "endpoint: built");
        Ok(url)
    }

    fn map_send_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.timeout)
        } else {
            ApiError::Network(err)
        }
    }

    /// Turn a non-success status into `ApiError::Api`, passing successes through
    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body);
        debug!(status = status.as_u16(), %message, "check_status: API error");
        Err(ApiError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(format!("{}: {}", e, truncate(&body))))
    }
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 120;
    if body.chars().count() > LIMIT {
        format!("{}...", body.chars().take(LIMIT).collect::<String>())
    } else {
        body.to_string()
    }
}

/// Interpret the body of a successful delete or update
///
/// Empty bodies and JSON that is not a member record are plain
/// acknowledgements; anything that is not JSON at all is a malformed reply.
pub(crate) fn parse_ack_body(body: &str) -> Result<Option<TeamMember>, ApiError> {
    if body.trim().is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse(format!("{}: {}", e, truncate(body))))?;
    Ok(serde_json::from_value(value).ok())
}

#[async_trait]
impl RosterApi for RestApi {
    async fn list_members(&self) -> Result<Vec<TeamMember>, ApiError> {
        debug!("list_members: called");
        let url = self.endpoint(None, None)?;
        let response = self.http.get(url).send().await.map_err(|e| self.map_send_error(e))?;
        Self::read_json(Self::check_status(response).await?).await
    }

    async fn get_member(&self, id: &MemberId) -> Result<TeamMember, ApiError> {
        debug!(%id, "get_member: called");
        let url = self.endpoint(Some(id), None)?;
        let response = self.http.get(url).send().await.map_err(|e| self.map_send_error(e))?;
        Self::read_json(Self::check_status(response).await?).await
    }

    async fn add_member(&self, member: &NewMember) -> Result<TeamMember, ApiError> {
        debug!(name = %member.name, "add_member: called");
        let url = self.endpoint(None, None)?;
        let response = self
            .http
            .post(url)
            .json(member)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Self::read_json(Self::check_status(response).await?).await
    }

    async fn update_member(&self, id: &MemberId, payload: &UpdatePayload) -> Result<Option<TeamMember>, ApiError> {
        debug!(%id, fields = ?payload.field_names(), "update_member: called");
        let url = self.endpoint(Some(id), Some("update"))?;
        let response = self
            .http
            .put(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let body = Self::check_status(response).await?.text().await?;
        parse_ack_body(&body)
    }

    async fn delete_member(&self, id: &MemberId) -> Result<Option<TeamMember>, ApiError> {
        debug!(%id, "delete_member: called");
        let url = self.endpoint(Some(id), None)?;
        let response = self.http.delete(url).send().await.map_err(|e| self.map_send_error(e))?;
        let body = Self::check_status(response).await?.text().await?;
        parse_ack_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    use crate::api::ApiOperation;
    use crate::batch::BulkCoordinator;

    fn api(base: &str) -> RestApi {
        RestApi::from_config(&ApiConfig {
            base_url: base.to_string(),
            timeout_ms: 1000,
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_paths() {
        let api = api("http://localhost:4000");
        assert_eq!(api.endpoint(None, None).unwrap().as_str(), "http://localhost:4000/teamMembers");
        assert_eq!(
            api.endpoint(Some(&MemberId::from(7)), Some("update")).unwrap().as_str(),
            "http://localhost:4000/teamMembers/7/update"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = api("https://example.com/api/");
        assert_eq!(
            api.endpoint(Some(&MemberId::from(3)), None).unwrap().as_str(),
            "https://example.com/api/teamMembers/3"
        );
    }

    #[test]
    fn test_endpoint_encodes_id() {
        let api = api("http://localhost:4000");
        let url = api.endpoint(Some(&MemberId::from("a/b c")), Some("update")).unwrap();
        assert_eq!(url.as_str(), "http://localhost:4000/teamMembers/a%2Fb%20c/update");
    }

    #[test]
    fn test_invalid_base_url() {
        let result = RestApi::from_config(&ApiConfig {
            base_url: "not a url".to_string(),
            timeout_ms: 1000,
        });
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(extract_error_message(r#"{"error": "Member not found"}"#), "Member not found");
        assert_eq!(extract_error_message(r#"{"message": "nope"}"#), "Unknown error");
        assert_eq!(extract_error_message("<html>502</html>"), "Unknown error");
        assert_eq!(extract_error_message(""), "Unknown error");
    }

    #[test]
    fn test_parse_ack_body() {
        assert_eq!(parse_ack_body("").unwrap(), None);
        assert_eq!(parse_ack_body(r#"{"success": true}"#).unwrap(), None);

        let echoed = parse_ack_body(r#"{"id": 4, "name": "Kim", "role": "QA", "bio": "Breaks things"}"#).unwrap();
        assert_eq!(echoed.map(|m| m.id), Some(MemberId::from(4)));

        assert!(matches!(parse_ack_body("OK!"), Err(ApiError::InvalidResponse(_))));
    }

    /// Read one HTTP request, headers plus a Content-Length body
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).into_owned();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Answer a single request with `status` and a JSON `body`; the handle yields the raw request
    async fn serve_once(status: &'static str, body: &'static str) -> (RestApi, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
            request
        });
        (api(&format!("http://{}", addr)), handle)
    }

    fn role_payload() -> UpdatePayload {
        UpdatePayload {
            role: Some("Lead".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_update_accepts_bare_acknowledgement() {
        let (api, server) = serve_once("200 OK", r#"{"success":true}"#).await;

        let echoed = api.update_member(&MemberId::from(1), &role_payload()).await.unwrap();
        assert!(echoed.is_none());

        let request = server.await.unwrap();
        assert!(request.starts_with("PUT /teamMembers/1/update "));
        assert!(request.contains(r#""role":"Lead""#));
    }

    #[tokio::test]
    async fn test_update_echo_is_parsed() {
        let (api, _server) = serve_once("200 OK", r#"{"id":1,"name":"Kim","role":"Lead","bio":"QA"}"#).await;

        let echoed = api.update_member(&MemberId::from(1), &role_payload()).await.unwrap();
        assert_eq!(echoed.map(|m| m.role), Some("Lead".to_string()));
    }

    #[tokio::test]
    async fn test_update_non_json_body_is_invalid() {
        let (api, _server) = serve_once("200 OK", "done").await;

        let result = api.update_member(&MemberId::from(1), &role_payload()).await;
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_batch_update_counts_acknowledged_ids_as_succeeded() {
        let (api, _server) = serve_once("200 OK", r#"{"success":true}"#).await;
        let operation = ApiOperation::update(Arc::new(api));
        let ids: BTreeSet<MemberId> = [MemberId::from(1)].into_iter().collect();
        let payload = role_payload();

        let outcome = BulkCoordinator::new().execute(&ids, &operation, Some(&payload)).await;

        assert_eq!(outcome.succeeded, ids);
        assert!(outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_uses_error_field() {
        let (api, _server) = serve_once("404 Not Found", r#"{"error":"Member not found"}"#).await;

        let err = api.delete_member(&MemberId::from(9)).await.unwrap_err();
        assert!(!err.is_retryable());
        match err {
            ApiError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Member not found");
            }
            other => panic!("Expected Api error, got {:?}", other),
        }
    }
}
