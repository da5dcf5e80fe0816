use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{RecordService, ServiceError, WireRecord};
use crate::catalog::{StudentId, TeachingSession};
use crate::roster::RosterEntry;
use crate::scope::{RecordValue, ScopeKey};

/// Bearer token for the school API. Login and refresh happen outside
/// this process; the sidecar only carries the token it was given.
#[derive(Debug, Clone)]
pub struct AuthSession {
    token: String,
}

impl AuthSession {
    pub fn new(token: impl Into<String>) -> AuthSession {
        AuthSession {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

/// `RecordService` over the school's HTTP API. One shared client, all
/// requests bearer-authenticated, bodies in camelCase JSON.
pub struct HttpRecordService {
    client: Client,
    base_url: String,
    auth: AuthSession,
}

impl HttpRecordService {
    pub fn new(
        base_url: impl Into<String>,
        auth: AuthSession,
        timeout: Duration,
    ) -> Result<HttpRecordService, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(HttpRecordService {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ServiceError> {
        debug!(path, "record store GET");
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .bearer_auth(self.auth.token())
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        expect_success(resp)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

async fn expect_success(resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl RecordService for HttpRecordService {
    async fn fetch_sessions(&self) -> Result<Vec<TeachingSession>, ServiceError> {
        self.get_json("/teacher/sessions", &[]).await
    }

    async fn fetch_roster(&self, scope: ScopeKey) -> Result<Vec<RosterEntry>, ServiceError> {
        let query = [
            ("classId", scope.class_id.0.to_string()),
            ("subjectId", scope.subject_id.0.to_string()),
            ("kind", scope.kind().as_str().to_string()),
            ("period", scope.period.as_wire()),
        ];
        self.get_json("/teacher/roster", &query).await
    }

    async fn upsert_record(
        &self,
        student: StudentId,
        scope: ScopeKey,
        value: RecordValue,
    ) -> Result<(), ServiceError> {
        let body = WireRecord::from_parts(student, scope, value);
        debug!(student = %student, "record store POST");
        let resp = self
            .client
            .post(self.url("/teacher/records"))
            .bearer_auth(self.auth.token())
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        expect_success(resp).await?;
        Ok(())
    }
}
