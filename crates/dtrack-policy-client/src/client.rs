use std::time::Duration;

use async_trait::async_trait;
use dtrack_policy_core::{
    ApplyError, ConditionSpec, Policy, PolicyAccessor, PolicyCondition, Project,
};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Page size used for every paginated listing.
pub const PAGE_SIZE: usize = 100;

const TOTAL_COUNT_HEADER: &str = "X-Total-Count";
const API_KEY_HEADER: &str = "X-Api-Key";

/// Dependency-Track REST API v1 client.
pub struct DtrackClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl DtrackClient {
    /// Builds a client whose requests each time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `ApplyError::InvalidConfig` if `base_url` is not an absolute
    /// http(s) URL, and `ApplyError::Transport` if the HTTP client cannot be
    /// constructed.
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, ApplyError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApplyError::invalid_config(format!("base URL {base_url:?}: {e}")))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(ApplyError::invalid_config(format!(
                "base URL {base_url} must be an http(s) URL"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApplyError::transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url,
            api_key: api_key.to_string(),
        })
    }

    /// `{base}/api/v1/{segments...}`, each segment percent-encoded.
    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        debug!(%method, %url, "dependency-track request");
        self.http
            .request(method, url)
            .header(API_KEY_HEADER, &self.api_key)
            .header("Accept", "application/json")
    }

    /// Fetches every page of a listing endpoint.
    async fn get_all<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
        kind: &'static str,
        key: &str,
    ) -> Result<Vec<T>, ApplyError> {
        let mut items = Vec::new();
        let page_size = PAGE_SIZE.to_string();
        for page in 1.. {
            let page_number = page.to_string();
            let resp = self
                .request(Method::GET, self.api_url(segments))
                .query(query)
                .query(&[("pageNumber", &page_number), ("pageSize", &page_size)])
                .send()
                .await
                .map_err(transport)?;
            let resp = check_status(resp, kind, key).await?;
            let total = total_count(&resp);
            let batch: Vec<T> = resp.json().await.map_err(transport)?;
            let fetched = batch.len();
            items.extend(batch);

            let done = match total {
                Some(total) => items.len() >= total,
                None => fetched < PAGE_SIZE,
            };
            if done || fetched == 0 {
                break;
            }
        }
        Ok(items)
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
        kind: &'static str,
        key: &str,
    ) -> Result<T, ApplyError> {
        let resp = req.send().await.map_err(transport)?;
        let resp = check_status(resp, kind, key).await?;
        resp.json().await.map_err(transport)
    }

    async fn send_empty(
        &self,
        req: RequestBuilder,
        kind: &'static str,
        key: &str,
    ) -> Result<(), ApplyError> {
        let resp = req.send().await.map_err(transport)?;
        check_status(resp, kind, key).await.map(|_| ())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NewPolicy<'a> {
    name: &'a str,
}

#[async_trait]
impl PolicyAccessor for DtrackClient {
    async fn policy_by_name(&self, name: &str) -> Result<Policy, ApplyError> {
        let policies: Vec<Policy> = self.get_all(&["policy"], &[], "policy", name).await?;
        policies
            .into_iter()
            .find(|p| p.name == name)
            .ok_or_else(|| ApplyError::not_found("policy", name))
    }

    async fn create_policy(&self, name: &str) -> Result<Policy, ApplyError> {
        let req = self
            .request(Method::PUT, self.api_url(&["policy"]))
            .json(&NewPolicy { name });
        self.send_json(req, "policy", name).await
    }

    async fn update_policy(&self, policy: &Policy) -> Result<Policy, ApplyError> {
        let req = self
            .request(Method::POST, self.api_url(&["policy"]))
            .json(policy);
        self.send_json(req, "policy", &policy.name).await
    }

    async fn attach_tag(&self, policy: Uuid, tag: &str) -> Result<(), ApplyError> {
        let policy = policy.to_string();
        let url = self.api_url(&["policy", &policy, "tag", tag]);
        self.send_empty(self.request(Method::POST, url), "tag", tag)
            .await
    }

    async fn detach_tag(&self, policy: Uuid, tag: &str) -> Result<(), ApplyError> {
        let policy = policy.to_string();
        let url = self.api_url(&["policy", &policy, "tag", tag]);
        self.send_empty(self.request(Method::DELETE, url), "tag", tag)
            .await
    }

    async fn project_by_name_version(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Project, ApplyError> {
        let req = self
            .request(Method::GET, self.api_url(&["project", "lookup"]))
            .query(&[("name", name), ("version", version)]);
        self.send_json(req, "project", &format!("{name}:{version}"))
            .await
    }

    async fn projects_by_name(&self, name: &str) -> Result<Vec<Project>, ApplyError> {
        let query = [
            ("name", name),
            ("excludeInactive", "true"),
            ("onlyRoot", "true"),
        ];
        let projects: Vec<Project> = self.get_all(&["project"], &query, "project", name).await?;
        Ok(projects.into_iter().filter(|p| p.name == name).collect())
    }

    async fn attach_project(&self, policy: Uuid, project: Uuid) -> Result<(), ApplyError> {
        let (policy, project) = (policy.to_string(), project.to_string());
        let url = self.api_url(&["policy", &policy, "project", &project]);
        self.send_empty(self.request(Method::POST, url), "project", &project)
            .await
    }

    async fn detach_project(&self, policy: Uuid, project: Uuid) -> Result<(), ApplyError> {
        let (policy, project) = (policy.to_string(), project.to_string());
        let url = self.api_url(&["policy", &policy, "project", &project]);
        self.send_empty(self.request(Method::DELETE, url), "project", &project)
            .await
    }

    async fn create_condition(
        &self,
        policy: Uuid,
        condition: &ConditionSpec,
    ) -> Result<PolicyCondition, ApplyError> {
        let policy = policy.to_string();
        let req = self
            .request(Method::PUT, self.api_url(&["policy", &policy, "condition"]))
            .json(condition);
        self.send_json(req, "policy", &policy).await
    }

    async fn delete_condition(&self, condition: Uuid) -> Result<(), ApplyError> {
        let condition = condition.to_string();
        let url = self.api_url(&["policy", "condition", &condition]);
        self.send_empty(self.request(Method::DELETE, url), "condition", &condition)
            .await
    }
}

fn transport(e: reqwest::Error) -> ApplyError {
    if e.is_timeout() {
        ApplyError::transport(format!("request timed out: {e}"))
    } else {
        ApplyError::transport(e.to_string())
    }
}

fn total_count(resp: &Response) -> Option<usize> {
    resp.headers()
        .get(TOTAL_COUNT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Maps 404 to `NotFound` and any other non-2xx, non-304 status to a service
/// error carrying the response body. Dependency-Track answers 304 when an
/// association already exists or is already gone.
async fn check_status(
    resp: Response,
    kind: &'static str,
    key: &str,
) -> Result<Response, ApplyError> {
    let status = resp.status();
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(ApplyError::not_found(kind, key));
    }
    let body = resp.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_string()
    } else {
        body
    };
    Err(ApplyError::service(status.as_u16(), message))
}
