use std::time::Duration;

use anyhow::{Context, Result};
use burnsync_config::BurnsyncConfig;
use burnsync_domain::{Issue, IssueSource, IssueState, Project, StateType, SyncError};
use chrono::{DateTime, Utc};
use reqwest::{blocking::Client, header::AUTHORIZATION};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

const REQUEST_TIMEOUT_SECS: u64 = 30;

const PROJECT_ISSUES_QUERY: &str = r#"
query ProjectIssues($projectId: String!, $first: Int!, $after: String) {
  project(id: $projectId) {
    id
    name
    issues(first: $first, after: $after) {
      nodes {
        id
        identifier
        title
        state {
          name
          type
        }
        createdAt
        completedAt
      }
      pageInfo {
        hasNextPage
        endCursor
      }
    }
  }
}
"#;

/// Blocking client for the Linear GraphQL API.
pub struct LinearClient {
    endpoint: String,
    token: String,
    page_size: usize,
    http: Client,
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Deserialize)]
struct ProjectData {
    project: Option<ProjectPayload>,
}

#[derive(Deserialize)]
struct ProjectPayload {
    id: String,
    name: String,
    issues: IssueConnection,
}

#[derive(Deserialize)]
struct IssueConnection {
    #[serde(default)]
    nodes: Vec<IssuePayload>,
    #[serde(rename = "pageInfo", default)]
    page_info: PageInfo,
}

#[derive(Default, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage", default)]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
struct IssuePayload {
    id: String,
    identifier: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    state: Option<StatePayload>,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(rename = "completedAt")]
    completed_at: Option<String>,
}

#[derive(Default, Deserialize)]
struct StatePayload {
    name: Option<String>,
    #[serde(rename = "type")]
    state_type: Option<String>,
}

impl LinearClient {
    pub fn from_config(config: &BurnsyncConfig) -> Result<Self> {
        let token = config.api_token()?.to_string();
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .with_context(|| "failed to build Linear HTTP client")?;

        Ok(Self {
            endpoint: config.api_url.clone(),
            token,
            page_size: config.page_size,
            http,
        })
    }

    /// Fetches a project and every one of its issues, following pagination
    /// cursors until the last page.
    pub fn fetch_project(&self, project_id: &str) -> Result<Project> {
        let mut issues = Vec::new();
        let mut after: Option<String> = None;
        let mut identity: Option<(String, String)> = None;
        let mut pages = 0usize;

        loop {
            let page = self.fetch_issue_page(project_id, after.as_deref())?;
            pages += 1;
            identity.get_or_insert((page.id, page.name));

            let connection = page.issues;
            for node in connection.nodes {
                issues.push(into_issue(node)?);
            }

            if !connection.page_info.has_next_page {
                break;
            }
            let Some(cursor) = connection.page_info.end_cursor else {
                return Err(SyncError::upstream(format!(
                    "project {project_id} reported another page without an end cursor"
                ))
                .into());
            };
            if after.as_deref() == Some(cursor.as_str()) {
                return Err(SyncError::upstream(format!(
                    "project {project_id} returned the same cursor twice ({cursor})"
                ))
                .into());
            }
            after = Some(cursor);
        }

        let (id, name) = identity.unwrap_or_else(|| (project_id.to_string(), String::new()));
        log::debug!(
            "fetched {} issues for project {} in {} page(s)",
            issues.len(),
            project_id,
            pages
        );
        Ok(Project { id, name, issues })
    }

    fn fetch_issue_page(&self, project_id: &str, after: Option<&str>) -> Result<ProjectPayload> {
        let data: ProjectData = self.query(
            PROJECT_ISSUES_QUERY,
            json!({
                "projectId": project_id,
                "first": self.page_size,
                "after": after,
            }),
        )?;

        data.project.ok_or_else(|| {
            SyncError::upstream(format!("project {project_id} not found in Linear")).into()
        })
    }

    fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response = self
            .http
            .post(&self.endpoint)
            .header(AUTHORIZATION, &self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .map_err(|error| SyncError::upstream(format!("Linear request failed: {error}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|error| SyncError::upstream(format!("failed to read Linear response: {error}")))?;

        let envelope = match serde_json::from_str::<Envelope>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(SyncError::upstream(format!(
                    "Linear request failed: status={status} body={body}"
                ))
                .into());
            }
            Err(error) => {
                return Err(SyncError::upstream(format!(
                    "failed to decode Linear response: {error}"
                ))
                .into());
            }
        };

        if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
            return Err(SyncError::upstream(format!("Linear API error: {}", Value::Array(errors))).into());
        }
        if !status.is_success() {
            return Err(SyncError::upstream(format!(
                "Linear request failed: status={status} body={body}"
            ))
            .into());
        }

        let data = envelope
            .data
            .ok_or_else(|| SyncError::upstream("Linear response contained no data"))?;
        serde_json::from_value(data).map_err(|error| {
            SyncError::upstream(format!("unexpected Linear response shape: {error}")).into()
        })
    }
}

impl IssueSource for LinearClient {
    fn fetch_project(&self, project_id: &str) -> Result<Project> {
        LinearClient::fetch_project(self, project_id)
    }
}

fn into_issue(payload: IssuePayload) -> Result<Issue> {
    let created_at = parse_timestamp(&payload.identifier, "createdAt", &payload.created_at)?;
    let completed_at = match payload.completed_at.and_then(non_empty) {
        Some(value) => Some(parse_timestamp(&payload.identifier, "completedAt", &value)?),
        None => None,
    };
    let state = payload.state.unwrap_or_default();

    Ok(Issue {
        id: payload.id,
        identifier: payload.identifier,
        title: payload.title.unwrap_or_default(),
        state: IssueState {
            name: state
                .name
                .and_then(non_empty)
                .unwrap_or_else(|| "Unknown".to_string()),
            state_type: state
                .state_type
                .as_deref()
                .map_or(StateType::Unknown, StateType::parse),
        },
        created_at,
        completed_at,
    })
}

fn parse_timestamp(identifier: &str, field: &str, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|timestamp| timestamp.with_timezone(&Utc))
        .map_err(|error| {
            SyncError::upstream(format!(
                "issue {identifier} has malformed {field} '{value}': {error}"
            ))
            .into()
        })
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}
