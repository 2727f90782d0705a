//! Thin GraphQL client for the Linear API.
//!
//! One POST endpoint, query strings embedded as constants, variables passed
//! as JSON. Filter objects for searches are built as `serde_json::Value`
//! instead of string interpolation so user input never lands inside the
//! query text itself.

use std::time::Duration;

use reqwest::Client;
use serde_json::{Value, json};
use tracing::debug;

use crate::errors::{IssueTrackerError, IssueTrackerResult};
use crate::types::{Issue, IssueComment, IssueQuery, NewIssue, Team};

/// Default Linear GraphQL endpoint.
pub const LINEAR_API_URL: &str = "https://api.linear.app/graphql";

const ISSUE_FIELDS: &str = r#"
    id
    identifier
    title
    description
    state { name type }
    assignee { name email }
    creator { name email }
    createdAt
    updatedAt
    url
    priority
    labels { nodes { id name } }
"#;

/// Client for the Linear GraphQL API.
#[derive(Debug, Clone)]
pub struct LinearClient {
    http: Client,
    api_url: String,
    auth_header: String,
}

impl LinearClient {
    /// Constructs a client from an API key.
    ///
    /// # Errors
    /// [`IssueTrackerError::MissingApiKey`] when the key is empty.
    pub fn new(api_key: &str, api_url: Option<String>) -> IssueTrackerResult<Self> {
        if api_key.trim().is_empty() {
            return Err(IssueTrackerError::MissingApiKey);
        }
        // Linear expects a Bearer token; tolerate keys already prefixed.
        let auth_header = if api_key.starts_with("Bearer ") {
            api_key.to_string()
        } else {
            format!("Bearer {api_key}")
        };
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            api_url: api_url.unwrap_or_else(|| LINEAR_API_URL.to_string()),
            auth_header,
        })
    }

    /// Executes one GraphQL request and returns the `data` payload.
    ///
    /// # Errors
    /// [`IssueTrackerError::Api`] when the response carries an `errors`
    /// array, plus the usual transport/status failures.
    async fn execute(&self, query: &str, variables: Option<Value>) -> IssueTrackerResult<Value> {
        let mut payload = json!({ "query": query });
        if let Some(vars) = variables {
            payload["variables"] = vars;
        }

        debug!(url = %self.api_url, "executing GraphQL request");
        let resp: Value = self
            .http
            .post(&self.api_url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(errors) = resp.get("errors").and_then(Value::as_array) {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(Value::as_str))
                .collect();
            return Err(IssueTrackerError::Api(messages.join(", ")));
        }

        Ok(resp.get("data").cloned().unwrap_or(Value::Null))
    }

    /// Lists all teams in the workspace.
    pub async fn get_teams(&self) -> IssueTrackerResult<Vec<Team>> {
        let query = "query { teams { nodes { id key name } } }";
        let data = self.execute(query, None).await?;
        let nodes = data
            .pointer("/teams/nodes")
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(nodes)?)
    }

    /// Fetches one issue by id; `Ok(None)` when it does not exist.
    pub async fn get_issue(&self, issue_id: &str) -> IssueTrackerResult<Option<Issue>> {
        let query = format!("query GetIssue($id: String!) {{ issue(id: $id) {{ {ISSUE_FIELDS} }} }}");
        let data = self.execute(&query, Some(json!({ "id": issue_id }))).await?;
        match data.get("issue") {
            Some(Value::Null) | None => Ok(None),
            Some(issue) => Ok(Some(serde_json::from_value(issue.clone())?)),
        }
    }

    /// Searches issues with the given filters.
    pub async fn search_issues(&self, q: &IssueQuery) -> IssueTrackerResult<Vec<Issue>> {
        let mut filter = serde_json::Map::new();
        if let Some(team_id) = &q.team_id {
            filter.insert("team".into(), json!({ "id": { "eq": team_id } }));
        }
        if let Some(state) = &q.state {
            filter.insert("state".into(), json!({ "name": { "eq": state } }));
        }
        if let Some(assignee_id) = &q.assignee_id {
            filter.insert("assignee".into(), json!({ "id": { "eq": assignee_id } }));
        }
        if let Some(text) = &q.query {
            filter.insert("title".into(), json!({ "containsIgnoreCase": text }));
        }

        let query = format!(
            "query SearchIssues($filter: IssueFilter, $first: Int!) {{ \
               issues(filter: $filter, first: $first) {{ nodes {{ {ISSUE_FIELDS} }} }} }}"
        );
        let variables = json!({
            "filter": Value::Object(filter),
            "first": q.limit.max(1),
        });

        let data = self.execute(&query, Some(variables)).await?;
        let nodes = data
            .pointer("/issues/nodes")
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));
        Ok(serde_json::from_value(nodes)?)
    }

    /// Creates a new issue.
    ///
    /// # Errors
    /// [`IssueTrackerError::MutationFailed`] when the API reports
    /// `success: false`.
    pub async fn create_issue(&self, new: &NewIssue) -> IssueTrackerResult<Issue> {
        let mutation = format!(
            "mutation CreateIssue($input: IssueCreateInput!) {{ \
               issueCreate(input: $input) {{ success issue {{ {ISSUE_FIELDS} }} }} }}"
        );

        let mut input = serde_json::Map::new();
        input.insert("teamId".into(), json!(new.team_id));
        input.insert("title".into(), json!(new.title));
        if let Some(v) = &new.description {
            input.insert("description".into(), json!(v));
        }
        if let Some(v) = &new.assignee_id {
            input.insert("assigneeId".into(), json!(v));
        }
        if let Some(v) = &new.state_id {
            input.insert("stateId".into(), json!(v));
        }
        if let Some(v) = new.priority {
            input.insert("priority".into(), json!(v));
        }
        if let Some(v) = &new.label_ids {
            input.insert("labelIds".into(), json!(v));
        }

        let data = self
            .execute(&mutation, Some(json!({ "input": Value::Object(input) })))
            .await?;

        let success = data
            .pointer("/issueCreate/success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !success {
            return Err(IssueTrackerError::MutationFailed("issueCreate"));
        }

        let issue = data
            .pointer("/issueCreate/issue")
            .cloned()
            .ok_or(IssueTrackerError::MutationFailed("issueCreate"))?;
        Ok(serde_json::from_value(issue)?)
    }

    /// Updates fields on an existing issue.
    pub async fn update_issue(
        &self,
        issue_id: &str,
        title: Option<&str>,
        description: Option<&str>,
        state_id: Option<&str>,
        assignee_id: Option<&str>,
        priority: Option<u8>,
    ) -> IssueTrackerResult<Issue> {
        let mutation = format!(
            "mutation UpdateIssue($id: String!, $input: IssueUpdateInput!) {{ \
               issueUpdate(id: $id, input: $input) {{ success issue {{ {ISSUE_FIELDS} }} }} }}"
        );

        let mut input = serde_json::Map::new();
        if let Some(v) = title {
            input.insert("title".into(), json!(v));
        }
        if let Some(v) = description {
            input.insert("description".into(), json!(v));
        }
        if let Some(v) = state_id {
            input.insert("stateId".into(), json!(v));
        }
        if let Some(v) = assignee_id {
            input.insert("assigneeId".into(), json!(v));
        }
        if let Some(v) = priority {
            input.insert("priority".into(), json!(v));
        }

        let data = self
            .execute(
                &mutation,
                Some(json!({ "id": issue_id, "input": Value::Object(input) })),
            )
            .await?;

        let success = data
            .pointer("/issueUpdate/success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !success {
            return Err(IssueTrackerError::MutationFailed("issueUpdate"));
        }

        let issue = data
            .pointer("/issueUpdate/issue")
            .cloned()
            .ok_or(IssueTrackerError::MutationFailed("issueUpdate"))?;
        Ok(serde_json::from_value(issue)?)
    }

    /// Adds a comment to an issue.
    pub async fn add_comment(&self, issue_id: &str, body: &str) -> IssueTrackerResult<IssueComment> {
        let mutation = "mutation CreateComment($issueId: String!, $body: String!) { \
               commentCreate(input: { issueId: $issueId, body: $body }) { \
                 success comment { id body createdAt user { name email } } } }";

        let data = self
            .execute(mutation, Some(json!({ "issueId": issue_id, "body": body })))
            .await?;

        let success = data
            .pointer("/commentCreate/success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if !success {
            return Err(IssueTrackerError::MutationFailed("commentCreate"));
        }

        let comment = data
            .pointer("/commentCreate/comment")
            .cloned()
            .ok_or(IssueTrackerError::MutationFailed("commentCreate"))?;
        Ok(serde_json::from_value(comment)?)
    }
}
