//! Data model for issues as exposed by the Linear GraphQL API.

use serde::{Deserialize, Serialize};

/// An issue node with the fields our queries select.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    /// Human-facing identifier, e.g. "ENG-142".
    pub identifier: String,
    pub title: String,
    pub description: Option<String>,
    pub state: Option<WorkflowState>,
    pub assignee: Option<UserRef>,
    pub creator: Option<UserRef>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub url: Option<String>,
    /// 0 = urgent .. 4 = none, as Linear encodes it.
    pub priority: Option<f64>,
    pub labels: Option<LabelConnection>,
}

/// Workflow state (e.g. "In Progress" / "started").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    pub name: String,
    #[serde(rename = "type")]
    pub state_type: Option<String>,
}

/// Minimal reference to a workspace user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// GraphQL connection wrapper for labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConnection {
    #[serde(default)]
    pub nodes: Vec<Label>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
}

/// A team in the workspace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub key: String,
    pub name: String,
}

/// A comment created on an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueComment {
    pub id: String,
    pub body: String,
    pub created_at: Option<String>,
    pub user: Option<UserRef>,
}

/// Fields accepted when creating an issue.
#[derive(Debug, Clone, Default)]
pub struct NewIssue {
    pub team_id: String,
    pub title: String,
    pub description: Option<String>,
    pub assignee_id: Option<String>,
    pub state_id: Option<String>,
    /// 0 = urgent .. 4 = none.
    pub priority: Option<u8>,
    pub label_ids: Option<Vec<String>>,
}

/// Filters accepted when searching issues.
#[derive(Debug, Clone, Default)]
pub struct IssueQuery {
    /// Case-insensitive substring match on the title.
    pub query: Option<String>,
    pub team_id: Option<String>,
    /// Workflow state name, exact match.
    pub state: Option<String>,
    pub assignee_id: Option<String>,
    pub limit: usize,
}
