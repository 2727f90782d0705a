//! Fixed tool menu exposed to the model and typed argument decoding.
//!
//! Tool names are a closed enum so the menu and the dispatch site cannot
//! drift apart silently: an unlisted name fails parsing and the orchestrator
//! treats that as fatal. Malformed argument JSON is the opposite case and is
//! tolerated; every argument struct decodes `{}` into defaults.

use serde::Deserialize;
use serde_json::json;

use llm_gateway::ToolSpec;

/// Every tool the orchestrator can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    GetCodeContext,
    GetHistoryContext,
    GetIssuesForBlock,
    SearchIssues,
    CreateIssue,
}

impl ToolName {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "get_code_context" => Some(Self::GetCodeContext),
            "get_history_context" => Some(Self::GetHistoryContext),
            "get_issues_for_block" => Some(Self::GetIssuesForBlock),
            "search_issues" => Some(Self::SearchIssues),
            "create_issue" => Some(Self::CreateIssue),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GetCodeContext => "get_code_context",
            Self::GetHistoryContext => "get_history_context",
            Self::GetIssuesForBlock => "get_issues_for_block",
            Self::SearchIssues => "search_issues",
            Self::CreateIssue => "create_issue",
        }
    }
}

/// Arguments for `get_code_context`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CodeContextArgs {
    pub context_lines: Option<u32>,
}

/// Arguments for `get_history_context`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistoryContextArgs {
    pub max_commits: Option<usize>,
}

/// Arguments for `get_issues_for_block`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct IssuesForBlockArgs {
    pub team_id: Option<String>,
    pub limit: Option<usize>,
}

/// Arguments for `search_issues`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchIssuesArgs {
    pub query: Option<String>,
    pub team_id: Option<String>,
    pub state: Option<String>,
    pub limit: Option<usize>,
}

/// Arguments for `create_issue`. Required fields are still `Option` here so
/// malformed JSON decodes; the dispatcher reports missing fields back to the
/// model instead of failing the request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateIssueArgs {
    pub team_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<String>,
    pub state_id: Option<String>,
    pub priority: Option<u8>,
    pub label_ids: Option<Vec<String>>,
}

/// Decodes tool arguments, treating malformed JSON as an empty argument set.
pub fn decode_args<T: Default + for<'de> Deserialize<'de>>(raw: &str) -> T {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Builds the tool menu presented to the model on every turn.
///
/// Issue-tracker tools are only listed when that integration is configured.
pub fn tool_menu(include_issue_tools: bool) -> Vec<ToolSpec> {
    let mut menu = vec![
        ToolSpec {
            name: "get_code_context",
            description: "Fetch the code block plus surrounding lines at the block's ref, with \
the inferred language.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "context_lines": {
                        "type": "integer",
                        "description": "Lines of context on each side of the block."
                    }
                }
            }),
        },
        ToolSpec {
            name: "get_history_context",
            description: "Fetch git blame, deduplicated commit history and related pull request \
discussions for the code block.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "max_commits": {
                        "type": "integer",
                        "description": "Maximum commits to include."
                    }
                }
            }),
        },
    ];

    if include_issue_tools {
        menu.push(ToolSpec {
            name: "get_issues_for_block",
            description: "List tracker issues that mention the block's file path.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "team_id": { "type": "string" },
                    "limit": { "type": "integer" }
                }
            }),
        });
        menu.push(ToolSpec {
            name: "search_issues",
            description: "Search tracker issues by text, team, or workflow state.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "team_id": { "type": "string" },
                    "state": { "type": "string" },
                    "limit": { "type": "integer" }
                }
            }),
        });
        menu.push(ToolSpec {
            name: "create_issue",
            description: "Create a tracker issue. A reference to the code block under discussion \
is appended to the description automatically.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "team_id": { "type": "string" },
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "assignee_id": { "type": "string" },
                    "state_id": { "type": "string" },
                    "priority": { "type": "integer" },
                    "label_ids": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["team_id", "title"]
            }),
        });
    }

    menu
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_menu_entry_parses_back() {
        for spec in tool_menu(true) {
            assert!(ToolName::parse(spec.name).is_some(), "unparseable: {}", spec.name);
        }
    }

    #[test]
    fn issue_tools_are_gated() {
        let names: Vec<&str> = tool_menu(false).iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["get_code_context", "get_history_context"]);
        assert_eq!(tool_menu(true).len(), 5);
    }

    #[test]
    fn malformed_arguments_decode_to_defaults() {
        let args: CodeContextArgs = decode_args("not json at all");
        assert_eq!(args.context_lines, None);

        let args: SearchIssuesArgs = decode_args(r#"{"query": "cache", "limit": 3}"#);
        assert_eq!(args.query.as_deref(), Some("cache"));
        assert_eq!(args.limit, Some(3));
    }

    #[test]
    fn unknown_names_do_not_parse() {
        assert_eq!(ToolName::parse("drop_table"), None);
        assert_eq!(ToolName::parse("get_code_context"), Some(ToolName::GetCodeContext));
    }
}
