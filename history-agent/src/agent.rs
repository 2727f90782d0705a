//! Tool-calling orchestrator: drives the model loop over one question.
//!
//! The loop is strictly turn-by-turn: model call, tool dispatch, model call,
//! until the model answers in plain text or the turn budget runs out. Tool
//! calls within one turn are dispatched sequentially; each result is
//! correlated back to its originating call id before the next model turn.
//!
//! Failure split: repository/range errors and model errors abort the request;
//! issue-tracker and PR failures only shrink the context the model sees.

use std::path::Path;

use git_block_engine::{
    BlockRef, GitBlockError, GitHubClient, GitHubConfig, GitWorkspace, HistoryOptions,
    build_history_context,
};
use issue_tracker::{IssueQuery, LinearClient, NewIssue};
use llm_gateway::{ChatClient, ChatMessage, ChatOutcome, ChatRole, ToolCallRequest, config_from_env};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::cache::{ContextCache, cache_key};
use crate::config::AgentConfig;
use crate::errors::{AgentError, AgentResult};
use crate::prompt::{SYSTEM_PROMPT, block_description, render_common_prefix};
use crate::sessions::ConversationMemory;
use crate::tools::{
    CodeContextArgs, CreateIssueArgs, HistoryContextArgs, IssuesForBlockArgs, SearchIssuesArgs,
    ToolName, decode_args, tool_menu,
};

/// Cache discriminator for the full rendered prefix.
const CONTEXT_KIND_FULL: &str = "full_context";

#[derive(Debug)]
enum ModelBackend {
    Live(ChatClient),
    #[cfg(test)]
    Scripted(std::sync::Mutex<std::collections::VecDeque<ChatOutcome>>),
}

/// Answers questions about a code block using git history and tools.
#[derive(Debug)]
pub struct HistoryAgent {
    llm: ModelBackend,
    git: GitWorkspace,
    prs: Option<GitHubClient>,
    issues: Option<LinearClient>,
    cache: ContextCache,
    memory: ConversationMemory,
    cfg: AgentConfig,
}

impl HistoryAgent {
    /// Assembles an agent from explicit collaborators.
    pub fn new(
        llm: ChatClient,
        git: GitWorkspace,
        prs: Option<GitHubClient>,
        issues: Option<LinearClient>,
        cfg: AgentConfig,
    ) -> Self {
        let cache = ContextCache::new(cfg.cache_ttl, cfg.cache_enabled);
        let memory = ConversationMemory::new(cfg.session_ttl, cfg.session_max_count);
        Self {
            llm: ModelBackend::Live(llm),
            git,
            prs,
            issues,
            cache,
            memory,
            cfg,
        }
    }

    /// Wires the full agent from environment variables.
    ///
    /// The PR client is always constructed (`GITHUB_API_KEY` optionally raises
    /// its rate limits); the issue tracker is enabled only when
    /// `LINEAR_API_KEY` is present.
    ///
    /// # Errors
    /// [`AgentError::Config`] or [`AgentError::Llm`] on invalid startup
    /// configuration.
    pub fn from_env() -> AgentResult<Self> {
        let cfg = AgentConfig::from_env()?;
        let llm = ChatClient::from_config(config_from_env()?)?;
        let git = GitWorkspace::new(&cfg.repos_root);

        let mut gh = GitHubConfig::default();
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            if !url.trim().is_empty() {
                gh.base_api = url;
            }
        }
        gh.token = std::env::var("GITHUB_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let prs = Some(
            GitHubClient::from_config(gh)
                .map_err(|e| AgentError::Config(format!("github client: {e}")))?,
        );

        let issues = match std::env::var("LINEAR_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Some(
                LinearClient::new(&key, None)
                    .map_err(|e| AgentError::Config(format!("issue tracker client: {e}")))?,
            ),
            _ => None,
        };

        Ok(Self::new(llm, git, prs, issues, cfg))
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    /// Answers one question about a block, returning the answer text and the
    /// session id the exchange was recorded under.
    ///
    /// # Errors
    /// - [`AgentError::Git`] when the block reference is invalid or code
    ///   fetch fails outside best-effort paths
    /// - [`AgentError::Llm`] when a model call fails
    /// - [`AgentError::UnknownTool`] when the model requests an unlisted tool
    /// - [`AgentError::TurnBudgetExhausted`] when the model never answers
    pub async fn answer_question(
        &self,
        block_ref: &BlockRef,
        question: &str,
        session_id: Option<&str>,
    ) -> AgentResult<(String, String)> {
        if !block_ref.is_well_formed() {
            return Err(GitBlockError::InvalidRange {
                start: block_ref.start_line,
                end: block_ref.end_line,
                total: 0,
            }
            .into());
        }

        let session = self.memory.get_or_create(session_id);
        if let Some(prev) = self.memory.last_block(&session) {
            if prev != *block_ref {
                debug!(session = %session, path = %block_ref.path, "session moved to a different block");
            }
        }
        let menu = tool_menu(self.issues.is_some());

        let mut messages = vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(block_description(block_ref)),
        ];
        for turn in self.memory.recent_turns(&session, self.cfg.memory_turns) {
            messages.push(match turn.role {
                ChatRole::Assistant => ChatMessage::assistant(turn.content),
                _ => ChatMessage::user(turn.content),
            });
        }
        messages.push(ChatMessage::user(question));

        for turn in 0..self.cfg.max_turns {
            let outcome = self.complete(&messages, &menu).await?;
            match outcome {
                ChatOutcome::Text(answer) => {
                    info!(turns = turn + 1, session = %session, "question answered");
                    self.memory
                        .record(&session, ChatRole::User, question, Some(block_ref));
                    self.memory
                        .record(&session, ChatRole::Assistant, &answer, None);
                    return Ok((answer, session));
                }
                ChatOutcome::ToolCalls(calls) => {
                    debug!(count = calls.len(), turn, "dispatching tool calls");
                    messages.push(ChatMessage::assistant_tool_calls(calls.clone()));
                    for call in calls {
                        let result = self.dispatch_tool(block_ref, &call).await?;
                        messages.push(ChatMessage::tool_result(&call.id, &call.name, result));
                    }
                }
            }
        }

        Err(AgentError::TurnBudgetExhausted(self.cfg.max_turns))
    }

    /// Single-shot answering over the precomputed, cache-friendly prefix.
    ///
    /// The rendered code+history prefix is reused across questions about the
    /// same block, so providers with implicit prefix caching see identical
    /// leading bytes. No tools are offered on this path.
    pub async fn answer_with_prefix_cache(
        &self,
        block_ref: &BlockRef,
        question: &str,
    ) -> AgentResult<String> {
        let prefix = self.cached_prefix(block_ref).await?;
        let messages = vec![ChatMessage::system(prefix), ChatMessage::user(question)];
        match self.complete(&messages, &[]).await? {
            ChatOutcome::Text(answer) => Ok(answer),
            // No tools were offered, so treat a tool request as no answer.
            ChatOutcome::ToolCalls(_) => Ok(String::new()),
        }
    }

    /// Returns the rendered prefix for a block, building it on a cache miss.
    async fn cached_prefix(&self, block_ref: &BlockRef) -> AgentResult<String> {
        let key = cache_key(block_ref, CONTEXT_KIND_FULL);
        if let Some(hit) = self.cache.get(&key) {
            debug!(path = %block_ref.path, "context prefix cache hit");
            return Ok(hit);
        }

        let code = self
            .git
            .get_code_context(block_ref, self.cfg.context_lines)
            .await?;
        let history = build_history_context(
            &self.git,
            self.prs.as_ref(),
            block_ref,
            &self.history_options(None),
        )
        .await;

        let text = render_common_prefix(SYSTEM_PROMPT, &code, &history);
        let label = format!(
            "{}/{} {}:{}-{}",
            block_ref.repo_owner,
            block_ref.repo_name,
            block_ref.path,
            block_ref.start_line,
            block_ref.end_line
        );
        self.cache.insert(&key, &label, text.clone());
        Ok(text)
    }

    fn history_options(&self, max_commits: Option<usize>) -> HistoryOptions {
        HistoryOptions {
            max_commits: max_commits.unwrap_or(self.cfg.max_commits),
            include_prs: self.prs.is_some(),
            max_prs: self.cfg.max_prs,
            ..HistoryOptions::default()
        }
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[llm_gateway::ToolSpec],
    ) -> AgentResult<ChatOutcome> {
        match &self.llm {
            ModelBackend::Live(client) => Ok(client.complete(messages, tools).await?),
            #[cfg(test)]
            ModelBackend::Scripted(script) => {
                let mut turns = script.lock().unwrap();
                Ok(turns.pop_front().expect("scripted model ran out of turns"))
            }
        }
    }

    /// Routes one tool call to its collaborator and serializes the result.
    ///
    /// # Errors
    /// [`AgentError::UnknownTool`] for a name outside the menu;
    /// [`AgentError::Git`] when a code fetch fails. Issue-tracker failures
    /// are folded into the serialized result instead.
    async fn dispatch_tool(
        &self,
        block_ref: &BlockRef,
        call: &ToolCallRequest,
    ) -> AgentResult<String> {
        let tool = ToolName::parse(&call.name)
            .ok_or_else(|| AgentError::UnknownTool(call.name.clone()))?;
        debug!(tool = tool.as_str(), call_id = %call.id, "dispatching tool");

        match tool {
            ToolName::GetCodeContext => {
                let args: CodeContextArgs = decode_args(&call.arguments);
                let lines = args.context_lines.unwrap_or(self.cfg.context_lines);
                let ctx = self.git.get_code_context(block_ref, lines).await?;
                Ok(serde_json::to_string(&ctx)?)
            }
            ToolName::GetHistoryContext => {
                let args: HistoryContextArgs = decode_args(&call.arguments);
                let history = build_history_context(
                    &self.git,
                    self.prs.as_ref(),
                    block_ref,
                    &self.history_options(args.max_commits),
                )
                .await;
                Ok(serde_json::to_string(&history)?)
            }
            ToolName::GetIssuesForBlock => {
                let args: IssuesForBlockArgs = decode_args(&call.arguments);
                let query = IssueQuery {
                    query: Some(file_name(&block_ref.path).to_string()),
                    team_id: args.team_id,
                    state: None,
                    assignee_id: None,
                    limit: args.limit.unwrap_or(10),
                };
                self.search_issues_best_effort(query).await
            }
            ToolName::SearchIssues => {
                let args: SearchIssuesArgs = decode_args(&call.arguments);
                let query = IssueQuery {
                    query: args.query,
                    team_id: args.team_id,
                    state: args.state,
                    assignee_id: None,
                    limit: args.limit.unwrap_or(10),
                };
                self.search_issues_best_effort(query).await
            }
            ToolName::CreateIssue => {
                let args: CreateIssueArgs = decode_args(&call.arguments);
                self.create_issue_best_effort(block_ref, args).await
            }
        }
    }

    /// Issue search that never fails the request: errors become an empty
    /// result with an error note the model can read.
    async fn search_issues_best_effort(&self, query: IssueQuery) -> AgentResult<String> {
        let Some(client) = &self.issues else {
            return Ok(json!({ "issues": [], "error": "issue tracker not configured" }).to_string());
        };
        match client.search_issues(&query).await {
            Ok(issues) => Ok(serde_json::to_string(&json!({ "issues": issues }))?),
            Err(e) => {
                warn!(error = %e, "issue search failed, returning empty result");
                Ok(json!({ "issues": [], "error": e.to_string() }).to_string())
            }
        }
    }

    async fn create_issue_best_effort(
        &self,
        block_ref: &BlockRef,
        args: CreateIssueArgs,
    ) -> AgentResult<String> {
        let Some(client) = &self.issues else {
            return Ok(json!({ "error": "issue tracker not configured" }).to_string());
        };
        let (Some(team_id), Some(title)) = (args.team_id, args.title) else {
            return Ok(json!({ "error": "team_id and title are required" }).to_string());
        };

        let description = ensure_related_block_footer(
            args.description.as_deref().unwrap_or_default(),
            block_ref,
        );
        let new = NewIssue {
            team_id,
            title,
            description: Some(description),
            assignee_id: args.assignee_id,
            state_id: args.state_id,
            priority: args.priority,
            label_ids: args.label_ids,
        };
        match client.create_issue(&new).await {
            Ok(issue) => {
                info!(identifier = %issue.identifier, "issue created");
                Ok(serde_json::to_string(&json!({ "issue": issue }))?)
            }
            Err(e) => {
                warn!(error = %e, "issue creation failed");
                Ok(json!({ "error": e.to_string() }).to_string())
            }
        }
    }
}

/// Appends the block reference footer to an issue description, exactly once.
fn ensure_related_block_footer(description: &str, block_ref: &BlockRef) -> String {
    let footer = related_block_footer(block_ref);
    if description.contains(&footer) {
        return description.to_string();
    }
    if description.is_empty() {
        footer
    } else {
        format!("{description}\n\n{footer}")
    }
}

fn related_block_footer(block_ref: &BlockRef) -> String {
    format!(
        "---\nRelated Code Block: {}/{} `{}` lines {}-{} (ref `{}`)",
        block_ref.repo_owner,
        block_ref.repo_name,
        block_ref.path,
        block_ref.start_line,
        block_ref.end_line,
        block_ref.git_ref,
    )
}

fn file_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::process::Command;
    use std::sync::Mutex;

    fn block() -> BlockRef {
        BlockRef {
            repo_owner: "acme".into(),
            repo_name: "widgets".into(),
            git_ref: "main".into(),
            path: "a.py".into(),
            start_line: 10,
            end_line: 12,
        }
    }

    fn scripted_agent(outcomes: Vec<ChatOutcome>, max_turns: usize) -> HistoryAgent {
        scripted_agent_at(Path::new("/nonexistent-repos-root"), outcomes, max_turns)
    }

    fn scripted_agent_at(
        repos_root: &Path,
        outcomes: Vec<ChatOutcome>,
        max_turns: usize,
    ) -> HistoryAgent {
        let cfg = AgentConfig {
            max_turns,
            ..AgentConfig::default()
        };
        HistoryAgent {
            llm: ModelBackend::Scripted(Mutex::new(VecDeque::from(outcomes))),
            git: GitWorkspace::new(repos_root),
            prs: None,
            issues: None,
            cache: ContextCache::new(cfg.cache_ttl, cfg.cache_enabled),
            memory: ConversationMemory::new(cfg.session_ttl, cfg.session_max_count),
            cfg,
        }
    }

    fn git(repo: &Path, args: &[&str]) {
        let status = Command::new("git")
            .arg("-c")
            .arg("user.name=Test")
            .arg("-c")
            .arg("user.email=test@example.com")
            .args(args)
            .current_dir(repo)
            .status()
            .expect("git binary available");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Creates `{root}/widgets` with `a.py` (30 lines) committed on `main`.
    fn seed_repo(root: &Path) {
        let repo = root.join("widgets");
        std::fs::create_dir_all(&repo).unwrap();
        git(&repo, &["init", "-q"]);
        git(&repo, &["checkout", "-q", "-B", "main"]);

        let body: String = (1..=30).map(|i| format!("line {i}\n")).collect();
        std::fs::write(repo.join("a.py"), body).unwrap();
        git(&repo, &["add", "a.py"]);
        git(&repo, &["commit", "-q", "-m", "add a.py"]);
    }

    fn tool_call(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: "call-1".into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }

    #[tokio::test]
    async fn one_tool_round_then_text_terminates() {
        // History degrades gracefully on the missing repo, so the dispatch
        // round succeeds with an empty payload.
        let agent = scripted_agent(
            vec![
                ChatOutcome::ToolCalls(vec![tool_call("get_history_context", "{}")]),
                ChatOutcome::Text("changed in abc123".into()),
            ],
            8,
        );

        let (answer, session) = agent
            .answer_question(&block(), "why was this changed?", None)
            .await
            .unwrap();
        assert_eq!(answer, "changed in abc123");
        assert_eq!(agent.memory.recent_turns(&session, 10).len(), 2);
    }

    #[tokio::test]
    async fn unknown_tool_is_fatal() {
        let agent = scripted_agent(
            vec![ChatOutcome::ToolCalls(vec![tool_call("drop_table", "{}")])],
            8,
        );

        let err = agent
            .answer_question(&block(), "anything", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::UnknownTool(name) if name == "drop_table"));
    }

    #[tokio::test]
    async fn turn_budget_is_enforced() {
        let agent = scripted_agent(
            vec![
                ChatOutcome::ToolCalls(vec![tool_call("get_history_context", "{}")]),
                ChatOutcome::ToolCalls(vec![tool_call("get_history_context", "{}")]),
            ],
            2,
        );

        let err = agent
            .answer_question(&block(), "anything", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::TurnBudgetExhausted(2)));
    }

    #[tokio::test]
    async fn malformed_range_is_rejected_up_front() {
        let mut bad = block();
        bad.start_line = 20;
        bad.end_line = 10;
        let agent = scripted_agent(vec![], 8);

        let err = agent.answer_question(&bad, "anything", None).await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Git(GitBlockError::InvalidRange { start: 20, end: 10, .. })
        ));
    }

    #[tokio::test]
    async fn issue_tools_degrade_without_tracker() {
        let agent = scripted_agent(
            vec![
                ChatOutcome::ToolCalls(vec![tool_call("search_issues", r#"{"query":"cache"}"#)]),
                ChatOutcome::Text("no issues found".into()),
            ],
            8,
        );

        let (answer, _) = agent
            .answer_question(&block(), "any open issues?", None)
            .await
            .unwrap();
        assert_eq!(answer, "no issues found");
    }

    #[tokio::test]
    async fn follow_up_folds_prior_turns_into_the_transcript() {
        let agent = scripted_agent(
            vec![
                ChatOutcome::Text("first answer".into()),
                ChatOutcome::Text("second answer".into()),
            ],
            8,
        );

        let (_, session) = agent.answer_question(&block(), "q1", None).await.unwrap();
        let (answer, reused) = agent
            .answer_question(&block(), "q2", Some(&session))
            .await
            .unwrap();
        assert_eq!(answer, "second answer");
        assert_eq!(reused, session);
        assert_eq!(agent.memory.recent_turns(&session, 10).len(), 4);
        assert_eq!(agent.memory.last_block(&session), Some(block()));
    }

    #[tokio::test]
    async fn prefix_is_rendered_once_per_block() {
        let tmp = tempfile::tempdir().unwrap();
        seed_repo(tmp.path());
        let agent = scripted_agent_at(
            tmp.path(),
            vec![
                ChatOutcome::Text("first answer".into()),
                ChatOutcome::Text("second answer".into()),
            ],
            8,
        );

        let first = agent
            .answer_with_prefix_cache(&block(), "who wrote this?")
            .await
            .unwrap();
        assert_eq!(first, "first answer");
        assert_eq!(agent.cache.active_len(), 1);
        assert_eq!(
            agent.cache.active_labels(),
            vec!["acme/widgets a.py:10-12".to_string()]
        );

        // Remove the checkout: a follow-up about the same block can only
        // succeed off the cached prefix, not a fresh blame/commit pass.
        std::fs::remove_dir_all(tmp.path().join("widgets")).unwrap();
        let second = agent
            .answer_with_prefix_cache(&block(), "when was it last touched?")
            .await
            .unwrap();
        assert_eq!(second, "second answer");
    }

    #[test]
    fn footer_is_appended_exactly_once() {
        let b = block();
        let first = ensure_related_block_footer("Flaky cache expiry", &b);
        assert!(first.contains("Related Code Block: acme/widgets `a.py` lines 10-12"));

        let second = ensure_related_block_footer(&first, &b);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_description_gets_bare_footer() {
        let text = ensure_related_block_footer("", &block());
        assert!(text.starts_with("---\nRelated Code Block:"));
    }
}
