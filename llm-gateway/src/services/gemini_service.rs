//! Google Gemini chat service with tool calling.
//!
//! Minimal, non-streaming client around the `generateContent` REST API. The
//! endpoint is derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1beta/models/{model}:generateContent
//!
//! Authentication uses the `x-goog-api-key` header so the key never appears
//! in URLs or logs.
//!
//! Transcript mapping differs from OpenAI in three ways:
//! - system messages become the request's `systemInstruction`
//! - assistant tool requests become `functionCall` parts on a `model` turn
//! - tool results become `functionResponse` parts on a `user` turn
//!
//! Gemini does not assign call ids, so ids of the form `fc-{index}` are
//! synthesized per response to keep the transcript correlated.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    chat::{ChatMessage, ChatOutcome, ChatRole, ToolCallRequest, ToolSpec},
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        HttpError, LlmGatewayError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
};

/// Thin client for the Gemini `generateContent` API.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`LlmGatewayError::Provider`] with `InvalidProvider` if `cfg.provider` is not Gemini
    /// - [`LlmGatewayError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`LlmGatewayError::Provider`] with `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`LlmGatewayError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, LlmGatewayError> {
        // 1) Provider must be Gemini.
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        // 2) API key must be present.
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::Gemini, ProviderErrorKind::MissingApiKey)
        })?;

        // 3) Endpoint must use http/https.
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        // 4) HTTP client: timeout + default headers.
        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            header::HeaderValue::from_str(&api_key).map_err(|e| {
                ProviderError::new(
                    Provider::Gemini,
                    ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
                )
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_generate = format!("{}/v1beta/models/{}:generateContent", base, cfg.model);

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = cfg.timeout_secs.unwrap_or(60),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            url_generate,
        })
    }

    /// Performs a **non-streaming** `generateContent` call over a full
    /// transcript, optionally exposing tools.
    ///
    /// # Errors
    /// - [`LlmGatewayError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`LlmGatewayError::Timeout`] when the request exceeds the configured timeout
    /// - [`LlmGatewayError::HttpTransport`] for other client/network failures
    /// - [`LlmGatewayError::Provider`] with `Decode` if the JSON cannot be parsed
    /// - [`LlmGatewayError::Provider`] with `EmptyChoices` if no candidates are returned
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolSpec],
    ) -> Result<ChatOutcome, LlmGatewayError> {
        let started = Instant::now();
        let body = GenerateContentRequest::build(&self.cfg, messages, tools);

        debug!(
            model = %self.cfg.model,
            messages = messages.len(),
            tools = tools.len(),
            "POST {}", self.url_generate
        );

        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmGatewayError::Timeout(self.request_timeout())
                } else {
                    LlmGatewayError::from(e)
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_generate.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "Gemini generateContent returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url,
                    snippet,
                }),
            )
            .into());
        }

        let out: GenerateContentResponse = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                error!(
                    error = %e,
                    model = %self.cfg.model,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode generateContent response"
                );
                return Err(ProviderError::new(
                    Provider::Gemini,
                    ProviderErrorKind::Decode(format!(
                        "serde error: {e}; expected `candidates[0].content.parts`"
                    )),
                )
                .into());
            }
        };

        let parts = out
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .ok_or_else(|| {
                ProviderError::new(Provider::Gemini, ProviderErrorKind::EmptyChoices)
            })?;

        let mut text = String::new();
        let mut calls = Vec::new();
        for part in parts {
            if let Some(t) = part.text {
                text.push_str(&t);
            }
            if let Some(fc) = part.function_call {
                let arguments = if fc.args.is_object() {
                    fc.args.to_string()
                } else {
                    "{}".to_string()
                };
                calls.push(ToolCallRequest {
                    id: format!("fc-{}", calls.len()),
                    name: fc.name,
                    arguments,
                });
            }
        }

        info!(
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            tool_calls = calls.len(),
            "generateContent completed"
        );

        if !calls.is_empty() {
            return Ok(ChatOutcome::ToolCalls(calls));
        }
        Ok(ChatOutcome::Text(text))
    }

    fn request_timeout(&self) -> Duration {
        self.cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60))
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<WireTools>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    fn build(cfg: &LlmModelConfig, messages: &[ChatMessage], tools: &[ToolSpec]) -> Self {
        let mut system_text = String::new();
        let mut contents: Vec<Content> = Vec::new();

        for m in messages {
            match m.role {
                ChatRole::System => {
                    if !system_text.is_empty() {
                        system_text.push('\n');
                    }
                    system_text.push_str(m.content.as_deref().unwrap_or_default());
                }
                ChatRole::User => contents.push(Content {
                    role: Some("user"),
                    parts: vec![Part::text(m.content.clone().unwrap_or_default())],
                }),
                ChatRole::Assistant => {
                    let parts = match &m.tool_calls {
                        Some(calls) => calls
                            .iter()
                            .map(|c| Part::function_call(&c.name, &c.arguments))
                            .collect(),
                        None => vec![Part::text(m.content.clone().unwrap_or_default())],
                    };
                    contents.push(Content {
                        role: Some("model"),
                        parts,
                    });
                }
                ChatRole::Tool => contents.push(Content {
                    role: Some("user"),
                    parts: vec![Part::function_response(
                        m.name.as_deref().unwrap_or_default(),
                        m.content.as_deref().unwrap_or_default(),
                    )],
                }),
            }
        }

        let system_instruction = if system_text.is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: vec![Part::text(system_text)],
            })
        };

        let wire_tools = if tools.is_empty() {
            None
        } else {
            Some(vec![WireTools {
                function_declarations: tools
                    .iter()
                    .map(|t| FunctionDeclaration {
                        name: t.name,
                        description: t.description,
                        parameters: t.parameters.clone(),
                    })
                    .collect(),
            }])
        };

        let generation_config = Some(GenerationConfig {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            max_output_tokens: cfg.max_tokens,
        });

        Self {
            system_instruction,
            contents,
            tools: wire_tools,
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCallPart>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponsePart>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            function_call: None,
            function_response: None,
        }
    }

    fn function_call(name: &str, arguments: &str) -> Self {
        // Arguments are stored as a JSON string; Gemini wants an object.
        let args: Value = serde_json::from_str(arguments).unwrap_or(Value::Object(Default::default()));
        if args.as_object().is_none() {
            warn!(name, "non-object tool arguments in transcript, sending empty args");
        }
        Self {
            text: None,
            function_call: Some(FunctionCallPart {
                name: name.to_string(),
                args: if args.is_object() {
                    args
                } else {
                    Value::Object(Default::default())
                },
            }),
            function_response: None,
        }
    }

    fn function_response(name: &str, content: &str) -> Self {
        Self {
            text: None,
            function_call: None,
            function_response: Some(FunctionResponsePart {
                name: name.to_string(),
                response: serde_json::json!({ "result": content }),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
struct FunctionCallPart {
    name: String,
    args: Value,
}

#[derive(Debug, Serialize)]
struct FunctionResponsePart {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireTools {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: &'static str,
    description: &'static str,
    parameters: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

/// Minimal response for `generateContent`.
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentOut>,
}

#[derive(Debug, Deserialize)]
struct ContentOut {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartOut {
    text: Option<String>,
    function_call: Option<FunctionCallOut>,
}

#[derive(Debug, Deserialize)]
struct FunctionCallOut {
    name: String,
    #[serde(default)]
    args: Value,
}
