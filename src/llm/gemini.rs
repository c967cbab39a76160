//! Google Gemini provider implementation
//!
//! Covers both model text operations: `generateContent` for the turn
//! request and `streamGenerateContent` (SSE framing) for the incremental
//! follow-up fragments.

use super::error::ModelError;
use super::types::{ContentBlock, MessageRole, ModelRequest, ModelResponse, Usage};
use super::{ModelService, TextStream};
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

/// Gemini models
#[derive(Debug, Clone, Copy)]
pub enum GeminiModel {
    Gemini3Flash,
    Gemini3Pro,
}

impl GeminiModel {
    pub fn api_name(self) -> &'static str {
        match self {
            GeminiModel::Gemini3Flash => "gemini-3-flash-preview",
            GeminiModel::Gemini3Pro => "gemini-3-pro-preview",
        }
    }

    pub fn model_id(self) -> &'static str {
        match self {
            GeminiModel::Gemini3Flash => "gemini-3-flash",
            GeminiModel::Gemini3Pro => "gemini-3-pro",
        }
    }
}

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    base_url: String,
    model: GeminiModel,
    model_id: String,
}

impl GeminiService {
    pub fn new(api_key: String, model: GeminiModel) -> Result<Self, ModelError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| ModelError::unknown(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
            model,
            model_id: model.model_id().to_string(),
        })
    }

    fn endpoint(&self, operation: &str) -> String {
        format!(
            "{}/{}:{}?key={}",
            self.base_url,
            self.model.api_name(),
            operation,
            self.api_key
        )
    }

    fn translate_request(&self, request: &ModelRequest) -> GeminiRequest {
        let system_instruction = if request.system.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart::Text {
                    text: request.system.clone(),
                }],
            })
        };

        let mut contents = Vec::new();
        for msg in &request.messages {
            let role = match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };

            let parts: Vec<GeminiPart> = msg
                .content
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => GeminiPart::Text { text: text.clone() },
                    ContentBlock::ToolUse { name, input, .. } => GeminiPart::FunctionCall {
                        function_call: GeminiFunctionCall {
                            name: name.clone(),
                            args: input.clone(),
                        },
                    },
                    ContentBlock::ToolResult { name, content, .. } => {
                        GeminiPart::FunctionResponse {
                            function_response: GeminiFunctionResponse {
                                name: name.clone(),
                                response: json!({ "result": content }),
                            },
                        }
                    }
                })
                .collect();

            if !parts.is_empty() {
                contents.push(GeminiContent {
                    role: Some(role.to_string()),
                    parts,
                });
            }
        }

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![GeminiTool {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|t| GeminiFunctionDeclaration {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.input_schema.clone(),
                    })
                    .collect(),
            }])
        };

        GeminiRequest {
            contents,
            system_instruction,
            tools,
            generation_config: request.max_tokens.map(|t| GeminiGenerationConfig {
                max_output_tokens: Some(t as i32),
            }),
        }
    }

    fn normalize_response(resp: GeminiResponse) -> Result<ModelResponse, ModelError> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::unknown("no candidates in response"))?;

        let mut content = Vec::new();
        for part in candidate.content.parts {
            match part {
                GeminiPart::Text { text } => {
                    if !text.is_empty() {
                        content.push(ContentBlock::Text { text });
                    }
                }
                GeminiPart::FunctionCall { function_call } => {
                    // Gemini does not issue call ids; synthesize one so tool
                    // responses stay keyed per call.
                    content.push(ContentBlock::ToolUse {
                        id: format!("call-{}", uuid::Uuid::new_v4()),
                        name: function_call.name,
                        input: function_call.args,
                    });
                }
                GeminiPart::FunctionResponse { .. } => {}
            }
        }

        let usage = resp
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u64::from(u.prompt_token_count),
                output_tokens: u64::from(u.candidates_token_count),
            })
            .unwrap_or_default();

        Ok(ModelResponse { content, usage })
    }

    fn classify_http_error(status: reqwest::StatusCode, body: &str) -> ModelError {
        let message = serde_json::from_str::<GeminiErrorResponse>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string());
        match status.as_u16() {
            400 => ModelError::invalid_request(format!("invalid request: {message}")),
            401 | 403 => ModelError::auth(format!("authentication failed: {message}")),
            429 => ModelError::rate_limit(format!("rate limit exceeded: {message}")),
            500..=599 => ModelError::server_error(format!("server error: {message}")),
            _ => ModelError::unknown(format!("HTTP {status}: {message}")),
        }
    }

    fn classify_transport_error(e: &reqwest::Error) -> ModelError {
        if e.is_timeout() {
            ModelError::network(format!("request timeout: {e}"))
        } else if e.is_connect() {
            ModelError::network(format!("connection failed: {e}"))
        } else {
            ModelError::unknown(format!("request failed: {e}"))
        }
    }
}

#[async_trait]
impl ModelService for GeminiService {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let gemini_request = self.translate_request(request);

        let response = self
            .client
            .post(self.endpoint("generateContent"))
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| Self::classify_transport_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelError::network(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Self::classify_http_error(status, &body));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            ModelError::unknown(format!("failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(gemini_response)
    }

    async fn stream(&self, request: &ModelRequest) -> Result<TextStream, ModelError> {
        let gemini_request = self.translate_request(request);
        let url = format!("{}&alt=sse", self.endpoint("streamGenerateContent"));

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| Self::classify_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_http_error(status, &body));
        }

        let byte_stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(|e| format!("{e}")));
        Ok(decode_sse_fragments(byte_stream))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

struct SseDecoder {
    upstream: Pin<Box<dyn Stream<Item = Result<Vec<u8>, String>> + Send>>,
    buffer: String,
    pending: VecDeque<String>,
    done: bool,
}

impl SseDecoder {
    /// Drain complete `data:` lines out of the buffer into pending
    /// fragments. Returns an error on undecodable payloads.
    fn drain_lines(&mut self) -> Result<(), ModelError> {
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=pos).collect();
            let line = line.trim_end();
            let Some(data) = line.strip_prefix("data:") else {
                continue;
            };
            let data = data.trim();
            if data.is_empty() {
                continue;
            }
            let chunk: GeminiResponse = serde_json::from_str(data)
                .map_err(|e| ModelError::unknown(format!("bad stream chunk: {e}")))?;
            for candidate in chunk.candidates {
                for part in candidate.content.parts {
                    if let GeminiPart::Text { text } = part {
                        if !text.is_empty() {
                            self.pending.push_back(text);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Decode an SSE body into a fragment stream. The sequence is finite and
/// non-restartable: it ends when the transport ends, and a decode or
/// transport failure yields one error and then terminates.
fn decode_sse_fragments<S>(upstream: S) -> TextStream
where
    S: Stream<Item = Result<Vec<u8>, String>> + Send + 'static,
{
    let decoder = SseDecoder {
        upstream: Box::pin(upstream),
        buffer: String::new(),
        pending: VecDeque::new(),
        done: false,
    };

    Box::pin(futures::stream::unfold(decoder, |mut dec| async move {
        loop {
            if let Some(fragment) = dec.pending.pop_front() {
                return Some((Ok(fragment), dec));
            }
            if dec.done {
                return None;
            }
            match dec.upstream.next().await {
                Some(Ok(chunk)) => {
                    dec.buffer.push_str(&String::from_utf8_lossy(&chunk));
                    if let Err(e) = dec.drain_lines() {
                        dec.done = true;
                        return Some((Err(e), dec));
                    }
                }
                Some(Err(e)) => {
                    dec.done = true;
                    return Some((Err(ModelError::network(format!("stream failed: {e}"))), dec));
                }
                None => {
                    dec.done = true;
                }
            }
        }
    }))
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    args: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
