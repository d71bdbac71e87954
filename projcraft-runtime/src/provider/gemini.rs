//! Google Gemini provider implementation (`generateContent` REST endpoint)

use super::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// System instruction sent when the caller supplies none. Keeps Gemini
/// answering with bare payloads instead of prose.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "JSON.";

/// Finish reasons Gemini uses when a safety filter stopped generation
const BLOCKED_FINISH_REASONS: &[&str] = &["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII", "RECITATION"];

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: ProviderConfig,
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, ProviderError> {
        let client = http_client(&config)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config
            .base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com/v1beta")
    }

    fn build_request(&self, request: &CompletionRequest) -> GeminiRequest {
        let mut system = None;
        let mut contents = Vec::new();
        for msg in &request.messages {
            match msg.role {
                Role::System => system = Some(msg.content.clone()),
                Role::User => contents.push(GeminiContent::text("user", &msg.content)),
                Role::Assistant => contents.push(GeminiContent::text("model", &msg.content)),
            }
        }
        let system = system.unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string());

        GeminiRequest {
            contents,
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: Some(system) }],
            }),
            generation_config: Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                stop_sequences: request.stop.clone(),
            }),
        }
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or("gemini-2.5-flash")
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let model = request.model.as_deref().unwrap_or(self.default_model()).to_string();
        let api_request = self.build_request(&request);

        let api_key = self.config.api_key.as_ref()
            .filter(|k| !k.is_empty())
            .ok_or(ProviderError::AuthenticationFailed)?;

        let mut req = self.client
            .post(format!("{}/models/{}:generateContent", self.base_url(), model))
            .header("x-goog-api-key", api_key)
            .json(&api_request);

        for (key, value) in &self.config.headers {
            req = req.header(key, value);
        }

        let response = req.send().await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, text));
        }

        let api_response: GeminiResponse = response.json().await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        api_response.into_completion(model)
    }
}

// ============================================================================
// Gemini API Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn text(role: &str, text: &str) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![GeminiPart { text: Some(text.to_string()) }],
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    response_id: String,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
    #[serde(default)]
    total_token_count: usize,
}

impl GeminiResponse {
    fn into_completion(self, requested_model: String) -> Result<CompletionResponse, ProviderError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(ProviderError::ContentPolicy(reason));
        }

        let candidate = self.candidates.into_iter().next()
            .ok_or_else(|| ProviderError::Other("No candidates in response".into()))?;

        let finish_reason = match candidate.finish_reason.as_deref() {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some(r) if BLOCKED_FINISH_REASONS.contains(&r) => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let usage = self.usage_metadata.map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            completion_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        }).unwrap_or_default();

        Ok(CompletionResponse {
            id: self.response_id,
            model: self.model_version.unwrap_or(requested_model),
            content: if text.is_empty() { None } else { Some(text) },
            finish_reason,
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GeminiProvider {
        GeminiProvider::new(ProviderConfig::gemini("test-key")).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = CompletionRequest::new(vec![ChatMessage::user("plan"), ChatMessage::assistant("ok")])
            .with_temperature(0.3)
            .with_max_tokens(3000);

        let json = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], DEFAULT_SYSTEM_INSTRUCTION);
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][1]["role"], "model");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 3000);
        assert!(json["generationConfig"].get("stopSequences").is_none());
    }

    #[test]
    fn test_explicit_system_overrides_default() {
        let request = CompletionRequest::new(vec![ChatMessage::system("Answer in YAML."), ChatMessage::user("x")]);
        let json = serde_json::to_value(provider().build_request(&request)).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Answer in YAML.");
        assert_eq!(json["contents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_blocked_prompt_is_content_policy() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        let err = parsed.into_completion("gemini-2.5-flash".into()).unwrap_err();
        assert_eq!(err, ProviderError::ContentPolicy("SAFETY".into()));
    }

    #[test]
    fn test_safety_finish_reason() {
        let body = r#"{"candidates": [{"finishReason": "SAFETY"}], "responseId": "r1"}"#;
        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        let completion = parsed.into_completion("gemini-2.5-flash".into()).unwrap();
        assert_eq!(completion.finish_reason, FinishReason::ContentFilter);
        assert!(completion.content.is_none());
        assert_eq!(completion.model, "gemini-2.5-flash");
    }

    #[test]
    fn test_text_parts_are_joined() {
        let body = r#"{
            "candidates": [{"content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]}, "finishReason": "STOP"}],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 2, "totalTokenCount": 6},
            "modelVersion": "gemini-2.5-flash-001"
        }"#;
        let parsed: GeminiResponse = serde_json::from_str(body).unwrap();
        let completion = parsed.into_completion("gemini-2.5-flash".into()).unwrap();
        assert_eq!(completion.content.as_deref(), Some("{\"a\":1}"));
        assert_eq!(completion.finish_reason, FinishReason::Stop);
        assert_eq!(completion.usage.total_tokens, 6);
        assert_eq!(completion.model, "gemini-2.5-flash-001");
    }
}
