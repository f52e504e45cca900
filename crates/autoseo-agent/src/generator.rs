//! Anthropic-backed content generator
//!
//! Every call is stateless: one prompt in, one JSON draft out, scored locally.

use async_trait::async_trait;
use autoseo_core::{AutoSeoError, CollaboratorSettings, GeneratedContent, Result};
use autoseo_engine::{ContentGenerator, ProgressCallback};
use std::time::Duration;

use crate::quality::score_draft;
use crate::types::{AnthropicMessage, AnthropicRequest, AnthropicResponse, Draft};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: usize = 8000;

// Rate limit retry configuration
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_SECS: u64 = 10;
const MAX_BACKOFF_SECS: u64 = 120;

const SYSTEM_PROMPT: &str = "You are an SEO content writer. You write accurate, \
well-structured long-form articles in HTML and always answer with a single JSON object.";

/// Content generator calling the Anthropic Messages API
#[derive(Debug, Clone)]
pub struct AnthropicGenerator {
    http: reqwest::Client,
    endpoint: String,
    max_tokens: usize,
}

impl AnthropicGenerator {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: ANTHROPIC_API_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Point at a different Messages endpoint (proxies, test servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn complete(&self, api_key: &str, request: &AnthropicRequest) -> Result<String> {
        let mut retries = 0;
        let mut backoff_secs = INITIAL_BACKOFF_SECS;

        loop {
            tracing::debug!("Sending request to Anthropic API (attempt {})", retries + 1);

            let response = self
                .http
                .post(&self.endpoint)
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(request)
                .send()
                .await
                .map_err(|e| AutoSeoError::Http(format!("Failed to send request: {}", e)))?;

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                retries += 1;
                if retries > MAX_RETRIES {
                    let error_text = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Unknown".to_string());
                    return Err(AutoSeoError::Generator(format!(
                        "Anthropic API {} after {} retries: {}",
                        status, MAX_RETRIES, error_text
                    )));
                }

                // Parse retry-after header if present, otherwise use exponential backoff
                let wait_secs = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(backoff_secs);

                tracing::warn!(
                    "Anthropic API returned {}. Waiting {} seconds before retry {}/{}",
                    status,
                    wait_secs,
                    retries,
                    MAX_RETRIES
                );
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                backoff_secs = (backoff_secs * 2).min(MAX_BACKOFF_SECS);
                continue;
            }

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(AutoSeoError::Auth(format!(
                    "Anthropic API rejected the API key ({})",
                    status
                )));
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown".to_string());
                return Err(AutoSeoError::Generator(format!(
                    "Anthropic API error {}: {}",
                    status, error_text
                )));
            }

            let body: AnthropicResponse = response
                .json()
                .await
                .map_err(|e| AutoSeoError::Generator(format!("Failed to parse response: {}", e)))?;

            if let Some(usage) = &body.usage {
                tracing::info!(
                    "Draft received ({} input tokens, {} output tokens)",
                    usage.input_tokens,
                    usage.output_tokens
                );
            }

            return body
                .content
                .into_iter()
                .find(|block| block.content_type == "text")
                .map(|block| block.text)
                .ok_or_else(|| AutoSeoError::Generator("No text in response".to_string()));
        }
    }
}

impl Default for AnthropicGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Prompt asking for one article about `keyword`
pub fn build_prompt(keyword: &str) -> String {
    format!(
        "Write a comprehensive, search-optimized article targeting the keyword \"{keyword}\".\n\n\
         Requirements:\n\
         - At least 1500 words of original, accurate content\n\
         - Use the exact keyword in the title and within the first 100 words\n\
         - Keep keyword density between 0.5% and 2.5%\n\
         - Structure the body with at least three <h2> sections; use <p>, <ul> and <h3> as needed\n\
         - SEO title between 30 and 60 characters\n\
         - Meta description between 120 and 160 characters\n\n\
         Respond with only a JSON object of the form:\n\
         {{\"title\": \"...\", \"seo_title\": \"...\", \"meta_description\": \"...\", \"content\": \"<h2>...</h2><p>...</p>\"}}"
    )
}

/// Extract the JSON draft from model output, tolerating surrounding prose or fences
pub fn parse_draft(output: &str) -> Result<Draft> {
    let start = output.find('{');
    let end = output.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &output[start..=end],
        _ => {
            return Err(AutoSeoError::Generator(
                "Model response did not contain a JSON draft".to_string(),
            ))
        }
    };

    let draft: Draft = serde_json::from_str(json)
        .map_err(|e| AutoSeoError::Generator(format!("Malformed draft JSON: {}", e)))?;
    if draft.title.trim().is_empty() || draft.content.trim().is_empty() {
        return Err(AutoSeoError::Generator(
            "Draft is missing a title or body".to_string(),
        ));
    }
    Ok(draft)
}

#[async_trait]
impl ContentGenerator for AnthropicGenerator {
    async fn initialize(&self, settings: &CollaboratorSettings) -> Result<()> {
        if settings.api_key.is_none() {
            return Err(AutoSeoError::Configuration(
                "No Anthropic API key found. Set ANTHROPIC_API_KEY=sk-ant-api03-...".to_string(),
            ));
        }
        tracing::info!("Content generator ready (model {})", settings.model);
        Ok(())
    }

    async fn generate(
        &self,
        keyword: &str,
        settings: &CollaboratorSettings,
        progress: Option<ProgressCallback>,
    ) -> Result<GeneratedContent> {
        let report = |message: String| {
            if let Some(progress) = &progress {
                progress(message);
            }
        };

        let api_key = settings
            .api_key
            .as_deref()
            .ok_or_else(|| AutoSeoError::Auth("ANTHROPIC_API_KEY is not set".to_string()))?;

        let request = AnthropicRequest {
            model: settings.model.clone(),
            max_tokens: self.max_tokens,
            system: Some(SYSTEM_PROMPT.to_string()),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: build_prompt(keyword),
            }],
        };

        report(format!("Requesting draft from {}", settings.model));
        let output = self.complete(api_key, &request).await?;

        report("Scoring draft".to_string());
        let draft = parse_draft(&output)?;
        let quality = score_draft(keyword, &draft);

        tracing::info!(
            keyword = %keyword,
            words = quality.word_count,
            score = quality.overall(),
            "Draft scored"
        );
        report(format!("Draft scored {}", quality.overall()));

        Ok(GeneratedContent {
            seo_title: if draft.seo_title.is_empty() {
                draft.title.clone()
            } else {
                draft.seo_title
            },
            title: draft.title,
            content: draft.content,
            meta_description: draft.meta_description,
            quality_score: quality.overall(),
            word_count: quality.word_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_mentions_keyword_and_shape() {
        let prompt = build_prompt("trail running");
        assert!(prompt.contains("\"trail running\""));
        assert!(prompt.contains("\"meta_description\""));
    }

    #[test]
    fn test_parse_draft_inside_fence() {
        let output = "Here you go:\n```json\n{\"title\": \"T\", \"seo_title\": \"S\", \
                      \"meta_description\": \"M\", \"content\": \"<p>body</p>\"}\n```";
        let draft = parse_draft(output).unwrap();
        assert_eq!(draft.title, "T");
        assert_eq!(draft.content, "<p>body</p>");
    }

    #[test]
    fn test_parse_draft_rejects_garbage() {
        assert!(matches!(
            parse_draft("I cannot help with that."),
            Err(AutoSeoError::Generator(_))
        ));
        assert!(parse_draft("{\"title\": \"\", \"content\": \"x\"}").is_err());
    }

    #[tokio::test]
    async fn test_initialize_requires_api_key() {
        let generator = AnthropicGenerator::new();
        let err = generator
            .initialize(&CollaboratorSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AutoSeoError::Configuration(_)));

        let settings = CollaboratorSettings {
            api_key: Some("sk-test".into()),
            model: "claude-sonnet-4-5-20250929".into(),
            ..Default::default()
        };
        assert!(generator.initialize(&settings).await.is_ok());
    }

    #[tokio::test]
    async fn test_generate_without_key_is_auth_error() {
        let err = AnthropicGenerator::new()
            .generate("seo", &CollaboratorSettings::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AutoSeoError::Auth(_)));
    }

    #[test]
    fn test_builder() {
        let generator = AnthropicGenerator::new()
            .with_max_tokens(4000)
            .with_endpoint("http://localhost:9/v1/messages");
        assert_eq!(generator.max_tokens, 4000);
        assert_eq!(generator.endpoint, "http://localhost:9/v1/messages");
    }
}
