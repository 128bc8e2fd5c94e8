use common::Config;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::error::{AppError, Result};
use crate::llm::remote::{RemoteLlmProvider, DEFAULT_API_URL, DEFAULT_MODEL};
use crate::llm::summarizer::{self, SummaryResult, REFINE_MAX_TOKENS, SUMMARY_MAX_TOKENS};
use crate::scraping::{self, DEFAULT_USER_AGENT};

/// The two user actions, as seen by whoever runs them
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// Fetch `url`, extract the article and summarize it
    async fn summarize(&self, api_key: &str, url: &str) -> Result<SummaryResult>;

    /// Rewrite `current_summary` according to `instruction`
    async fn refine(&self, api_key: &str, current_summary: &str, instruction: &str) -> Result<String>;
}

/// Resolved settings, with defaults filled in for everything the config leaves out
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub api_url: String,
    pub model: String,
    pub llm_timeout_secs: u64,
    pub temperature: f32,
    pub summary_max_tokens: usize,
    pub refine_max_tokens: usize,
    pub user_agent: String,
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            llm_timeout_secs: 120,
            temperature: 0.7,
            summary_max_tokens: SUMMARY_MAX_TOKENS,
            refine_max_tokens: REFINE_MAX_TOKENS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout_secs: None,
        }
    }
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        let defaults = Self::default();
        let llm = config.llm();
        let fetch = config.fetch();
        Self {
            api_url: llm.api_url.unwrap_or(defaults.api_url),
            model: llm.model.unwrap_or(defaults.model),
            llm_timeout_secs: llm.timeout_seconds.unwrap_or(defaults.llm_timeout_secs),
            temperature: llm.temperature.unwrap_or(defaults.temperature),
            summary_max_tokens: llm.summary_max_tokens.unwrap_or(defaults.summary_max_tokens),
            refine_max_tokens: llm.refine_max_tokens.unwrap_or(defaults.refine_max_tokens),
            user_agent: fetch.user_agent.unwrap_or(defaults.user_agent),
            fetch_timeout_secs: fetch.timeout_seconds,
        }
    }
}

/// Fetcher -> Extractor -> Summarizer, and the Refiner, wired to a remote LLM
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(settings: PipelineSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    fn provider(&self, api_key: &str) -> RemoteLlmProvider {
        RemoteLlmProvider::new(&self.settings.api_url, api_key, &self.settings.model).with_defaults(
            self.settings.llm_timeout_secs,
            self.settings.summary_max_tokens,
            self.settings.temperature,
        )
    }

    /// Fetch and extract; an empty extraction is an error, never a valid article
    pub async fn extract_from_url(&self, url: &str) -> Result<String> {
        let html = scraping::fetch_page(url, &self.settings.user_agent, self.settings.fetch_timeout_secs)
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "article fetch failed");
                AppError::Fetch(e)
            })?;

        let content = scraping::extract_article_text(&html);
        if content.is_empty() {
            warn!(%url, "no article text extracted");
            return Err(AppError::Extraction);
        }
        Ok(content)
    }
}

#[async_trait::async_trait]
impl Backend for Pipeline {
    #[instrument(level = "info", skip(self, api_key))]
    async fn summarize(&self, api_key: &str, url: &str) -> Result<SummaryResult> {
        if api_key.trim().is_empty() || url.trim().is_empty() {
            return Err(AppError::validation("API 키와 URL을 입력해주세요"));
        }

        let t0 = Instant::now();
        let content = self.extract_from_url(url.trim()).await?;
        let result = summarizer::summarize_article(
            &self.provider(api_key.trim()),
            &content,
            self.settings.summary_max_tokens,
        )
        .await?;
        info!(elapsed_ms = t0.elapsed().as_millis() as u64, "summarize finished");
        Ok(result)
    }

    #[instrument(level = "info", skip_all)]
    async fn refine(&self, api_key: &str, current_summary: &str, instruction: &str) -> Result<String> {
        if api_key.trim().is_empty() || instruction.trim().is_empty() {
            return Err(AppError::validation("API 키와 개선 의견을 입력해주세요"));
        }

        let t0 = Instant::now();
        let refined = summarizer::refine_summary(
            &self.provider(api_key.trim()),
            current_summary,
            instruction,
            self.settings.refine_max_tokens,
        )
        .await?;
        info!(elapsed_ms = t0.elapsed().as_millis() as u64, "refine finished");
        Ok(refined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_fill_defaults() {
        let settings = PipelineSettings::from_config(&Config::default());
        assert_eq!(settings.api_url, DEFAULT_API_URL);
        assert_eq!(settings.user_agent, "Mozilla/5.0");
        assert_eq!(settings.summary_max_tokens, 4000);
        assert_eq!(settings.refine_max_tokens, 3000);
        assert!(settings.fetch_timeout_secs.is_none());
    }

    #[test]
    fn settings_take_config_values() {
        let config: Config = toml::from_str(
            "[llm]\nmodel = \"gpt-4o\"\nrefine_max_tokens = 1500\n[fetch]\ntimeout_seconds = 15\n",
        )
        .expect("parse");
        let settings = PipelineSettings::from_config(&config);
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.refine_max_tokens, 1500);
        assert_eq!(settings.summary_max_tokens, 4000);
        assert_eq!(settings.fetch_timeout_secs, Some(15));
    }

    #[tokio::test]
    async fn summarize_validates_before_network() {
        let pipeline = Pipeline::default();

        let err = pipeline.summarize("", "https://example.com/a").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = pipeline.summarize("sk-test", "  ").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn refine_validates_before_network() {
        let pipeline = Pipeline::default();

        let err = pipeline.refine("", "summary", "shorter").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = pipeline.refine("sk-test", "summary", "").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
