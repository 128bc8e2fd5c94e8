/*!
common/src/lib.rs

Shared configuration types and credential storage for newsdesk.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader that merges a default file with an optional override
- The credential store (see `credentials`)
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod credentials;

pub use credentials::{default_credential_path, CredentialStore, FileCredentialStore};

/// Chat completion endpoint configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Full URL of an OpenAI-compatible chat completions endpoint
    pub api_url: Option<String>,
    pub model: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub temperature: Option<f32>,
    /// Response cap for the summarize request
    pub summary_max_tokens: Option<usize>,
    /// Response cap for the refine request
    pub refine_max_tokens: Option<usize>,
}

/// Article fetching configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FetchConfig {
    pub user_agent: Option<String>,
    /// No timeout override is applied when unset
    pub timeout_seconds: Option<u64>,
}

/// Where the API key is persisted between runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub path: Option<String>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub llm: Option<LlmConfig>,
    pub fetch: Option<FetchConfig>,
    pub credentials: Option<CredentialsConfig>,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// Missing files are skipped, so with neither present the result is `Config::default()`.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    pub fn llm(&self) -> LlmConfig {
        self.llm.clone().unwrap_or_default()
    }

    pub fn fetch(&self) -> FetchConfig {
        self.fetch.clone().unwrap_or_default()
    }

    /// Credential file location: `[credentials].path` if set, else `~/.news_summarizer_config`
    pub fn credential_path(&self) -> std::path::PathBuf {
        self.credentials
            .as_ref()
            .and_then(|c| c.path.as_ref())
            .map(std::path::PathBuf::from)
            .unwrap_or_else(default_credential_path)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn config_from_string() {
        let toml = r#"
            [llm]
            model = "gpt-4o"
            summary_max_tokens = 2000

            [fetch]
            user_agent = "Mozilla/5.0"
        "#;

        let cfg: Config = toml::from_str(toml).expect("parse config");
        let llm = cfg.llm();
        assert_eq!(llm.model.as_deref(), Some("gpt-4o"));
        assert_eq!(llm.summary_max_tokens, Some(2000));
        assert!(llm.api_url.is_none());
        assert_eq!(cfg.fetch().user_agent.as_deref(), Some("Mozilla/5.0"));
        assert!(cfg.credentials.is_none());
    }

    #[tokio::test]
    async fn override_file_takes_precedence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let default_path = dir.path().join("config.default.toml");
        let override_path = dir.path().join("config.toml");

        fs::write(
            &default_path,
            "[llm]\nmodel = \"gpt-4o-mini\"\ntimeout_seconds = 60\n",
        )
        .expect("write default");
        fs::write(&override_path, "[llm]\nmodel = \"gpt-4o\"\n").expect("write override");

        let cfg = Config::load_with_defaults(Some(default_path.as_path()), Some(override_path.as_path()))
            .await
            .expect("load");
        let llm = cfg.llm();
        assert_eq!(llm.model.as_deref(), Some("gpt-4o"));
        // untouched keys from the default file survive the merge
        assert_eq!(llm.timeout_seconds, Some(60));
    }

    #[tokio::test]
    async fn missing_files_yield_default_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("nope.toml");

        let cfg = Config::load_with_defaults(Some(missing.as_path()), None).await.expect("load");
        assert!(cfg.llm.is_none());
        assert!(cfg.fetch.is_none());
    }

    #[test]
    fn credential_path_override() {
        let cfg: Config = toml::from_str("[credentials]\npath = \"/tmp/key\"\n").expect("parse");
        assert_eq!(cfg.credential_path(), std::path::PathBuf::from("/tmp/key"));
    }
}
