//! API credential resolution.
//!
//! The chat backend needs a bearer token. Rather than hard-wiring one
//! source, resolution walks an ordered cascade of providers and
//! short-circuits on the first hit:
//!
//! 1. environment variables (`HUGGINGFACE_API_TOKEN`, then `CCHAT_API_TOKEN`);
//! 2. a token file configured at `[llm] token_file`;
//! 3. the cloud instance metadata service (1 second probe).
//!
//! "Not available" is `Ok(None)`, never an error; only malformed
//! configuration (e.g. a token file that exists but is empty) fails.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;

use crate::config::LlmConfig;

const ENV_VARS: &[&str] = &["HUGGINGFACE_API_TOKEN", "CCHAT_API_TOKEN"];

const METADATA_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// A resolved API token. The `Debug` impl is redacted so the secret cannot
/// leak through logs.
#[derive(Clone)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// One source of credentials. `Ok(None)` means "not available here";
/// errors are reserved for malformed configuration.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn resolve(&self) -> Result<Option<ApiToken>>;
    fn name(&self) -> &'static str;
}

/// Reads the first non-empty token from a list of environment variables.
pub struct EnvProvider {
    vars: Vec<String>,
}

impl EnvProvider {
    pub fn new(vars: &[&str]) -> Self {
        Self {
            vars: vars.iter().map(|v| v.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CredentialProvider for EnvProvider {
    async fn resolve(&self) -> Result<Option<ApiToken>> {
        for var in &self.vars {
            if let Ok(value) = std::env::var(var) {
                let value = value.trim();
                if !value.is_empty() {
                    return Ok(Some(ApiToken::new(value)));
                }
            }
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "environment"
    }
}

/// Reads a token from a configured file. No configured path, or a path that
/// does not exist, means "not available"; a file that exists but holds no
/// token is malformed and fails.
pub struct TokenFileProvider {
    path: Option<PathBuf>,
}

impl TokenFileProvider {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[async_trait]
impl CredentialProvider for TokenFileProvider {
    async fn resolve(&self) -> Result<Option<ApiToken>> {
        let Some(path) = &self.path else {
            return Ok(None);
        };

        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file: {}", path.display()))?;

        let token = content.trim();
        if token.is_empty() {
            bail!("Token file is empty: {}", path.display());
        }

        Ok(Some(ApiToken::new(token)))
    }

    fn name(&self) -> &'static str {
        "token-file"
    }
}

/// Probes the cloud instance metadata service for a service-account token.
/// Anything short of a well-formed success response (no metadata server,
/// timeout, unexpected body) resolves to "not available".
pub struct MetadataProvider {
    url: String,
}

impl MetadataProvider {
    pub fn new() -> Self {
        Self {
            url: METADATA_URL.to_string(),
        }
    }
}

impl Default for MetadataProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialProvider for MetadataProvider {
    async fn resolve(&self) -> Result<Option<ApiToken>> {
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        {
            Ok(c) => c,
            Err(_) => return Ok(None),
        };

        let response = match client
            .get(&self.url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
        {
            Ok(r) if r.status().is_success() => r,
            _ => return Ok(None),
        };

        let json: serde_json::Value = match response.json().await {
            Ok(j) => j,
            Err(_) => return Ok(None),
        };

        Ok(json
            .get("access_token")
            .and_then(|t| t.as_str())
            .filter(|t| !t.is_empty())
            .map(ApiToken::new))
    }

    fn name(&self) -> &'static str {
        "instance-metadata"
    }
}

/// Walk the default cascade for `config` and return the first token found.
pub async fn resolve_token(config: &LlmConfig) -> Result<Option<ApiToken>> {
    let providers: Vec<Box<dyn CredentialProvider>> = vec![
        Box::new(EnvProvider::new(ENV_VARS)),
        Box::new(TokenFileProvider::new(config.token_file.clone())),
        Box::new(MetadataProvider::new()),
    ];
    resolve_first(&providers).await
}

/// Try each provider in order, short-circuiting on the first hit.
pub async fn resolve_first(
    providers: &[Box<dyn CredentialProvider>],
) -> Result<Option<ApiToken>> {
    for provider in providers {
        if let Some(token) = provider.resolve().await? {
            tracing::debug!(provider = provider.name(), "resolved API credential");
            return Ok(Some(token));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_env_provider_absent_is_none() {
        let provider = EnvProvider::new(&["CCHAT_TEST_TOKEN_UNSET"]);
        assert!(provider.resolve().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_env_provider_reads_first_set_var() {
        std::env::set_var("CCHAT_TEST_TOKEN_SET", "hf_abc123");
        let provider = EnvProvider::new(&["CCHAT_TEST_TOKEN_UNSET", "CCHAT_TEST_TOKEN_SET"]);
        let token = provider.resolve().await.unwrap().unwrap();
        assert_eq!(token.reveal(), "hf_abc123");
        std::env::remove_var("CCHAT_TEST_TOKEN_SET");
    }

    #[tokio::test]
    async fn test_token_file_unconfigured_is_none() {
        let provider = TokenFileProvider::new(None);
        assert!(provider.resolve().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_file_missing_is_none() {
        let provider = TokenFileProvider::new(Some(PathBuf::from("./no/such/token")));
        assert!(provider.resolve().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_token_file_reads_trimmed_token() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("token");
        fs::write(&path, "  hf_from_file\n").unwrap();
        let provider = TokenFileProvider::new(Some(path));
        let token = provider.resolve().await.unwrap().unwrap();
        assert_eq!(token.reveal(), "hf_from_file");
    }

    #[tokio::test]
    async fn test_empty_token_file_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("token");
        fs::write(&path, "   \n").unwrap();
        let provider = TokenFileProvider::new(Some(path));
        assert!(provider.resolve().await.is_err());
    }

    #[tokio::test]
    async fn test_cascade_short_circuits_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("token");
        fs::write(&path, "from_file").unwrap();

        std::env::set_var("CCHAT_TEST_CASCADE", "from_env");
        let providers: Vec<Box<dyn CredentialProvider>> = vec![
            Box::new(EnvProvider::new(&["CCHAT_TEST_CASCADE"])),
            Box::new(TokenFileProvider::new(Some(path))),
        ];
        let token = resolve_first(&providers).await.unwrap().unwrap();
        assert_eq!(token.reveal(), "from_env");
        std::env::remove_var("CCHAT_TEST_CASCADE");
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = ApiToken::new("hf_secret");
        assert_eq!(format!("{token:?}"), "ApiToken(***)");
        assert!(!format!("{token:?}").contains("secret"));
    }
}
