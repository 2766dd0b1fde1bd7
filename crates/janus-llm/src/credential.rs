//! Vendor identifiers and credentials
//!
//! A credential identifies one billing/endpoint scope at one vendor. The
//! combination of vendor, key and endpoint fields is the identity used by
//! both the client pool and the adapter registry.

use crate::error::{Error, Result};
use crate::util::mask_api_key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported LLM vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    /// Anthropic Claude API
    Anthropic,
    /// OpenAI API
    OpenAi,
    /// Azure OpenAI (deployment-scoped)
    AzureOpenAi,
    /// Google Gemini API
    Gemini,
    /// Local Ollama server
    Ollama,
}

impl Vendor {
    /// Returns the string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAi => "openai",
            Self::AzureOpenAi => "azure_openai",
            Self::Gemini => "gemini",
            Self::Ollama => "ollama",
        }
    }

    /// All supported vendors
    pub const ALL: &'static [Vendor] = &[
        Vendor::Anthropic,
        Vendor::OpenAi,
        Vendor::AzureOpenAi,
        Vendor::Gemini,
        Vendor::Ollama,
    ];
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Credential for one vendor endpoint.
///
/// Immutable once issued; rotation happens by constructing a new credential.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderCredential {
    /// Vendor this credential belongs to
    pub vendor: Vendor,
    /// API key (empty for vendors without auth, e.g. local Ollama)
    pub api_key: String,
    /// Base URL override. Required for Azure (resource endpoint) and
    /// Ollama (server address), optional elsewhere.
    pub base_url: Option<String>,
    /// Deployment identifier. Required for Azure, unused elsewhere.
    pub deployment: Option<String>,
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for ProviderCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredential")
            .field("vendor", &self.vendor)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("base_url", &self.base_url)
            .field("deployment", &self.deployment)
            .finish()
    }
}

impl ProviderCredential {
    /// Create a credential with just a vendor and key.
    #[must_use]
    pub fn new(vendor: Vendor, api_key: impl Into<String>) -> Self {
        Self {
            vendor,
            api_key: api_key.into(),
            base_url: None,
            deployment: None,
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the deployment identifier
    #[must_use]
    pub fn with_deployment(mut self, deployment: impl Into<String>) -> Self {
        self.deployment = Some(deployment.into());
        self
    }

    /// Create a credential from environment variables for the given vendor.
    pub fn from_env(vendor: Vendor) -> Result<Self> {
        match vendor {
            Vendor::Anthropic => {
                let api_key = require_env("ANTHROPIC_API_KEY")?;
                let mut cred = Self::new(vendor, api_key);
                cred.base_url = std::env::var("ANTHROPIC_BASE_URL").ok();
                Ok(cred)
            }
            Vendor::OpenAi => {
                let api_key = require_env("OPENAI_API_KEY")?;
                let mut cred = Self::new(vendor, api_key);
                cred.base_url = std::env::var("OPENAI_BASE_URL").ok();
                Ok(cred)
            }
            Vendor::AzureOpenAi => {
                let api_key = require_env("AZURE_OPENAI_API_KEY")?;
                let endpoint = require_env("AZURE_OPENAI_ENDPOINT")?;
                let deployment = require_env("AZURE_OPENAI_DEPLOYMENT")?;
                Ok(Self::new(vendor, api_key)
                    .with_base_url(endpoint)
                    .with_deployment(deployment))
            }
            Vendor::Gemini => {
                let api_key = require_env("GEMINI_API_KEY")?;
                Ok(Self::new(vendor, api_key))
            }
            Vendor::Ollama => {
                let base_url = std::env::var("OLLAMA_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:11434".to_string());
                Ok(Self::new(vendor, "").with_base_url(base_url))
            }
        }
    }

    /// Cache identity for pooling: vendor + credential + endpoint fields.
    #[must_use]
    pub fn pool_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.vendor,
            self.api_key,
            self.base_url.as_deref().unwrap_or(""),
            self.deployment.as_deref().unwrap_or("")
        )
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::NotConfigured(format!("{name} not set")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_key_includes_endpoint_fields() {
        let plain = ProviderCredential::new(Vendor::OpenAi, "sk-test");
        let scoped = ProviderCredential::new(Vendor::AzureOpenAi, "sk-test")
            .with_base_url("https://example.openai.azure.com")
            .with_deployment("gpt-4o-prod");

        assert_ne!(plain.pool_key(), scoped.pool_key());
        assert!(scoped.pool_key().contains("gpt-4o-prod"));
    }

    #[test]
    fn test_pool_key_stable_for_identical_credentials() {
        let a = ProviderCredential::new(Vendor::Anthropic, "sk-ant-1");
        let b = ProviderCredential::new(Vendor::Anthropic, "sk-ant-1");
        assert_eq!(a.pool_key(), b.pool_key());
    }

    #[test]
    fn test_debug_masks_key() {
        let cred = ProviderCredential::new(Vendor::Anthropic, "sk-ant-1234567890abcdef");
        let debug = format!("{:?}", cred);
        assert!(!debug.contains("1234567890"));
        assert!(debug.contains("sk-a"));
    }

    #[test]
    fn test_vendor_display() {
        assert_eq!(Vendor::AzureOpenAi.to_string(), "azure_openai");
        assert_eq!(Vendor::Anthropic.to_string(), "anthropic");
    }
}
