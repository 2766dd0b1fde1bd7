//! Provider registry
//!
//! Factory + cache of adapter instances keyed by (vendor, credential,
//! endpoint). Constructing an adapter acquires a pooled client, so caching
//! at this level avoids a pool lookup on every call. Configuration errors
//! (missing key, missing Azure endpoint/deployment) surface here, before
//! any network call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::adapter::ProviderAdapter;
use crate::credential::{ProviderCredential, Vendor};
use crate::error::Result;
use crate::pool::ClientPool;
use crate::providers::anthropic::AnthropicAdapter;
use crate::providers::azure::AzureOpenAiAdapter;
use crate::providers::gemini::GeminiAdapter;
use crate::providers::ollama::OllamaAdapter;
use crate::providers::openai::OpenAiAdapter;

/// Registry of adapters over a shared client pool.
pub struct ProviderRegistry {
    pool: Arc<ClientPool>,
    adapters: Mutex<HashMap<String, Arc<dyn ProviderAdapter>>>,
}

impl ProviderRegistry {
    /// Create a registry over the given pool.
    #[must_use]
    pub fn new(pool: Arc<ClientPool>) -> Self {
        Self {
            pool,
            adapters: Mutex::new(HashMap::new()),
        }
    }

    /// Get the adapter for a credential, constructing and caching it on
    /// first use.
    pub fn get_adapter(&self, credential: &ProviderCredential) -> Result<Arc<dyn ProviderAdapter>> {
        let key = credential.pool_key();

        {
            let adapters = self.adapters.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(adapter) = adapters.get(&key) {
                return Ok(Arc::clone(adapter));
            }
        }

        debug!(vendor = %credential.vendor, "constructing provider adapter");
        let adapter: Arc<dyn ProviderAdapter> = match credential.vendor {
            Vendor::Anthropic => Arc::new(AnthropicAdapter::new(credential.clone(), &self.pool)?),
            Vendor::OpenAi => Arc::new(OpenAiAdapter::new(credential.clone(), &self.pool)?),
            Vendor::AzureOpenAi => {
                Arc::new(AzureOpenAiAdapter::new(credential.clone(), &self.pool)?)
            }
            Vendor::Gemini => Arc::new(GeminiAdapter::new(credential.clone(), &self.pool)?),
            Vendor::Ollama => Arc::new(OllamaAdapter::new(credential.clone(), &self.pool)?),
        };

        let mut adapters = self.adapters.lock().unwrap_or_else(|e| e.into_inner());
        let adapter = adapters.entry(key).or_insert(adapter);
        Ok(Arc::clone(adapter))
    }

    /// Register a pre-built adapter (used to inject mocks in tests).
    pub fn register(&self, credential: &ProviderCredential, adapter: Arc<dyn ProviderAdapter>) {
        let mut adapters = self.adapters.lock().unwrap_or_else(|e| e.into_inner());
        adapters.insert(credential.pool_key(), adapter);
    }

    /// Number of cached adapters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapters.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the registry has no cached adapters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The underlying client pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<ClientPool> {
        &self.pool
    }
}
