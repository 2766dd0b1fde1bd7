//! Azure OpenAI - deployment-scoped adapter
//!
//! Same wire format as OpenAI, different addressing: requests go to
//! `{endpoint}/openai/deployments/{deployment}/...` with an `api-key`
//! header and an `api-version` query parameter. Both the endpoint and the
//! deployment name are required configuration; requesting this vendor
//! without them is a configuration error raised before any network call.

/// Adapter implementation
pub mod provider;

#[cfg(test)]
mod tests;

pub use provider::AzureOpenAiAdapter;
