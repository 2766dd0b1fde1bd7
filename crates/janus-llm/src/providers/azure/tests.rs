use super::provider::AzureOpenAiAdapter;
use crate::adapter::ProviderAdapter;
use crate::credential::{ProviderCredential, Vendor};
use crate::error::Error;
use crate::pool::ClientPool;

fn full_credential() -> ProviderCredential {
    ProviderCredential::new(Vendor::AzureOpenAi, "azure-key")
        .with_base_url("https://example.openai.azure.com/")
        .with_deployment("gpt-4o-prod")
}

#[test]
fn test_requires_endpoint() {
    let pool = ClientPool::default();
    let credential = ProviderCredential::new(Vendor::AzureOpenAi, "azure-key")
        .with_deployment("gpt-4o-prod");

    let err = AzureOpenAiAdapter::new(credential, &pool).err().unwrap();
    assert!(matches!(err, Error::NotConfigured(_)));
}

#[test]
fn test_requires_deployment() {
    let pool = ClientPool::default();
    let credential = ProviderCredential::new(Vendor::AzureOpenAi, "azure-key")
        .with_base_url("https://example.openai.azure.com");

    let err = AzureOpenAiAdapter::new(credential, &pool).err().unwrap();
    assert!(matches!(err, Error::NotConfigured(_)));
}

#[test]
fn test_full_credential_constructs() {
    let pool = ClientPool::default();
    let adapter = AzureOpenAiAdapter::new(full_credential(), &pool).unwrap();

    assert_eq!(adapter.vendor(), Vendor::AzureOpenAi);
    assert_eq!(adapter.default_model(), "gpt-4o-prod");
    assert_eq!(adapter.available_models(), vec!["gpt-4o-prod".to_string()]);
    // Construction went through the pool.
    assert_eq!(pool.len(Vendor::AzureOpenAi), 1);
}

#[test]
fn test_endpoint_trailing_slash_is_trimmed() {
    let pool = ClientPool::default();
    let adapter = AzureOpenAiAdapter::new(full_credential(), &pool).unwrap();
    // No panic and the adapter reports capabilities statically.
    assert!(adapter.capabilities().streaming);
    assert!(adapter.capabilities().tools);
}
