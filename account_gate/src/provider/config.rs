use std::{env, sync::Arc};

use super::cognito::{CognitoConfig, CognitoIdentityProvider};
use super::errors::ProviderError;
use super::memory::InMemoryIdentityProvider;
use super::types::IdentityProvider;

/// Build the identity provider selected by `IDENTITY_PROVIDER_TYPE`
///
/// Supported types are `memory` (the default) and `cognito`.
pub fn provider_from_env() -> Result<Arc<dyn IdentityProvider>, ProviderError> {
    let provider_type = env::var("IDENTITY_PROVIDER_TYPE").unwrap_or_else(|_| "memory".to_string());
    provider_from_type(&provider_type, CognitoConfig::from_env)
}

fn provider_from_type<F>(
    provider_type: &str,
    cognito_config: F,
) -> Result<Arc<dyn IdentityProvider>, ProviderError>
where
    F: FnOnce() -> Result<CognitoConfig, ProviderError>,
{
    tracing::info!("Initializing identity provider with type: {}", provider_type);

    let provider: Arc<dyn IdentityProvider> = match provider_type.trim() {
        "memory" => Arc::new(InMemoryIdentityProvider::new()),
        "cognito" => Arc::new(CognitoIdentityProvider::new(cognito_config()?)?),
        t => {
            return Err(ProviderError::Config(format!(
                "Unsupported identity provider type: {t}. Supported types are 'memory' and 'cognito'"
            )));
        }
    };
    Ok(provider)
}
