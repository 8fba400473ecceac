mod cognito;
mod config;
mod errors;
mod memory;
mod sigv4;
mod types;

pub use cognito::{AwsCredentials, CognitoConfig, CognitoIdentityProvider};
pub use config::provider_from_env;
pub use errors::{AttributeError, ProviderError};
pub use memory::InMemoryIdentityProvider;
pub use types::{
    ATTR_EMAIL, ATTR_NAME, Attributes, IdentityError, IdentityProvider, IdentityResult,
    ProviderUser, SignInResult, UserStatus,
};
