use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use serde_json::{Value, json};
use std::fmt;
use url::Url;

use crate::config::PROVIDER_TIMEOUT;
use crate::provider::errors::ProviderError;
use crate::provider::sigv4::{SigningParams, hmac_sha256, sign_request};
use crate::provider::types::{
    Attributes, IdentityError, IdentityProvider, IdentityResult, ProviderUser, SignInResult,
    UserStatus,
};
use crate::session::{Session, SessionTable};

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const SERVICE: &str = "cognito-idp";

/// Static AWS credentials for the administrative lookups
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Settings for a Cognito user pool app client
#[derive(Clone)]
pub struct CognitoConfig {
    pub region: String,
    pub user_pool_id: String,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub endpoint: String,
    pub credentials: Option<AwsCredentials>,
}

impl fmt::Debug for CognitoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CognitoConfig")
            .field("region", &self.region)
            .field("user_pool_id", &self.user_pool_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("credentials", &self.credentials)
            .finish()
    }
}

impl CognitoConfig {
    /// Read the configuration from the process environment
    ///
    /// Required: `COGNITO_USER_POOL_ID`, `COGNITO_CLIENT_ID` and a region from
    /// `COGNITO_REGION` or `AWS_REGION`. Optional: `COGNITO_CLIENT_SECRET`,
    /// `COGNITO_ENDPOINT`, `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`/`AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self, ProviderError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| ProviderError::Config(format!("{key} must be set")))
        };

        let region = get("COGNITO_REGION")
            .or_else(|| get("AWS_REGION"))
            .ok_or_else(|| ProviderError::Config("COGNITO_REGION must be set".to_string()))?;
        let user_pool_id = required("COGNITO_USER_POOL_ID")?;
        let client_id = required("COGNITO_CLIENT_ID")?;
        let endpoint = get("COGNITO_ENDPOINT")
            .unwrap_or_else(|| format!("https://{SERVICE}.{region}.amazonaws.com/"));

        let credentials = match (get("AWS_ACCESS_KEY_ID"), get("AWS_SECRET_ACCESS_KEY")) {
            (Some(access_key_id), Some(secret_access_key)) => Some(AwsCredentials {
                access_key_id,
                secret_access_key,
                session_token: get("AWS_SESSION_TOKEN"),
            }),
            (None, None) => None,
            _ => {
                return Err(ProviderError::Config(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".to_string(),
                ));
            }
        };

        Ok(Self {
            region,
            user_pool_id,
            client_id,
            client_secret: get("COGNITO_CLIENT_SECRET"),
            endpoint,
            credentials,
        })
    }
}

/// Outcome of one user pool API call that reached the service
enum CognitoReply {
    Accepted(Value),
    Rejected(IdentityError),
}

/// Identity provider backed by an AWS Cognito user pool
///
/// Signup, confirmation, sign-in and global sign-out go through the public app
/// client API. Account lookups need administrative credentials; without them
/// `lookup_user` reports no existing account and `find_user_by_email` returns a
/// bare handle, leaving the service to reject unknown users itself.
pub struct CognitoIdentityProvider {
    config: CognitoConfig,
    client: reqwest::Client,
    host: String,
    /// Access token per session, needed for global sign-out
    sessions: SessionTable<String>,
}

impl CognitoIdentityProvider {
    pub fn new(config: CognitoConfig) -> Result<Self, ProviderError> {
        let url = Url::parse(&config.endpoint)
            .map_err(|e| ProviderError::Config(format!("Invalid COGNITO_ENDPOINT: {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(ProviderError::Config(
                    "COGNITO_ENDPOINT must have a host".to_string(),
                ));
            }
        };

        let client = reqwest::Client::builder()
            .timeout(*PROVIDER_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Config(format!("Failed to build HTTP client: {e}")))?;

        tracing::info!(
            "Using Cognito user pool {} in {} (admin lookups: {})",
            config.user_pool_id,
            config.region,
            config.credentials.is_some()
        );

        Ok(Self {
            config,
            client,
            host,
            sessions: SessionTable::new(),
        })
    }

    /// `SecretHash` for app clients that have a secret
    fn secret_hash(&self, username: &str) -> Result<Option<String>, ProviderError> {
        self.config
            .client_secret
            .as_deref()
            .map(|secret| compute_secret_hash(secret, username, &self.config.client_id))
            .transpose()
    }

    async fn call(
        &self,
        action: &str,
        body: &Value,
        signed: bool,
    ) -> Result<CognitoReply, ProviderError> {
        let target = format!("{TARGET_PREFIX}.{action}");
        let payload = body.to_string();

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", &target);

        if signed {
            let credentials = self.config.credentials.as_ref().ok_or_else(|| {
                ProviderError::Config(format!("{action} requires AWS credentials"))
            })?;
            let params = SigningParams {
                access_key_id: &credentials.access_key_id,
                secret_access_key: &credentials.secret_access_key,
                session_token: credentials.session_token.as_deref(),
                region: &self.config.region,
                service: SERVICE,
                host: &self.host,
            };
            for (name, value) in
                sign_request(&params, AMZ_JSON, &target, payload.as_bytes(), Utc::now())?
            {
                request = request.header(name, value);
            }
        }

        tracing::debug!("Calling {}", target);
        let response = request.body(payload).send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        if status.is_success() {
            let value = if text.trim().is_empty() {
                Value::Object(Default::default())
            } else {
                serde_json::from_str(&text)
                    .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?
            };
            return Ok(CognitoReply::Accepted(value));
        }

        if status.is_server_error() {
            tracing::warn!("{} failed with {}", target, status);
            return Err(ProviderError::Unavailable(format!("{action} returned {status}")));
        }

        let error = parse_error_body(&text);
        if is_service_fault(&error.code) {
            tracing::error!("{} rejected by the service: {}", target, error.code);
            return Err(ProviderError::Unavailable(format!(
                "{}: {}",
                error.code, error.description
            )));
        }

        tracing::debug!("{} rejected: {}", target, error.code);
        Ok(CognitoReply::Rejected(error))
    }
}

pub(super) fn compute_secret_hash(
    client_secret: &str,
    username: &str,
    client_id: &str,
) -> Result<String, ProviderError> {
    let mac = hmac_sha256(
        client_secret.as_bytes(),
        format!("{username}{client_id}").as_bytes(),
    )?;
    Ok(STANDARD.encode(mac))
}

/// Error body shape: `{"__type": "...#UsernameExistsException", "message": "..."}`
fn parse_error_body(text: &str) -> IdentityError {
    let value: Value = serde_json::from_str(text).unwrap_or(Value::Null);
    let raw_type = value
        .get("__type")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");
    let short_type = raw_type.rsplit('#').next().unwrap_or(raw_type);
    let code = short_type.strip_suffix("Exception").unwrap_or(short_type);
    let description = value
        .get("message")
        .or_else(|| value.get("Message"))
        .and_then(Value::as_str)
        .unwrap_or("The identity provider rejected the request");
    IdentityError::new(code, description)
}

/// Rejections caused by our configuration or the service, not by the end user's input
fn is_service_fault(code: &str) -> bool {
    matches!(
        code,
        "UnrecognizedClient"
            | "InvalidSignature"
            | "MissingAuthenticationToken"
            | "ExpiredToken"
            | "AccessDenied"
            | "ResourceNotFound"
            | "TooManyRequests"
            | "InternalError"
            | "InvalidLambdaResponse"
            | "UnexpectedLambda"
            | "Unknown"
    )
}

fn attribute_list(attributes: &Attributes) -> Value {
    Value::Array(
        attributes
            .iter()
            .map(|(name, value)| json!({ "Name": name, "Value": value }))
            .collect(),
    )
}

fn parse_attributes(value: Option<&Value>) -> Attributes {
    let mut attributes = Attributes::new();
    for entry in value.and_then(Value::as_array).into_iter().flatten() {
        if let (Some(name), Some(value)) = (
            entry.get("Name").and_then(Value::as_str),
            entry.get("Value").and_then(Value::as_str),
        ) {
            // The service never repeats a name; keep the first if it does
            let _ = attributes.add(name, value);
        }
    }
    attributes
}

fn user_from_record(email: &str, record: &Value, attributes_key: &str) -> ProviderUser {
    let mut user = ProviderUser::new(email);
    user.status = record
        .get("UserStatus")
        .and_then(Value::as_str)
        .map(UserStatus::from);
    user.attributes = parse_attributes(record.get(attributes_key));
    user
}

fn escape_filter_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait]
impl IdentityProvider for CognitoIdentityProvider {
    async fn lookup_user(&self, email: &str) -> Result<ProviderUser, ProviderError> {
        if self.config.credentials.is_none() {
            tracing::debug!("No admin credentials, treating {} as a new user", email);
            return Ok(ProviderUser::new(email));
        }

        let body = json!({
            "UserPoolId": self.config.user_pool_id,
            "Username": email,
        });
        match self.call("AdminGetUser", &body, true).await? {
            CognitoReply::Accepted(record) => Ok(user_from_record(email, &record, "UserAttributes")),
            CognitoReply::Rejected(error) if error.code == "UserNotFound" => {
                Ok(ProviderUser::new(email))
            }
            CognitoReply::Rejected(error) => Err(ProviderError::InvalidResponse(format!(
                "AdminGetUser: {}: {}",
                error.code, error.description
            ))),
        }
    }

    async fn find_user_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderUser>, ProviderError> {
        if self.config.credentials.is_none() {
            return Ok(Some(ProviderUser::new(email)));
        }

        let body = json!({
            "UserPoolId": self.config.user_pool_id,
            "Filter": format!("email = \"{}\"", escape_filter_value(email)),
            "Limit": 1,
        });
        match self.call("ListUsers", &body, true).await? {
            CognitoReply::Accepted(reply) => Ok(reply
                .get("Users")
                .and_then(Value::as_array)
                .and_then(|users| users.first())
                .map(|record| user_from_record(email, record, "Attributes"))),
            CognitoReply::Rejected(error) => Err(ProviderError::InvalidResponse(format!(
                "ListUsers: {}: {}",
                error.code, error.description
            ))),
        }
    }

    async fn create_user(
        &self,
        user: &ProviderUser,
        password: &str,
        validation_data: &Attributes,
    ) -> Result<IdentityResult, ProviderError> {
        let mut body = json!({
            "ClientId": self.config.client_id,
            "Username": user.email,
            "Password": password,
            "UserAttributes": attribute_list(&user.attributes),
            "ValidationData": attribute_list(validation_data),
        });
        if let Some(hash) = self.secret_hash(&user.email)? {
            body["SecretHash"] = Value::String(hash);
        }

        match self.call("SignUp", &body, false).await? {
            CognitoReply::Accepted(reply) => {
                let confirmed = reply
                    .get("UserConfirmed")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                tracing::info!("Signed up {} (confirmed: {})", user.email, confirmed);
                Ok(IdentityResult::Succeeded)
            }
            CognitoReply::Rejected(error) => Ok(IdentityResult::Failed(vec![error])),
        }
    }

    async fn confirm_sign_up(
        &self,
        user: &ProviderUser,
        code: &str,
        force_confirm: bool,
    ) -> Result<IdentityResult, ProviderError> {
        // Cognito calls the force flag ForceAliasCreation
        let mut body = json!({
            "ClientId": self.config.client_id,
            "Username": user.email,
            "ConfirmationCode": code,
            "ForceAliasCreation": force_confirm,
        });
        if let Some(hash) = self.secret_hash(&user.email)? {
            body["SecretHash"] = Value::String(hash);
        }

        match self.call("ConfirmSignUp", &body, false).await? {
            CognitoReply::Accepted(_) => {
                tracing::info!("Account confirmed: {}", user.email);
                Ok(IdentityResult::Succeeded)
            }
            CognitoReply::Rejected(error) => Ok(IdentityResult::Failed(vec![error])),
        }
    }

    async fn password_sign_in(
        &self,
        email: &str,
        password: &str,
        remember: bool,
        lockout_on_failure: bool,
    ) -> Result<SignInResult, ProviderError> {
        // Lockout is enforced by the user pool itself
        tracing::debug!("Password sign-in (lockout on failure: {})", lockout_on_failure);

        let mut auth_parameters = json!({
            "USERNAME": email,
            "PASSWORD": password,
        });
        if let Some(hash) = self.secret_hash(email)? {
            auth_parameters["SECRET_HASH"] = Value::String(hash);
        }
        let body = json!({
            "AuthFlow": "USER_PASSWORD_AUTH",
            "ClientId": self.config.client_id,
            "AuthParameters": auth_parameters,
        });

        match self.call("InitiateAuth", &body, false).await? {
            CognitoReply::Accepted(reply) => {
                let access_token = reply
                    .get("AuthenticationResult")
                    .and_then(|result| result.get("AccessToken"))
                    .and_then(Value::as_str);
                match access_token {
                    Some(token) => {
                        let session = self
                            .sessions
                            .issue(email, remember, token.to_string())
                            .await?;
                        Ok(SignInResult::Succeeded(session))
                    }
                    None => {
                        let challenge = reply
                            .get("ChallengeName")
                            .and_then(Value::as_str)
                            .unwrap_or("none");
                        tracing::warn!("Unsupported sign-in challenge: {}", challenge);
                        Ok(SignInResult::NotAllowed)
                    }
                }
            }
            CognitoReply::Rejected(error) => Ok(match error.code.as_str() {
                "UserNotConfirmed" | "PasswordResetRequired" => SignInResult::NotAllowed,
                "NotAuthorized" if error.description.contains("attempts exceeded") => {
                    SignInResult::LockedOut
                }
                _ => SignInResult::Failed,
            }),
        }
    }

    async fn resolve_session(&self, session_id: &str) -> Result<Option<Session>, ProviderError> {
        Ok(self.sessions.resolve(session_id).await)
    }

    async fn sign_out(&self, session: &Session) -> Result<(), ProviderError> {
        let Some(access_token) = self.sessions.revoke(&session.id).await else {
            return Ok(());
        };

        let body = json!({ "AccessToken": access_token });
        if let CognitoReply::Rejected(error) = self.call("GlobalSignOut", &body, false).await? {
            // Token already revoked or expired, nothing left to end
            tracing::warn!("GlobalSignOut rejected: {}", error.code);
        }
        Ok(())
    }
}
