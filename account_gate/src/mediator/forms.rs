use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::sync::LazyLock;

use super::errors::ModelError;

const MAX_FIELD_LENGTH: usize = 256;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Signup submission
#[derive(Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Password", default)]
    pub password: String,
}

/// Confirmation code submission
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfirmForm {
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Code", default)]
    pub code: String,
}

/// Login submission
#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(rename = "Email", default)]
    pub email: String,
    #[serde(rename = "Password", default)]
    pub password: String,
    #[serde(rename = "RememberMe", default, deserialize_with = "checkbox")]
    pub remember_me: bool,
}

impl fmt::Debug for SignupForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("remember_me", &self.remember_me)
            .finish()
    }
}

impl SignupForm {
    pub fn validate(&self) -> Vec<ModelError> {
        let mut errors = validate_email(&self.email);
        errors.extend(validate_password(&self.password));
        errors
    }
}

impl ConfirmForm {
    pub fn validate(&self) -> Vec<ModelError> {
        let mut errors = validate_email(&self.email);
        let code = self.code.trim();
        if code.is_empty() {
            errors.push(ModelError::new("Code", "The Code field is required."));
        } else if code.chars().any(char::is_whitespace) {
            errors.push(ModelError::new("Code", "The Code field must not contain spaces."));
        }
        errors
    }
}

impl LoginForm {
    pub fn validate(&self) -> Vec<ModelError> {
        let mut errors = validate_email(&self.email);
        errors.extend(validate_password(&self.password));
        errors
    }
}

/// HTML checkboxes submit `on` unless given a value; anything unrecognised is unchecked
fn checkbox<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => true,
        "false" | "off" | "0" | "" => false,
        other => {
            tracing::debug!("Treating checkbox value {:?} as unchecked", other);
            false
        }
    })
}

fn validate_email(email: &str) -> Vec<ModelError> {
    let email = email.trim();
    if email.is_empty() {
        return vec![ModelError::new("Email", "The Email field is required.")];
    }
    if email.chars().count() > MAX_FIELD_LENGTH {
        return vec![ModelError::new(
            "Email",
            format!("The field Email must be a string with a maximum length of {MAX_FIELD_LENGTH}."),
        )];
    }
    match EMAIL_PATTERN.as_ref() {
        Some(pattern) if pattern.is_match(email) => vec![],
        Some(_) => vec![ModelError::new(
            "Email",
            "The Email field is not a valid e-mail address.",
        )],
        None => {
            tracing::error!("Email pattern failed to compile");
            vec![ModelError::new("Email", "The Email field could not be validated.")]
        }
    }
}

// The provider enforces its own password policy; only the shape is checked here
fn validate_password(password: &str) -> Vec<ModelError> {
    if password.is_empty() {
        vec![ModelError::new("Password", "The Password field is required.")]
    } else if password.chars().count() > MAX_FIELD_LENGTH {
        vec![ModelError::new(
            "Password",
            format!(
                "The field Password must be a string with a maximum length of {MAX_FIELD_LENGTH}."
            ),
        )]
    } else {
        vec![]
    }
}
