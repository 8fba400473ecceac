use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use ring::rand::SecureRandom;
use thiserror::Error;

pub(crate) fn base64url_encode(input: Vec<u8>) -> String {
    URL_SAFE_NO_PAD.encode(input)
}

pub(crate) fn gen_random_bytes(len: usize) -> Result<Vec<u8>, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random bytes".to_string()))?;
    Ok(bytes)
}

pub(crate) fn gen_random_string(len: usize) -> Result<String, UtilError> {
    Ok(base64url_encode(gen_random_bytes(len)?))
}

/// Random decimal code of `digits` length, e.g. a signup confirmation code
pub(crate) fn gen_random_digits(digits: usize) -> Result<String, UtilError> {
    let bytes = gen_random_bytes(digits)?;
    Ok(bytes.iter().map(|b| char::from(b'0' + b % 10)).collect())
}

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Expiry error: {0}")]
    Expiry(String),
}
