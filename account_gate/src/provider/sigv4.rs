//! AWS Signature Version 4 for the administrative user pool calls

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::provider::errors::ProviderError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

pub(super) struct SigningParams<'a> {
    pub(super) access_key_id: &'a str,
    pub(super) secret_access_key: &'a str,
    pub(super) session_token: Option<&'a str>,
    pub(super) region: &'a str,
    pub(super) service: &'a str,
    pub(super) host: &'a str,
}

pub(super) fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, ProviderError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ProviderError::Crypto(format!("Invalid HMAC key: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn signing_key(
    secret_access_key: &str,
    date_stamp: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, ProviderError> {
    let k_date = hmac_sha256(
        format!("AWS4{secret_access_key}").as_bytes(),
        date_stamp.as_bytes(),
    )?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// Sign a JSON RPC `POST /` request and return the headers to attach
///
/// `content_type` and `target` must be sent exactly as given since both are signed.
pub(super) fn sign_request(
    params: &SigningParams<'_>,
    content_type: &str,
    target: &str,
    payload: &[u8],
    now: DateTime<Utc>,
) -> Result<Vec<(&'static str, String)>, ProviderError> {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = now.format("%Y%m%d").to_string();

    // Canonical headers are sorted by lowercase name
    let mut canonical_headers = vec![
        ("content-type", content_type.to_string()),
        ("host", params.host.to_string()),
        ("x-amz-date", amz_date.clone()),
    ];
    if let Some(token) = params.session_token {
        canonical_headers.push(("x-amz-security-token", token.to_string()));
    }
    canonical_headers.push(("x-amz-target", target.to_string()));

    let signed_headers = canonical_headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");
    let canonical_header_block: String = canonical_headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();

    let canonical_request = format!(
        "POST\n/\n\n{canonical_header_block}\n{signed_headers}\n{}",
        sha256_hex(payload)
    );

    let credential_scope = format!(
        "{date_stamp}/{}/{}/aws4_request",
        params.region, params.service
    );
    let string_to_sign = format!(
        "{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(
        params.secret_access_key,
        &date_stamp,
        params.region,
        params.service,
    )?;
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

    let authorization = format!(
        "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
        params.access_key_id
    );

    let mut headers = vec![("X-Amz-Date", amz_date)];
    if let Some(token) = params.session_token {
        headers.push(("X-Amz-Security-Token", token.to_string()));
    }
    headers.push(("Authorization", authorization));
    Ok(headers)
}
