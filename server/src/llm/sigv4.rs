//! AWS Signature Version 4 for Bedrock runtime requests.
//!
//! DESIGN
//! ======
//! Only what `InvokeModel` needs: header-based signing, no query string,
//! static credentials. Callers pass the headers they want signed (at least
//! `host`); `sign` adds `x-amz-date` and, for temporary credentials,
//! `x-amz-security-token`, then returns the full header set including
//! `authorization`.
//!
//! Paths are encoded twice: once when the request URL is built (the model id
//! contains `:`), and again here for the canonical request, as every AWS
//! service except S3 expects.

use std::collections::BTreeMap;
use std::fmt::Write;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

use super::config::AwsCredentials;
use super::types::LlmError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Scope a signature is valid for.
pub struct SigningScope<'a> {
    pub region: &'a str,
    pub service: &'a str,
}

/// Sign a request and return the headers to send, keyed by lowercase name.
///
/// # Errors
///
/// Returns [`LlmError::Signing`] if the HMAC key cannot be initialized.
pub fn sign(
    credentials: &AwsCredentials,
    scope: &SigningScope<'_>,
    method: &str,
    path: &str,
    mut headers: BTreeMap<String, String>,
    body: &[u8],
    now: OffsetDateTime,
) -> Result<BTreeMap<String, String>, LlmError> {
    let amz_date = amz_date(now);
    let date = &amz_date[..8];

    headers.insert("x-amz-date".into(), amz_date.clone());
    if let Some(token) = &credentials.session_token {
        headers.insert("x-amz-security-token".into(), token.clone());
    }

    let signed_headers = headers.keys().map(String::as_str).collect::<Vec<_>>().join(";");
    let canonical = canonical_request(method, path, &headers, &signed_headers, &sha256_hex(body));
    let credential_scope = format!("{date}/{}/{}/aws4_request", scope.region, scope.service);
    let string_to_sign = format!("{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}", sha256_hex(canonical.as_bytes()));

    let key = signing_key(&credentials.secret_access_key, date, scope.region, scope.service)?;
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes())?);

    headers.insert(
        "authorization".into(),
        format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
            credentials.access_key_id
        ),
    );
    Ok(headers)
}

/// Derive the per-day signing key.
///
/// # Errors
///
/// Returns [`LlmError::Signing`] if the HMAC key cannot be initialized.
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>, LlmError> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

/// Percent-encode per RFC 3986, leaving unreserved characters alone.
#[must_use]
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(char::from(byte)),
            b'/' if !encode_slash => out.push('/'),
            other => {
                let _ = write!(out, "%{other:02X}");
            }
        }
    }
    out
}

fn canonical_request(
    method: &str,
    path: &str,
    headers: &BTreeMap<String, String>,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    let canonical_uri = if path.is_empty() { "/".to_string() } else { uri_encode(path, false) };
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{}\n", value.trim()))
        .collect();
    format!("{method}\n{canonical_uri}\n\n{canonical_headers}\n{signed_headers}\n{payload_hash}")
}

fn amz_date(now: OffsetDateTime) -> String {
    let utc = now.to_offset(time::UtcOffset::UTC);
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second()
    )
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, LlmError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| LlmError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
#[path = "sigv4_test.rs"]
mod tests;
