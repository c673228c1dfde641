//! AWS Signature Version 4 signing for S3-compatible backends.
//!
//! Supports query-string presigning (grants) and header signing (requests the
//! gateway sends itself, such as object deletion).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::BackendError;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Payload hash used by presigned URLs, whose body is unknown at signing time.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// SHA-256 of the empty body.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Signs requests with a fixed access key for one region and service.
#[derive(Clone)]
pub struct SigV4Signer {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    service: String,
}

impl SigV4Signer {
    /// Create a signer for the `s3` service.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            service: "s3".to_string(),
        }
    }

    fn scope(&self, date: &str) -> String {
        format!("{date}/{}/{}/aws4_request", self.region, self.service)
    }

    /// Build the query string of a presigned URL, signature included.
    ///
    /// `canonical_uri` must already be URI-encoded. `extra_headers` are headers
    /// the eventual request must carry with exactly these values; `host` is
    /// always signed.
    pub fn presign_query(
        &self,
        method: &str,
        host: &str,
        canonical_uri: &str,
        expires_secs: u64,
        extra_headers: &[(&str, &str)],
        now: DateTime<Utc>,
    ) -> Result<String, BackendError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = self.scope(&date);

        let mut headers = vec![("host", host)];
        headers.extend_from_slice(extra_headers);
        let (canonical_headers, signed_headers) = canonicalize_headers(&headers);

        let mut params = BTreeMap::new();
        params.insert("X-Amz-Algorithm", ALGORITHM.to_string());
        params.insert(
            "X-Amz-Credential",
            format!("{}/{scope}", self.access_key_id),
        );
        params.insert("X-Amz-Date", amz_date.clone());
        params.insert("X-Amz-Expires", expires_secs.to_string());
        params.insert("X-Amz-SignedHeaders", signed_headers.clone());

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", uri_encode(k, true), uri_encode(v, true)))
            .collect::<Vec<_>>()
            .join("&");

        let canonical_request = format!(
            "{method}\n{canonical_uri}\n{query}\n{canonical_headers}\n{signed_headers}\n{UNSIGNED_PAYLOAD}"
        );
        let signature = self.signature(&date, &amz_date, &scope, &canonical_request)?;

        Ok(format!("{query}&X-Amz-Signature={signature}"))
    }

    /// Compute the headers that authenticate a request without query parameters.
    ///
    /// Returns `(name, value)` pairs for `authorization`, `x-amz-content-sha256`
    /// and `x-amz-date`; the caller sends them together with `extra_headers`.
    pub fn sign_request(
        &self,
        method: &str,
        host: &str,
        canonical_uri: &str,
        extra_headers: &[(&str, &str)],
        payload_sha256: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<(&'static str, String)>, BackendError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let scope = self.scope(&date);

        let mut headers = vec![
            ("host", host),
            ("x-amz-content-sha256", payload_sha256),
            ("x-amz-date", amz_date.as_str()),
        ];
        headers.extend_from_slice(extra_headers);
        let (canonical_headers, signed_headers) = canonicalize_headers(&headers);

        let canonical_request = format!(
            "{method}\n{canonical_uri}\n\n{canonical_headers}\n{signed_headers}\n{payload_sha256}"
        );
        let signature = self.signature(&date, &amz_date, &scope, &canonical_request)?;

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key_id
        );

        Ok(vec![
            ("authorization", authorization),
            ("x-amz-content-sha256", payload_sha256.to_string()),
            ("x-amz-date", amz_date),
        ])
    }

    fn signature(
        &self,
        date: &str,
        amz_date: &str,
        scope: &str,
        canonical_request: &str,
    ) -> Result<String, BackendError> {
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let secret = format!("AWS4{}", self.secret_access_key);
        let k_date = hmac_sha256(secret.as_bytes(), date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, self.service.as_bytes())?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;

        Ok(hex::encode(hmac_sha256(
            &k_signing,
            string_to_sign.as_bytes(),
        )?))
    }
}

impl std::fmt::Debug for SigV4Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigV4Signer")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, BackendError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| BackendError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Lowercase, trim and sort headers into the canonical block and the
/// `SignedHeaders` list.
fn canonicalize_headers(headers: &[(&str, &str)]) -> (String, String) {
    let sorted: BTreeMap<String, String> = headers
        .iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    let canonical = sorted
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect::<String>();
    let signed = sorted.keys().cloned().collect::<Vec<_>>().join(";");

    (canonical, signed)
}

/// Percent-encode per the SigV4 rules: unreserved characters pass through,
/// everything else becomes `%XX` of its UTF-8 bytes.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut result = String::with_capacity(input.len());
    for byte in input.bytes() {
        let c = byte as char;
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '~' | '.') || (c == '/' && !encode_slash)
        {
            result.push(c);
        } else {
            result.push_str(&format!("%{byte:02X}"));
        }
    }
    result
}
