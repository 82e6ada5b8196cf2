//! AWS Signature Version 4 primitives.
//!
//! Only what the client needs: SHA-256 hashing, the HMAC key
//! derivation chain, canonical request construction for header-signed
//! requests and presigned query strings.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// Static signing inputs, borrowed from the client.
#[derive(Debug, Clone, Copy)]
pub struct SigningContext<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
    pub region: &'a str,
    pub service: &'a str,
}

pub fn sha256_hex(data: &[u8]) -> String {
    to_hex(&Sha256::digest(data))
}

pub fn to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("hmac accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// SigV4 URI encoding: unreserved characters pass through, everything
/// else becomes uppercase percent escapes. `/` is kept literal in
/// paths and encoded in query values.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn scope_date(now: &DateTime<Utc>) -> String {
    now.format("%Y%m%d").to_string()
}

pub fn amz_date(now: &DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn credential_scope(ctx: &SigningContext<'_>, now: &DateTime<Utc>) -> String {
    format!("{}/{}/{}/aws4_request", scope_date(now), ctx.region, ctx.service)
}

/// Derive the signing key: chained HMACs over date, region, service.
fn signing_key(ctx: &SigningContext<'_>, now: &DateTime<Utc>) -> Vec<u8> {
    let secret = format!("AWS4{}", ctx.secret_key);
    let k_date = hmac_sha256(secret.as_bytes(), scope_date(now).as_bytes());
    let k_region = hmac_sha256(&k_date, ctx.region.as_bytes());
    let k_service = hmac_sha256(&k_region, ctx.service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

fn canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k, true), uri_encode(v, true)))
        .collect();
    encoded.sort();
    encoded
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn sign(ctx: &SigningContext<'_>, now: &DateTime<Utc>, canonical_request: &str) -> String {
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date(now),
        credential_scope(ctx, now),
        sha256_hex(canonical_request.as_bytes())
    );
    to_hex(&hmac_sha256(&signing_key(ctx, now), string_to_sign.as_bytes()))
}

/// Headers for a header-signed request: (x-amz-date, authorization).
/// `path` must already be URI-encoded; the query is assumed empty
/// (the client never signs query parameters on PUT/GET).
pub fn signed_headers(
    ctx: &SigningContext<'_>,
    now: &DateTime<Utc>,
    method: &str,
    host: &str,
    path: &str,
    payload_hash: &str,
) -> (String, String) {
    let date = amz_date(now);
    let canonical_headers = format!(
        "host:{}\nx-amz-content-sha256:{}\nx-amz-date:{}\n",
        host, payload_hash, date
    );
    let signed = "host;x-amz-content-sha256;x-amz-date";
    let canonical_request = format!(
        "{}\n{}\n\n{}\n{}\n{}",
        method, path, canonical_headers, signed, payload_hash
    );
    let signature = sign(ctx, now, &canonical_request);
    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM,
        ctx.access_key,
        credential_scope(ctx, now),
        signed,
        signature
    );
    (date, authorization)
}

/// Query string for a presigned GET, signature included. Appended
/// verbatim to the object URL.
pub fn presigned_query(
    ctx: &SigningContext<'_>,
    now: &DateTime<Utc>,
    host: &str,
    path: &str,
    expires_secs: u64,
) -> String {
    let params = vec![
        ("X-Amz-Algorithm".to_string(), ALGORITHM.to_string()),
        (
            "X-Amz-Credential".to_string(),
            format!("{}/{}", ctx.access_key, credential_scope(ctx, now)),
        ),
        ("X-Amz-Date".to_string(), amz_date(now)),
        ("X-Amz-Expires".to_string(), expires_secs.to_string()),
        ("X-Amz-SignedHeaders".to_string(), "host".to_string()),
    ];
    let query = canonical_query(&params);
    let canonical_request = format!(
        "GET\n{}\n{}\nhost:{}\n\nhost\n{}",
        path, query, host, UNSIGNED_PAYLOAD
    );
    let signature = sign(ctx, now, &canonical_request);
    format!("{}&X-Amz-Signature={}", query, signature)
}
