//! Blocking object-store client over reqwest.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use url::Url;

use crate::sigv4::{self, SigningContext, UNSIGNED_PAYLOAD};

/// SHA-256 of an empty body, for signed GETs.
const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// Error type for object-store operations.
#[derive(Debug)]
pub enum StorageError {
    /// Object key does not exist
    NotFound,
    /// Malformed endpoint URL
    InvalidEndpoint(String),
    /// Network error
    Network(String),
    /// HTTP error with status code
    Http(u16, String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::NotFound => write!(f, "object not found"),
            StorageError::InvalidEndpoint(msg) => write!(f, "invalid endpoint: {}", msg),
            StorageError::Network(msg) => write!(f, "network error: {}", msg),
            StorageError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// S3-compatible object store client (blocking, path-style).
#[derive(Debug, Clone)]
pub struct ObjectStore {
    http: reqwest::blocking::Client,
    endpoint: Url,
    region: String,
    bucket: String,
    access_key: String,
    secret_key: String,
}

impl ObjectStore {
    pub fn new(
        endpoint: &str,
        region: impl Into<String>,
        bucket: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| StorageError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        if endpoint.host_str().is_none() {
            return Err(StorageError::InvalidEndpoint(endpoint.to_string()));
        }
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("kassa/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Ok(Self {
            http,
            endpoint,
            region: region.into(),
            bucket: bucket.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        })
    }

    fn ctx(&self) -> SigningContext<'_> {
        SigningContext {
            access_key: &self.access_key,
            secret_key: &self.secret_key,
            region: &self.region,
            service: "s3",
        }
    }

    /// Host header value: hostname plus explicit non-default port.
    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Path-style object path, URI-encoded per segment.
    fn object_path(&self, key: &str) -> String {
        format!(
            "/{}/{}",
            sigv4::uri_encode(&self.bucket, true),
            sigv4::uri_encode(key, false)
        )
    }

    fn object_url(&self, key: &str) -> String {
        let base = self.endpoint.as_str().trim_end_matches('/');
        format!("{}{}", base, self.object_path(key))
    }

    /// Upload an object, overwriting any existing one.
    pub fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let payload_hash = sigv4::sha256_hex(&body);
        let (date, authorization) = sigv4::signed_headers(
            &self.ctx(),
            &Utc::now(),
            "PUT",
            &self.host(),
            &self.object_path(key),
            &payload_hash,
        );

        let response = self
            .http
            .put(self.object_url(key))
            .header("x-amz-date", date)
            .header("x-amz-content-sha256", payload_hash)
            .header("authorization", authorization)
            .header("content-type", content_type)
            .body(body)
            .send()
            .map_err(|e| StorageError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StorageError::Http(status.as_u16(), body_excerpt(response)))
        }
    }

    /// Download an object. A missing key is `NotFound`, not a generic
    /// HTTP error.
    pub fn get_object(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let (date, authorization) = sigv4::signed_headers(
            &self.ctx(),
            &Utc::now(),
            "GET",
            &self.host(),
            &self.object_path(key),
            EMPTY_PAYLOAD_SHA256,
        );

        let response = self
            .http
            .get(self.object_url(key))
            .header("x-amz-date", date)
            .header("x-amz-content-sha256", EMPTY_PAYLOAD_SHA256)
            .header("authorization", authorization)
            .send()
            .map_err(|e| StorageError::Network(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(StorageError::NotFound);
        }
        if !status.is_success() {
            return Err(StorageError::Http(status.as_u16(), body_excerpt(response)));
        }
        let bytes = response
            .bytes()
            .map_err(|e| StorageError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    /// Build a presigned GET link valid for `ttl_secs`. Pure
    /// computation, no request is made.
    pub fn presign_get(&self, key: &str, ttl_secs: u64) -> String {
        self.presign_get_at(key, ttl_secs, Utc::now())
    }

    fn presign_get_at(&self, key: &str, ttl_secs: u64, now: DateTime<Utc>) -> String {
        let query = sigv4::presigned_query(
            &self.ctx(),
            &now,
            &self.host(),
            &self.object_path(key),
            ttl_secs,
        );
        format!("{}?{}", self.object_url(key), query)
    }
}

fn body_excerpt(response: reqwest::blocking::Response) -> String {
    let mut text = response.text().unwrap_or_default();
    text.truncate(200);
    text
}
