//! S3-compatible object store client.
//!
//! Blocking reqwest client (no Tokio runtime required) with
//! hand-rolled AWS Signature V4: header signing for PUT/GET and
//! query-string presigning for time-limited download links.
//! Path-style addressing, so Yandex Object Storage and MinIO-style
//! endpoints work unchanged.

mod client;
mod sigv4;

pub use client::{ObjectStore, StorageError};
