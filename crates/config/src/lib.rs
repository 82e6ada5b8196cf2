// Configuration loading
// Everything comes from the process environment; defaults match the
// original deployment (Yandex Object Storage, port 8080).

use std::env;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

const DEFAULT_ENDPOINT: &str = "https://storage.yandexcloud.net";
const DEFAULT_REGION: &str = "ru-central1";
const DEFAULT_BUCKET: &str = "my-bucket-name";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_TEMPLATE: &str = "template.xlsx";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidPort(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort(v) => write!(f, "invalid KASSA_PORT value {:?}", v),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Service settings. Credentials default to empty strings rather than
/// erroring so that a template-only dry run can still boot; uploads
/// against a real bucket will fail with 403 until they are set.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Settings {
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_bucket: String,
    #[serde(skip_serializing)]
    pub s3_access_key: String,
    #[serde(skip_serializing)]
    pub s3_secret_key: String,
    pub port: u16,
    pub template_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key→value source. Tests feed maps in.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("KASSA_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };
        Ok(Self {
            s3_endpoint: lookup("S3_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.into()),
            s3_region: lookup("S3_REGION").unwrap_or_else(|| DEFAULT_REGION.into()),
            s3_bucket: lookup("S3_BUCKET").unwrap_or_else(|| DEFAULT_BUCKET.into()),
            s3_access_key: lookup("S3_ACCESS_KEY").unwrap_or_default(),
            s3_secret_key: lookup("S3_SECRET_KEY").unwrap_or_default(),
            port,
            template_path: lookup("KASSA_TEMPLATE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from<'a>(map: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| map.get(key).map(|v| v.to_string())
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(|_| None).unwrap();
        assert_eq!(settings.s3_endpoint, DEFAULT_ENDPOINT);
        assert_eq!(settings.s3_region, DEFAULT_REGION);
        assert_eq!(settings.s3_bucket, DEFAULT_BUCKET);
        assert_eq!(settings.s3_access_key, "");
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.template_path, PathBuf::from("template.xlsx"));
    }

    #[test]
    fn test_explicit_values_win() {
        let map = HashMap::from([
            ("S3_ENDPOINT", "http://localhost:9000"),
            ("S3_BUCKET", "register"),
            ("S3_ACCESS_KEY", "AKID"),
            ("S3_SECRET_KEY", "SECRET"),
            ("KASSA_PORT", "9090"),
            ("KASSA_TEMPLATE", "/srv/template.xlsx"),
        ]);
        let settings = Settings::from_lookup(lookup_from(&map)).unwrap();
        assert_eq!(settings.s3_endpoint, "http://localhost:9000");
        assert_eq!(settings.s3_bucket, "register");
        assert_eq!(settings.s3_access_key, "AKID");
        assert_eq!(settings.port, 9090);
        assert_eq!(settings.template_path, PathBuf::from("/srv/template.xlsx"));
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let map = HashMap::from([("KASSA_PORT", "lots")]);
        let err = Settings::from_lookup(lookup_from(&map)).unwrap_err();
        assert_eq!(err, ConfigError::InvalidPort("lots".into()));
    }
}
