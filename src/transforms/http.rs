//! HTTP export stage.
//!
//! # Responsibilities
//! - POST the previous function's output to a configured endpoint
//! - Optionally attach a header whose value comes from the secret provider
//! - Optionally present a client certificate (mutual TLS)
//! - On a failed send, leave the payload in the context's retry slot when
//!   persist-on-error is set
//!
//! Only a 2xx response counts as success; its body is returned verbatim.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

use crate::net::tls::{self, TlsError, TlsMaterial};
use crate::observability::metrics;
use crate::pipeline::{PipelineContext, PipelineData};
use crate::security::SecretError;

pub const DEFAULT_MIME_TYPE: &str = "application/json";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no data received")]
    NoData,

    #[error("failed to convert data to bytes: {0}")]
    Coerce(#[source] serde_json::Error),

    #[error("invalid export URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("{0}")]
    SecretConfig(&'static str),

    #[error("no secret provider available to resolve the export header")]
    NoSecretProvider,

    #[error("failed to resolve export header secret: {0}")]
    Secret(#[from] SecretError),

    #[error("cert_file, key_file and ca_file must be set together")]
    IncompleteTls,

    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("POST to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("export failed with {0} HTTP status code")]
    Status(u16),
}

impl ExportError {
    /// Whether the failure happened on the wire, i.e. after the payload
    /// was eligible for persistence.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExportError::Transport { .. } | ExportError::Body { .. } | ExportError::Status(_)
        )
    }
}

/// Export stage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpSenderConfig {
    pub url: String,
    /// Sent as `Content-Type`; empty means `application/json`.
    pub mime_type: String,
    pub persist_on_error: bool,
    /// Header set from the secret at `secret_path`. Set both or neither.
    pub secret_header_name: String,
    pub secret_path: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
    pub ca_file: Option<PathBuf>,
}

impl Default for HttpSenderConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            mime_type: String::new(),
            persist_on_error: false,
            secret_header_name: String::new(),
            secret_path: String::new(),
            timeout_secs: 30,
            cert_file: None,
            key_file: None,
            ca_file: None,
        }
    }
}

impl HttpSenderConfig {
    pub fn new(url: impl Into<String>, mime_type: impl Into<String>, persist_on_error: bool) -> Self {
        Self {
            url: url.into(),
            mime_type: mime_type.into(),
            persist_on_error,
            ..Self::default()
        }
    }

    pub fn with_secret_header(
        mut self,
        header_name: impl Into<String>,
        secret_path: impl Into<String>,
    ) -> Self {
        self.secret_header_name = header_name.into();
        self.secret_path = secret_path.into();
        self
    }

    pub fn with_tls(mut self, material: TlsMaterial) -> Self {
        self.cert_file = Some(material.cert_path);
        self.key_file = Some(material.key_path);
        self.ca_file = Some(material.ca_path);
        self
    }

    /// Client certificate settings, if any were given.
    ///
    /// A partially filled triple is an error rather than a silent
    /// downgrade to plain TLS.
    fn tls_material(&self) -> Result<Option<TlsMaterial>, ExportError> {
        match (&self.cert_file, &self.key_file, &self.ca_file) {
            (None, None, None) => Ok(None),
            (Some(cert), Some(key), Some(ca)) => {
                Ok(Some(TlsMaterial::new(cert.clone(), key.clone(), ca.clone())))
            }
            _ => Err(ExportError::IncompleteTls),
        }
    }
}

/// POSTs pipeline output to one endpoint.
#[derive(Debug, Clone)]
pub struct HttpSender {
    url: Url,
    mime_type: String,
    persist_on_error: bool,
    secret_header_name: String,
    secret_path: String,
    http: reqwest::Client,
}

impl HttpSender {
    /// Build the sender and its HTTP client.
    ///
    /// Certificate problems surface here, before any export is attempted.
    pub fn new(config: HttpSenderConfig) -> Result<Self, ExportError> {
        let url = Url::parse(&config.url).map_err(|source| ExportError::InvalidUrl {
            url: config.url.clone(),
            source,
        })?;

        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs.max(1)));
        if let Some(material) = config.tls_material()? {
            builder = tls::configure_client(builder, &material)?;
        }
        let http = builder.build().map_err(ExportError::Client)?;

        let mime_type = if config.mime_type.is_empty() {
            DEFAULT_MIME_TYPE.to_string()
        } else {
            config.mime_type
        };

        Ok(Self {
            url,
            mime_type,
            persist_on_error: config.persist_on_error,
            secret_header_name: config.secret_header_name,
            secret_path: config.secret_path,
            http,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// `Ok(true)` when both secret fields are set, `Ok(false)` when both
    /// are empty, an error otherwise.
    pub fn determine_if_using_secrets(&self) -> Result<bool, ExportError> {
        match (self.secret_header_name.is_empty(), self.secret_path.is_empty()) {
            (true, true) => Ok(false),
            (false, false) => Ok(true),
            (true, false) => Err(ExportError::SecretConfig(
                "secret path was specified but no header name was provided",
            )),
            (false, true) => Err(ExportError::SecretConfig(
                "secret header name was provided but no secret path was provided",
            )),
        }
    }

    /// Count a failed send and, for wire failures, leave `data` in the
    /// retry slot when persist-on-error is set.
    fn fail(
        &self,
        ctx: &mut PipelineContext,
        data: Vec<u8>,
        outcome: &'static str,
        err: ExportError,
    ) -> ExportError {
        metrics::record_export_attempt(outcome);
        if self.persist_on_error && err.is_retryable() {
            ctx.set_retry_data(data);
        }
        err
    }

    /// Send `data` and return the response body of a 2xx reply.
    pub async fn http_post(
        &self,
        ctx: &mut PipelineContext,
        data: Option<&PipelineData>,
    ) -> Result<Vec<u8>, ExportError> {
        let data = data.ok_or(ExportError::NoData)?;
        let export_data = data.coerce_type().map_err(ExportError::Coerce)?;
        let using_secrets = self.determine_if_using_secrets()?;

        let mut request = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, self.mime_type.as_str())
            .body(export_data.clone());

        if using_secrets {
            let provider = ctx.secret_provider().ok_or(ExportError::NoSecretProvider)?;
            let mut secrets = provider
                .get_secrets(&self.secret_path, &[self.secret_header_name.as_str()])
                .await?;
            let value = secrets.remove(&self.secret_header_name).unwrap_or_default();
            request = request.header(self.secret_header_name.as_str(), value);
        }

        debug!(url = %self.url, "POSTing data");
        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                let url = self.url.to_string();
                let err = ExportError::Transport { url, source };
                return Err(self.fail(ctx, export_data, "transport_error", err));
            }
        };

        let status = response.status();
        debug!(status = %status, "Response received");

        let body = match response.bytes().await {
            Ok(body) => body,
            Err(source) => {
                let url = self.url.to_string();
                let err = ExportError::Body { url, source };
                return Err(self.fail(ctx, export_data, "body_error", err));
            }
        };

        trace!(
            transport = "HTTP",
            correlation_id = %ctx.correlation_id(),
            "Data exported"
        );

        if !status.is_success() {
            let err = ExportError::Status(status.as_u16());
            return Err(self.fail(ctx, export_data, "status_error", err));
        }

        metrics::record_export_attempt("success");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::registry::Registry;

    fn sender(header: &str, path: &str) -> HttpSender {
        HttpSender::new(
            HttpSenderConfig::new("http://127.0.0.1:1/export", "", true)
                .with_secret_header(header, path),
        )
        .unwrap()
    }

    #[test]
    fn test_determine_if_using_secrets() {
        assert!(!sender("", "").determine_if_using_secrets().unwrap());
        assert!(sender("X-Api-Key", "export").determine_if_using_secrets().unwrap());
        assert!(matches!(
            sender("", "export").determine_if_using_secrets(),
            Err(ExportError::SecretConfig(_))
        ));
        assert!(matches!(
            sender("X-Api-Key", "").determine_if_using_secrets(),
            Err(ExportError::SecretConfig(_))
        ));
    }

    #[test]
    fn test_default_mime_type() {
        assert_eq!(sender("", "").mime_type(), DEFAULT_MIME_TYPE);
        let custom = HttpSender::new(HttpSenderConfig::new("http://localhost/", "text/plain", false))
            .unwrap();
        assert_eq!(custom.mime_type(), "text/plain");
    }

    #[test]
    fn test_invalid_url() {
        let err = HttpSender::new(HttpSenderConfig::new("not a url", "", false)).unwrap_err();
        assert!(matches!(err, ExportError::InvalidUrl { .. }));
    }

    #[test]
    fn test_missing_tls_files_fail_construction() {
        let config = HttpSenderConfig::new("https://localhost:8443/", "", false).with_tls(
            TlsMaterial::new("/no/cert.pem", "/no/key.pem", "/no/ca.pem"),
        );
        assert!(matches!(HttpSender::new(config), Err(ExportError::Tls(_))));
    }

    #[test]
    fn test_partial_tls_settings_rejected() {
        let config = HttpSenderConfig {
            url: "https://localhost:8443/".into(),
            cert_file: Some("/no/cert.pem".into()),
            ..HttpSenderConfig::default()
        };
        assert!(matches!(HttpSender::new(config), Err(ExportError::IncompleteTls)));
    }

    #[tokio::test]
    async fn test_no_data() {
        let mut ctx = PipelineContext::new("corr", Arc::new(Registry::new()));
        let err = sender("", "").http_post(&mut ctx, None).await.unwrap_err();
        assert!(matches!(err, ExportError::NoData));
        assert!(!err.is_retryable());
        assert!(ctx.retry_data().is_none());
    }

    #[test]
    fn test_only_wire_failures_fill_retry_slot() {
        let mut ctx = PipelineContext::new("corr", Arc::new(Registry::new()));
        let sender = sender("", "");

        let err = sender.fail(&mut ctx, b"kept".to_vec(), "status_error", ExportError::Status(502));
        assert!(err.is_retryable());
        assert_eq!(ctx.take_retry_data(), Some(b"kept".to_vec()));

        let err = sender.fail(&mut ctx, b"dropped".to_vec(), "no_data", ExportError::NoData);
        assert!(!err.is_retryable());
        assert!(ctx.retry_data().is_none());
    }

    #[test]
    fn test_wire_failures_respect_persist_flag() {
        let mut ctx = PipelineContext::new("corr", Arc::new(Registry::new()));
        let sender = HttpSender::new(HttpSenderConfig::new("http://127.0.0.1:1/", "", false)).unwrap();

        sender.fail(&mut ctx, b"payload".to_vec(), "status_error", ExportError::Status(500));
        assert!(ctx.retry_data().is_none());
    }

    #[tokio::test]
    async fn test_secrets_without_provider() {
        let mut ctx = PipelineContext::new("corr", Arc::new(Registry::new()));
        let data = PipelineData::from("payload");
        let err = sender("X-Api-Key", "export")
            .http_post(&mut ctx, Some(&data))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::NoSecretProvider));
        assert!(ctx.retry_data().is_none());
    }

    #[test]
    fn test_config_from_toml() {
        let config: HttpSenderConfig = toml::from_str(
            r#"
            url = "http://localhost:7770/export"
            persist_on_error = true
            "#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.persist_on_error);
        assert!(config.tls_material().unwrap().is_none());
    }
}
