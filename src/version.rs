//! Semantic version handling and the major-version gate.
//!
//! The gate compares only the first dot-separated token of each version,
//! as strings, after dropping a leading marker such as `v`. Minor, patch,
//! and any `-dev.N` suffix never influence the outcome.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::clients::{ClientError, RemoteClient};
use crate::resilience::{retry_until_elapsed, RetryError, StartupTimer};

/// Version the core services report while running unreleased builds.
pub const CORE_PRE_RELEASE_VERSION: &str = "master";
/// JSON key holding the version in the core services response.
pub const CORE_SERVICE_VERSION_KEY: &str = "version";

/// Errors that stop the compatibility check.
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("SDK version '{0}' is malformed")]
    MalformedSdkVersion(String),

    #[error("Core Services version '{0}' is malformed")]
    MalformedCoreVersion(String),

    #[error("no client configured to reach Core Services")]
    NoVersionSource,

    #[error("unable to get version of Core Services: {0}")]
    Unreachable(#[source] RetryError<ClientError>),

    #[error("unable to decode Core Services version data: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("Core Services version data missing '{0}' information")]
    MissingKey(&'static str),
}

/// Outcome of a completed compatibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compatibility {
    /// The check was disabled.
    Skipped,
    /// The SDK reports major version 0 (beta build or debugger run).
    SdkPreRelease,
    /// The core services report the pre-release sentinel.
    CorePreRelease,
    /// Major versions match.
    Compatible { sdk: String, core: String },
    /// Major versions differ.
    Incompatible { sdk: String, core: String },
}

impl Compatibility {
    pub fn is_compatible(&self) -> bool {
        !matches!(self, Compatibility::Incompatible { .. })
    }
}

/// Something that can report the raw core services version document.
#[async_trait]
pub trait VersionSource: Send + Sync {
    async fn fetch_version(&self) -> Result<Vec<u8>, ClientError>;
}

#[async_trait]
impl VersionSource for RemoteClient {
    async fn fetch_version(&self) -> Result<Vec<u8>, ClientError> {
        self.get_bytes().await
    }
}

/// A `[marker]major.minor.rest` version, split but not interpreted.
///
/// Only the number of dot-separated parts is checked, so `1.x.0` is
/// accepted. Everything after the second dot, including any `-dev.N`
/// suffix, is kept verbatim in `patch`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceVersion {
    pub marker: Option<char>,
    pub major: String,
    pub minor: String,
    pub patch: String,
}

impl ServiceVersion {
    /// `None` when the version has fewer than three dot-separated parts.
    pub fn parse(version: &str) -> Option<Self> {
        let mut parts = version.splitn(3, '.');
        let (first, minor, patch) = (parts.next()?, parts.next()?, parts.next()?);

        let (marker, major) = match first.chars().next() {
            Some(c) if !c.is_ascii_digit() => (Some(c), &first[c.len_utf8()..]),
            _ => (None, first),
        };

        Some(Self {
            marker,
            major: major.to_string(),
            minor: minor.to_string(),
            patch: patch.to_string(),
        })
    }
}

impl fmt::Display for ServiceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(marker) = self.marker {
            write!(f, "{marker}")?;
        }
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Checks that the core services share this runtime's major version.
#[derive(Debug, Clone)]
pub struct VersionValidator {
    skip_version_check: bool,
    sdk_version: String,
}

impl VersionValidator {
    pub fn new(skip_version_check: bool, sdk_version: impl Into<String>) -> Self {
        Self {
            skip_version_check,
            sdk_version: sdk_version.into(),
        }
    }

    pub fn sdk_version(&self) -> &str {
        &self.sdk_version
    }

    /// Run the compatibility check.
    ///
    /// `source` is only contacted when the local rules cannot decide, and
    /// only transport failures are retried.
    pub async fn validate(
        &self,
        source: Option<&dyn VersionSource>,
        timer: &StartupTimer,
    ) -> Result<Compatibility, VersionError> {
        if self.skip_version_check {
            return Ok(Compatibility::Skipped);
        }

        let sdk = ServiceVersion::parse(&self.sdk_version)
            .ok_or_else(|| VersionError::MalformedSdkVersion(self.sdk_version.clone()))?;
        if sdk.major == "0" {
            return Ok(Compatibility::SdkPreRelease);
        }

        let source = source.ok_or(VersionError::NoVersionSource)?;
        let data = retry_until_elapsed(timer, "core services version fetch", || {
            source.fetch_version()
        })
        .await
        .map_err(VersionError::Unreachable)?;

        let core_version = parse_version_document(&data)?;
        if core_version == CORE_PRE_RELEASE_VERSION {
            return Ok(Compatibility::CorePreRelease);
        }

        let core = ServiceVersion::parse(&core_version)
            .ok_or_else(|| VersionError::MalformedCoreVersion(core_version.clone()))?;

        let compatible = core.major == sdk.major;
        let sdk = self.sdk_version.clone();
        if compatible {
            Ok(Compatibility::Compatible {
                sdk,
                core: core_version,
            })
        } else {
            Ok(Compatibility::Incompatible {
                sdk,
                core: core_version,
            })
        }
    }
}

fn parse_version_document(data: &[u8]) -> Result<String, VersionError> {
    let mut document: std::collections::HashMap<String, String> =
        serde_json::from_slice(data).map_err(VersionError::Decode)?;
    document
        .remove(CORE_SERVICE_VERSION_KEY)
        .ok_or(VersionError::MissingKey(CORE_SERVICE_VERSION_KEY))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FixedSource {
        body: &'static str,
        calls: AtomicU32,
    }

    impl FixedSource {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl VersionSource for FixedSource {
        async fn fetch_version(&self) -> Result<Vec<u8>, ClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.body.as_bytes().to_vec())
        }
    }

    fn timer() -> StartupTimer {
        StartupTimer::new(Duration::from_secs(5), Duration::from_secs(1))
    }

    async fn check(sdk: &str, body: &'static str) -> (Result<Compatibility, VersionError>, u32) {
        let source = FixedSource::new(body);
        let result = VersionValidator::new(false, sdk)
            .validate(Some(&source), &timer())
            .await;
        (result, source.calls.load(Ordering::SeqCst))
    }

    #[test]
    fn test_service_version_parse() {
        let v = ServiceVersion::parse("v2.0.0-dev.11").unwrap();
        assert_eq!(v.marker, Some('v'));
        assert_eq!((v.major.as_str(), v.minor.as_str()), ("2", "0"));
        assert_eq!(v.patch, "0-dev.11");
        assert_eq!(v.to_string(), "v2.0.0-dev.11");

        let plain = ServiceVersion::parse("1.2.1").unwrap();
        assert_eq!(plain.marker, None);
        assert_eq!(plain.major, "1");
    }

    #[test]
    fn test_service_version_counts_parts_only() {
        let loose = ServiceVersion::parse("1.x.0").unwrap();
        assert_eq!(loose.major, "1");
        assert_eq!(loose.minor, "x");

        for bad in ["", "1", "v1.2", "2.0"] {
            assert!(ServiceVersion::parse(bad).is_none(), "{bad}");
        }
    }

    #[tokio::test]
    async fn test_non_numeric_minor_passes_gate() {
        let (result, calls) = check("1.x.0", r#"{"version": "1.0.0"}"#).await;
        assert!(result.unwrap().is_compatible());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_marker_stripped_from_both_versions() {
        for (sdk, core) in [("v2.0.0", "v2.0.0"), ("2.1.0", "v2.0.0")] {
            let body: &'static str =
                Box::leak(format!(r#"{{"version": "{core}"}}"#).into_boxed_str());
            let (result, _) = check(sdk, body).await;
            assert!(result.unwrap().is_compatible(), "{sdk} vs {core}");
        }
    }

    #[tokio::test]
    async fn test_equal_majors_compatible() {
        let pairs = [
            ("v1.0.0", "1.1.0"),
            ("v2.0.0-dev.11", "2.0.0"),
            ("v1.2.0", "1.2.1-dev.1"),
            ("v1.2.0-dev.4", "1.2.1-dev.1"),
        ];
        for (sdk, core) in pairs {
            let body: &'static str =
                Box::leak(format!(r#"{{"version" : "{core}"}}"#).into_boxed_str());
            let (result, _) = check(sdk, body).await;
            assert!(result.unwrap().is_compatible(), "{sdk} vs {core}");
        }
    }

    #[tokio::test]
    async fn test_unequal_majors_incompatible() {
        let (result, calls) = check("v1.0.0", r#"{"version": "2.0.0"}"#).await;
        assert_eq!(
            result.unwrap(),
            Compatibility::Incompatible {
                sdk: "v1.0.0".into(),
                core: "2.0.0".into()
            }
        );
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_sdk_major_zero_skips_remote() {
        for sdk in ["v0.0.0", "v0.2.0", "0.9.1-dev.3"] {
            let (result, calls) = check(sdk, r#"{"version": "1.0.0"}"#).await;
            assert_eq!(result.unwrap(), Compatibility::SdkPreRelease);
            assert_eq!(calls, 0);
        }
    }

    #[tokio::test]
    async fn test_skip_flag() {
        let source = FixedSource::new("");
        let result = VersionValidator::new(true, "")
            .validate(Some(&source), &timer())
            .await
            .unwrap();
        assert_eq!(result, Compatibility::Skipped);
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_core_pre_release_sentinel() {
        for sdk in ["v1.0.0", "v7.3.1"] {
            let (result, _) = check(sdk, r#"{"version": "master"}"#).await;
            assert_eq!(result.unwrap(), Compatibility::CorePreRelease);
        }
    }

    #[tokio::test]
    async fn test_malformed_sdk_fails_without_network() {
        for sdk in ["", "v1.0", "1"] {
            let (result, calls) = check(sdk, r#"{"version": "1.0.0"}"#).await;
            assert!(matches!(result, Err(VersionError::MalformedSdkVersion(_))));
            assert_eq!(calls, 0);
        }
    }

    #[tokio::test]
    async fn test_bad_core_documents() {
        let (result, _) = check("v1.0.0", r#"{"version": "12"}"#).await;
        assert!(matches!(result, Err(VersionError::MalformedCoreVersion(_))));

        let (result, calls) = check("v1.0.0", "").await;
        assert!(matches!(result, Err(VersionError::Decode(_))));
        assert_eq!(calls, 1);

        let (result, _) = check("v1.0.0", "{}").await;
        assert!(matches!(
            result,
            Err(VersionError::MissingKey(CORE_SERVICE_VERSION_KEY))
        ));
    }

    #[tokio::test]
    async fn test_missing_source_only_matters_when_needed() {
        let result = VersionValidator::new(false, "v0.1.0")
            .validate(None, &timer())
            .await;
        assert_eq!(result.unwrap(), Compatibility::SdkPreRelease);

        let result = VersionValidator::new(false, "v1.1.0")
            .validate(None, &timer())
            .await;
        assert!(matches!(result, Err(VersionError::NoVersionSource)));
    }
}
