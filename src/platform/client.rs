//! HTTP-backed platform clients.
//!
//! The built-in clients check that credentials are present when they are
//! built, answer region queries from the platform's published region
//! catalog, and probe endpoints over HTTP.

use std::time::Duration;

use async_trait::async_trait;

use super::{ClientBuilder, PlatformClient, PlatformKind, PlatformMetadata};
use crate::error::ClientError;
use crate::validation::{ValidationIssue, ValidationResult};

/// Timeout applied to every probe request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Looks up an environment variable.
pub type EnvLookup = fn(&str) -> Option<String>;

fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Static description of a cloud platform's client requirements.
#[derive(Debug, Clone, Copy)]
pub struct CloudProfile {
    pub kind: PlatformKind,
    /// Regions published by the provider.
    pub regions: &'static [&'static str],
    /// Alternative credential sources; each entry lists variables that must
    /// all be set.
    pub credentials: &'static [&'static [&'static str]],
}

impl CloudProfile {
    /// Succeeds if any credential source is fully populated.
    pub fn check_credentials(&self, env: EnvLookup) -> Result<(), ClientError> {
        let satisfied = self
            .credentials
            .iter()
            .any(|source| source.iter().all(|name| env(name).is_some()));

        if satisfied {
            Ok(())
        } else {
            let options: Vec<String> = self
                .credentials
                .iter()
                .map(|source| source.join(" + "))
                .collect();
            Err(ClientError::MissingCredentials(options.join(" | ")))
        }
    }
}

/// A live client for one cloud platform.
pub struct HttpPlatformClient {
    profile: CloudProfile,
    http: reqwest::Client,
}

impl HttpPlatformClient {
    pub fn new(profile: CloudProfile) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { profile, http })
    }
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    async fn regions(&self) -> Result<Vec<String>, ClientError> {
        Ok(self.profile.regions.iter().map(|r| r.to_string()).collect())
    }

    async fn probe(&self, url: &str) -> Result<(), ClientError> {
        tracing::debug!(platform = %self.profile.kind, url, "Probing endpoint");

        let response = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|e| ClientError::Request {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if response.status().is_server_error() {
            return Err(ClientError::Request {
                url: url.to_string(),
                message: format!("server responded with {}", response.status()),
            });
        }

        Ok(())
    }
}

/// Builds [`HttpPlatformClient`]s for one platform.
#[derive(Debug, Clone, Copy)]
pub struct HttpClientBuilder {
    profile: CloudProfile,
    env: EnvLookup,
}

impl HttpClientBuilder {
    pub fn new(profile: CloudProfile) -> Self {
        Self {
            profile,
            env: process_env,
        }
    }

    /// Replaces the environment used to find credentials.
    pub fn with_env(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }
}

#[async_trait]
impl ClientBuilder for HttpClientBuilder {
    async fn build(&self, metadata: &PlatformMetadata) -> Result<Box<dyn PlatformClient>, ClientError> {
        if metadata.platform() != self.profile.kind {
            return Err(ClientError::MetadataMismatch {
                expected: self.profile.kind,
                found: metadata.platform(),
            });
        }

        self.profile.check_credentials(self.env)?;

        tracing::debug!(
            platform = %self.profile.kind,
            region = ?metadata.region(),
            "Building platform client"
        );
        Ok(Box::new(HttpPlatformClient::new(self.profile)?))
    }
}

/// Result for a client-backed validator invoked without a client.
pub fn missing_client(kind: PlatformKind) -> ValidationResult {
    let mut result = ValidationResult::new();
    result.add(ValidationIssue::error(
        kind.field_path(),
        format!("{} validation requires a platform client", kind),
    ));
    result
}

/// Checks that `region` is offered to the client's credentials.
pub async fn check_region(
    client: &dyn PlatformClient,
    path: &str,
    region: &str,
    result: &mut ValidationResult,
) {
    let regions = match client.regions().await {
        Ok(regions) => regions,
        Err(e) => {
            result.add(ValidationIssue::error(
                path,
                format!("failed to list regions: {}", e),
            ));
            return;
        }
    };

    if regions.iter().any(|r| r == region) {
        return;
    }

    let mut issue = ValidationIssue::error(path, format!("invalid region {:?}", region));
    let closest = regions
        .iter()
        .map(|r| (r, strsim::jaro_winkler(region, r)))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((known, _)) = closest {
        issue = issue.with_suggestion(format!("did you mean {:?}?", known));
    }
    result.add(issue);
}

/// Probes `url`, reporting an unreachable endpoint at `path`.
pub async fn check_endpoint(
    client: &dyn PlatformClient,
    path: &str,
    url: &str,
    result: &mut ValidationResult,
) {
    if let Err(e) = client.probe(url).await {
        result.add(ValidationIssue::error(path, e.to_string()));
    }
}
