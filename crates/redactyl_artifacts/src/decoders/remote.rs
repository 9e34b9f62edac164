//! Remote OCI registry decoding.
//!
//! Resolves an image reference against the registry v2 API, fetches the
//! manifest (following one level of index/manifest-list indirection), and
//! streams each layer blob through the tar iterator without a full download.
//! Virtual paths are `<ref>::<digest>::entry`.

use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::time::Duration;

use serde::Deserialize;

use redactyl_core::budget::BudgetTracker;
use redactyl_core::error::ScanError;
use redactyl_core::vpath::VirtualPath;

use crate::detect::is_gzip_magic;
use crate::sink::EntrySink;

use super::tar::scan_tar_reader;

const DEFAULT_REGISTRY: &str = "registry-1.docker.io";
const DEFAULT_TAG: &str = "latest";
const USER_AGENT: &str = concat!("redactyl/", env!("CARGO_PKG_VERSION"));
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json";

/// A parsed `[registry/]repository[:tag|@digest]` image reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// Registry host, defaulted to Docker Hub's pull endpoint.
    pub registry: String,
    /// Repository path, with `library/` prepended for bare Docker Hub names.
    pub repository: String,
    /// Tag or `sha256:` digest to resolve.
    pub reference: String,
    /// The reference exactly as the user wrote it; used as the outermost
    /// virtual path segment.
    pub original: String,
}

impl ImageReference {
    /// Parses an image reference string.
    pub fn parse(input: &str) -> Result<Self, ScanError> {
        if input.is_empty() {
            return Err(ScanError::Config {
                message: "empty image reference".to_string(),
            });
        }

        let (name, reference) = split_reference(input);
        let (registry, mut repository) = split_registry(name);

        if repository.is_empty() {
            return Err(ScanError::Config {
                message: format!("invalid image reference '{input}'"),
            });
        }

        if registry == DEFAULT_REGISTRY && !repository.contains('/') {
            repository = format!("library/{repository}");
        }

        Ok(Self {
            registry,
            repository,
            reference,
            original: input.to_string(),
        })
    }
}

fn split_reference(input: &str) -> (&str, String) {
    if let Some((name, digest)) = input.split_once('@') {
        return (name, digest.to_string());
    }

    // A colon after the last slash is a tag; earlier ones are registry ports.
    let slash = input.rfind('/').map_or(0, |i| i + 1);
    if let Some(colon) = input[slash..].rfind(':') {
        let at = slash + colon;
        return (&input[..at], input[at + 1..].to_string());
    }

    (input, DEFAULT_TAG.to_string())
}

fn split_registry(name: &str) -> (String, String) {
    if let Some((first, rest)) = name.split_once('/')
        && (first.contains('.') || first.contains(':') || first == "localhost")
    {
        let registry = if first == "docker.io" { DEFAULT_REGISTRY } else { first };
        return (registry.to_string(), rest.to_string());
    }
    (DEFAULT_REGISTRY.to_string(), name.to_string())
}

#[derive(Debug, Deserialize)]
struct Descriptor {
    digest: String,
    #[serde(rename = "mediaType", default)]
    media_type: String,
    #[serde(default)]
    platform: Option<Platform>,
}

#[derive(Debug, Deserialize)]
struct Platform {
    #[serde(default)]
    os: String,
    #[serde(default)]
    architecture: String,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    #[serde(default)]
    layers: Vec<Descriptor>,
    #[serde(default)]
    manifests: Vec<Descriptor>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    access_token: String,
}

/// Scans a remote image's layers.
pub(crate) fn scan_remote_image(
    reference: &ImageReference,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| network(format!("cannot build HTTP client: {e}")))?;

    let mut token: Option<String> = None;
    let manifest = fetch_manifest(&client, reference, &reference.reference, &mut token)?;

    let manifest = if manifest.layers.is_empty() && !manifest.manifests.is_empty() {
        let digest = pick_platform(&manifest.manifests);
        fetch_manifest(&client, reference, &digest, &mut token)?
    } else {
        manifest
    };

    let base = VirtualPath::file(reference.original.clone());

    for layer in &manifest.layers {
        if let Err(reason) = budget.check() {
            budget.abort(reason);
            return Ok(());
        }
        if !budget.enter() {
            continue;
        }

        let result = scan_layer(&client, reference, layer, &base, token.as_deref(), budget, sink);
        budget.leave();
        result?;
    }

    Ok(())
}

/// Picks the `linux/amd64` manifest from an index, else the first one.
fn pick_platform(manifests: &[Descriptor]) -> String {
    manifests
        .iter()
        .find(|d| {
            d.platform
                .as_ref()
                .is_some_and(|p| p.os == "linux" && p.architecture == "amd64")
        })
        .or_else(|| manifests.first())
        .map(|d| d.digest.clone())
        .unwrap_or_default()
}

fn fetch_manifest(
    client: &reqwest::blocking::Client,
    reference: &ImageReference,
    tag_or_digest: &str,
    token: &mut Option<String>,
) -> Result<Manifest, ScanError> {
    let url = format!(
        "https://{}/v2/{}/manifests/{}",
        reference.registry, reference.repository, tag_or_digest
    );
    let response = authorized_get(client, &url, MANIFEST_ACCEPT, reference, token)?;
    response
        .json()
        .map_err(|e| network(format!("invalid manifest from {}: {e}", reference.registry)))
}

fn scan_layer(
    client: &reqwest::blocking::Client,
    reference: &ImageReference,
    layer: &Descriptor,
    base: &VirtualPath,
    token: Option<&str>,
    budget: &mut BudgetTracker<'_>,
    sink: &mut dyn EntrySink,
) -> Result<(), ScanError> {
    let url = format!(
        "https://{}/v2/{}/blobs/{}",
        reference.registry, reference.repository, layer.digest
    );

    let mut request = client.get(&url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }
    let response = request
        .send()
        .map_err(|e| network(format!("cannot fetch layer {}: {e}", layer.digest)))?
        .error_for_status()
        .map_err(|e| network(format!("layer fetch failed: {e}")))?;

    let mut metadata = BTreeMap::new();
    metadata.insert("image".to_string(), reference.original.clone());
    metadata.insert("layer_digest".to_string(), layer.digest.clone());

    let layer_base = base.child(layer.digest.clone());
    let mut reader = BufReader::new(response);
    let gzipped = layer.media_type.contains("gzip") || reader.fill_buf().map(is_gzip_magic).unwrap_or(false);

    if gzipped {
        scan_tar_reader(flate2::read::GzDecoder::new(reader), &layer_base, &metadata, budget, sink)
    } else {
        scan_tar_reader(reader, &layer_base, &metadata, budget, sink)
    }
}

/// Performs a GET, transparently acquiring a bearer token on a 401 challenge.
fn authorized_get(
    client: &reqwest::blocking::Client,
    url: &str,
    accept: &str,
    reference: &ImageReference,
    token: &mut Option<String>,
) -> Result<reqwest::blocking::Response, ScanError> {
    let mut request = client.get(url).header(reqwest::header::ACCEPT, accept);
    if let Some(token) = token.as_deref() {
        request = request.bearer_auth(token);
    }
    let response = request.send().map_err(|e| network(format!("GET {url}: {e}")))?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED && token.is_none() {
        let challenge = response
            .headers()
            .get(reqwest::header::WWW_AUTHENTICATE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| network(format!("{} denied access without a challenge", reference.registry)))?;

        let fresh = fetch_token(client, &challenge, reference)?;
        *token = Some(fresh);

        let mut retry = client.get(url).header(reqwest::header::ACCEPT, accept);
        if let Some(token) = token.as_deref() {
            retry = retry.bearer_auth(token);
        }
        return retry
            .send()
            .map_err(|e| network(format!("GET {url}: {e}")))?
            .error_for_status()
            .map_err(|e| network(format!("GET {url}: {e}")));
    }

    response.error_for_status().map_err(|e| network(format!("GET {url}: {e}")))
}

/// Fetches an anonymous pull token from the realm named in a
/// `Www-Authenticate: Bearer` challenge.
fn fetch_token(
    client: &reqwest::blocking::Client,
    challenge: &str,
    reference: &ImageReference,
) -> Result<String, ScanError> {
    let realm = challenge_field(challenge, "realm")
        .ok_or_else(|| network(format!("challenge without realm: {challenge}")))?;
    let service = challenge_field(challenge, "service").unwrap_or_default();
    let scope = format!("repository:{}:pull", reference.repository);

    let response = client
        .get(&realm)
        .query(&[("service", service.as_str()), ("scope", scope.as_str())])
        .send()
        .map_err(|e| network(format!("token request failed: {e}")))?
        .error_for_status()
        .map_err(|e| network(format!("token request failed: {e}")))?;

    let token: TokenResponse = response
        .json()
        .map_err(|e| network(format!("invalid token response: {e}")))?;

    let value = if token.token.is_empty() { token.access_token } else { token.token };
    if value.is_empty() {
        return Err(network("token endpoint returned no token".to_string()));
    }
    Ok(value)
}

fn challenge_field(challenge: &str, field: &str) -> Option<String> {
    let marker = format!("{field}=\"");
    let start = challenge.find(&marker)? + marker.len();
    let end = challenge[start..].find('"')? + start;
    Some(challenge[start..end].to_string())
}

fn network(message: String) -> ScanError {
    ScanError::Network { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_name_defaults_to_docker_hub_library() {
        let r = ImageReference::parse("alpine").unwrap();
        assert_eq!(r.registry, "registry-1.docker.io");
        assert_eq!(r.repository, "library/alpine");
        assert_eq!(r.reference, "latest");
        assert_eq!(r.original, "alpine");
    }

    #[test]
    fn tag_after_last_slash_is_split_off() {
        let r = ImageReference::parse("acme/app:1.2.3").unwrap();
        assert_eq!(r.repository, "acme/app");
        assert_eq!(r.reference, "1.2.3");
    }

    #[test]
    fn registry_host_is_recognised_by_dot_or_port() {
        let r = ImageReference::parse("ghcr.io/acme/app:main").unwrap();
        assert_eq!(r.registry, "ghcr.io");
        assert_eq!(r.repository, "acme/app");

        let r = ImageReference::parse("localhost:5000/app").unwrap();
        assert_eq!(r.registry, "localhost:5000");
        assert_eq!(r.repository, "app");
        assert_eq!(r.reference, "latest");
    }

    #[test]
    fn docker_io_maps_to_the_pull_endpoint() {
        let r = ImageReference::parse("docker.io/library/redis:7").unwrap();
        assert_eq!(r.registry, "registry-1.docker.io");
        assert_eq!(r.repository, "library/redis");
    }

    #[test]
    fn digest_references_are_preserved() {
        let r = ImageReference::parse("ghcr.io/acme/app@sha256:deadbeef").unwrap();
        assert_eq!(r.reference, "sha256:deadbeef");
        assert_eq!(r.repository, "acme/app");
    }

    #[test]
    fn registry_port_is_not_mistaken_for_a_tag() {
        let r = ImageReference::parse("localhost:5000/team/app").unwrap();
        assert_eq!(r.registry, "localhost:5000");
        assert_eq!(r.repository, "team/app");
        assert_eq!(r.reference, "latest");
    }

    #[test]
    fn empty_reference_is_rejected() {
        assert!(ImageReference::parse("").is_err());
    }

    #[test]
    fn platform_picker_prefers_linux_amd64() {
        let manifests = vec![
            Descriptor {
                digest: "sha256:arm".to_string(),
                media_type: String::new(),
                platform: Some(Platform {
                    os: "linux".to_string(),
                    architecture: "arm64".to_string(),
                }),
            },
            Descriptor {
                digest: "sha256:amd".to_string(),
                media_type: String::new(),
                platform: Some(Platform {
                    os: "linux".to_string(),
                    architecture: "amd64".to_string(),
                }),
            },
        ];
        assert_eq!(pick_platform(&manifests), "sha256:amd");
    }

    #[test]
    fn platform_picker_falls_back_to_first() {
        let manifests = vec![Descriptor {
            digest: "sha256:only".to_string(),
            media_type: String::new(),
            platform: None,
        }];
        assert_eq!(pick_platform(&manifests), "sha256:only");
    }

    #[test]
    fn challenge_fields_are_extracted() {
        let challenge = r#"Bearer realm="https://auth.docker.io/token",service="registry.docker.io""#;
        assert_eq!(
            challenge_field(challenge, "realm").as_deref(),
            Some("https://auth.docker.io/token")
        );
        assert_eq!(
            challenge_field(challenge, "service").as_deref(),
            Some("registry.docker.io")
        );
        assert_eq!(challenge_field(challenge, "scope"), None);
    }
}
