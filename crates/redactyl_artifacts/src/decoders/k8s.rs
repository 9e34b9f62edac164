//! Kubernetes manifest detection.
//!
//! A file is a manifest when it parses as YAML with `apiVersion` and `kind`
//! at the top level, or when it lives under a k8s-ish directory and at least
//! mentions `apiVersion`. Manifests are emitted whole; detection only adds
//! `k8s_*` metadata for the findings.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_yaml::Value;

/// Directory name fragments that suggest Kubernetes manifests.
const K8S_DIR_HINTS: &[&str] = &["k8s", "kubernetes", "manifests", "deploy", "overlays"];

/// Returns `true` when the file should be treated as a K8s manifest.
#[must_use]
pub fn is_k8s_manifest(relative_path: &str, bytes: &[u8]) -> bool {
    let lower = relative_path.to_ascii_lowercase();
    let is_yaml = lower.ends_with(".yaml") || lower.ends_with(".yml");
    if !is_yaml {
        return false;
    }

    if first_document(bytes).is_some() {
        return true;
    }

    let in_k8s_dir = lower
        .split('/')
        .any(|component| K8S_DIR_HINTS.contains(&component));
    in_k8s_dir && contains_api_version(bytes)
}

/// Extracts `k8s_kind`, `k8s_api_version`, `k8s_name`, and `k8s_namespace`
/// metadata from the first document of a manifest.
#[must_use]
pub fn manifest_metadata(bytes: &[u8]) -> BTreeMap<String, String> {
    let mut metadata = BTreeMap::new();

    let Some(doc) = first_document(bytes) else {
        return metadata;
    };

    if let Some(kind) = doc.get("kind").and_then(Value::as_str) {
        metadata.insert("k8s_kind".to_string(), kind.to_string());
    }
    if let Some(api) = doc.get("apiVersion").and_then(Value::as_str) {
        metadata.insert("k8s_api_version".to_string(), api.to_string());
    }
    if let Some(object_meta) = doc.get("metadata") {
        if let Some(name) = object_meta.get("name").and_then(Value::as_str) {
            metadata.insert("k8s_name".to_string(), name.to_string());
        }
        if let Some(namespace) = object_meta.get("namespace").and_then(Value::as_str) {
            metadata.insert("k8s_namespace".to_string(), namespace.to_string());
        }
    }

    metadata
}

/// Parses the first YAML document that carries both `apiVersion` and `kind`.
fn first_document(bytes: &[u8]) -> Option<Value> {
    for document in serde_yaml::Deserializer::from_slice(bytes) {
        let Ok(value) = Value::deserialize(document) else {
            return None;
        };
        if value.get("apiVersion").is_some() && value.get("kind").is_some() {
            return Some(value);
        }
    }
    None
}

fn contains_api_version(bytes: &[u8]) -> bool {
    bytes.windows(b"apiVersion".len()).any(|w| w == b"apiVersion")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPLOYMENT: &[u8] = b"apiVersion: apps/v1\nkind: Deployment\nmetadata:\n  name: web\n  namespace: prod\nspec: {}\n";

    #[test]
    fn manifest_with_api_version_and_kind_is_detected() {
        assert!(is_k8s_manifest("anywhere/app.yaml", DEPLOYMENT));
    }

    #[test]
    fn plain_yaml_outside_k8s_dirs_is_not_a_manifest() {
        assert!(!is_k8s_manifest("config/app.yaml", b"logging: debug\nport: 8080\n"));
    }

    #[test]
    fn non_yaml_files_are_never_manifests() {
        assert!(!is_k8s_manifest("deploy/app.json", DEPLOYMENT));
    }

    #[test]
    fn k8s_dir_with_api_version_mention_counts() {
        let partial = b"# templated\napiVersion: {{ .Values.api }}\nkind: {{ .Values.kind }}\n";
        assert!(is_k8s_manifest("k8s/app.yaml", partial) || is_k8s_manifest("deploy/app.yaml", partial));
    }

    #[test]
    fn metadata_extracts_kind_name_namespace() {
        let metadata = manifest_metadata(DEPLOYMENT);
        assert_eq!(metadata.get("k8s_kind"), Some(&"Deployment".to_string()));
        assert_eq!(metadata.get("k8s_api_version"), Some(&"apps/v1".to_string()));
        assert_eq!(metadata.get("k8s_name"), Some(&"web".to_string()));
        assert_eq!(metadata.get("k8s_namespace"), Some(&"prod".to_string()));
    }

    #[test]
    fn multi_document_manifests_use_the_first_k8s_document() {
        let multi = b"config: true\n---\napiVersion: v1\nkind: Secret\nmetadata:\n  name: creds\n";
        assert!(is_k8s_manifest("x/app.yaml", multi));
        assert_eq!(manifest_metadata(multi).get("k8s_kind"), Some(&"Secret".to_string()));
    }

    #[test]
    fn invalid_yaml_yields_empty_metadata() {
        assert!(manifest_metadata(b"{unbalanced").is_empty());
    }
}
