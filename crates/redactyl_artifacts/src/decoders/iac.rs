//! IaC hotspot detection.
//!
//! Files that routinely carry credentials even though they are not archives:
//! terraform state, kubeconfigs, registry and packaging rc files. Hotspots
//! are emitted as regular files; this module only decides what qualifies.

/// Exact basenames that are always hotspots.
const HOTSPOT_BASENAMES: &[&str] = &[
    "kubeconfig",
    ".kubeconfig",
    ".npmrc",
    ".pypirc",
    ".netrc",
    ".dockercfg",
    ".git-credentials",
];

/// Suffixes that are always hotspots.
const HOTSPOT_SUFFIXES: &[&str] = &[".tfstate", ".tfstate.backup", ".tfvars", ".pem", ".ppk"];

/// Returns `true` when the path is an IaC credential hotspot.
#[must_use]
pub fn is_iac_hotspot(relative_path: &str) -> bool {
    let lower = relative_path.to_ascii_lowercase().replace('\\', "/");
    let basename = lower.rsplit('/').next().unwrap_or(&lower);

    if HOTSPOT_BASENAMES.contains(&basename) {
        return true;
    }
    if HOTSPOT_SUFFIXES.iter().any(|suffix| basename.ends_with(suffix)) {
        return true;
    }

    // `config` and `credentials` are hotspots only inside well-known
    // credential directories.
    let mut components = lower.split('/').rev();
    let file = components.next().unwrap_or_default();
    let parent = components.next().unwrap_or_default();

    matches!(
        (parent, file),
        (".kube", "config") | (".aws", "credentials") | (".aws", "config") | (".docker", "config.json")
    )
}
