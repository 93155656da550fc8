//! Small Kubernetes helpers shared by the provisioning client and the
//! state reconciler.

use kube::discovery::ApiResource;

/// Split an apiVersion string into (group, version).
///
/// Core resources have no group: `"v1"` parses to `("", "v1")`.
fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// Lower-cased plural form of a kind, as used in API paths.
///
/// Simple `lowercase + "s"` covers every kind this service touches
/// (ClusterDeployment, ClusterVersion, Cluster).
fn pluralize_kind(kind: &str) -> String {
    format!("{}s", kind.to_lowercase())
}

/// Build an ApiResource from a known apiVersion and kind.
///
/// The version you provide is used exactly; suitable for the fixed,
/// versioned orchestrator API this service targets.
pub fn build_api_resource(api_version: &str, kind: &str) -> ApiResource {
    let (group, version) = parse_api_version(api_version);
    ApiResource {
        group,
        version,
        kind: kind.to_string(),
        api_version: api_version.to_string(),
        plural: pluralize_kind(kind),
    }
}
