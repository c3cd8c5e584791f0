use k8s_openapi::api::core::v1::ResourceRequirements;
use kube_derive::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Desired state of a Nexus repository manager instance.
#[derive(CustomResource, Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[kube(
    group = "apps.m88i.io",
    version = "v1alpha1",
    kind = "Nexus",
    plural = "nexus",
    namespaced
)]
#[serde(rename_all = "camelCase")]
pub struct NexusSpec {
    /// Number of pods running the instance.
    pub replicas: i32,

    /// Custom image. Ignored when `use_red_hat_image` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    #[serde(default)]
    pub use_red_hat_image: bool,

    /// Requests and limits for the server container. When both collections are
    /// empty the operator defaults apply.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    #[serde(default)]
    pub persistence: NexusPersistence,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NexusPersistence {
    pub persistent: bool,

    // Consumed by whoever provisions the claim, not by the deployment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_size: Option<String>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Nexus, NexusSpec};

    #[test]
    fn can_deserialize_camel_case_spec() {
        let nexus: Nexus = serde_json::from_value(json!({
            "apiVersion": "apps.m88i.io/v1alpha1",
            "kind": "Nexus",
            "metadata": { "name": "nexus3", "namespace": "repos" },
            "spec": {
                "replicas": 1,
                "useRedHatImage": true,
                "persistence": { "persistent": true, "volumeSize": "10Gi" }
            }
        }))
        .unwrap();

        assert_eq!(nexus.spec.replicas, 1);
        assert!(nexus.spec.use_red_hat_image);
        assert_eq!(nexus.spec.image, None);
        assert!(nexus.spec.persistence.persistent);
        assert_eq!(nexus.spec.persistence.volume_size.as_deref(), Some("10Gi"));
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let spec: NexusSpec = serde_json::from_value(json!({ "replicas": 2 })).unwrap();

        assert_eq!(spec.resources, None);
        assert!(!spec.use_red_hat_image);
        assert!(!spec.persistence.persistent);
    }
}
