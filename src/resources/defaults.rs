use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ResourceRequirements;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::models::nexus::NexusSpec;

pub const NEXUS_COMMUNITY_LATEST_IMAGE: &str = "docker.io/sonatype/nexus3";
pub const NEXUS_CERTIFIED_LATEST_IMAGE: &str =
    "registry.connect.redhat.com/sonatype/nexus-repository-manager";

pub const DEFAULT_CPU_REQUEST: &str = "1";
pub const DEFAULT_MEMORY_REQUEST: &str = "2Gi";
pub const DEFAULT_CPU_LIMIT: &str = "2";
pub const DEFAULT_MEMORY_LIMIT: &str = "2Gi";

pub const HEAP_SIZE_DEFAULT: &str = "1200m";
pub const MAX_DIRECT_MEMORY_SIZE_DEFAULT: &str = "2g";

pub const PROBE_INITIAL_DELAY_SECONDS: i32 = 60;
pub const PROBE_TIMEOUT_SECONDS: i32 = 10;

/// Values the deployment builder falls back to when a `Nexus` leaves them unset.
#[derive(Debug, Clone, PartialEq)]
pub struct BuilderConfig {
    pub community_image: String,
    pub certified_image: String,
    pub default_resources: ResourceRequirements,
    /// Heap size used when the container has no memory limit.
    pub default_heap_size: String,
    /// `MaxDirectMemorySize` used when the container has no memory limit.
    pub default_max_direct_memory: String,
    pub probe_initial_delay_seconds: i32,
    pub probe_timeout_seconds: i32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        BuilderConfig {
            community_image: NEXUS_COMMUNITY_LATEST_IMAGE.to_string(),
            certified_image: NEXUS_CERTIFIED_LATEST_IMAGE.to_string(),
            default_resources: resource_requirements(
                DEFAULT_CPU_REQUEST,
                DEFAULT_MEMORY_REQUEST,
                DEFAULT_CPU_LIMIT,
                DEFAULT_MEMORY_LIMIT,
            ),
            default_heap_size: HEAP_SIZE_DEFAULT.to_string(),
            default_max_direct_memory: MAX_DIRECT_MEMORY_SIZE_DEFAULT.to_string(),
            probe_initial_delay_seconds: PROBE_INITIAL_DELAY_SECONDS,
            probe_timeout_seconds: PROBE_TIMEOUT_SECONDS,
        }
    }
}

/// Builds a cpu/memory request and limit pair.
pub fn resource_requirements(
    cpu_request: &str,
    memory_request: &str,
    cpu_limit: &str,
    memory_limit: &str,
) -> ResourceRequirements {
    let requests: BTreeMap<String, Quantity> = [
        ("cpu".to_string(), Quantity(cpu_request.to_string())),
        ("memory".to_string(), Quantity(memory_request.to_string())),
    ]
    .iter()
    .cloned()
    .collect();
    let limits: BTreeMap<String, Quantity> = [
        ("cpu".to_string(), Quantity(cpu_limit.to_string())),
        ("memory".to_string(), Quantity(memory_limit.to_string())),
    ]
    .iter()
    .cloned()
    .collect();

    ResourceRequirements {
        limits: Some(limits),
        requests: Some(requests),
    }
}

/// The image, certified flag and resources a deployment was built with.
///
/// The builder never writes these back into the `Nexus` it was given. Callers
/// that want the defaults remembered persist this value themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSpec {
    pub image: String,
    pub use_red_hat_image: bool,
    pub resources: ResourceRequirements,
}

impl ResolvedSpec {
    pub fn resolve(spec: &NexusSpec, config: &BuilderConfig) -> Self {
        let (image, use_red_hat_image) = resolve_image(spec, config);

        ResolvedSpec {
            image,
            use_red_hat_image,
            resources: resolve_resources(spec, config),
        }
    }

    /// True when the image selection differs from what the spec carries.
    pub fn image_differs_from(&self, spec: &NexusSpec) -> bool {
        spec.image.as_deref() != Some(self.image.as_str())
            || spec.use_red_hat_image != self.use_red_hat_image
    }
}

/// Picks the container image. The certified flag always wins; an empty image
/// falls back to the community build and clears the flag.
pub fn resolve_image(spec: &NexusSpec, config: &BuilderConfig) -> (String, bool) {
    if spec.use_red_hat_image {
        return (config.certified_image.clone(), true);
    }

    match spec.image.as_deref() {
        Some(image) if !image.is_empty() => (image.to_string(), false),
        _ => (config.community_image.clone(), false),
    }
}

/// All or nothing: the spec's requirements are used verbatim unless both
/// requests and limits are empty.
pub fn resolve_resources(spec: &NexusSpec, config: &BuilderConfig) -> ResourceRequirements {
    match &spec.resources {
        Some(resources) if !is_unset(resources) => resources.clone(),
        _ => config.default_resources.clone(),
    }
}

fn is_unset(resources: &ResourceRequirements) -> bool {
    resources.requests.as_ref().map_or(true, |r| r.is_empty())
        && resources.limits.as_ref().map_or(true, |l| l.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::ResourceRequirements;
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

    use super::*;
    use crate::models::nexus::NexusSpec;

    #[test]
    fn certified_flag_overrides_custom_image() {
        let spec = NexusSpec {
            image: Some("quay.io/acme/nexus:3.28".to_string()),
            use_red_hat_image: true,
            ..Default::default()
        };

        let (image, certified) = resolve_image(&spec, &BuilderConfig::default());

        assert_eq!(image, NEXUS_CERTIFIED_LATEST_IMAGE);
        assert!(certified);
    }

    #[test]
    fn missing_image_falls_back_to_community() {
        for image in vec![None, Some(String::new())] {
            let spec = NexusSpec {
                image,
                ..Default::default()
            };

            let (image, certified) = resolve_image(&spec, &BuilderConfig::default());

            assert_eq!(image, NEXUS_COMMUNITY_LATEST_IMAGE);
            assert!(!certified);
        }
    }

    #[test]
    fn custom_image_is_kept() {
        let spec = NexusSpec {
            image: Some("quay.io/acme/nexus:3.28".to_string()),
            ..Default::default()
        };

        let (image, certified) = resolve_image(&spec, &BuilderConfig::default());

        assert_eq!(image, "quay.io/acme/nexus:3.28");
        assert!(!certified);
    }

    #[test]
    fn empty_resources_are_defaulted() {
        let config = BuilderConfig::default();
        let empty = ResourceRequirements {
            limits: Some(BTreeMap::new()),
            requests: None,
        };

        for resources in vec![None, Some(ResourceRequirements::default()), Some(empty)] {
            let spec = NexusSpec {
                resources,
                ..Default::default()
            };
            assert_eq!(resolve_resources(&spec, &config), config.default_resources);
        }
    }

    #[test]
    fn partial_resources_are_used_verbatim() {
        let limits: BTreeMap<String, Quantity> =
            [("memory".to_string(), Quantity("4000M".to_string()))]
                .iter()
                .cloned()
                .collect();
        let resources = ResourceRequirements {
            limits: Some(limits),
            requests: None,
        };
        let spec = NexusSpec {
            resources: Some(resources.clone()),
            ..Default::default()
        };

        assert_eq!(resolve_resources(&spec, &BuilderConfig::default()), resources);
    }

    #[test]
    fn resolve_does_not_touch_the_spec() {
        let spec = NexusSpec::default();
        let before = spec.clone();

        let resolved = ResolvedSpec::resolve(&spec, &BuilderConfig::default());

        assert_eq!(spec, before);
        assert_eq!(resolved.image, NEXUS_COMMUNITY_LATEST_IMAGE);
        assert!(resolved.image_differs_from(&spec));
    }

    #[test]
    fn image_matching_spec_is_not_a_difference() {
        let spec = NexusSpec {
            image: Some("quay.io/acme/nexus:3.28".to_string()),
            ..Default::default()
        };

        let resolved = ResolvedSpec::resolve(&spec, &BuilderConfig::default());

        assert!(!resolved.image_differs_from(&spec));
    }
}
