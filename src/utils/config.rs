use envconfig::Envconfig;

use crate::resources::defaults::{resource_requirements, BuilderConfig};

#[derive(Envconfig, Clone, Debug)]
pub struct OperatorConfig {
    #[envconfig(from = "NEXUS_COMMUNITY_IMAGE", default = "docker.io/sonatype/nexus3")]
    pub community_image: String,
    #[envconfig(
        from = "NEXUS_CERTIFIED_IMAGE",
        default = "registry.connect.redhat.com/sonatype/nexus-repository-manager"
    )]
    pub certified_image: String,
    #[envconfig(from = "NEXUS_DEFAULT_CPU_REQUEST", default = "1")]
    pub default_cpu_request: String,
    #[envconfig(from = "NEXUS_DEFAULT_MEMORY_REQUEST", default = "2Gi")]
    pub default_memory_request: String,
    #[envconfig(from = "NEXUS_DEFAULT_CPU_LIMIT", default = "2")]
    pub default_cpu_limit: String,
    #[envconfig(from = "NEXUS_DEFAULT_MEMORY_LIMIT", default = "2Gi")]
    pub default_memory_limit: String,
    /// Heap size for containers without a memory limit
    #[envconfig(from = "NEXUS_DEFAULT_HEAP_SIZE", default = "1200m")]
    pub default_heap_size: String,
    #[envconfig(from = "NEXUS_DEFAULT_MAX_DIRECT_MEMORY", default = "2g")]
    pub default_max_direct_memory: String,
    #[envconfig(from = "NEXUS_PROBE_INITIAL_DELAY_SECONDS", default = "60")]
    pub probe_initial_delay_seconds: i32,
    #[envconfig(from = "NEXUS_PROBE_TIMEOUT_SECONDS", default = "10")]
    pub probe_timeout_seconds: i32,
    /// Write the resolved image selection back into the `Nexus` spec
    #[envconfig(from = "PERSIST_RESOLVED_DEFAULTS", default = "false")]
    pub persist_resolved_defaults: bool,
    #[envconfig(from = "RECONCILE_INTERVAL_SECONDS", default = "300")]
    pub reconcile_interval_seconds: u64,
}

impl OperatorConfig {
    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            community_image: self.community_image.clone(),
            certified_image: self.certified_image.clone(),
            default_resources: resource_requirements(
                &self.default_cpu_request,
                &self.default_memory_request,
                &self.default_cpu_limit,
                &self.default_memory_limit,
            ),
            default_heap_size: self.default_heap_size.clone(),
            default_max_direct_memory: self.default_max_direct_memory.clone(),
            probe_initial_delay_seconds: self.probe_initial_delay_seconds,
            probe_timeout_seconds: self.probe_timeout_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use envconfig::Envconfig;

    use super::OperatorConfig;
    use crate::resources::defaults::BuilderConfig;

    #[test]
    fn defaults_match_builder_defaults() {
        let config = OperatorConfig::init_from_hashmap(&HashMap::new()).unwrap();

        assert_eq!(config.builder_config(), BuilderConfig::default());
        assert!(!config.persist_resolved_defaults);
        assert_eq!(config.reconcile_interval_seconds, 300);
    }

    #[test]
    fn can_override_from_environment() {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("NEXUS_COMMUNITY_IMAGE".to_string(), "mirror.local/nexus3".to_string());
        env.insert("NEXUS_DEFAULT_HEAP_SIZE".to_string(), "800m".to_string());
        env.insert("NEXUS_PROBE_TIMEOUT_SECONDS".to_string(), "30".to_string());
        env.insert("PERSIST_RESOLVED_DEFAULTS".to_string(), "true".to_string());

        let config = OperatorConfig::init_from_hashmap(&env).unwrap();
        let builder_config = config.builder_config();

        assert_eq!(builder_config.community_image, "mirror.local/nexus3");
        assert_eq!(builder_config.default_heap_size, "800m");
        assert_eq!(builder_config.probe_timeout_seconds, 30);
        assert!(config.persist_resolved_defaults);
    }

    #[test]
    fn rejects_unparseable_values() {
        let mut env: HashMap<String, String> = HashMap::new();
        env.insert("NEXUS_PROBE_TIMEOUT_SECONDS".to_string(), "soon".to_string());

        assert!(OperatorConfig::init_from_hashmap(&env).is_err());
    }
}
