use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec, DeploymentStrategy};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, HTTPGetAction, PersistentVolumeClaimVolumeSource, PodSpec,
    PodTemplateSpec, Probe, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use log::debug;

use super::defaults::{BuilderConfig, ResolvedSpec};
use super::labels::{apply_labels, generate_labels};
use super::memory::{calculate_jvm_memory, JVM_ARGS_ENV_KEY};
use super::naming::{claim_name, data_volume_name, instance_name};
use crate::models::nexus::Nexus;

pub const NEXUS_CONTAINER_NAME: &str = "nexus-server";
pub const NEXUS_SERVICE_PORT: i32 = 8081;
pub const NEXUS_DATA_DIR: &str = "/nexus-data";

const RECREATE_STRATEGY: &str = "Recreate";
const PULL_ALWAYS: &str = "Always";

/// A freshly built `Deployment` and the defaults that went into it.
#[derive(Debug, Clone)]
pub struct SynthesizedDeployment {
    pub deployment: Deployment,
    pub resolved: ResolvedSpec,
}

/// Builds the `Deployment` running a `Nexus` instance.
///
/// # Arguments
/// - `nexus` - The instance to run. It is only read.
/// - `claim` - Persistent volume claim backing the data directory, used when
///   persistence is enabled. Defaults to the claim named after the instance.
/// - `config` - Defaults for everything the instance leaves unset.
pub fn new_deployment(
    nexus: &Nexus,
    claim: Option<&str>,
    config: &BuilderConfig,
) -> SynthesizedDeployment {
    let name = instance_name(nexus);
    let resolved = ResolvedSpec::resolve(&nexus.spec, config);

    let mut deployment_meta = ObjectMeta {
        name: Some(name.to_string()),
        namespace: nexus.metadata.namespace.clone(),
        ..Default::default()
    };
    let mut template_meta = ObjectMeta::default();
    apply_labels(nexus, &mut deployment_meta);
    apply_labels(nexus, &mut template_meta);

    let mut container = Container {
        name: NEXUS_CONTAINER_NAME.to_string(),
        ports: Some(vec![ContainerPort {
            name: Some("http".to_string()),
            container_port: NEXUS_SERVICE_PORT,
            protocol: Some("TCP".to_string()),
            ..Default::default()
        }]),
        image_pull_policy: Some(PULL_ALWAYS.to_string()),
        image: Some(resolved.image.clone()),
        resources: Some(resolved.resources.clone()),
        ..Default::default()
    };
    let mut pod_spec = PodSpec::default();

    if nexus.spec.persistence.persistent {
        let claim = claim.map_or_else(|| claim_name(name), str::to_string);
        add_volume(name, &claim, &mut pod_spec, &mut container);
    }
    add_probes(&mut container, config);
    apply_jvm_args(&mut container, config);

    pod_spec.containers = vec![container];

    debug!("Built deployment for Nexus {}", name);

    let deployment = Deployment {
        metadata: deployment_meta,
        spec: Some(DeploymentSpec {
            replicas: Some(nexus.spec.replicas),
            selector: LabelSelector {
                match_labels: Some(generate_labels(nexus)),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(template_meta),
                spec: Some(pod_spec),
            },
            strategy: Some(DeploymentStrategy {
                type_: Some(RECREATE_STRATEGY.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    };

    SynthesizedDeployment {
        deployment,
        resolved,
    }
}

fn add_volume(name: &str, claim_name: &str, pod_spec: &mut PodSpec, container: &mut Container) {
    let volume_name = data_volume_name(name);

    pod_spec.volumes = Some(vec![Volume {
        name: volume_name.clone(),
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name: claim_name.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }]);
    container.volume_mounts = Some(vec![VolumeMount {
        name: volume_name,
        mount_path: NEXUS_DATA_DIR.to_string(),
        ..Default::default()
    }]);
}

fn default_probe(config: &BuilderConfig) -> Probe {
    Probe {
        http_get: Some(HTTPGetAction {
            path: Some(String::new()),
            port: IntOrString::Int(NEXUS_SERVICE_PORT),
            scheme: Some("HTTP".to_string()),
            ..Default::default()
        }),
        initial_delay_seconds: Some(config.probe_initial_delay_seconds),
        timeout_seconds: Some(config.probe_timeout_seconds),
        ..Default::default()
    }
}

fn add_probes(container: &mut Container, config: &BuilderConfig) {
    container.readiness_probe = Some(default_probe(config));
    container.liveness_probe = Some(default_probe(config));
}

fn apply_jvm_args(container: &mut Container, config: &BuilderConfig) {
    let limits = container
        .resources
        .as_ref()
        .and_then(|resources| resources.limits.as_ref());
    let memory = calculate_jvm_memory(limits, config);

    container.env.get_or_insert_with(Vec::new).push(EnvVar {
        name: JVM_ARGS_ENV_KEY.to_string(),
        value: Some(memory.vm_params()),
        ..Default::default()
    });
}
