use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, Resource};
use log::{debug, info};
use serde_json::{json, Value};

use crate::models::nexus::{Nexus, NexusSpec};
use crate::resources::defaults::{BuilderConfig, ResolvedSpec};
use crate::resources::deployment::new_deployment;
use crate::resources::naming::{claim_name, instance_name};
use crate::utils::config::OperatorConfig;
use crate::utils::error::Error;

const FIELD_MANAGER: &str = "nexus-operator";

pub struct NexusController {
    client: Client,
    builder_config: BuilderConfig,
    persist_resolved_defaults: bool,
}

impl NexusController {
    pub fn new(client: Client, config: &OperatorConfig) -> Self {
        NexusController {
            client,
            builder_config: config.builder_config(),
            persist_resolved_defaults: config.persist_resolved_defaults,
        }
    }

    /// Builds the `Deployment` for a `Nexus` and applies it server side.
    ///
    /// # Arguments:
    /// - `nexus` - The instance being reconciled.
    /// - `namespace` - Namespace the instance and its `Deployment` live in.
    ///
    /// Returns the defaults the deployment was built with.
    pub async fn apply_deployment(
        &self,
        nexus: &Nexus,
        namespace: &str,
    ) -> Result<ResolvedSpec, Error> {
        let name = instance_name(nexus);
        debug!("Nexus apply_deployment {}/{}", namespace, name);

        // The claim itself is provisioned outside the operator.
        let claim = claim_name(name);
        let synthesized = new_deployment(nexus, Some(&claim), &self.builder_config);

        let mut deployment = synthesized.deployment;
        deployment.metadata.owner_references = owner_reference(nexus).map(|owner| vec![owner]);

        let api: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let params = PatchParams::apply(FIELD_MANAGER).force();
        api.patch(name, &params, &Patch::Apply(&deployment)).await?;

        info!("Applied deployment {}/{}", namespace, name);
        Ok(synthesized.resolved)
    }

    /// Writes the resolved image selection back into the `Nexus` spec when enabled
    /// and when it differs from what the spec already says.
    ///
    /// # Arguments:
    /// - `nexus` - The instance the deployment was built from.
    /// - `namespace` - Namespace where the instance resides.
    /// - `resolved` - Defaults returned by `apply_deployment`.
    pub async fn persist_resolved_defaults(
        &self,
        nexus: &Nexus,
        namespace: &str,
        resolved: &ResolvedSpec,
    ) -> Result<(), Error> {
        if !self.persist_resolved_defaults {
            return Ok(());
        }

        let patch_body = match resolved_defaults_patch(&nexus.spec, resolved) {
            Some(patch_body) => patch_body,
            None => return Ok(()),
        };

        let name = instance_name(nexus);
        debug!("Nexus persist_resolved_defaults {}/{}", namespace, name);

        let api: Api<Nexus> = Api::namespaced(self.client.clone(), namespace);
        let patch: Patch<&Value> = Patch::Merge(&patch_body);
        api.patch(name, &PatchParams::default(), &patch).await?;

        Ok(())
    }
}

/// Controller reference making the `Deployment` owned by (and garbage collected with) its `Nexus`.
pub fn owner_reference(nexus: &Nexus) -> Option<OwnerReference> {
    Some(OwnerReference {
        api_version: Nexus::api_version(&()).to_string(),
        kind: Nexus::kind(&()).to_string(),
        name: nexus.metadata.name.clone()?,
        uid: nexus.metadata.uid.clone()?,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

/// Merge patch carrying the resolved image selection, or `None` when the spec already matches.
pub fn resolved_defaults_patch(spec: &NexusSpec, resolved: &ResolvedSpec) -> Option<Value> {
    if !resolved.image_differs_from(spec) {
        return None;
    }

    Some(json!({
        "spec": {
            "image": resolved.image,
            "useRedHatImage": resolved.use_red_hat_image
        }
    }))
}
