use std::collections::BTreeMap;

use kube::api::ObjectMeta;

use super::naming::instance_name;
use crate::models::nexus::Nexus;

pub const APP_LABEL: &str = "app";

/// Labels stamped on everything derived from a `Nexus`: the instance's own
/// labels plus the identity label, which wins on conflict.
pub fn generate_labels(nexus: &Nexus) -> BTreeMap<String, String> {
    let mut labels = nexus.metadata.labels.clone().unwrap_or_default();
    labels.insert(APP_LABEL.to_string(), instance_name(nexus).to_string());
    labels
}

pub fn apply_labels(nexus: &Nexus, object_meta: &mut ObjectMeta) {
    object_meta.labels = Some(generate_labels(nexus));
}
