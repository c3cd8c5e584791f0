//! Names derived from a `Nexus` instance. The formats are stable: changing one
//! renames the objects of every running instance on the next reconcile.

use crate::models::nexus::Nexus;

pub fn instance_name(nexus: &Nexus) -> &str {
    nexus.metadata.name.as_deref().unwrap_or_default()
}

/// `<name>-data`, shared by the data volume and its mount.
pub fn data_volume_name(name: &str) -> String {
    format!("{}-data", name)
}

/// Persistent volume claim provisioned for an instance: the instance name itself.
pub fn claim_name(name: &str) -> String {
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::nexus::{Nexus, NexusSpec};

    #[test]
    fn names_are_derived_from_instance() {
        let nexus = Nexus::new("nexus3", NexusSpec::default());
        let name = instance_name(&nexus);

        assert_eq!(name, "nexus3");
        assert_eq!(data_volume_name(name), "nexus3-data");
        assert_eq!(claim_name(name), "nexus3");
    }

    #[test]
    fn unnamed_instance_has_empty_name() {
        let mut nexus = Nexus::new("nexus3", NexusSpec::default());
        nexus.metadata.name = None;

        assert_eq!(instance_name(&nexus), "");
    }
}
