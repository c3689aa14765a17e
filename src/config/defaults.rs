//! Default values for optional install-config fields.
//!
//! Defaults only fill fields that are unset, so applying them twice yields
//! the same configuration.

use super::cidr::Cidr;
use super::model::{
    Architecture, ClusterNetworkEntry, Hyperthreading, InstallConfig, MachineNetworkEntry,
    MachinePool, Networking, PublishStrategy,
};
use crate::platform::{self, Platform};

pub const DEFAULT_NETWORK_TYPE: &str = "OVNKubernetes";
pub const DEFAULT_HOST_PREFIX: u8 = 23;
pub const DEFAULT_REPLICAS: u32 = 3;

/// Fills every unset optional field, platform-independent and
/// platform-aware.
pub fn apply_defaults(mut config: InstallConfig) -> InstallConfig {
    let machine_cidr = default_machine_cidr(config.platform.as_ref());
    config.networking = Some(fill_networking(
        config.networking.take().unwrap_or_default(),
        machine_cidr,
    ));

    config.control_plane = Some(fill_pool(
        config
            .control_plane
            .take()
            .unwrap_or_else(|| MachinePool::named("master")),
        "master",
    ));

    if config.compute.is_empty() {
        config.compute.push(MachinePool::named("worker"));
    }
    config.compute = config
        .compute
        .into_iter()
        .map(|pool| fill_pool(pool, "worker"))
        .collect();

    if config.publish.is_none() {
        config.publish = Some(PublishStrategy::External);
    }

    config.platform = config.platform.map(apply_platform_defaults);

    config
}

/// A fully defaulted networking section for the given machine network.
#[cfg(test)]
pub(crate) fn default_networking(machine_cidr: Cidr) -> Networking {
    fill_networking(Networking::default(), machine_cidr)
}

fn fill_networking(mut networking: Networking, machine_cidr: Cidr) -> Networking {
    if networking.network_type.is_empty() {
        networking.network_type = DEFAULT_NETWORK_TYPE.to_string();
    }

    if networking.machine_network.is_empty() {
        networking.machine_network.push(MachineNetworkEntry { cidr: machine_cidr });
    }

    if networking.cluster_network.is_empty() {
        networking.cluster_network.push(ClusterNetworkEntry {
            cidr: Cidr::ipv4([10, 128, 0, 0], 14),
            host_prefix: DEFAULT_HOST_PREFIX,
        });
    }

    if networking.service_network.is_empty() {
        networking.service_network.push(Cidr::ipv4([172, 30, 0, 0], 16));
    }

    networking
}

fn fill_pool(mut pool: MachinePool, name: &str) -> MachinePool {
    if pool.name.is_empty() {
        pool.name = name.to_string();
    }
    if pool.replicas.is_none() {
        pool.replicas = Some(DEFAULT_REPLICAS);
    }
    if pool.hyperthreading.is_none() {
        pool.hyperthreading = Some(Hyperthreading::Enabled);
    }
    if pool.architecture.is_none() {
        pool.architecture = Some(Architecture::Amd64);
    }
    pool
}

fn default_machine_cidr(platform: Option<&Platform>) -> Cidr {
    match platform {
        Some(Platform::Libvirt(_)) => Cidr::ipv4([192, 168, 126, 0], 24),
        _ => Cidr::ipv4([10, 0, 0, 0], 16),
    }
}

fn apply_platform_defaults(platform: Platform) -> Platform {
    match platform {
        Platform::Azure(p) => Platform::Azure(platform::azure::apply_defaults(p)),
        Platform::Libvirt(p) => Platform::Libvirt(platform::libvirt::apply_defaults(p)),
        Platform::BareMetal(p) => Platform::BareMetal(platform::baremetal::apply_defaults(p)),
        Platform::PowerVs(p) => Platform::PowerVs(platform::powervs::apply_defaults(p)),
        Platform::OpenStack(p) => Platform::OpenStack(platform::openstack::apply_defaults(p)),
        Platform::Nutanix(p) => Platform::Nutanix(platform::nutanix::apply_defaults(p)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::fixtures::sample_config;
    use crate::platform::LibvirtPlatform;

    #[test]
    fn fills_unset_fields() {
        let mut config = sample_config();
        config.networking = None;
        config.control_plane = None;
        config.compute.clear();
        config.publish = None;

        let config = apply_defaults(config);
        let networking = config.networking.as_ref().unwrap();
        assert_eq!(networking.network_type, DEFAULT_NETWORK_TYPE);
        assert_eq!(networking.machine_network[0].cidr.to_string(), "10.0.0.0/16");
        assert_eq!(networking.cluster_network[0].host_prefix, DEFAULT_HOST_PREFIX);
        assert_eq!(networking.service_network[0].to_string(), "172.30.0.0/16");

        let control_plane = config.control_plane.as_ref().unwrap();
        assert_eq!(control_plane.name, "master");
        assert_eq!(control_plane.replicas, Some(3));
        assert_eq!(control_plane.hyperthreading, Some(Hyperthreading::Enabled));

        assert_eq!(config.compute.len(), 1);
        assert_eq!(config.compute[0].name, "worker");
        assert_eq!(config.publish, Some(PublishStrategy::External));
    }

    #[test]
    fn keeps_explicit_values() {
        let mut config = sample_config();
        let mut pool = MachinePool::named("worker");
        pool.replicas = Some(0);
        config.compute = vec![pool];
        config.publish = Some(PublishStrategy::Internal);

        let config = apply_defaults(config);
        assert_eq!(config.compute[0].replicas, Some(0));
        assert_eq!(config.publish, Some(PublishStrategy::Internal));
    }

    #[test]
    fn libvirt_uses_its_own_machine_network() {
        let mut config = sample_config();
        config.networking = None;
        config.platform = Some(Platform::Libvirt(LibvirtPlatform::default()));

        let config = apply_defaults(config);
        let networking = config.networking.unwrap();
        assert_eq!(
            networking.machine_network[0].cidr.to_string(),
            "192.168.126.0/24"
        );
        match config.platform {
            Some(Platform::Libvirt(p)) => assert_eq!(p.uri, platform::libvirt::DEFAULT_URI),
            other => panic!("unexpected platform {:?}", other),
        }
    }

    #[test]
    fn idempotent() {
        let once = apply_defaults(sample_config());
        let twice = apply_defaults(once.clone());
        assert_eq!(once, twice);
    }
}
