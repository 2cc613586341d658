use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use ipnet::IpNet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OverlayAddressError {
    #[error("The overlay CIDR and the node address belong to different address families!")]
    MixedAddressFamilies,
}

/// Projects a node address into the overlay network: the network bits come
/// from the overlay CIDR, the host bits from the node address.
pub fn overlay_address(
    overlay_net: &IpNet,
    node_address: &IpAddr,
) -> Result<IpAddr, OverlayAddressError> {
    match (overlay_net, node_address) {
        (IpNet::V4(net), IpAddr::V4(address)) => {
            let mask = u32::from(net.netmask());
            let host = u32::from(*address) & !mask;

            Ok(IpAddr::V4(Ipv4Addr::from(u32::from(net.network()) | host)))
        }
        (IpNet::V6(net), IpAddr::V6(address)) => {
            let mask = u128::from(net.netmask());
            let host = u128::from(*address) & !mask;

            Ok(IpAddr::V6(Ipv6Addr::from(u128::from(net.network()) | host)))
        }
        _ => Err(OverlayAddressError::MixedAddressFamilies),
    }
}

#[cfg(test)]
mod tests {
    use std::net::IpAddr;

    use ipnet::IpNet;

    use super::{overlay_address, OverlayAddressError};

    #[test]
    fn overlay_address_keeps_host_bits_from_the_node_address() {
        assert_overlay("192.168.200.0/24", "10.0.14.57", "192.168.200.57");
        assert_overlay("192.168.200.0/16", "10.0.14.57", "192.168.14.57");
        assert_overlay("172.16.0.0/12", "10.31.200.3", "172.31.200.3");
    }

    #[test]
    fn overlay_address_supports_ipv6() {
        assert_overlay("fd00:abcd::/64", "fe80::1c4f:2e:9", "fd00:abcd::1c4f:2e:9");
    }

    #[test]
    fn mixed_address_families_are_rejected() {
        let net: IpNet = "192.168.200.0/24".parse().unwrap();
        let address: IpAddr = "fe80::1".parse().unwrap();

        let result = overlay_address(&net, &address);

        assert!(matches!(
            result,
            Err(OverlayAddressError::MixedAddressFamilies)
        ));
    }

    fn assert_overlay(net_raw: &str, address_raw: &str, expected_raw: &str) {
        let net: IpNet = net_raw.parse().unwrap();
        let address: IpAddr = address_raw.parse().unwrap();
        let expected: IpAddr = expected_raw.parse().unwrap();

        assert_eq!(overlay_address(&net, &address).unwrap(), expected);
    }
}
