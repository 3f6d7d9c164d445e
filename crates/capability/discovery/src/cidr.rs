//! IPv4 网段展开
//!
//! 把 CIDR 记法展开为可探测的主机地址列表，上限 254 台，
//! 防止误扫大网段。

use crate::error::DiscoveryError;
use std::net::Ipv4Addr;

/// 单次扫描的主机数上限。
pub const MAX_HOSTS: usize = 254;

/// 展开 CIDR 网段为主机地址列表。
///
/// /31 与 /32 按点对点/单机处理；其余前缀排除网络地址与广播地址。
pub fn expand_hosts(cidr: &str) -> Result<Vec<Ipv4Addr>, DiscoveryError> {
    let (addr_part, prefix_part) = cidr
        .split_once('/')
        .ok_or_else(|| DiscoveryError::InvalidRange(cidr.to_string()))?;
    let base: Ipv4Addr = addr_part
        .parse()
        .map_err(|_| DiscoveryError::InvalidRange(cidr.to_string()))?;
    let prefix: u32 = prefix_part
        .parse()
        .map_err(|_| DiscoveryError::InvalidRange(cidr.to_string()))?;
    if prefix > 32 {
        return Err(DiscoveryError::InvalidRange(cidr.to_string()));
    }

    let mask: u32 = (!0u32).checked_shl(32 - prefix).unwrap_or(0);
    let network = u32::from(base) & mask;

    let hosts = match prefix {
        32 => vec![base],
        31 => vec![Ipv4Addr::from(network), Ipv4Addr::from(network + 1)],
        _ => {
            let broadcast = network | !mask;
            ((network + 1)..broadcast)
                .take(MAX_HOSTS)
                .map(Ipv4Addr::from)
                .collect()
        }
    };
    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slash_30_yields_two_usable_hosts() {
        let hosts = expand_hosts("192.168.1.0/30").unwrap();
        assert_eq!(
            hosts,
            vec![
                Ipv4Addr::new(192, 168, 1, 1),
                Ipv4Addr::new(192, 168, 1, 2)
            ]
        );
    }

    #[test]
    fn slash_24_is_capped_at_254_hosts() {
        let hosts = expand_hosts("10.0.0.0/24").unwrap();
        assert_eq!(hosts.len(), 254);
        assert_eq!(hosts[0], Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(hosts[253], Ipv4Addr::new(10, 0, 0, 254));
    }

    #[test]
    fn large_range_is_capped() {
        let hosts = expand_hosts("10.0.0.0/16").unwrap();
        assert_eq!(hosts.len(), MAX_HOSTS);
    }

    #[test]
    fn host_bits_are_masked_off() {
        let hosts = expand_hosts("192.168.1.37/30").unwrap();
        assert_eq!(hosts[0], Ipv4Addr::new(192, 168, 1, 37));
    }

    #[test]
    fn slash_32_is_single_host() {
        let hosts = expand_hosts("10.1.2.3/32").unwrap();
        assert_eq!(hosts, vec![Ipv4Addr::new(10, 1, 2, 3)]);
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(matches!(
            expand_hosts("not-a-subnet"),
            Err(DiscoveryError::InvalidRange(_))
        ));
        assert!(matches!(
            expand_hosts("10.0.0.0/33"),
            Err(DiscoveryError::InvalidRange(_))
        ));
        assert!(matches!(
            expand_hosts("300.0.0.0/24"),
            Err(DiscoveryError::InvalidRange(_))
        ));
    }
}
