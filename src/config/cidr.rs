//! CIDR network notation used by the networking section.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CidrError;

/// An IP network in `address/prefix` notation.
///
/// The address is kept as written so validation can report a CIDR whose
/// host bits are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Cidr {
    addr: IpAddr,
    prefix: u8,
}

impl Cidr {
    /// Creates a CIDR, rejecting prefixes wider than the address family.
    pub fn new(addr: IpAddr, prefix: u8) -> Result<Self, CidrError> {
        let max = max_prefix(&addr);
        if prefix > max {
            return Err(CidrError::PrefixLength {
                cidr: format!("{}/{}", addr, prefix),
                prefix,
                max,
            });
        }
        Ok(Self { addr, prefix })
    }

    /// IPv4 network from its octets; prefixes above 32 are clamped.
    pub fn ipv4(octets: [u8; 4], prefix: u8) -> Self {
        Self {
            addr: IpAddr::from(octets),
            prefix: prefix.min(32),
        }
    }

    /// The address as written.
    pub fn addr(&self) -> IpAddr {
        self.addr
    }

    /// The prefix length.
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    pub fn is_ipv4(&self) -> bool {
        self.addr.is_ipv4()
    }

    /// Bit width of the address family (32 or 128).
    pub fn address_bits(&self) -> u8 {
        max_prefix(&self.addr)
    }

    /// The network address, with all host bits cleared.
    pub fn network(&self) -> IpAddr {
        let bits = to_bits(&self.addr) & self.mask();
        from_bits(bits, self.addr.is_ipv4())
    }

    /// Returns true if the address as written has no host bits set.
    pub fn is_network_address(&self) -> bool {
        self.network() == self.addr
    }

    /// Returns true if `ip` falls inside this network.
    pub fn contains(&self, ip: &IpAddr) -> bool {
        if ip.is_ipv4() != self.is_ipv4() {
            return false;
        }
        to_bits(ip) & self.mask() == to_bits(&self.addr) & self.mask()
    }

    /// Returns true if the two networks share any address.
    pub fn overlaps(&self, other: &Cidr) -> bool {
        if self.is_ipv4() != other.is_ipv4() {
            return false;
        }
        let mask = if self.prefix <= other.prefix {
            self.mask()
        } else {
            other.mask()
        };
        to_bits(&self.addr) & mask == to_bits(&other.addr) & mask
    }

    fn mask(&self) -> u128 {
        prefix_mask(u32::from(self.address_bits()), u32::from(self.prefix))
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| CidrError::Syntax(s.to_string()))?;
        let addr: IpAddr = addr.parse().map_err(|_| CidrError::Syntax(s.to_string()))?;
        let prefix: u8 = prefix.parse().map_err(|_| CidrError::Syntax(s.to_string()))?;
        Cidr::new(addr, prefix)
    }
}

impl TryFrom<String> for Cidr {
    type Error = CidrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Cidr> for String {
    fn from(cidr: Cidr) -> Self {
        cidr.to_string()
    }
}

fn max_prefix(addr: &IpAddr) -> u8 {
    if addr.is_ipv4() {
        32
    } else {
        128
    }
}

fn to_bits(addr: &IpAddr) -> u128 {
    match addr {
        IpAddr::V4(v4) => u128::from(u32::from(*v4)),
        IpAddr::V6(v6) => u128::from(*v6),
    }
}

fn from_bits(bits: u128, ipv4: bool) -> IpAddr {
    if ipv4 {
        IpAddr::from((bits as u32).to_be_bytes())
    } else {
        IpAddr::from(bits.to_be_bytes())
    }
}

fn prefix_mask(width: u32, prefix: u32) -> u128 {
    if prefix == 0 {
        return 0;
    }
    let full = if width == 128 {
        u128::MAX
    } else {
        (1u128 << width) - 1
    };
    let host_bits = width - prefix;
    if host_bits == 0 {
        full
    } else {
        full & !((1u128 << host_bits) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidr(s: &str) -> Cidr {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_displays() {
        let c = cidr("10.0.0.0/16");
        assert_eq!(c.prefix(), 16);
        assert!(c.is_ipv4());
        assert_eq!(c.to_string(), "10.0.0.0/16");

        let v6 = cidr("fd01::/48");
        assert_eq!(v6.address_bits(), 128);
    }

    #[test]
    fn rejects_bad_syntax_and_prefix() {
        assert!(matches!("10.0.0.0".parse::<Cidr>(), Err(CidrError::Syntax(_))));
        assert!(matches!("10.0.0.0/x".parse::<Cidr>(), Err(CidrError::Syntax(_))));
        assert!(matches!(
            "10.0.0.0/33".parse::<Cidr>(),
            Err(CidrError::PrefixLength { max: 32, .. })
        ));
    }

    #[test]
    fn network_address_detection() {
        assert!(cidr("10.128.0.0/14").is_network_address());
        let c = cidr("10.0.0.1/16");
        assert!(!c.is_network_address());
        assert_eq!(c.network().to_string(), "10.0.0.0");
    }

    #[test]
    fn containment_and_overlap() {
        let machine = cidr("10.0.0.0/16");
        assert!(machine.contains(&"10.0.4.5".parse().unwrap()));
        assert!(!machine.contains(&"10.1.0.1".parse().unwrap()));
        assert!(!machine.contains(&"fd00::1".parse().unwrap()));

        assert!(machine.overlaps(&cidr("10.0.128.0/17")));
        assert!(cidr("10.0.128.0/17").overlaps(&machine));
        assert!(!machine.overlaps(&cidr("172.30.0.0/16")));
        assert!(cidr("0.0.0.0/0").overlaps(&machine));
    }

    #[test]
    fn serde_uses_string_form() {
        let c: Cidr = serde_yaml::from_str("\"192.168.126.0/24\"").unwrap();
        assert_eq!(c, cidr("192.168.126.0/24"));
        let out = serde_yaml::to_string(&c).unwrap();
        assert_eq!(out.trim(), "192.168.126.0/24");
        assert!(serde_yaml::from_str::<Cidr>("\"nope\"").is_err());
    }
}
