use log::trace;
use zerocopy::{NetworkEndian, U128, U32};

//------------ AddressFamily (trait) ----------------------------------------
//
/// The address family of an IP address as a Trait.
///
/// Each family has a separate type, so that a trie only takes the exact
/// amount of memory needed for the keys of its nodes. The values are stored
/// in network byte order.
pub trait AddressFamily:
    std::fmt::Binary
    + std::fmt::Debug
    + std::hash::Hash
    + std::fmt::Display
    + Eq
    + Copy
    + Ord
    + Send
    + Sync
    + zerocopy::FromBytes
    + zerocopy::IntoBytes
    + zerocopy::KnownLayout
    + zerocopy::Immutable
    + zerocopy::Unaligned
{
    /// The number of bits in the byte representation of the family.
    const BITS: u8;

    /// The type actually holding the value, u32 for IPv4, and u128 for IPv6.
    type Inner: Into<Self> + From<u32> + From<u8>;

    /// The std::net that the value of self belongs to. So,
    /// [std::net::Ipv4Addr], and [std::net::Ipv6Addr] for IPv4, and IPv6
    /// respectively.
    type InnerIpAddr;

    fn new(value: Self::Inner) -> Self {
        value.into()
    }

    fn from_ipaddr(ip_addr: Self::InnerIpAddr) -> Self;

    fn from_u32(value: u32) -> Self;

    fn zero() -> Self;

    /// fill the bits after the specified len with zeros. Interpreted as an IP
    /// Prefix, this means that self will be truncated to the specified len.
    fn truncate_to_len(self, len: u8) -> Self;

    /// Whether the bit at position `pos`, counted from the most significant
    /// bit and starting at zero, is set. Interpreted as an IP prefix, this
    /// is the bit right after a prefix of length `pos`. Positions beyond
    /// the width of the family always read as unset.
    fn bit_at(self, pos: u8) -> bool;

    /// The number of leading bits self and other have in common.
    fn common_len(self, other: Self) -> u8;

    /// Turn self in to a [std::net::IpAddr].
    fn into_ipaddr(self) -> std::net::IpAddr;
}

//-------------- Ipv4 Type --------------------------------------------------

/// Exactly fitting IPv4 bytes (4 octets).
pub type IPv4 = zerocopy::U32<NetworkEndian>;

impl AddressFamily for IPv4 {
    const BITS: u8 = 32;
    type Inner = u32;
    type InnerIpAddr = std::net::Ipv4Addr;

    fn zero() -> Self {
        U32::from(0_u32)
    }

    fn from_u32(value: u32) -> Self {
        IPv4::from(value)
    }

    fn from_ipaddr(ip_addr: Self::InnerIpAddr) -> Self {
        IPv4::from(ip_addr.octets())
    }

    fn truncate_to_len(self, len: u8) -> Self {
        let net = u32::from(self);
        match len {
            0 => U32::from(0_u32),
            len if len >= 32 => self,
            len => U32::from(net & (u32::MAX << (32 - len as u32))),
        }
    }

    fn bit_at(self, pos: u8) -> bool {
        if pos >= 32 {
            return false;
        }
        u32::from(self) & (1_u32 << (31 - pos as u32)) != 0
    }

    fn common_len(self, other: Self) -> u8 {
        let diff = u32::from(self) ^ u32::from(other);
        trace!("common_len diff {:032b}", diff);
        diff.leading_zeros() as u8
    }

    fn into_ipaddr(self) -> std::net::IpAddr {
        std::net::IpAddr::V4(std::net::Ipv4Addr::from(u32::from(self)))
    }
}

//-------------- Ipv6 Type --------------------------------------------------

/// Exactly fitting IPv6 bytes (16 octets).
pub type IPv6 = U128<NetworkEndian>;

impl AddressFamily for IPv6 {
    const BITS: u8 = 128;
    type Inner = u128;
    type InnerIpAddr = std::net::Ipv6Addr;

    fn zero() -> Self {
        U128::from(0_u128)
    }

    fn from_ipaddr(ip_addr: Self::InnerIpAddr) -> Self {
        IPv6::from(ip_addr.octets())
    }

    fn from_u32(value: u32) -> Self {
        U128::from(value as u128)
    }

    fn truncate_to_len(self, len: u8) -> Self {
        let net = u128::from(self);
        match len {
            0 => U128::from(0_u128),
            len if len >= 128 => self,
            len => U128::from(net & (u128::MAX << (128 - len as u32))),
        }
    }

    fn bit_at(self, pos: u8) -> bool {
        if pos >= 128 {
            return false;
        }
        u128::from(self) & (1_u128 << (127 - pos as u32)) != 0
    }

    fn common_len(self, other: Self) -> u8 {
        let diff = u128::from(self) ^ u128::from(other);
        diff.leading_zeros() as u8
    }

    fn into_ipaddr(self) -> std::net::IpAddr {
        std::net::IpAddr::V6(std::net::Ipv6Addr::from(u128::from(self)))
    }
}
