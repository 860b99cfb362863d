use crate::AddressFamily;

//------------ PrefixId ------------------------------------------------------

/// The key of a node in a [crate::trie::PrefixTrie]: a network address of
/// family `AF` and a prefix length. The address is always truncated to the
/// length, so two ids are equal if, and only if, they denote the same
/// prefix.
#[derive(Hash, Eq, PartialEq, Debug, Copy, Clone)]
pub struct PrefixId<AF: AddressFamily> {
    len: u8,
    net: AF,
}

impl<AF: AddressFamily> PrefixId<AF> {
    pub(crate) fn new(net: AF, len: u8) -> Self {
        let len = len.min(AF::BITS);
        PrefixId {
            len,
            net: net.truncate_to_len(len),
        }
    }

    pub(crate) fn get_net(&self) -> AF {
        self.net
    }

    pub(crate) fn get_len(&self) -> u8 {
        self.len
    }

    /// Whether `other` is a strict more-specific of self, i.e. it is
    /// longer and shares all of self's bits.
    pub(crate) fn contains(&self, other: &Self) -> bool {
        if other.len <= self.len {
            return false;
        }
        other.net.truncate_to_len(self.len) == self.net
    }

    /// Whether `other` is equal to self, or a more-specific of self.
    pub(crate) fn covers(&self, other: &Self) -> bool {
        self == other || self.contains(other)
    }

    /// The bit of this prefix right after the first `len` bits. This is the
    /// bit that decides in which child slot of a node of length `len` this
    /// prefix goes.
    pub(crate) fn bit_at(&self, len: u8) -> bool {
        self.net.bit_at(len)
    }

    /// The longest prefix that covers both self and other.
    pub(crate) fn common_supernet(&self, other: &Self) -> Self {
        let len = self
            .net
            .common_len(other.net)
            .min(self.len)
            .min(other.len);
        Self::new(self.net, len)
    }
}

impl<AF: AddressFamily> std::fmt::Display for PrefixId<AF> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.net.into_ipaddr(), self.len)
    }
}

// Callers dispatch on the address family of the prefix before converting,
// an address of the wrong family ends up as the zero address.
impl<AF: AddressFamily> From<inetnum::addr::Prefix> for PrefixId<AF> {
    fn from(value: inetnum::addr::Prefix) -> Self {
        let net = match value.addr() {
            std::net::IpAddr::V4(addr) => {
                AF::read_from_bytes(&addr.octets()).ok()
            }
            std::net::IpAddr::V6(addr) => {
                AF::read_from_bytes(&addr.octets()).ok()
            }
        };
        Self::new(net.unwrap_or(<AF as AddressFamily>::zero()), value.len())
    }
}

// There is no reasonable way for this to panic, PrefixId and inetnum's Prefix
// represent the same data in slightly different ways, and the net of a
// PrefixId is always truncated to its length.
#[allow(clippy::unwrap_used)]
impl<AF: AddressFamily> From<PrefixId<AF>> for inetnum::addr::Prefix {
    fn from(value: PrefixId<AF>) -> Self {
        Self::new(value.get_net().into_ipaddr(), value.get_len()).unwrap()
    }
}
