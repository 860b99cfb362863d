use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use super::bgp::BgpPath;

//------------ Protocol ------------------------------------------------------

/// The source protocol of a path. The order of the variants is the
/// precedence order: if a route has paths of several protocols, only the
/// paths of the lowest protocol take part in the selection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Protocol {
    Static,
    Bgp,
    Ospf,
    Isis,
    Fib,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Static => write!(f, "static"),
            Protocol::Bgp => write!(f, "bgp"),
            Protocol::Ospf => write!(f, "ospf"),
            Protocol::Isis => write!(f, "isis"),
            Protocol::Fib => write!(f, "fib"),
        }
    }
}

//------------ Per protocol attributes ---------------------------------------

/// A configured static path.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StaticPath {
    pub next_hop: IpAddr,
}

/// The kind of an OSPF route, from most to least preferred.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OspfPathType {
    IntraArea,
    InterArea,
    External1,
    External2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OspfPath {
    pub path_type: OspfPathType,
    pub metric: u32,
    pub next_hop: IpAddr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IsisLevel {
    Level1,
    Level2,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsisPath {
    pub level: IsisLevel,
    pub metric: u32,
    pub next_hop: IpAddr,
}

/// A path redistributed from the kernel forwarding table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FibPath {
    /// The route priority, lower is better.
    pub priority: u32,
    pub next_hop: IpAddr,
    /// The kernel protocol number that installed the route.
    pub kernel_protocol: u8,
}

/// The attributes of a path, one variant per source protocol.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PathAttrs {
    Static(StaticPath),
    Bgp(Arc<BgpPath>),
    Ospf(OspfPath),
    Isis(IsisPath),
    Fib(FibPath),
}

//------------ HiddenReason --------------------------------------------------

/// Why a path is kept in a RIB, but not used nor exposed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HiddenReason {
    NextHopUnreachable,
    FilteredByPolicy,
    AsLoop,
    OriginatorIdLoop,
    ClusterLoop,
}

impl fmt::Display for HiddenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            HiddenReason::NextHopUnreachable => "next-hop-unreachable",
            HiddenReason::FilteredByPolicy => "filtered-by-policy",
            HiddenReason::AsLoop => "as-loop",
            HiddenReason::OriginatorIdLoop => "originator-id-loop",
            HiddenReason::ClusterLoop => "cluster-loop",
        };
        f.write_str(reason)
    }
}

//------------ Path ----------------------------------------------------------

/// One way to reach a prefix, as learned from a protocol.
///
/// Two paths are equal if their attributes are equal. The hidden marker
/// and the learn time are bookkeeping of the RIB holding the path, they
/// don't take part in the comparison.
#[derive(Clone, Debug)]
pub struct Path {
    pub attrs: PathAttrs,
    pub hidden_reason: Option<HiddenReason>,
    /// The time the path was learned, in seconds since the epoch.
    pub ltime: u64,
}

impl Path {
    pub fn new(attrs: PathAttrs) -> Self {
        Self {
            attrs,
            hidden_reason: None,
            ltime: 0,
        }
    }

    pub fn new_static(next_hop: IpAddr) -> Self {
        Self::new(PathAttrs::Static(StaticPath { next_hop }))
    }

    pub fn new_bgp(bgp: BgpPath) -> Self {
        Self::new(PathAttrs::Bgp(Arc::new(bgp)))
    }

    pub fn new_ospf(ospf: OspfPath) -> Self {
        Self::new(PathAttrs::Ospf(ospf))
    }

    pub fn new_isis(isis: IsisPath) -> Self {
        Self::new(PathAttrs::Isis(isis))
    }

    pub fn new_fib(fib: FibPath) -> Self {
        Self::new(PathAttrs::Fib(fib))
    }

    pub fn with_ltime(mut self, ltime: u64) -> Self {
        self.ltime = ltime;
        self
    }

    pub fn protocol(&self) -> Protocol {
        match self.attrs {
            PathAttrs::Static(_) => Protocol::Static,
            PathAttrs::Bgp(_) => Protocol::Bgp,
            PathAttrs::Ospf(_) => Protocol::Ospf,
            PathAttrs::Isis(_) => Protocol::Isis,
            PathAttrs::Fib(_) => Protocol::Fib,
        }
    }

    pub fn next_hop(&self) -> IpAddr {
        match &self.attrs {
            PathAttrs::Static(p) => p.next_hop,
            PathAttrs::Bgp(p) => p.next_hop,
            PathAttrs::Ospf(p) => p.next_hop,
            PathAttrs::Isis(p) => p.next_hop,
            PathAttrs::Fib(p) => p.next_hop,
        }
    }

    pub fn bgp(&self) -> Option<&BgpPath> {
        match &self.attrs {
            PathAttrs::Bgp(p) => Some(p),
            _ => None,
        }
    }

    /// Mutable access to the BGP attributes. The attributes are copied
    /// first if they are shared with another path.
    pub fn bgp_mut(&mut self) -> Option<&mut BgpPath> {
        match &mut self.attrs {
            PathAttrs::Bgp(p) => Some(Arc::make_mut(p)),
            _ => None,
        }
    }

    /// The ADD-PATH identifier of a BGP path, zero for all other paths.
    pub fn path_identifier(&self) -> u32 {
        self.bgp().map(|p| p.path_identifier).unwrap_or(0)
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden_reason.is_some()
    }

    pub fn set_hidden(&mut self, reason: Option<HiddenReason>) {
        self.hidden_reason = reason;
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.attrs == other.attrs
    }
}

impl Eq for Path {}

impl std::hash::Hash for Path {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.attrs.hash(state);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.attrs {
            PathAttrs::Static(p) => write!(f, "static nh {}", p.next_hop)?,
            PathAttrs::Bgp(p) => write!(f, "{}", p)?,
            PathAttrs::Ospf(p) => write!(
                f,
                "ospf {:?} metric {} nh {}",
                p.path_type, p.metric, p.next_hop
            )?,
            PathAttrs::Isis(p) => write!(
                f,
                "isis {:?} metric {} nh {}",
                p.level, p.metric, p.next_hop
            )?,
            PathAttrs::Fib(p) => write!(
                f,
                "fib prio {} nh {} proto {}",
                p.priority, p.next_hop, p.kernel_protocol
            )?,
        }
        if let Some(reason) = self.hidden_reason {
            write!(f, " (hidden: {})", reason)?;
        }
        Ok(())
    }
}
