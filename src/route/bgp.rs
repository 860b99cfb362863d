use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

use inetnum::asn::Asn;

//------------ Origin --------------------------------------------------------

/// The ORIGIN attribute of a BGP path. Lower is better.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Origin {
    #[default]
    Igp,
    Egp,
    Incomplete,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Igp => write!(f, "igp"),
            Origin::Egp => write!(f, "egp"),
            Origin::Incomplete => write!(f, "incomplete"),
        }
    }
}

//------------ AsPath --------------------------------------------------------

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SegmentType {
    Set,
    Sequence,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AsPathSegment {
    pub segment_type: SegmentType,
    pub asns: Vec<Asn>,
}

impl AsPathSegment {
    pub fn sequence(asns: impl IntoIterator<Item = Asn>) -> Self {
        Self {
            segment_type: SegmentType::Sequence,
            asns: asns.into_iter().collect(),
        }
    }

    pub fn set(asns: impl IntoIterator<Item = Asn>) -> Self {
        Self {
            segment_type: SegmentType::Set,
            asns: asns.into_iter().collect(),
        }
    }

    /// The number of hops this segment adds to the path length. A set
    /// counts as a single hop, however many ASNs it holds.
    pub fn hop_count(&self) -> usize {
        match self.segment_type {
            SegmentType::Sequence => self.asns.len(),
            SegmentType::Set => usize::from(!self.asns.is_empty()),
        }
    }
}

// The number of ASNs a sequence segment can hold on the wire.
const MAX_SEGMENT_LEN: usize = 255;

/// The AS_PATH of a BGP path as a list of segments.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AsPath(Vec<AsPathSegment>);

impl AsPath {
    pub fn new(segments: Vec<AsPathSegment>) -> Self {
        Self(segments)
    }

    /// Create a path that consists of one sequence segment.
    pub fn from_sequence(asns: impl IntoIterator<Item = Asn>) -> Self {
        let segment = AsPathSegment::sequence(asns);
        if segment.asns.is_empty() {
            return Self::default();
        }
        Self(vec![segment])
    }

    pub fn segments(&self) -> &[AsPathSegment] {
        &self.0
    }

    /// The path length as used in the decision process.
    pub fn len(&self) -> usize {
        self.0.iter().map(AsPathSegment::hop_count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, asn: Asn) -> bool {
        self.0.iter().any(|s| s.asns.contains(&asn))
    }

    /// The left-most ASN of the path, the neighbour AS for a path learned
    /// over eBGP.
    pub fn first_asn(&self) -> Option<Asn> {
        self.0
            .first()
            .filter(|s| s.segment_type == SegmentType::Sequence)
            .and_then(|s| s.asns.first().copied())
    }

    /// The right-most ASN of the path, i.e. the originating AS.
    pub fn origin_asn(&self) -> Option<Asn> {
        self.0
            .last()
            .filter(|s| s.segment_type == SegmentType::Sequence)
            .and_then(|s| s.asns.last().copied())
    }

    /// Prepend `asn` `times` times to the path. The ASNs go into the
    /// leading sequence segment while it has room, into a new leading
    /// sequence segment otherwise.
    pub fn prepend(&mut self, asn: Asn, times: u8) {
        for _ in 0..times {
            match self.0.first_mut() {
                Some(seg)
                    if seg.segment_type == SegmentType::Sequence
                        && seg.asns.len() < MAX_SEGMENT_LEN =>
                {
                    seg.asns.insert(0, asn);
                }
                _ => self.0.insert(0, AsPathSegment::sequence([asn])),
            }
        }
    }
}

impl fmt::Display for AsPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for seg in &self.0 {
            let asns = seg
                .asns
                .iter()
                .map(|a| a.into_u32().to_string())
                .collect::<Vec<_>>()
                .join(" ");
            if !first {
                write!(f, " ")?;
            }
            first = false;
            match seg.segment_type {
                SegmentType::Sequence => write!(f, "{}", asns)?,
                SegmentType::Set => write!(f, "{{{}}}", asns)?,
            }
        }
        Ok(())
    }
}

//------------ Community -----------------------------------------------------

/// A standard (RFC 1997) community.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Community(pub u32);

impl Community {
    /// Do not advertise outside the local AS (RFC 1997).
    pub const NO_EXPORT: Community = Community(0xFFFF_FF01);

    /// Do not advertise to any peer (RFC 1997).
    pub const NO_ADVERTISE: Community = Community(0xFFFF_FF02);

    pub fn new(asn: u16, value: u16) -> Self {
        Self((u32::from(asn) << 16) | u32::from(value))
    }
}

impl fmt::Display for Community {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0 >> 16, self.0 & 0xffff)
    }
}

//------------ BgpPath -------------------------------------------------------

/// The attributes of a path learned over BGP that take part in the
/// decision process, plus the ones policy may act upon.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BgpPath {
    /// The ADD-PATH path identifier, zero if the session does not
    /// negotiate ADD-PATH.
    pub path_identifier: u32,
    pub next_hop: IpAddr,
    pub local_pref: u32,
    pub as_path: AsPath,
    pub origin: Origin,
    pub med: u32,
    /// Whether the path was learned over an external session.
    pub ebgp: bool,
    /// The BGP identifier of the peer, or the ORIGINATOR_ID if the path
    /// was reflected.
    pub bgp_identifier: u32,
    /// The address of the peer the path was learned from.
    pub source: IpAddr,
    pub communities: Vec<Community>,
}

impl Default for BgpPath {
    fn default() -> Self {
        Self {
            path_identifier: 0,
            next_hop: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            local_pref: 100,
            as_path: AsPath::default(),
            origin: Origin::Igp,
            med: 0,
            ebgp: false,
            bgp_identifier: 0,
            source: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            communities: vec![],
        }
    }
}

impl BgpPath {
    /// Compare two paths for the decision process. `Ordering::Less` means
    /// self is preferred over other.
    ///
    /// The first difference decides: higher local preference, shorter AS
    /// path, lower origin, lower MED, lower BGP identifier, lower source
    /// address. Paths that are still tied are ordered eBGP before iBGP,
    /// then by next hop, and finally by all their attributes, so that the
    /// result is a total order.
    pub fn select_cmp(&self, other: &Self) -> Ordering {
        other
            .local_pref
            .cmp(&self.local_pref)
            .then_with(|| self.as_path.len().cmp(&other.as_path.len()))
            .then_with(|| self.origin.cmp(&other.origin))
            .then_with(|| self.med.cmp(&other.med))
            .then_with(|| self.bgp_identifier.cmp(&other.bgp_identifier))
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| other.ebgp.cmp(&self.ebgp))
            .then_with(|| self.next_hop.cmp(&other.next_hop))
            .then_with(|| self.cmp(other))
    }

    /// Whether both paths are equally good for multipath: local
    /// preference, AS path length, origin and MED are all equal.
    pub fn ecmp(&self, other: &Self) -> bool {
        self.local_pref == other.local_pref
            && self.as_path.len() == other.as_path.len()
            && self.origin == other.origin
            && self.med == other.med
    }
}

impl fmt::Display for BgpPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bgp nh {} lp {} as-path [{}] origin {} med {} {} src {}",
            self.next_hop,
            self.local_pref,
            self.as_path,
            self.origin,
            self.med,
            if self.ebgp { "ebgp" } else { "ibgp" },
            self.source
        )?;
        if self.path_identifier != 0 {
            write!(f, " id {}", self.path_identifier)?;
        }
        Ok(())
    }
}
