use std::error::Error;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use inetnum::addr::Prefix;
use inetnum::asn::Asn;

use super::*;
use crate::route::{AsPath, BgpPath, Community};

fn bgp_path() -> Path {
    Path::new_bgp(BgpPath {
        next_hop: IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)),
        as_path: AsPath::from_sequence([Asn::from_u32(12345)]),
        communities: vec![Community::new(65000, 1)],
        ..Default::default()
    })
}

#[test]
fn test_empty_chain_accepts_unmodified() -> Result<(), Box<dyn Error>> {
    let pfx = Prefix::from_str("10.0.0.0/8")?;
    let (path, reject) = FilterChain::default().process(&pfx, bgp_path());
    assert!(!reject);
    assert_eq!(path, bgp_path());
    Ok(())
}

#[test]
fn test_accept_and_reject_terminate() -> Result<(), Box<dyn Error>> {
    let pfx = Prefix::from_str("10.0.0.0/8")?;

    let filter = Filter::new(
        "f",
        vec![
            Term::new(
                "modify-then-accept",
                vec![],
                vec![Action::SetLocalPref(200), Action::Accept],
            ),
            Term::new("never-reached", vec![], vec![Action::Reject]),
        ],
    );
    let (path, reject) = filter.process(&pfx, bgp_path());
    assert!(!reject);
    assert_eq!(path.bgp().map(|b| b.local_pref), Some(200));

    let chain =
        FilterChain::new(vec![Filter::accept_all(), Filter::reject_all()]);
    let (_, reject) = chain.process(&pfx, bgp_path());
    assert!(reject);

    let chain = FilterChain::new(vec![
        Filter::reject_all(),
        Filter::new(
            "late",
            vec![Term::new("lp", vec![], vec![Action::SetLocalPref(1)])],
        ),
    ]);
    let (path, reject) = chain.process(&pfx, bgp_path());
    assert!(reject);
    assert_eq!(path.bgp().map(|b| b.local_pref), Some(100));
    Ok(())
}

#[test]
fn test_route_filters() -> Result<(), Box<dyn Error>> {
    let base = Prefix::from_str("10.0.0.0/8")?;
    let p8 = Prefix::from_str("10.0.0.0/8")?;
    let p16 = Prefix::from_str("10.1.0.0/16")?;
    let p24 = Prefix::from_str("10.1.1.0/24")?;
    let outside = Prefix::from_str("11.0.0.0/16")?;

    let exact = RouteFilter::new(base, RouteFilterMatcher::Exact);
    assert!(exact.matches(&p8));
    assert!(!exact.matches(&p16));

    let or_longer = RouteFilter::new(base, RouteFilterMatcher::OrLonger);
    assert!(or_longer.matches(&p8));
    assert!(or_longer.matches(&p24));
    assert!(!or_longer.matches(&outside));

    let longer = RouteFilter::new(base, RouteFilterMatcher::Longer);
    assert!(!longer.matches(&p8));
    assert!(longer.matches(&p16));

    let range = RouteFilter::new(
        base,
        RouteFilterMatcher::InRange { min: 12, max: 20 },
    );
    assert!(range.matches(&p16));
    assert!(!range.matches(&p24));
    assert!(!range.matches(&p8));
    assert!(!range.matches(&outside));
    Ok(())
}

#[test]
fn test_term_conditions() -> Result<(), Box<dyn Error>> {
    let p16 = Prefix::from_str("10.1.0.0/16")?;
    let term = Term::new(
        "match",
        vec![
            TermCondition::PrefixList(vec![Prefix::from_str(
                "192.0.2.0/24",
            )?]),
            TermCondition::Community(Community::new(65000, 1)),
        ],
        vec![Action::Reject],
    );

    // Matches on the community.
    assert!(term.process(&p16, bgp_path()).reject);

    // No BGP attributes, no community, not in the prefix list.
    let stat = Path::new_static(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));
    let res = term.process(&p16, stat.clone());
    assert!(!res.terminate);
    assert_eq!(res.path, stat);

    let res = term.process(&Prefix::from_str("192.0.2.0/24")?, stat);
    assert!(res.reject);
    Ok(())
}

#[test]
fn test_modifying_actions() -> Result<(), Box<dyn Error>> {
    let pfx = Prefix::from_str("10.0.0.0/8")?;
    let nh = IpAddr::V4(Ipv4Addr::new(198, 51, 100, 1));
    let term = Term::new(
        "modify",
        vec![],
        vec![
            Action::SetNextHop(nh),
            Action::AsPathPrepend {
                asn: Asn::from_u32(12345),
                times: 3,
            },
            Action::AddCommunity(Community::new(65000, 2)),
            Action::AddCommunity(Community::new(65000, 2)),
        ],
    );

    let original = bgp_path();
    let res = term.process(&pfx, original.clone());
    let bgp = res.path.bgp().ok_or("not a bgp path")?;
    assert_eq!(bgp.next_hop, nh);
    assert_eq!(bgp.as_path.to_string(), "12345 12345 12345 12345");
    assert_eq!(bgp.as_path.len(), 4);
    assert_eq!(
        bgp.communities,
        vec![Community::new(65000, 1), Community::new(65000, 2)]
    );
    // The attributes are copied on write.
    assert_eq!(original, bgp_path());

    // Paths of other protocols are left alone.
    let stat = Path::new_static(nh);
    assert_eq!(term.process(&pfx, stat.clone()).path, stat);
    Ok(())
}
