use std::error::Error;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;
use std::sync::Arc;

use inetnum::addr::Prefix;
use inetnum::asn::Asn;
use rotonda_rib::errors::RibError;
use rotonda_rib::filter::{
    Action, Filter, FilterChain, RouteFilter, RouteFilterMatcher, Term,
    TermCondition,
};
use rotonda_rib::rib::config::{Afi, ClientOptions, RibConfig};
use rotonda_rib::rib::{AdjRibOut, LocRib, PeerInfo};
use rotonda_rib::route::{Community, Path};
use rotonda_rib::test_types::{bgp_path, ClientEvent, RecordingClient};

mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

fn addr(last: u8) -> Ipv4Addr {
    Ipv4Addr::new(192, 0, 2, last)
}

fn peer_addr(last: u8) -> IpAddr {
    IpAddr::V4(addr(last))
}

fn with_community(path: &Path, community: Community) -> Path {
    let mut path = path.clone();
    if let Some(bgp) = path.bgp_mut() {
        bgp.communities.push(community);
    }
    path
}

fn with_id(path: &Path, id: u32) -> Path {
    let mut path = path.clone();
    if let Some(bgp) = path.bgp_mut() {
        bgp.path_identifier = id;
    }
    path
}

// An outgoing RIB for `peer`, fed by `loc_rib`, with a recording session
// registered on it.
fn out_rib(
    loc_rib: &LocRib,
    config: RibConfig,
    peer: PeerInfo,
    chain: FilterChain,
) -> (Arc<AdjRibOut>, Arc<RecordingClient>) {
    let adj_out = Arc::new(AdjRibOut::new(config, peer, chain));
    let session = Arc::new(RecordingClient::new());
    adj_out.register(session.clone());
    loc_rib.register_with_options(adj_out.clone(), adj_out.upstream_options());
    session.take_events();
    (adj_out, session)
}

#[test]
fn test_own_paths_not_sent_back() -> Result<(), Box<dyn Error>> {
    crate::common::init();

    let loc_rib = LocRib::new(RibConfig::named("inet.0"));
    let pfx = Prefix::from_str("10.0.0.0/8")?;
    let other = bgp_path(100, addr(2), &[65002]);
    let own = bgp_path(200, addr(1), &[65001]);
    loc_rib.add_path(&pfx, other.clone())?;

    let adj_out = Arc::new(AdjRibOut::new(
        RibConfig::named("out-1"),
        PeerInfo::ebgp(peer_addr(1)),
        FilterChain::default(),
    ));
    let session = Arc::new(RecordingClient::new());
    adj_out.register(session.clone());
    loc_rib.register_with_options(adj_out.clone(), adj_out.upstream_options());
    assert_eq!(
        session.take_events(),
        vec![
            ClientEvent::EndOfRib,
            ClientEvent::Add(pfx, other.clone()),
            ClientEvent::EndOfRib,
        ]
    );

    // The peer's own path becomes the best one: the peer only gets the
    // withdrawal of the previous best path.
    loc_rib.add_path(&pfx, own.clone())?;
    assert_eq!(
        session.take_events(),
        vec![ClientEvent::Remove(pfx, other.clone())]
    );
    assert!(!adj_out.contains_pfx_path(&pfx, &own));
    assert!(session.held(&pfx).is_empty());

    // And once it's gone again, the other path comes back.
    assert!(loc_rib.remove_path(&pfx, &own));
    assert_eq!(session.take_events(), vec![ClientEvent::Add(pfx, other)]);
    Ok(())
}

#[test]
fn test_community_suppression() -> Result<(), Box<dyn Error>> {
    crate::common::init();

    let loc_rib = LocRib::new(RibConfig::named("inet.0"));
    let (_ebgp_out, ebgp) = out_rib(
        &loc_rib,
        RibConfig::named("out-ebgp"),
        PeerInfo::ebgp(peer_addr(1)),
        FilterChain::default(),
    );
    let (_ibgp_out, ibgp) = out_rib(
        &loc_rib,
        RibConfig::named("out-ibgp"),
        PeerInfo::ibgp(peer_addr(2)),
        FilterChain::default(),
    );

    let no_export = Prefix::from_str("10.1.0.0/16")?;
    let no_advertise = Prefix::from_str("10.2.0.0/16")?;
    let plain = Prefix::from_str("10.3.0.0/16")?;
    let path = bgp_path(100, addr(9), &[65009]);
    loc_rib.add_path(
        &no_export,
        with_community(&path, Community::NO_EXPORT),
    )?;
    loc_rib.add_path(
        &no_advertise,
        with_community(&path, Community::NO_ADVERTISE),
    )?;
    loc_rib.add_path(&plain, path.clone())?;

    assert_eq!(ebgp.held_count(), 1);
    assert_eq!(ebgp.held(&plain), vec![path.clone()]);

    assert_eq!(ibgp.held_count(), 2);
    assert_eq!(
        ibgp.held(&no_export),
        vec![with_community(&path, Community::NO_EXPORT)]
    );
    assert!(ibgp.held(&no_advertise).is_empty());

    // Withdrawing a suppressed path sends nothing.
    ebgp.take_events();
    assert!(loc_rib.remove_path(
        &no_advertise,
        &with_community(&path, Community::NO_ADVERTISE)
    ));
    assert!(ebgp.take_events().is_empty());
    Ok(())
}

#[test]
fn test_peer_client_on_loc_rib() -> Result<(), Box<dyn Error>> {
    crate::common::init();

    let loc_rib = LocRib::new(RibConfig::named("inet.0"));
    let peer = PeerInfo::ebgp(peer_addr(1));
    let to_peer = Arc::new(RecordingClient::new());
    let plain = Arc::new(RecordingClient::new());
    loc_rib.register_with_options(
        to_peer.clone(),
        ClientOptions::default().for_peer(peer),
    );
    loc_rib.register_with_options(plain.clone(), ClientOptions::default());

    let pfx = Prefix::from_str("10.0.0.0/8")?;
    let path = bgp_path(100, addr(9), &[65009]);
    let no_advertise = with_community(&path, Community::NO_ADVERTISE);
    loc_rib.add_path(&pfx, no_advertise.clone())?;
    loc_rib.add_path(&pfx, bgp_path(100, addr(1), &[65001]))?;

    // Neither the marked path nor the peer's own path reach it.
    assert!(to_peer.held(&pfx).is_empty());
    assert_eq!(plain.held(&pfx).len(), 2);

    loc_rib.add_path(&pfx, path.clone())?;
    assert_eq!(to_peer.held(&pfx), vec![path]);
    Ok(())
}

#[test]
fn test_add_path_send() -> Result<(), Box<dyn Error>> {
    crate::common::init();

    let loc_rib = LocRib::new(RibConfig::named("inet.0"));
    let (adj_out, session) = out_rib(
        &loc_rib,
        RibConfig {
            name: "out-1".to_string(),
            add_path_tx: true,
            ..Default::default()
        },
        PeerInfo::ibgp(peer_addr(1)),
        FilterChain::default(),
    );

    let pfx_1 = Prefix::from_str("10.0.0.0/8")?;
    let pfx_2 = Prefix::from_str("11.0.0.0/8")?;
    let a = bgp_path(100, addr(2), &[65002]);
    let b = bgp_path(100, addr(3), &[65003]);
    loc_rib.add_path(&pfx_1, a.clone())?;
    loc_rib.add_path(&pfx_1, b.clone())?;
    loc_rib.add_path(&pfx_2, a.clone())?;

    assert_eq!(
        session.take_events(),
        vec![
            ClientEvent::Add(pfx_1, with_id(&a, 1)),
            ClientEvent::Add(pfx_1, with_id(&b, 2)),
            ClientEvent::Add(pfx_2, with_id(&a, 1)),
        ]
    );
    assert_eq!(adj_out.path_ids_in_use(), 2);

    // The id of a is still used for the second prefix.
    assert!(loc_rib.remove_path(&pfx_1, &a));
    assert_eq!(
        session.take_events(),
        vec![ClientEvent::Remove(pfx_1, with_id(&a, 1))]
    );
    assert_eq!(adj_out.path_ids_in_use(), 2);

    assert!(loc_rib.remove_path(&pfx_2, &a));
    assert_eq!(adj_out.path_ids_in_use(), 1);
    assert_eq!(session.held(&pfx_1), vec![with_id(&b, 2)]);
    Ok(())
}

#[test]
fn test_export_chain() -> Result<(), Box<dyn Error>> {
    crate::common::init();

    let chain = FilterChain::new(vec![Filter::new(
        "export",
        vec![
            Term::new(
                "no-10",
                vec![TermCondition::RouteFilters(vec![RouteFilter::new(
                    Prefix::from_str("10.0.0.0/8")?,
                    RouteFilterMatcher::OrLonger,
                )])],
                vec![Action::Reject],
            ),
            Term::new(
                "prepend",
                vec![],
                vec![Action::AsPathPrepend {
                    asn: Asn::from_u32(64512),
                    times: 2,
                }],
            ),
        ],
    )]);

    let loc_rib = LocRib::new(RibConfig::named("inet.0"));
    let (adj_out, session) = out_rib(
        &loc_rib,
        RibConfig {
            name: "out-1".to_string(),
            afi: Some(Afi::Ipv4),
            ..Default::default()
        },
        PeerInfo::ebgp(peer_addr(1)),
        chain,
    );

    let rejected = Prefix::from_str("10.1.0.0/16")?;
    let accepted = Prefix::from_str("172.16.0.0/12")?;
    let path = bgp_path(100, addr(9), &[65009]);
    loc_rib.add_path(&rejected, path.clone())?;
    loc_rib.add_path(&accepted, path.clone())?;

    let mut prepended = path.clone();
    if let Some(bgp) = prepended.bgp_mut() {
        bgp.as_path.prepend(Asn::from_u32(64512), 2);
    }
    assert_eq!(
        session.take_events(),
        vec![ClientEvent::Add(accepted, prepended.clone())]
    );
    assert_eq!(adj_out.route_count(), 1);
    assert!(adj_out.contains_pfx_path(&accepted, &prepended));

    // A withdrawal of the path as the local RIB knows it withdraws the
    // path as it was sent.
    assert!(loc_rib.remove_path(&accepted, &path));
    assert_eq!(
        session.take_events(),
        vec![ClientEvent::Remove(accepted, prepended)]
    );

    // The address family restriction holds for direct use as well.
    assert_eq!(
        adj_out.add_path(&Prefix::from_str("2001:db8::/32")?, path),
        Err(RibError::AddressFamilyMismatch)
    );
    Ok(())
}
