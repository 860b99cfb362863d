use std::error::Error;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

use inetnum::addr::Prefix;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::*;
use crate::{IPv4, IPv6};

fn pid(s: &str) -> Result<PrefixId<IPv4>, Box<dyn Error>> {
    Ok(PrefixId::from(Prefix::from_str(s)?))
}

fn static_route(pfx: PrefixId<IPv4>, last_octet: u8) -> Route {
    Route::with_path(
        pfx.into(),
        Path::new_static(IpAddr::V4(Ipv4Addr::new(192, 0, 2, last_octet))),
    )
}

fn prefixes(routes: Vec<&Route>) -> Vec<String> {
    routes.into_iter().map(|r| r.prefix().to_string()).collect()
}

#[test]
fn test_insert_and_get() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv4>::new();
    for p in ["10.0.0.0/8", "10.1.0.0/16", "10.0.0.0/16", "192.168.0.0/24"] {
        trie.insert(pid(p)?, static_route(pid(p)?, 1));
    }

    assert!(trie.get(pid("10.1.0.0/16")?).is_some());
    assert!(trie.get(pid("10.0.0.0/16")?).is_some());
    assert!(trie.get(pid("10.2.0.0/16")?).is_none());
    assert!(trie.get(pid("10.0.0.0/9")?).is_none());
    // 0.0.0.0/0 is the placeholder for 10/8 and 192.168/24, 10.0.0.0/15
    // the one for the two /16s. They are there but not active.
    assert!(trie.get(pid("0.0.0.0/0")?).is_none());
    assert!(trie.get(pid("10.0.0.0/15")?).is_none());
    assert_eq!(trie.route_count(), 4);
    assert_eq!(trie.stats().nodes, 6);
    assert_eq!(trie.stats().inactive, 2);
    Ok(())
}

#[test]
fn test_insert_merges_paths() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv4>::new();
    let pfx = pid("10.0.0.0/8")?;
    trie.insert(pfx, static_route(pfx, 1));
    trie.insert(pfx, static_route(pfx, 2));
    trie.insert(pfx, static_route(pfx, 2));

    assert_eq!(trie.get(pfx).map(|r| r.len()), Some(2));
    assert_eq!(trie.stats().paths, 2);
    assert_eq!(trie.stats().nodes, 1);
    Ok(())
}

#[test]
fn test_push_down() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv4>::new();
    for p in ["10.1.0.0/16", "10.2.0.0/16", "10.0.0.0/8", "0.0.0.0/0"] {
        trie.insert(pid(p)?, static_route(pid(p)?, 1));
    }

    assert_eq!(
        prefixes(trie.lpm(pid("10.2.3.0/24")?)),
        vec!["0.0.0.0/0", "10.0.0.0/8", "10.2.0.0/16"]
    );
    // 10.0.0.0/14 was created as the placeholder for the two /16s, then
    // pushed down below 10.0.0.0/8.
    assert_eq!(trie.stats().nodes, 5);
    assert_eq!(trie.stats().inactive, 1);
    Ok(())
}

#[test]
fn test_lpm_stops_at_exact_match() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv4>::new();
    for p in ["10.0.0.0/8", "10.0.0.0/16", "10.0.0.0/24"] {
        trie.insert(pid(p)?, static_route(pid(p)?, 1));
    }
    assert_eq!(
        prefixes(trie.lpm(pid("10.0.0.0/16")?)),
        vec!["10.0.0.0/8", "10.0.0.0/16"]
    );
    assert_eq!(
        prefixes(trie.lpm(pid("10.0.0.1/32")?)),
        vec!["10.0.0.0/8", "10.0.0.0/16", "10.0.0.0/24"]
    );
    assert!(trie.lpm(pid("11.0.0.0/8")?).is_empty());
    Ok(())
}

#[test]
fn test_get_longer() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv4>::new();
    for p in [
        "10.0.0.0/8",
        "10.1.0.0/16",
        "10.1.1.0/24",
        "10.2.0.0/16",
        "11.0.0.0/8",
    ] {
        trie.insert(pid(p)?, static_route(pid(p)?, 1));
    }

    assert_eq!(
        prefixes(trie.get_longer(pid("10.1.0.0/16")?)),
        vec!["10.1.0.0/16", "10.1.1.0/24"]
    );
    // The query prefix itself does not have to be present.
    assert_eq!(
        prefixes(trie.get_longer(pid("10.0.0.0/14")?)),
        vec!["10.1.0.0/16", "10.1.1.0/24", "10.2.0.0/16"]
    );
    assert_eq!(
        prefixes(trie.get_longer(pid("10.0.0.0/7")?)),
        vec![
            "10.0.0.0/8",
            "10.1.0.0/16",
            "10.1.1.0/24",
            "10.2.0.0/16",
            "11.0.0.0/8"
        ]
    );
    assert!(trie.get_longer(pid("12.0.0.0/8")?).is_empty());
    Ok(())
}

#[test]
fn test_remove_keeps_children() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv4>::new();
    let p8 = pid("10.0.0.0/8")?;
    let p16 = pid("10.1.0.0/16")?;
    let route = static_route(p8, 1);
    let path = route.paths().first().cloned().ok_or("no path")?;
    trie.insert(p8, route);
    trie.insert(p16, static_route(p16, 1));

    assert!(trie.remove_path(p8, &path));
    assert!(trie.get(p8).is_none());
    assert!(trie.get(p16).is_some());
    assert_eq!(prefixes(trie.dump()), vec!["10.1.0.0/16"]);
    assert_eq!(trie.stats().nodes, 2);
    assert_eq!(trie.stats().inactive, 1);

    // Removing again, or from an unknown prefix, is not an error.
    assert!(!trie.remove_path(p8, &path));
    assert!(!trie.remove_path(pid("172.16.0.0/12")?, &path));
    Ok(())
}

#[test]
fn test_withdraw_then_reinsert() -> Result<(), Box<dyn Error>> {
    let all = [
        "0.0.0.0/0",
        "10.0.0.0/8",
        "10.1.0.0/16",
        "10.1.128.0/17",
        "10.2.0.0/16",
        "192.168.1.0/24",
    ];
    let queries = ["10.1.200.1/32", "10.2.0.0/16", "192.168.1.7/32"];

    let mut reference = PrefixTrie::<IPv4>::new();
    let mut trie = PrefixTrie::<IPv4>::new();
    for p in all {
        reference.insert(pid(p)?, static_route(pid(p)?, 1));
        trie.insert(pid(p)?, static_route(pid(p)?, 1));
    }

    let victim = pid("10.1.0.0/16")?;
    let route = static_route(victim, 1);
    assert!(trie.remove_route(victim, &route));
    assert!(trie.get(victim).is_none());
    trie.insert(victim, route);

    assert_eq!(prefixes(trie.dump()), prefixes(reference.dump()));
    for q in queries {
        assert_eq!(
            prefixes(trie.lpm(pid(q)?)),
            prefixes(reference.lpm(pid(q)?))
        );
    }
    assert_eq!(trie.get(victim), reference.get(victim));
    assert_eq!(trie.stats(), reference.stats());
    Ok(())
}

#[test]
fn test_lpm_any_insertion_order() -> Result<(), Box<dyn Error>> {
    crate::types::tests::init();
    let mut rng = StdRng::seed_from_u64(7);

    // Prefixes below 10.0.0.0/8, so that there is a lot of overlap.
    let mut pfxs: Vec<PrefixId<IPv4>> = (0..300)
        .map(|_| {
            let net = 0x0a00_0000 | (rng.random::<u32>() & 0x00ff_ffff);
            PrefixId::new(IPv4::from(net), rng.random_range(8..=28))
        })
        .collect();
    pfxs.sort_by_key(|p| (u32::from(p.get_net()), p.get_len()));
    pfxs.dedup();

    let queries: Vec<PrefixId<IPv4>> = (0..200)
        .map(|_| {
            let net = 0x0a00_0000 | (rng.random::<u32>() & 0x00ff_ffff);
            PrefixId::new(IPv4::from(net), rng.random_range(8..=32))
        })
        .collect();

    for _ in 0..5 {
        pfxs.shuffle(&mut rng);
        let mut trie = PrefixTrie::<IPv4>::new();
        for p in &pfxs {
            trie.insert(*p, static_route(*p, 1));
        }
        assert_eq!(trie.route_count(), pfxs.len());

        for q in &queries {
            let mut expected = pfxs
                .iter()
                .filter(|p| p.covers(q))
                .map(|p| (p.get_len(), p.to_string()))
                .collect::<Vec<_>>();
            expected.sort();
            let expected =
                expected.into_iter().map(|(_, p)| p).collect::<Vec<_>>();
            let found = trie
                .lpm(*q)
                .into_iter()
                .map(|r| PrefixId::<IPv4>::from(r.prefix()).to_string())
                .collect::<Vec<_>>();
            assert_eq!(found, expected);

            assert_eq!(trie.get(*q).is_some(), pfxs.contains(q));
        }
    }
    Ok(())
}

#[test]
fn test_replace_all() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv4>::new();
    let pfx = pid("10.0.0.0/8")?;
    let a = Path::new_static(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));
    let b = Path::new_static(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2)));
    let c = Path::new_static(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 3)));

    assert!(trie.replace_all(pfx, a.clone()).is_empty());
    trie.insert(pfx, Route::with_path(pfx.into(), b.clone()));
    assert_eq!(trie.replace_all(pfx, c.clone()), vec![a, b]);
    assert_eq!(trie.get(pfx).map(|r| r.paths().to_vec()), Some(vec![c]));
    assert_eq!(trie.stats().paths, 1);
    Ok(())
}

#[test]
fn test_replace_path_unknown_prefix() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv4>::new();
    let a = Path::new_static(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)));
    let b = Path::new_static(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2)));
    assert_eq!(
        trie.replace_path(pid("10.0.0.0/8")?, &a, b),
        Err(RibError::PrefixNotFound)
    );
    Ok(())
}

#[test]
fn test_match_prefix() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv4>::new();
    for p in ["10.0.0.0/8", "10.1.0.0/16", "10.1.1.0/24", "10.1.2.0/24"] {
        trie.insert(pid(p)?, static_route(pid(p)?, 1));
    }

    let res = trie.match_prefix(
        pid("10.1.3.0/24")?,
        &MatchOptions {
            match_type: MatchType::LongestMatch,
            include_less_specifics: true,
            include_more_specifics: true,
        },
    );
    assert_eq!(res.match_type, MatchType::LongestMatch);
    assert_eq!(res.prefix, Some(Prefix::from_str("10.1.0.0/16")?));
    assert_eq!(
        res.less_specifics
            .unwrap_or_default()
            .iter()
            .map(|r| r.prefix().to_string())
            .collect::<Vec<_>>(),
        vec!["10.0.0.0/8"]
    );
    assert_eq!(res.more_specifics.map(|r| r.len()), Some(2));

    let res = trie.match_prefix(
        pid("10.1.3.0/24")?,
        &MatchOptions {
            match_type: MatchType::ExactMatch,
            ..Default::default()
        },
    );
    assert!(res.match_type.is_empty());
    assert!(res.route.is_none());

    let res = trie.match_prefix(pid("10.1.1.0/24")?, &MatchOptions::default());
    assert_eq!(res.match_type, MatchType::ExactMatch);
    assert!(res.less_specifics.is_none());
    Ok(())
}

#[test]
fn test_v6() -> Result<(), Box<dyn Error>> {
    let mut trie = PrefixTrie::<IPv6>::new();
    let p32 = PrefixId::<IPv6>::from(Prefix::from_str("2001:db8::/32")?);
    let p48 = PrefixId::<IPv6>::from(Prefix::from_str("2001:db8:1::/48")?);
    let q = PrefixId::<IPv6>::from(Prefix::from_str("2001:db8:1:2::/64")?);
    let path = Path::new_static(IpAddr::from_str("2001:db8::1")?);

    trie.insert(p48, Route::with_path(p48.into(), path.clone()));
    trie.insert(p32, Route::with_path(p32.into(), path));

    assert_eq!(
        trie.lpm(q)
            .into_iter()
            .map(|r| r.prefix().to_string())
            .collect::<Vec<_>>(),
        vec!["2001:db8::/32", "2001:db8:1::/48"]
    );
    assert_eq!(trie.route_count(), 2);
    Ok(())
}
