use std::error::Error;
use std::net::Ipv4Addr;
use std::str::FromStr;
use std::sync::Arc;

use inetnum::addr::Prefix;
use rotonda_rib::rib::config::{ClientOptions, RibConfig};
use rotonda_rib::rib::LocRib;
use rotonda_rib::test_types::{bgp_path, static_path, RecordingClient};

mod common {
    use std::io::Write;

    pub fn init() {
        let _ = env_logger::builder()
            .format(|buf, record| writeln!(buf, "{}", record.args()))
            .is_test(true)
            .try_init();
    }
}

const THREADS: u8 = 4;
const PER_THREAD: u8 = 50;

#[test]
fn test_concurrent_writers() -> Result<(), Box<dyn Error>> {
    crate::common::init();

    let rib = Arc::new(LocRib::new(RibConfig::named("concurrent")));
    let client = Arc::new(RecordingClient::new());
    rib.register_with_options(client.clone(), ClientOptions::default());
    let shared = Prefix::from_str("185.34.0.0/16")?;

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let rib = rib.clone();
            std::thread::Builder::new()
                .name(format!("writer-{}", t))
                .spawn(move || -> Result<(), String> {
                    let source = Ipv4Addr::new(192, 0, 2, t + 1);
                    for i in 0..PER_THREAD {
                        let addr = Ipv4Addr::new(10, t, i, 0);
                        let pfx = Prefix::new_v4(addr, 24)
                            .map_err(|e| e.to_string())?;
                        rib.add_path(&pfx, static_path(source))
                            .map_err(|e| e.to_string())?;
                    }
                    rib.add_path(
                        &shared,
                        bgp_path(100, source, &[65000 + u32::from(t)]),
                    )
                    .map_err(|e| e.to_string())
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for handle in handles {
        handle.join().map_err(|_| "writer panicked")??;
    }

    let expected = usize::from(THREADS) * usize::from(PER_THREAD) + 1;
    assert_eq!(rib.route_count(), expected as i64);
    assert_eq!(rib.get(&shared).map(|r| r.len()), Some(THREADS.into()));

    // Every change reached the client, in an order that adds up.
    assert_eq!(client.held_count(), expected - 1 + usize::from(THREADS));
    assert_eq!(client.held(&shared).len(), usize::from(THREADS));
    Ok(())
}

#[test]
fn test_readers_during_writes() -> Result<(), Box<dyn Error>> {
    crate::common::init();

    let rib = Arc::new(LocRib::new(RibConfig::default()));
    let nh = static_path(Ipv4Addr::new(192, 0, 2, 1));
    rib.add_path(&Prefix::from_str("10.0.0.0/8")?, nh.clone())?;

    let writer = {
        let rib = rib.clone();
        let nh = nh.clone();
        std::thread::spawn(move || -> Result<(), String> {
            for i in 0..=255 {
                let pfx = Prefix::new_v4(Ipv4Addr::new(10, i, 0, 0), 16)
                    .map_err(|e| e.to_string())?;
                rib.add_path(&pfx, nh.clone()).map_err(|e| e.to_string())?;
            }
            Ok(())
        })
    };

    // The /8 is always there, whatever the writer is doing.
    let lookup = Prefix::from_str("10.200.1.1/32")?;
    for _ in 0..200 {
        let found = rib.lpm(&lookup);
        assert!(found.first().is_some_and(|r| r.prefix().len() == 8));
        assert!(found.len() <= 2);
    }

    writer.join().map_err(|_| "writer panicked")??;
    assert_eq!(rib.route_count(), 257);
    assert_eq!(rib.lpm(&lookup).len(), 2);
    Ok(())
}
