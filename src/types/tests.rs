use std::error::Error;
use std::str::FromStr;

use inetnum::addr::Prefix;

use crate::types::{AddressFamily, PrefixId};
use crate::{IPv4, IPv6};

pub(crate) fn init() {
    use std::io::Write;

    let _ = env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .is_test(true)
        .try_init();
}

//------------ AddressFamily bit flippers -----------------------------------

#[test]
fn test_af_1() -> Result<(), Box<dyn Error>> {
    init();
    let bit_addr: IPv4 =
        IPv4::from(0b1111_1111_1111_1111_1111_1111_1111_1111_u32);

    assert_eq!(bit_addr.truncate_to_len(32), bit_addr);
    assert_eq!(
        u32::from(bit_addr.truncate_to_len(28)),
        0b1111_1111_1111_1111_1111_1111_1111_0000
    );
    assert_eq!(u32::from(bit_addr.truncate_to_len(0)), 0);
    assert!(bit_addr.bit_at(0));
    assert!(bit_addr.bit_at(31));
    assert!(!bit_addr.bit_at(32));

    let other = IPv4::from(0b1111_1111_0000_0000_0000_0000_0000_0000_u32);
    assert_eq!(bit_addr.common_len(other), 8);
    assert_eq!(bit_addr.common_len(bit_addr), 32);
    Ok(())
}

#[test]
fn test_af_2() -> Result<(), Box<dyn Error>> {
    let addr = <IPv6 as AddressFamily>::from_ipaddr(
        std::net::Ipv6Addr::from_str("2001:db8::1")?,
    );

    assert_eq!(
        addr.truncate_to_len(32).into_ipaddr(),
        std::net::IpAddr::from_str("2001:db8::")?
    );
    // 0x2001: 0010 0000 0000 0001
    assert!(!addr.bit_at(0));
    assert!(addr.bit_at(2));
    assert!(addr.bit_at(127));
    assert!(!addr.bit_at(128));
    Ok(())
}

#[test]
fn test_prefix_id() -> Result<(), Box<dyn Error>> {
    let p8 = PrefixId::<IPv4>::from(Prefix::from_str("10.0.0.0/8")?);
    let p16 = PrefixId::<IPv4>::from(Prefix::from_str("10.1.0.0/16")?);
    let other = PrefixId::<IPv4>::from(Prefix::from_str("10.2.0.0/16")?);

    assert!(p8.contains(&p16));
    assert!(!p16.contains(&p8));
    assert!(!p8.contains(&p8));
    assert!(p8.covers(&p8));
    assert_eq!(p16.common_supernet(&other).to_string(), "10.0.0.0/14");
    assert_eq!(p16.common_supernet(&p8), p8);

    // The net is always truncated to the length.
    let sloppy = PrefixId::<IPv4>::new(IPv4::from(0x0a01_0203_u32), 16);
    assert_eq!(sloppy, p16);
    assert_eq!(Prefix::from(sloppy), Prefix::from_str("10.1.0.0/16")?);
    Ok(())
}

#[test]
fn test_prefix_id_wrong_family() -> Result<(), Box<dyn Error>> {
    init();
    let v6_as_v4 = PrefixId::<IPv4>::from(Prefix::from_str("2001:db8::/32")?);
    assert_eq!(v6_as_v4.to_string(), "0.0.0.0/32");

    let v4_as_v6 = PrefixId::<IPv6>::from(Prefix::from_str("10.1.0.0/16")?);
    assert_eq!(v4_as_v6.to_string(), "::/16");

    let v6 = PrefixId::<IPv6>::from(Prefix::from_str("2001:db8::/32")?);
    assert_eq!(Prefix::from(v6), Prefix::from_str("2001:db8::/32")?);
    Ok(())
}
