use super::*;

#[test]
fn test_security_bits() {
    assert_eq!(Security::WPA_PSK.bits(), 12);
    assert_eq!(Security::WPA_ENTERPRISE.bits(), 48);
    assert!(Security::AUTO.is_auto());

    let mut sec = Security::OPEN;
    sec |= Security::WEP;
    assert_eq!(sec.bits(), 3);
    assert!(sec.contains(Security::WEP));
    assert!(!sec.contains(Security::WPA2_PSK));

    assert_eq!(Security::from_bits(64), Some(Security::WPA2_AES_TKIP));
    assert_eq!(Security::from_bits(128), None);
}

#[test]
fn test_bssid_text_form() {
    let bssid: Bssid = "12:34:56:78:9a:bc".parse().unwrap();
    assert_eq!(bssid, Bssid([0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc]));

    let mut text: String<17> = String::new();
    core::fmt::Write::write_fmt(&mut text, format_args!("{}", bssid)).unwrap();
    assert_eq!(text.as_str(), "12:34:56:78:9a:bc");

    assert!("12:34:56:78:9a".parse::<Bssid>().is_err());
    assert!("12:34:56:78:9a:bc:de".parse::<Bssid>().is_err());
    assert!("1:34:56:78:9a:bc".parse::<Bssid>().is_err());
}

#[test]
fn test_ip_config_from_reply() {
    let reply = Reply::from_lines(&[
        "    IP              SubNet         Gateway",
        " 192.168.1.105: 255.255.255.0: 192.168.1.1",
    ])
    .unwrap();
    assert_eq!(
        IpConfig::from_reply(&reply),
        Some(IpConfig {
            address: Ipv4Addr::new(192, 168, 1, 105),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(192, 168, 1, 1),
        })
    );
    assert_eq!(IpConfig::from_reply(&Reply::new()), None);
}

#[test]
fn test_addressing_follows_dhcp_flag() {
    let config = IpConfig {
        address: Ipv4Addr::new(10, 0, 0, 2),
        netmask: Ipv4Addr::new(255, 0, 0, 0),
        gateway: Ipv4Addr::new(10, 0, 0, 1),
    };
    let mut profile = NetworkProfile {
        static_ip: Some(config),
        ..NetworkProfile::default()
    };
    assert_eq!(
        profile.addressing(),
        Addressing::Static {
            ip: Some(&config),
            dns: None
        }
    );

    profile.dhcp = true;
    assert_eq!(profile.addressing(), Addressing::Dhcp { hostname: None });
}

#[test]
fn test_timing_ranges_and_defaults() {
    assert!(!TimingParam::ScanTime.range().contains(&4));
    assert!(TimingParam::ScanTime.range().contains(&16000));
    assert!(!TimingParam::ScanTime.range().contains(&16001));
    assert!(!TimingParam::AutoConnectTimeout.range().contains(&0));
    assert!(TimingParam::L4RetryCount.range().contains(&0));

    let timing = TimingParams::default();
    assert_eq!(timing.get(TimingParam::ScanTime), 150);
    assert_eq!(timing.get(TimingParam::L4RetryCount), 20);
}

#[test]
fn test_ncm_readiness() {
    let profile = NetworkProfile::default();
    assert_eq!(profile.check_ncm_ready(true), Err(Error::IncompleteProfile));
    assert_eq!(profile.retry_limits().association, 100);
    assert_eq!(profile.retry_limits().socket, 20);
}

#[test]
fn test_profile_slots() {
    assert_eq!(ProfileSlot::try_from(1), Ok(ProfileSlot::One));
    assert_eq!(ProfileSlot::try_from(2), Err(Error::InvalidParameter));
}

#[test]
fn test_bounded_names() {
    assert_eq!(to_ssid(""), Err(Error::InvalidParameter));
    assert!(to_ssid("homenet").is_ok());
    let long = [b's'; MAX_SSID_LEN + 1];
    assert_eq!(
        to_ssid(core::str::from_utf8(&long).unwrap()),
        Err(Error::InvalidParameter)
    );
}
