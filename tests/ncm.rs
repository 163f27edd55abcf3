mod common;

use std::net::Ipv4Addr;

use common::ScriptedEngine;
use gs_wifi::command::{CommandError, Event};
use gs_wifi::connection::{Owner, Protocol, Role};
use gs_wifi::ncm::{AutoAssociateOptions, NcmActivation, NcmMode, NcmParam, NcmState, WirelessMode};
use gs_wifi::profile::{Bssid, DnsServers, IpConfig, TimingParam};
use gs_wifi::{Cid, Error, Module};

fn cid(raw: u8) -> Cid {
    Cid::new(raw).unwrap()
}

fn enabled(associate_only: bool) -> NcmActivation {
    NcmActivation {
        enabled: true,
        associate_only,
        ..NcmActivation::default()
    }
}

#[test]
fn test_staging_requests() {
    let mut module = Module::new(ScriptedEngine::new());
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module
        .set_auto_associate(
            "lab",
            AutoAssociateOptions {
                bssid: Some(Bssid([0x12, 0x34, 0x56, 0x78, 0x9a, 0xbc])),
                channel: 6,
                mode: WirelessMode::AdHoc,
            },
        )
        .unwrap();
    module
        .set_auto_connect_client(Ipv4Addr::new(192, 168, 1, 2), 8883, Protocol::Tcp)
        .unwrap();
    module
        .set_auto_connect_client_host("broker.local", 1883, Protocol::Tcp)
        .unwrap();
    module.set_auto_connect_server(7000, Protocol::Udp).unwrap();

    assert_eq!(
        module.engine().requests,
        [
            "AT+WAUTO=0,\"homenet\",,0",
            "AT+WAUTO=1,\"lab\",12:34:56:78:9a:bc,6",
            "AT+NAUTO=0,1,192.168.1.2,8883",
            "AT+NAUTO=0,1,broker.local,1883",
            "AT+NAUTO=1,0,,7000",
        ]
    );
    // Last write wins, nothing started.
    assert_eq!(module.profile().auto_association().unwrap().ssid(), "lab");
    assert_eq!(module.ncm_state(), NcmState::Disabled);
}

#[test]
fn test_enable_requires_staged_targets() {
    let mut module = Module::new(ScriptedEngine::new());
    assert_eq!(module.set_ncm(enabled(true)), Err(Error::IncompleteProfile));

    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    assert_eq!(module.set_ncm(enabled(false)), Err(Error::IncompleteProfile));
    assert_eq!(module.engine().requests.len(), 1);

    module.set_ncm(enabled(true)).unwrap();
    assert_eq!(module.engine().requests[1], "AT+NCMAUTO=0,1,0,0");
    assert_eq!(module.ncm_state(), NcmState::Associating);
}

#[test]
fn test_associate_only_never_connects() {
    let mut module = Module::new(ScriptedEngine::new());
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module
        .set_auto_connect_client(Ipv4Addr::new(10, 0, 0, 5), 80, Protocol::Tcp)
        .unwrap();
    module.set_ncm(enabled(true)).unwrap();

    module.engine_mut().push_event(Event::NcmAssociated);
    module.poll_events().unwrap();
    assert_eq!(module.ncm_state(), NcmState::Associated);
    assert!(module.is_associated());

    assert!(
        module
            .engine()
            .requests
            .iter()
            .all(|request| !request.starts_with("AT+NCTCP") && !request.starts_with("AT+NCUDP"))
    );
}

#[test]
fn test_full_connection_cycle() {
    let mut module = Module::new(ScriptedEngine::new());
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module
        .set_auto_connect_client(Ipv4Addr::new(10, 0, 0, 5), 80, Protocol::Tcp)
        .unwrap();
    module
        .set_ncm(NcmActivation {
            enabled: true,
            associate_only: false,
            remember: true,
            mode: NcmMode::Station,
        })
        .unwrap();
    assert_eq!(module.engine().requests[2], "AT+NCMAUTO=0,1,1,1");

    module.handle_event(Event::NcmAssociated).unwrap();
    assert_eq!(module.ncm_state(), NcmState::ConnectingSocket);
    module.handle_event(Event::NcmConnectFailed).unwrap();
    module.handle_event(Event::NcmConnected(cid(1))).unwrap();
    assert_eq!(module.ncm_state(), NcmState::Connected(cid(1)));

    let connection = module.connections().get(cid(1)).unwrap();
    assert_eq!(connection.owner(), Owner::Ncm);
    assert_eq!(connection.role(), Role::Client);
    assert_eq!(module.disconnect(cid(1)), Err(Error::NcmOwned));

    module.handle_event(Event::Disassociated).unwrap();
    assert_eq!(module.ncm_state(), NcmState::Associating);
    assert!(module.connections().is_empty());
    assert!(!module.is_associated());
}

#[test]
fn test_association_retries_bounded() {
    let mut module = Module::new(ScriptedEngine::new());
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module
        .set_ncm_param(NcmParam::L3ConnectRetryCount, 3)
        .unwrap();
    module.set_ncm(enabled(true)).unwrap();
    assert_eq!(module.ncm().association_retry_limit(), 3);

    for _ in 0..10 {
        module.handle_event(Event::NcmAssociationFailed).unwrap();
        assert!(module.ncm().association_failures() <= 3);
    }
    assert_eq!(module.ncm_state(), NcmState::Disabled);
    assert!(module.ncm().is_exhausted());

    // A later association by the firmware restarts the manager.
    module.handle_event(Event::NcmAssociated).unwrap();
    assert_eq!(module.ncm_state(), NcmState::Associated);
}

#[test]
fn test_zero_retry_count_uses_module_default() {
    let mut module = Module::new(ScriptedEngine::new());
    module
        .set_ncm_param(NcmParam::L3ConnectRetryCount, 0)
        .unwrap();
    module.set_param(TimingParam::L4RetryCount, 0).unwrap();
    assert_eq!(module.ncm().association_retry_limit(), 100);
    assert_eq!(module.ncm().socket_retry_limit(), 20);

    module.set_param(TimingParam::L4RetryCount, 2).unwrap();
    assert_eq!(module.ncm().socket_retry_limit(), 2);
    assert_eq!(
        module.engine().requests,
        ["AT+NCMAUTOCONF=11,0", "ATS7=0", "ATS7=2"]
    );
}

#[test]
fn test_period_zero_rejected_locally() {
    let mut module = Module::new(ScriptedEngine::new());
    assert_eq!(
        module.set_ncm_param(NcmParam::AllChannelScanPeriod, 0),
        Err(Error::InvalidParameter)
    );
    assert!(module.engine().requests.is_empty());
}

#[test]
fn test_socket_retries_fall_back_to_associated() {
    let mut module = Module::new(ScriptedEngine::new());
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module.set_auto_connect_server(7000, Protocol::Tcp).unwrap();
    module.set_param(TimingParam::L4RetryCount, 2).unwrap();
    module.set_ncm(enabled(false)).unwrap();

    module.handle_event(Event::NcmAssociated).unwrap();
    module.handle_event(Event::NcmConnectFailed).unwrap();
    module.handle_event(Event::NcmConnectFailed).unwrap();
    assert_eq!(module.ncm_state(), NcmState::Associated);
}

#[test]
fn test_disable_hands_connection_to_host() {
    let mut module = Module::new(ScriptedEngine::new());
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module.set_auto_connect_server(7000, Protocol::Tcp).unwrap();
    module.set_ncm(enabled(false)).unwrap();
    module.handle_event(Event::NcmAssociated).unwrap();
    module.handle_event(Event::NcmConnected(cid(5))).unwrap();

    module.set_ncm(NcmActivation::default()).unwrap();
    assert_eq!(module.ncm_state(), NcmState::Disabled);
    assert_eq!(
        module.connections().get(cid(5)).unwrap().owner(),
        Owner::Host
    );
    module.disconnect(cid(5)).unwrap();
    assert_eq!(module.engine().requests.last().unwrap(), "AT+NCLOSE=5");
}

#[test]
fn test_enable_pushes_staged_static_addressing() {
    let mut module = Module::new(ScriptedEngine::new());
    module
        .set_static_ip(IpConfig {
            address: Ipv4Addr::new(10, 0, 0, 2),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(10, 0, 0, 1),
        })
        .unwrap();
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module.set_ncm(enabled(true)).unwrap();

    assert_eq!(
        module.engine().requests,
        [
            "AT+WAUTO=0,\"homenet\",,0",
            "AT+NSET=10.0.0.2,255.255.255.0,10.0.0.1",
            "AT+NCMAUTO=0,1,0,0",
        ]
    );
    assert!(!module.profile().static_ip_pending());
}

#[test]
fn test_ncm_association_pushes_staged_addressing() {
    let first = IpConfig {
        address: Ipv4Addr::new(10, 0, 0, 2),
        netmask: Ipv4Addr::new(255, 255, 255, 0),
        gateway: Ipv4Addr::new(10, 0, 0, 1),
    };
    let second = IpConfig {
        address: Ipv4Addr::new(10, 0, 0, 3),
        ..first
    };

    let mut module = Module::new(ScriptedEngine::new());
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module.set_ncm(enabled(true)).unwrap();

    // Staged while the manager is still associating.
    module.set_static_ip(first).unwrap();
    module
        .set_dns(DnsServers {
            primary: Ipv4Addr::new(1, 1, 1, 1),
            secondary: None,
        })
        .unwrap();
    assert_eq!(module.engine().requests.len(), 2);

    module.engine_mut().push_event(Event::NcmAssociated);
    assert_eq!(module.poll_events(), Ok(1));
    assert!(!module.profile().static_ip_pending());
    assert!(!module.profile().dns_pending());
    assert_eq!(module.ip_config(), Some(&first));

    // Staged across a link loss, pushed on re-association.
    module.handle_event(Event::Disassociated).unwrap();
    module.set_static_ip(second).unwrap();
    module.handle_event(Event::NcmAssociated).unwrap();
    assert!(!module.profile().static_ip_pending());

    assert_eq!(
        module.engine().requests[2..],
        [
            "AT+NSET=10.0.0.2,255.255.255.0,10.0.0.1",
            "AT+DNSSET=1.1.1.1",
            "AT+NSET=10.0.0.3,255.255.255.0,10.0.0.1",
        ]
    );
}

#[test]
fn test_ncm_association_leaves_dhcp_alone() {
    let mut module = Module::new(ScriptedEngine::new());
    module.set_dhcp(true, None).unwrap();
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module.set_ncm(enabled(true)).unwrap();
    module
        .set_static_ip(IpConfig {
            address: Ipv4Addr::new(10, 0, 0, 2),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(10, 0, 0, 1),
        })
        .unwrap();

    module.handle_event(Event::NcmAssociated).unwrap();
    assert!(module.profile().static_ip_pending());
    assert_eq!(module.engine().requests.len(), 3);
}

#[test]
fn test_link_loss_during_staged_push_propagates() {
    let engine = ScriptedEngine::new()
        .ok(&[])
        .ok(&[])
        .err(CommandError::Transport);
    let mut module = Module::new(engine);
    module
        .set_auto_associate("homenet", AutoAssociateOptions::default())
        .unwrap();
    module.set_ncm(enabled(true)).unwrap();
    module
        .set_static_ip(IpConfig {
            address: Ipv4Addr::new(10, 0, 0, 2),
            netmask: Ipv4Addr::new(255, 255, 255, 0),
            gateway: Ipv4Addr::new(10, 0, 0, 1),
        })
        .unwrap();

    module.engine_mut().push_event(Event::NcmAssociated);
    module.engine_mut().push_event(Event::Disassociated);
    assert_eq!(module.poll_events(), Err(Error::Transport));
    assert_eq!(module.ncm_state(), NcmState::Associated);
    assert!(module.profile().static_ip_pending());

    // The notice behind the failed one is still queued.
    assert_eq!(module.poll_events(), Ok(1));
    assert_eq!(module.ncm_state(), NcmState::Associating);
}
