//! JSON diagnostic snapshot of the staged profile.
//!
//! Secrets never reach the host mirror, so they cannot leak into the report.

use core::net::Ipv4Addr;

use serde::Serialize;

use super::{Addressing, TimingParam};
use crate::command::CommandEngine;
use crate::connection::Protocol;
use crate::error::Error;
use crate::module::Module;
use crate::ncm::{AutoTarget, NcmParams, RemoteHost};

#[derive(Serialize)]
struct ProfileReport<'a> {
    associated: bool,
    address: Option<[u8; 4]>,
    ssid: Option<&'a str>,
    channel: Option<u8>,
    security: Option<u8>,
    dhcp: bool,
    hostname: Option<&'a str>,
    static_ip: Option<StaticReport>,
    dns: Option<[u8; 4]>,
    dns_secondary: Option<[u8; 4]>,
    pending: bool,
    target: Option<TargetReport<'a>>,
    ncm: NcmReport<'a>,
    connections: usize,
    certificates: usize,
}

#[derive(Serialize)]
struct StaticReport {
    address: [u8; 4],
    netmask: [u8; 4],
    gateway: [u8; 4],
}

#[derive(Serialize)]
struct TargetReport<'a> {
    server: bool,
    tcp: bool,
    host: Option<&'a str>,
    address: Option<[u8; 4]>,
    port: u16,
}

#[derive(Serialize)]
struct NcmReport<'a> {
    state: &'a str,
    enabled: bool,
    associate_only: bool,
    association_failures: u16,
    association_limit: u16,
    socket_limit: u16,
    params: &'a NcmParams,
    l4_retry_count: u16,
}

fn octets(ip: Ipv4Addr) -> [u8; 4] {
    ip.octets()
}

impl<E: CommandEngine> Module<E> {
    /// Writes a JSON snapshot of the staged profile, link and connection
    /// manager state into `buf` and returns the number of bytes written.
    ///
    /// Fails with [`Error::BufferOverflow`] when `buf` is too small.
    pub fn profile_report(&self, buf: &mut [u8]) -> Result<usize, Error> {
        let profile = &self.profile;
        let auto = profile.auto_association();

        let (static_ip, dns) = match profile.addressing() {
            Addressing::Static { ip, dns } => (ip, dns),
            Addressing::Dhcp { .. } => (None, None),
        };

        let target = profile.auto_target().map(|target| match target {
            AutoTarget::Client {
                host,
                port,
                protocol,
            } => {
                let (name, address) = match host {
                    RemoteHost::Address(ip) => (None, Some(octets(*ip))),
                    RemoteHost::Name(name) => (Some(name.as_str()), None),
                };
                TargetReport {
                    server: false,
                    tcp: *protocol == Protocol::Tcp,
                    host: name,
                    address,
                    port: *port,
                }
            }
            AutoTarget::Server { port, protocol } => TargetReport {
                server: true,
                tcp: *protocol == Protocol::Tcp,
                host: None,
                address: None,
                port: *port,
            },
        });

        let report = ProfileReport {
            associated: self.associated,
            address: self.ip_config.map(|config| octets(config.address)),
            ssid: auto.map(|auto| auto.ssid()),
            channel: auto.map(|auto| auto.options().channel),
            security: profile.security().map(|security| security.bits()),
            dhcp: profile.dhcp(),
            hostname: profile.hostname(),
            static_ip: static_ip.map(|config| StaticReport {
                address: octets(config.address),
                netmask: octets(config.netmask),
                gateway: octets(config.gateway),
            }),
            dns: dns.map(|servers| octets(servers.primary)),
            dns_secondary: dns.and_then(|servers| servers.secondary).map(octets),
            pending: profile.static_ip_pending() || profile.dns_pending(),
            target,
            ncm: NcmReport {
                state: self.ncm.state().name(),
                enabled: self.ncm.is_enabled(),
                associate_only: profile.ncm_activation().associate_only,
                association_failures: self.ncm.association_failures(),
                association_limit: self.ncm.association_retry_limit(),
                socket_limit: self.ncm.socket_retry_limit(),
                params: profile.ncm_params(),
                l4_retry_count: profile.timing().get(TimingParam::L4RetryCount),
            },
            connections: self.registry.len(),
            certificates: self.certs.len(),
        };

        serde_json_core::to_slice(&report, buf).map_err(|_| Error::BufferOverflow)
    }
}
