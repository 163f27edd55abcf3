//! Network Connection Manager (NCM).
//!
//! The NCM is the module's autonomous associate-and-connect loop. The host
//! stages the association target and, optionally, a connection target, then
//! switches the manager on. From that point the firmware retries on its own
//! timers and reports progress as out-of-band notices; the driver only keeps
//! a mirror of where the manager is.
//!
//! ```text
//!                    enable
//!   ┌──────────┐ ───────────▶ ┌─────────────┐  NcmAssociated   ┌────────────┐
//!   │ Disabled │              │ Associating │ ───────────────▶ │ Associated │
//!   └──────────┘ ◀─────────── └─────────────┘  (assoc. only)   └────────────┘
//!        ▲    retries exhausted   ▲     │ NcmAssociated               ▲
//!        │                        │     ▼ (with L4)                   │ L4 retries
//!        │ disable               ┌──────────────────┐ ────────────────┘ exhausted
//!        └─────────── any ────── │ ConnectingSocket │
//!                                └──────────────────┘
//!                  Disassociated   │ NcmConnected ▲ Disconnected(own cid)
//!                  (from any       ▼              │
//!                  linked state)  ┌────────────────┐
//!                                 │ Connected(cid) │
//!                                 └────────────────┘
//! ```
//!
//! Association attempts are bounded by the L3 connect retry count
//! ([`NcmParam::L3ConnectRetryCount`]) and socket attempts by the L4 retry
//! count ([`TimingParam::L4RetryCount`](crate::profile::TimingParam)). Once
//! the association budget is spent the manager sits in `Disabled` until the
//! firmware reports a fresh association.
//!
//! Staging (`set_auto_*`) only stores settings in the module; it never starts
//! a connection attempt.

#![deny(unsafe_code)]

use core::net::Ipv4Addr;

use crate::command::{CommandEngine, OrEmpty};
use crate::connection::{Cid, Owner, Protocol};
use crate::error::Error;
use crate::module::Module;
use crate::profile::{Bssid, HostName, Ssid};

mod params;

pub use params::{NcmParam, NcmParams, RetryLimits};


/// Wireless network mode used for auto-association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WirelessMode {
    /// Join an access point.
    #[default]
    Infrastructure = 0,
    /// Peer-to-peer network.
    AdHoc = 1,
    /// Act as a limited access point.
    LimitedAp = 2,
}

/// Options for [`Module::set_auto_associate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AutoAssociateOptions {
    /// Only join this access point. `None` accepts any BSSID.
    pub bssid: Option<Bssid>,
    /// Only join on this channel. 0 means any channel.
    pub channel: u8,
    /// Network mode. Should match [`NcmActivation::mode`].
    pub mode: WirelessMode,
}

/// Staged auto-association target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoAssociation {
    ssid: Ssid,
    options: AutoAssociateOptions,
}

impl AutoAssociation {
    /// Network name.
    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    /// BSSID, channel and mode filters.
    pub fn options(&self) -> &AutoAssociateOptions {
        &self.options
    }
}

/// Remote end of an auto-connect client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteHost {
    /// Literal address.
    Address(Ipv4Addr),
    /// Name resolved by the connection manager (firmware 2.5.1 and later).
    Name(HostName),
}

impl core::fmt::Display for RemoteHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RemoteHost::Address(ip) => write!(f, "{}", ip),
            RemoteHost::Name(name) => f.write_str(name),
        }
    }
}

/// Staged auto-connect target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoTarget {
    /// Connect out to `host:port`.
    Client {
        /// Remote address or name.
        host: RemoteHost,
        /// Remote port.
        port: u16,
        /// Transport protocol.
        protocol: Protocol,
    },
    /// Listen on a local port.
    Server {
        /// Local port.
        port: u16,
        /// Transport protocol.
        protocol: Protocol,
    },
}

impl AutoTarget {
    /// Transport protocol of the target.
    pub fn protocol(&self) -> Protocol {
        match self {
            AutoTarget::Client { protocol, .. } | AutoTarget::Server { protocol, .. } => *protocol,
        }
    }
}

/// Connection manager operating mode. The discriminants are wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NcmMode {
    /// Station.
    #[default]
    Station = 0,
    /// Limited access point.
    LimitedAp = 1,
}

/// Arguments of [`Module::set_ncm`].
///
/// The default is the disabled, associate-only, not remembered station
/// manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NcmActivation {
    /// Start (`true`) or stop the manager.
    pub enabled: bool,
    /// Stop after association instead of also bringing up the staged
    /// connection.
    pub associate_only: bool,
    /// Store these flags in the active profile so the manager starts on
    /// power-up. Only persists once the profile itself is saved.
    pub remember: bool,
    /// Station or limited AP.
    pub mode: NcmMode,
}

impl Default for NcmActivation {
    fn default() -> Self {
        Self {
            enabled: false,
            associate_only: true,
            remember: false,
            mode: NcmMode::Station,
        }
    }
}

impl NcmActivation {
    /// Wire value of the connection level: 0 stops after association, 1 also
    /// opens the L4 connection.
    pub fn level(&self) -> u8 {
        if self.associate_only { 0 } else { 1 }
    }
}

/// Where the connection manager is, as far as the host knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NcmState {
    /// Not running, or out of association retries.
    Disabled,
    /// Scanning and joining the staged network.
    Associating,
    /// Associated; no connection wanted or L4 retries spent.
    Associated,
    /// Bringing up the staged connection.
    ConnectingSocket,
    /// The staged connection is up on this cid.
    Connected(Cid),
}

impl NcmState {
    /// Short lowercase name, without the cid.
    pub fn name(&self) -> &'static str {
        match self {
            NcmState::Disabled => "disabled",
            NcmState::Associating => "associating",
            NcmState::Associated => "associated",
            NcmState::ConnectingSocket => "connecting",
            NcmState::Connected(_) => "connected",
        }
    }
}

impl core::fmt::Display for NcmState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NcmState::Connected(cid) => write!(f, "connected({})", cid),
            other => f.write_str(other.name()),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for NcmState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            NcmState::Connected(cid) => defmt::write!(f, "connected({})", cid),
            other => defmt::write!(f, "{=str}", other.name()),
        }
    }
}

/// Host mirror of the connection manager.
#[derive(Debug, Clone)]
pub struct Ncm {
    state: NcmState,
    enabled: bool,
    associate_only: bool,
    exhausted: bool,
    limits: RetryLimits,
    association_failures: u16,
    socket_failures: u16,
}

impl Default for Ncm {
    fn default() -> Self {
        Self::new(RetryLimits::default())
    }
}

impl Ncm {
    /// A stopped manager with the given retry bounds.
    pub fn new(limits: RetryLimits) -> Self {
        Self {
            state: NcmState::Disabled,
            enabled: false,
            associate_only: true,
            exhausted: false,
            limits,
            association_failures: 0,
            socket_failures: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> NcmState {
        self.state
    }

    /// `true` between an enabling and a disabling `set_ncm`, even while out
    /// of retries.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `true` when the association budget is spent and the manager waits for
    /// a re-association.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The cid of the manager's connection while it is up.
    pub fn connected_cid(&self) -> Option<Cid> {
        match self.state {
            NcmState::Connected(cid) => Some(cid),
            _ => None,
        }
    }

    /// Association attempts that failed since the last success.
    pub fn association_failures(&self) -> u16 {
        self.association_failures
    }

    /// Socket attempts that failed since the last success.
    pub fn socket_failures(&self) -> u16 {
        self.socket_failures
    }

    /// Resolved association retry bound.
    pub fn association_retry_limit(&self) -> u16 {
        self.limits.association
    }

    /// Resolved socket retry bound.
    pub fn socket_retry_limit(&self) -> u16 {
        self.limits.socket
    }

    pub(crate) fn set_limits(&mut self, limits: RetryLimits) {
        self.limits = limits;
    }

    pub(crate) fn enable(&mut self, associate_only: bool) {
        self.enabled = true;
        self.associate_only = associate_only;
        self.exhausted = false;
        self.association_failures = 0;
        self.socket_failures = 0;
        self.transition(NcmState::Associating);
    }

    pub(crate) fn disable(&mut self) {
        self.enabled = false;
        self.exhausted = false;
        self.transition(NcmState::Disabled);
    }

    pub(crate) fn on_associated(&mut self) {
        let restart = self.state == NcmState::Disabled && self.enabled && self.exhausted;
        if self.state != NcmState::Associating && !restart {
            debug!("ncm: association notice ignored while {}", self.state);
            return;
        }

        self.exhausted = false;
        self.association_failures = 0;
        self.socket_failures = 0;
        if self.associate_only {
            self.transition(NcmState::Associated);
        } else {
            self.transition(NcmState::ConnectingSocket);
        }
    }

    pub(crate) fn on_association_failed(&mut self) {
        if self.state != NcmState::Associating {
            return;
        }

        self.association_failures = self.association_failures.saturating_add(1);
        if self.association_failures >= self.limits.association {
            warn!(
                "ncm: association failed {} times, giving up",
                self.association_failures
            );
            self.exhausted = true;
            self.transition(NcmState::Disabled);
        }
    }

    /// Returns `false` when the notice does not fit the mirror's state.
    pub(crate) fn on_connected(&mut self, cid: Cid) -> bool {
        let expected = !self.associate_only
            && matches!(self.state, NcmState::ConnectingSocket | NcmState::Associated);
        if !expected {
            warn!("ncm: unexpected connection on cid {} while {}", cid, self.state);
            return false;
        }

        self.socket_failures = 0;
        self.transition(NcmState::Connected(cid));
        true
    }

    pub(crate) fn on_connect_failed(&mut self) {
        if self.state != NcmState::ConnectingSocket {
            return;
        }

        self.socket_failures = self.socket_failures.saturating_add(1);
        if self.socket_failures >= self.limits.socket {
            warn!("ncm: connection failed {} times, giving up", self.socket_failures);
            self.transition(NcmState::Associated);
        }
    }

    pub(crate) fn on_socket_closed(&mut self, cid: Cid) {
        if self.state == NcmState::Connected(cid) {
            self.socket_failures = 0;
            self.transition(NcmState::ConnectingSocket);
        }
    }

    pub(crate) fn on_disassociated(&mut self) {
        if matches!(
            self.state,
            NcmState::Associated | NcmState::ConnectingSocket | NcmState::Connected(_)
        ) {
            self.association_failures = 0;
            self.socket_failures = 0;
            self.transition(NcmState::Associating);
        }
    }

    fn transition(&mut self, next: NcmState) {
        if self.state != next {
            debug!("ncm: {} -> {}", self.state, next);
            self.state = next;
        }
    }
}

impl<E: CommandEngine> Module<E> {
    /// Stages the network the connection manager should join.
    ///
    /// Only stores the settings; nothing is started.
    pub fn set_auto_associate(
        &mut self,
        ssid: &str,
        options: AutoAssociateOptions,
    ) -> Result<(), Error> {
        let ssid = crate::profile::to_ssid(ssid)?;
        self.command(format_args!(
            "AT+WAUTO={},\"{}\",{},{}",
            options.mode as u8,
            ssid,
            OrEmpty(options.bssid),
            options.channel
        ))?;
        self.profile.auto_association = Some(AutoAssociation { ssid, options });
        Ok(())
    }

    /// Stages a client connection to `ip:port`.
    pub fn set_auto_connect_client(
        &mut self,
        ip: Ipv4Addr,
        port: u16,
        protocol: Protocol,
    ) -> Result<(), Error> {
        self.command(format_args!(
            "AT+NAUTO=0,{},{},{}",
            protocol as u8, ip, port
        ))?;
        self.profile.auto_target = Some(AutoTarget::Client {
            host: RemoteHost::Address(ip),
            port,
            protocol,
        });
        Ok(())
    }

    /// Stages a client connection to a host name the manager resolves
    /// itself.
    pub fn set_auto_connect_client_host(
        &mut self,
        name: &str,
        port: u16,
        protocol: Protocol,
    ) -> Result<(), Error> {
        let name = crate::profile::to_host_name(name)?;
        self.command(format_args!(
            "AT+NAUTO=0,{},{},{}",
            protocol as u8, name, port
        ))?;
        self.profile.auto_target = Some(AutoTarget::Client {
            host: RemoteHost::Name(name),
            port,
            protocol,
        });
        Ok(())
    }

    /// Stages a server socket on the local `port`.
    pub fn set_auto_connect_server(&mut self, port: u16, protocol: Protocol) -> Result<(), Error> {
        self.command(format_args!("AT+NAUTO=1,{},,{}", protocol as u8, port))?;
        self.profile.auto_target = Some(AutoTarget::Server { port, protocol });
        Ok(())
    }

    /// Starts or stops the connection manager.
    ///
    /// Enabling needs a staged auto-association target, plus an auto-connect
    /// target unless `associate_only` is set; otherwise
    /// [`Error::IncompleteProfile`] is returned and nothing is sent. Staged
    /// static addressing is pushed first when DHCP is off.
    ///
    /// Stopping the manager hands its connection, if any, over to the host.
    pub fn set_ncm(&mut self, activation: NcmActivation) -> Result<(), Error> {
        if activation.enabled {
            self.profile.check_ncm_ready(activation.associate_only)?;
            self.push_staged_addressing()?;
        }

        self.command(format_args!(
            "AT+NCMAUTO={},{},{},{}",
            activation.mode as u8,
            activation.enabled as u8,
            activation.level(),
            activation.remember as u8
        ))?;
        self.profile.ncm = activation;

        if activation.enabled {
            self.ncm.set_limits(self.profile.retry_limits());
            self.ncm.enable(activation.associate_only);
            info!("ncm enabled");
        } else {
            self.ncm.disable();
            if let Some(cid) = self.registry.ncm_connection().map(|c| c.cid()) {
                if let Some(connection) = self.registry.get_mut(cid) {
                    connection.set_owner(Owner::Host);
                }
                debug!("cid {} handed to host", cid);
            }
            info!("ncm disabled");
        }
        Ok(())
    }

    /// Tunes a connection manager parameter.
    ///
    /// Periods must be at least 1; retry counts accept 0, which the host
    /// mirror resolves to the module default.
    pub fn set_ncm_param(&mut self, param: NcmParam, value: u16) -> Result<(), Error> {
        param.validate(value)?;
        self.command(format_args!("AT+NCMAUTOCONF={},{}", param.id(), value))?;
        self.profile.ncm_params.set(param, value);
        self.ncm.set_limits(self.profile.retry_limits());
        Ok(())
    }

    /// The connection manager mirror.
    pub fn ncm(&self) -> &Ncm {
        &self.ncm
    }

    /// Shorthand for `ncm().state()`.
    pub fn ncm_state(&self) -> NcmState {
        self.ncm.state()
    }
}
