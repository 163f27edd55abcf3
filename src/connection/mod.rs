//! Connection identifiers and the connection registry.
//!
//! The module firmware owns a small fixed set of connection slots, each named
//! by a cid. The driver mirrors the slots the module reports in a
//! [`Registry`]; it never allocates a cid on its own.
//!
//! # Lifecycle
//!
//! ```text
//! Connection::requested ──CONNECT <cid>──▶ Open ──NCLOSE / DISCONNECT──▶ Closed
//!        │                                                        (removed)
//!        └── error reply: nothing recorded
//! ```
//!
//! A closed connection is never reopened. The same cid number may come back
//! later as a brand new allocation.
//!
//! # Examples
//!
//! ```rust,no_run
//! use core::net::Ipv4Addr;
//! use gs_wifi::{Cid, Module};
//! # use gs_wifi::command::{CommandEngine, CommandError, Reply};
//! # struct Engine;
//! # impl CommandEngine for Engine {
//! #     fn execute(&mut self, _request: &str) -> Result<Reply, CommandError> { Ok(Reply::new()) }
//! #     fn execute_with_payload(
//! #         &mut self,
//! #         _r: &str,
//! #         _p: &[u8],
//! #     ) -> Result<Reply, CommandError> {
//! #         Ok(Reply::new())
//! #     }
//! # }
//!
//! let mut module = Module::new(Engine);
//! let cid = Cid::or_invalid(module.connect_tcp(Ipv4Addr::new(10, 0, 0, 5), 80));
//! if cid.is_valid() {
//!     module.disconnect(cid).ok();
//! }
//! ```

#![deny(unsafe_code)]

use core::net::{Ipv4Addr, SocketAddrV4};

use crate::command::{CommandEngine, Reply};
use crate::error::Error;
use crate::module::Module;
use crate::tls::CertName;

mod registry;

pub use registry::Registry;

/// Number of connection slots the module provides.
pub const MAX_CONNECTIONS: usize = 16;

/// A connection identifier reported by the module.
///
/// Valid cids are `0..MAX_CONNECTIONS`. [`Cid::INVALID`] is the sentinel for
/// "no connection" and never names a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid(u8);

impl Cid {
    /// The "no connection" sentinel.
    pub const INVALID: Cid = Cid(0xFF);

    /// Wraps a raw slot number, or returns `None` when it is out of range.
    pub const fn new(raw: u8) -> Option<Cid> {
        if (raw as usize) < MAX_CONNECTIONS {
            Some(Cid(raw))
        } else {
            None
        }
    }

    /// The raw slot number.
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// `false` only for [`Cid::INVALID`].
    pub const fn is_valid(self) -> bool {
        (self.0 as usize) < MAX_CONNECTIONS
    }

    /// Parses the hex form the module uses on the wire (`"3"`, `"a"`).
    pub fn from_wire(text: &str) -> Option<Cid> {
        if text.is_empty() || text.len() > 2 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u8::from_str_radix(text, 16).ok().and_then(Cid::new)
    }

    /// Collapses a connection result into the sentinel form: the cid on
    /// success, [`Cid::INVALID`] on any error.
    pub fn or_invalid(result: Result<Cid, Error>) -> Cid {
        result.unwrap_or(Cid::INVALID)
    }
}

/// Wire form: one lowercase hex digit.
impl core::fmt::Display for Cid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:x}", self.0)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Cid {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=u8:x}", self.0)
    }
}

/// Transport protocol of a connection. The discriminants are wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// UDP
    Udp = 0,
    /// TCP
    Tcp = 1,
}

/// What a connection slot is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Outgoing connection (or a UDP socket bound to one remote endpoint).
    Client,
    /// Server socket set up by the connection manager.
    Server,
    /// Listening UDP socket.
    Listener,
}

/// Lifecycle of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// The setup request is about to be sent; no cid yet.
    Requested,
    /// The module reported a cid.
    Open,
    /// The slot was released. Terminal.
    Closed,
}

/// Who drives a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    /// Opened through [`Module::connect_tcp`] and friends.
    Host,
    /// Opened autonomously by the network connection manager.
    Ncm,
}

/// Metadata the driver keeps for one connection slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    cid: Cid,
    protocol: Protocol,
    role: Role,
    remote: Option<SocketAddrV4>,
    local_port: Option<u16>,
    state: ConnectionState,
    owner: Owner,
    tls: Option<CertName>,
}

impl Connection {
    /// Describes a connection that is about to be requested.
    pub fn requested(
        protocol: Protocol,
        role: Role,
        remote: Option<SocketAddrV4>,
        local_port: Option<u16>,
        owner: Owner,
    ) -> Self {
        Self {
            cid: Cid::INVALID,
            protocol,
            role,
            remote,
            local_port,
            state: ConnectionState::Requested,
            owner,
            tls: None,
        }
    }

    pub(crate) fn open(mut self, cid: Cid) -> Self {
        debug_assert_eq!(self.state, ConnectionState::Requested);
        self.cid = cid;
        self.state = ConnectionState::Open;
        self
    }

    pub(crate) fn close(mut self) -> Self {
        self.state = ConnectionState::Closed;
        self
    }

    pub(crate) fn set_owner(&mut self, owner: Owner) {
        self.owner = owner;
    }

    pub(crate) fn set_tls(&mut self, certificate: CertName) {
        self.tls = Some(certificate);
    }

    /// The slot this connection occupies ([`Cid::INVALID`] while requested).
    pub fn cid(&self) -> Cid {
        self.cid
    }

    /// Transport protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Client, server or listener.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Remote endpoint, if the slot is bound to one.
    pub fn remote(&self) -> Option<SocketAddrV4> {
        self.remote
    }

    /// Local port, if one was requested.
    pub fn local_port(&self) -> Option<u16> {
        self.local_port
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// `true` while the slot is allocated.
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Host or connection manager.
    pub fn owner(&self) -> Owner {
        self.owner
    }

    /// Name of the CA certificate the TLS session was validated against.
    pub fn tls_certificate(&self) -> Option<&str> {
        self.tls.as_ref().map(|name| name.as_str())
    }
}

impl<E: CommandEngine> Module<E> {
    /// Opens a TCP connection to `ip:port`.
    ///
    /// Returns the cid the module assigned. When the module is out of slots
    /// the rejection is passed through as [`Error::Rejected`].
    pub fn connect_tcp(&mut self, ip: Ipv4Addr, port: u16) -> Result<Cid, Error> {
        let pending = Connection::requested(
            Protocol::Tcp,
            Role::Client,
            Some(SocketAddrV4::new(ip, port)),
            None,
            Owner::Host,
        );
        let reply = self.command(format_args!("AT+NCTCP={},{}", ip, port))?;
        self.record_connection(pending, &reply)
    }

    /// Binds a UDP slot to `ip:port`.
    ///
    /// Nothing is transmitted: every later write on the cid becomes exactly
    /// one datagram to that endpoint. With `local_port` set to `None` the
    /// module picks the source port.
    pub fn connect_udp(
        &mut self,
        ip: Ipv4Addr,
        port: u16,
        local_port: Option<u16>,
    ) -> Result<Cid, Error> {
        let pending = Connection::requested(
            Protocol::Udp,
            Role::Client,
            Some(SocketAddrV4::new(ip, port)),
            local_port,
            Owner::Host,
        );
        let reply = match local_port {
            Some(local) => self.command(format_args!("AT+NCUDP={},{},{}", ip, port, local))?,
            None => self.command(format_args!("AT+NCUDP={},{}", ip, port))?,
        };
        self.record_connection(pending, &reply)
    }

    /// Opens a UDP listener on `port`.
    pub fn listen_udp(&mut self, port: u16) -> Result<Cid, Error> {
        let pending =
            Connection::requested(Protocol::Udp, Role::Listener, None, Some(port), Owner::Host);
        let reply = self.command(format_args!("AT+NSUDP={}", port))?;
        self.record_connection(pending, &reply)
    }

    /// Closes a connection opened by the host.
    ///
    /// An unknown cid fails with [`Error::InvalidHandle`] and a cid owned by
    /// the connection manager with [`Error::NcmOwned`]; neither sends a
    /// request. When the module rejects the close, the entry stays in place
    /// so the caller can retry.
    pub fn disconnect(&mut self, cid: Cid) -> Result<(), Error> {
        let owner = self
            .registry
            .get(cid)
            .map(|connection| connection.owner())
            .ok_or(Error::InvalidHandle)?;
        if owner == Owner::Ncm {
            return Err(Error::NcmOwned);
        }

        self.command(format_args!("AT+NCLOSE={}", cid))?;
        self.registry.remove(cid);
        debug!("cid {} closed", cid);
        Ok(())
    }

    /// Closes every connection, including the connection manager's.
    pub fn disconnect_all(&mut self) -> Result<(), Error> {
        self.command(format_args!("AT+NCLOSEALL"))?;
        let dropped = self.registry.clear();
        if let Some(cid) = self.ncm.connected_cid() {
            self.ncm.on_socket_closed(cid);
        }
        debug!("closed all connections ({})", dropped);
        Ok(())
    }

    fn record_connection(&mut self, pending: Connection, reply: &Reply) -> Result<Cid, Error> {
        let Some(cid) = reply.value("CONNECT").and_then(Cid::from_wire) else {
            error!("connection accepted without a cid");
            return Err(Error::MalformedReply);
        };
        self.insert_connection(pending.open(cid))?;
        debug!("cid {} open", cid);
        Ok(cid)
    }

    pub(crate) fn insert_connection(&mut self, connection: Connection) -> Result<(), Error> {
        let cid = connection.cid();
        if let Some(stale) = self.registry.insert(connection)? {
            // The module reused a slot we still tracked: its closure notice
            // never reached us.
            warn!("cid {} reported again, dropping stale entry", cid);
            if stale.owner() == Owner::Ncm {
                self.ncm.on_socket_closed(cid);
            }
        }
        Ok(())
    }
}
