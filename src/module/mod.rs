//! The driver facade.
//!
//! [`Module`] owns the command engine together with everything the host
//! mirrors about the radio: the connection registry, the staged profile, the
//! connection manager state, the certificate catalog and the link state.
//! Operations live next to the state they touch (`connection`, `profile`,
//! `ncm`, `tls`, `resolve`); this module only holds the shared plumbing.
//!
//! # Out-of-band notices
//!
//! The module reports peer closures, link loss and connection manager
//! progress between replies. The engine queues them and the host applies them
//! with [`Module::poll_events`], typically once per main loop iteration:
//!
//! ```rust,no_run
//! # use gs_wifi::command::{CommandEngine, CommandError, Reply};
//! # struct Engine;
//! # impl CommandEngine for Engine {
//! #     fn execute(&mut self, _r: &str) -> Result<Reply, CommandError> { Ok(Reply::new()) }
//! #     fn execute_with_payload(
//! #         &mut self,
//! #         _r: &str,
//! #         _p: &[u8],
//! #     ) -> Result<Reply, CommandError> {
//! #         Ok(Reply::new())
//! #     }
//! # }
//! use gs_wifi::Module;
//!
//! # fn main() -> Result<(), gs_wifi::Error> {
//! let mut module = Module::new(Engine);
//! loop {
//!     module.poll_events()?;
//!     // ... application work ...
//! #   break;
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

use core::net::SocketAddrV4;

use crate::command::{CommandEngine, CommandError, Event, Reply, Request, format_request};
use crate::connection::{Cid, Connection, Owner, Protocol, Registry, Role};
use crate::error::Error;
use crate::ncm::{AutoTarget, Ncm, RemoteHost};
use crate::profile::{IpConfig, NetworkProfile};
use crate::tls::CertificateStore;


/// A GS1011 module driven through a [`CommandEngine`].
#[derive(Debug)]
pub struct Module<E: CommandEngine> {
    engine: E,
    pub(crate) registry: Registry,
    pub(crate) profile: NetworkProfile,
    pub(crate) ncm: Ncm,
    pub(crate) certs: CertificateStore,
    pub(crate) associated: bool,
    pub(crate) ip_config: Option<IpConfig>,
    pub(crate) time_synced: bool,
}

impl<E: CommandEngine> Module<E> {
    /// Wraps an engine. The host mirror starts out empty: not associated,
    /// no connections, default profile.
    pub fn new(engine: E) -> Self {
        let profile = NetworkProfile::default();
        let ncm = Ncm::new(profile.retry_limits());
        Self {
            engine,
            registry: Registry::new(),
            profile,
            ncm,
            certs: CertificateStore::new(),
            associated: false,
            ip_config: None,
            time_synced: false,
        }
    }

    /// The engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine, mutably. Use it for the data path; configuration requests
    /// sent this way bypass the host mirror.
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Gives the engine back.
    pub fn release(self) -> E {
        self.engine
    }

    /// Open connections.
    pub fn connections(&self) -> &Registry {
        &self.registry
    }

    /// Uploaded certificates.
    pub fn certificates(&self) -> &CertificateStore {
        &self.certs
    }

    /// `true` while the Wi-Fi link is up.
    pub fn is_associated(&self) -> bool {
        self.associated
    }

    /// Address configuration of the current link, when known.
    pub fn ip_config(&self) -> Option<&IpConfig> {
        self.ip_config.as_ref()
    }

    /// `true` once a time sync succeeded.
    pub fn is_time_synced(&self) -> bool {
        self.time_synced
    }

    /// Applies every notice the engine has queued. Returns how many were
    /// handled.
    ///
    /// Stops at the first notice whose follow-up request fails; later
    /// notices stay queued in the engine.
    pub fn poll_events(&mut self) -> Result<usize, Error> {
        let mut handled = 0;
        while let Some(event) = self.engine.poll_event() {
            self.handle_event(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    /// Applies one out-of-band notice to the host mirror.
    ///
    /// An association by the connection manager pushes staged static
    /// addressing when DHCP is off, which is the only notice that sends a
    /// request. The mirror is updated before that request goes out.
    pub fn handle_event(&mut self, event: Event) -> Result<(), Error> {
        trace!("event {}", event);
        match event {
            Event::Disconnected(cid) => {
                if self.registry.remove(cid).is_some() {
                    debug!("cid {} closed by module", cid);
                }
                self.ncm.on_socket_closed(cid);
            }
            Event::Disassociated => {
                info!("link lost");
                self.link_down();
            }
            Event::NcmAssociated => {
                self.associated = true;
                self.ncm.on_associated();
                self.push_staged_addressing()?;
                if !self.profile.dhcp() {
                    self.ip_config = self.profile.static_ip;
                }
            }
            Event::NcmAssociationFailed => self.ncm.on_association_failed(),
            Event::NcmConnected(cid) => self.on_ncm_connected(cid),
            Event::NcmConnectFailed => self.ncm.on_connect_failed(),
        }
        Ok(())
    }

    pub(crate) fn link_down(&mut self) {
        self.associated = false;
        self.ip_config = None;
        let dropped = self.registry.clear();
        if dropped > 0 {
            debug!("dropped {} connections with the link", dropped);
        }
        self.ncm.on_disassociated();
    }

    fn on_ncm_connected(&mut self, cid: Cid) {
        let pending = match self.profile.auto_target() {
            Some(AutoTarget::Server { port, protocol }) => {
                Connection::requested(*protocol, Role::Server, None, Some(*port), Owner::Ncm)
            }
            Some(AutoTarget::Client {
                host,
                port,
                protocol,
            }) => {
                let remote = match host {
                    RemoteHost::Address(ip) => Some(SocketAddrV4::new(*ip, *port)),
                    RemoteHost::Name(_) => None,
                };
                Connection::requested(*protocol, Role::Client, remote, None, Owner::Ncm)
            }
            None => Connection::requested(Protocol::Tcp, Role::Client, None, None, Owner::Ncm),
        };

        if let Err(err) = self.insert_connection(pending.open(cid)) {
            error!("cannot track ncm cid {}: {}", cid, err);
            return;
        }
        if !self.ncm.on_connected(cid) {
            debug!("ncm state {} kept", self.ncm.state());
        }
    }

    /// Sends one request and waits for its reply.
    pub(crate) fn command(&mut self, args: core::fmt::Arguments<'_>) -> Result<Reply, Error> {
        let request = format_request(args)?;
        trace!("-> {}", request.as_str());
        finish(&request, self.engine.execute(&request))
    }

    /// Like [`Module::command`], but only the command name is logged.
    pub(crate) fn command_secret(
        &mut self,
        args: core::fmt::Arguments<'_>,
    ) -> Result<Reply, Error> {
        let request = format_request(args)?;
        trace!("-> {} (redacted)", verb(&request));
        finish(&request, self.engine.execute(&request))
    }

    /// Sends one request followed by a bulk data payload.
    pub(crate) fn command_with_payload(
        &mut self,
        args: core::fmt::Arguments<'_>,
        payload: &[u8],
    ) -> Result<Reply, Error> {
        let request = format_request(args)?;
        trace!("-> {} (+{} bytes)", request.as_str(), payload.len());
        finish(&request, self.engine.execute_with_payload(&request, payload))
    }
}

fn finish(request: &Request, result: Result<Reply, CommandError>) -> Result<Reply, Error> {
    match result {
        Ok(reply) => Ok(reply),
        Err(CommandError::Rejected(code)) => {
            debug!("{} rejected: {}", verb(request), code);
            Err(Error::Rejected(code))
        }
        Err(CommandError::Transport) => {
            error!("link to module lost during {}", verb(request));
            Err(Error::Transport)
        }
    }
}

/// The command name of a request, without its arguments.
fn verb(request: &str) -> &str {
    request.split('=').next().unwrap_or(request)
}
