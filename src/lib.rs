//! # gs-wifi - GainSpan serial-to-Wi-Fi driver
//!
//! A `no_std` driver for GainSpan GS1011 family modules, which expose Wi-Fi,
//! a TCP/IP stack and TLS through a textual AT command protocol over a
//! serial link. The driver mirrors what it told the module so callers can
//! reason about the radio without reading settings back.
//!
//! ## Features
//!
//! ### Connections
//! - TCP clients, UDP clients and UDP listeners keyed by module-assigned
//!   connection ids ([`Cid`])
//! - A registry that tracks every open cid and follows peer closures and
//!   link loss
//!
//! ### Network configuration
//! - Security modes, WPA/WEP passphrases and PSK precomputation
//! - DHCP or static addressing, with static settings held back until they
//!   can take effect
//! - Flash profile save/load and timing parameters
//!
//! ### Network Connection Manager
//! - Autonomous associate-and-connect with a host-side state mirror and
//!   bounded retries
//!
//! ### TLS, time and names
//! - CA certificate upload and TLS upgrade of open connections
//! - SNTP time sync and DNS lookups
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────── Module<E> ─────────────────────────┐
//! │  Registry   NetworkProfile   Ncm   CertificateStore   link  │
//! └──────────────────────────────┬──────────────────────────────┘
//!                                │ one request at a time
//!                     ┌──────────▼──────────┐
//!                     │  E: CommandEngine   │  serial framing, timeouts,
//!                     └─────────────────────┘  out-of-band notices
//! ```
//!
//! The byte transport and line framing are not part of this crate: callers
//! provide them by implementing [`command::CommandEngine`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::net::Ipv4Addr;
//! use gs_wifi::Module;
//! use gs_wifi::profile::{AssociateOptions, Security};
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
//!
//! # fn main() -> Result<(), gs_wifi::Error> {
//! let mut module = Module::new(Engine);
//! module.set_security(Security::WPA_PSK)?;
//! module.set_wpa_passphrase("correct horse")?;
//! module.set_dhcp(true, Some("sensor-01"))?;
//! module.associate("homenet", AssociateOptions::default())?;
//!
//! let cid = module.connect_tcp(Ipv4Addr::new(192, 168, 1, 10), 1883)?;
//! // ... exchange data through the engine ...
//! module.disconnect(cid)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Optional Features
//!
//! - `std`: implement `std::error::Error` for [`Error`]
//! - `defmt`: `defmt::Format` impls and defmt logging
//! - `log`: logging through the `log` facade (ignored when `defmt` is on)

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

#[macro_use]
mod fmt;

/// The command engine seam: request/reply types and line classification.
pub mod command;

/// Connection ids and the connection registry.
pub mod connection;

/// Error taxonomy shared by every operation.
pub mod error;

/// The [`Module`] facade.
pub mod module;

/// The network connection manager.
pub mod ncm;

/// Security, addressing and flash profile settings.
pub mod profile;

/// Time sync and DNS lookups.
pub mod resolve;

/// TLS upgrade and CA certificates.
pub mod tls;

pub use connection::Cid;
pub use error::Error;
pub use module::Module;
