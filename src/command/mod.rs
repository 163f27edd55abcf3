//! Command engine seam.
//!
//! The driver never touches the serial link itself. Everything it does goes
//! through a [`CommandEngine`]: a blocking, single-outstanding-request
//! primitive that sends one AT request, waits for the terminal `OK` or error
//! line, and hands back the data lines in between as a [`Reply`].
//!
//! ```text
//! ┌──────────────┐  request   ┌──────────────────┐  bytes  ┌──────────┐
//! │  Module<E>   │──────────▶│  CommandEngine   │───────▶│  GS1011  │
//! │  (this crate)│◀──────────│  (caller-owned)  │◀───────│  module  │
//! └──────────────┘   Reply    └──────────────────┘         └──────────┘
//!         ▲                            │
//!         └──────── poll_event ────────┘   out-of-band notices
//! ```
//!
//! Implementors typically classify incoming lines with [`parse::classify`]:
//! terminal lines end the request, [`Event`] lines are queued for
//! [`CommandEngine::poll_event`], everything else is a data line.

#![deny(unsafe_code)]

use core::fmt::Write;

use heapless::{String, Vec};

use crate::connection::Cid;
use crate::error::Error;

/// Engine-level error type
pub mod error;

/// Pure line classification helpers for engine implementors
pub mod parse;

pub use error::{CommandError, ErrorCode};

/// Maximum length of a single reply line (without the line terminator).
pub const MAX_LINE_LEN: usize = 128;

/// Maximum number of data lines kept per reply.
pub const MAX_REPLY_LINES: usize = 8;

/// Maximum length of a formatted request line.
pub const MAX_REQUEST_LEN: usize = 192;

/// A single reply line.
pub type Line = String<MAX_LINE_LEN>;

/// A formatted request line, ready for the engine.
pub type Request = String<MAX_REQUEST_LEN>;

/// Data lines returned with a terminal `OK`.
///
/// The terminal status itself is not stored: an `Ok(Reply)` from the engine
/// already means the module answered `OK`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    lines: Vec<Line, MAX_REPLY_LINES>,
}

impl Reply {
    /// Creates an empty reply (a bare `OK`).
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Builds a reply from a list of data lines.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gs_wifi::command::Reply;
    ///
    /// let reply = Reply::from_lines(&["CONNECT 3"]).unwrap();
    /// assert_eq!(reply.value("CONNECT"), Some("3"));
    /// ```
    pub fn from_lines(lines: &[&str]) -> Result<Self, Error> {
        let mut reply = Self::new();
        for line in lines {
            reply.push_line(line)?;
        }
        Ok(reply)
    }

    /// Appends a data line.
    pub fn push_line(&mut self, line: &str) -> Result<(), Error> {
        let line = Line::try_from(line).map_err(|_| Error::BufferOverflow)?;
        self.lines.push(line).map_err(|_| Error::BufferOverflow)
    }

    /// Iterates over the data lines in the order they were received.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(|line| line.as_str())
    }

    /// Number of data lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// `true` for a bare `OK`.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the remainder of the first line starting with `prefix`, with
    /// any `:` separator and surrounding whitespace removed.
    pub fn value(&self, prefix: &str) -> Option<&str> {
        self.lines().find_map(|line| {
            line.trim()
                .strip_prefix(prefix)
                .map(|rest| rest.trim_start_matches(':').trim())
        })
    }
}

/// Out-of-band notices the module emits between replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The module closed a connection on its own (peer reset, timeout).
    Disconnected(Cid),
    /// The Wi-Fi link went down.
    Disassociated,
    /// The connection manager finished association (L2 and L3).
    NcmAssociated,
    /// One connection manager association attempt failed.
    NcmAssociationFailed,
    /// The connection manager brought up its socket.
    NcmConnected(Cid),
    /// One connection manager socket attempt failed.
    NcmConnectFailed,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Event {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Event::Disconnected(cid) => defmt::write!(f, "Disconnected({})", cid),
            Event::Disassociated => defmt::write!(f, "Disassociated"),
            Event::NcmAssociated => defmt::write!(f, "NcmAssociated"),
            Event::NcmAssociationFailed => defmt::write!(f, "NcmAssociationFailed"),
            Event::NcmConnected(cid) => defmt::write!(f, "NcmConnected({})", cid),
            Event::NcmConnectFailed => defmt::write!(f, "NcmConnectFailed"),
        }
    }
}

impl core::fmt::Display for Event {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Event::Disconnected(cid) => write!(f, "Disconnected({})", cid),
            Event::Disassociated => f.write_str("Disassociated"),
            Event::NcmAssociated => f.write_str("NcmAssociated"),
            Event::NcmAssociationFailed => f.write_str("NcmAssociationFailed"),
            Event::NcmConnected(cid) => write!(f, "NcmConnected({})", cid),
            Event::NcmConnectFailed => f.write_str("NcmConnectFailed"),
        }
    }
}

/// The blocking request/reply primitive the driver is built on.
///
/// Exactly one request is in flight at a time and a request cannot be
/// cancelled once issued. Implementations own the serial link, line framing
/// and byte-level timeouts.
pub trait CommandEngine {
    /// Sends `request` and blocks until the terminal reply.
    ///
    /// Returns the data lines on `OK`, [`CommandError::Rejected`] on an error
    /// reply and [`CommandError::Transport`] when the link is gone.
    fn execute(&mut self, request: &str) -> Result<Reply, CommandError>;

    /// Sends `request`, then streams `payload` as a bulk data transfer
    /// (`ESC W` followed by the raw bytes) and blocks until the terminal
    /// reply.
    fn execute_with_payload(&mut self, request: &str, payload: &[u8])
    -> Result<Reply, CommandError>;

    /// Returns the next out-of-band notice collected since the last call.
    ///
    /// Connection manager events are the engine's to produce; the line
    /// classifier does not recognise them.
    fn poll_event(&mut self) -> Option<Event> {
        None
    }
}

impl<T: CommandEngine + ?Sized> CommandEngine for &mut T {
    fn execute(&mut self, request: &str) -> Result<Reply, CommandError> {
        (**self).execute(request)
    }

    fn execute_with_payload(
        &mut self,
        request: &str,
        payload: &[u8],
    ) -> Result<Reply, CommandError> {
        (**self).execute_with_payload(request, payload)
    }

    fn poll_event(&mut self) -> Option<Event> {
        (**self).poll_event()
    }
}

/// Renders a request into a bounded buffer.
///
/// Nothing is sent when the request does not fit.
pub fn format_request(args: core::fmt::Arguments<'_>) -> Result<Request, Error> {
    let mut request = Request::new();
    request
        .write_fmt(args)
        .map_err(|_| Error::BufferOverflow)?;
    Ok(request)
}

/// Renders an optional value, or nothing for `None`.
pub(crate) struct OrEmpty<T>(pub Option<T>);

impl<T: core::fmt::Display> core::fmt::Display for OrEmpty<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match &self.0 {
            Some(value) => value.fmt(f),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests;
