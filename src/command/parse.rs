//! Line classification for engine implementors.
//!
//! A GS1011 reply is a sequence of lines ending in a terminal status.
//! Unsolicited notices can show up between (or inside) replies and must be
//! set aside rather than treated as data.

use super::{ErrorCode, Event};
use crate::connection::Cid;

/// What a single received line means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Terminal `OK`.
    Ok,
    /// Terminal error reply.
    Error(ErrorCode),
    /// Unsolicited notice.
    Event(Event),
    /// Anything else, kept as a reply data line.
    Data(&'a str),
}

impl LineKind<'_> {
    /// `true` for lines that end a request.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LineKind::Ok | LineKind::Error(_))
    }
}

/// Classifies one line received from the module.
///
/// Only the notices with a fixed serial form are recognised: `DISCONNECT <cid>`
/// and the disassociation notice. The connection manager reports progress
/// through status queries rather than unsolicited lines, so
/// [`Event::NcmAssociated`], [`Event::NcmAssociationFailed`],
/// [`Event::NcmConnected`] and [`Event::NcmConnectFailed`] never come out of
/// here. An engine that runs the manager queues them from its own status
/// tracking.
///
/// # Examples
///
/// ```rust
/// use gs_wifi::command::Event;
/// use gs_wifi::command::parse::{classify, LineKind};
/// use gs_wifi::connection::Cid;
///
/// assert_eq!(classify("OK"), LineKind::Ok);
/// assert_eq!(
///     classify("DISCONNECT 4"),
///     LineKind::Event(Event::Disconnected(Cid::new(4).unwrap()))
/// );
/// assert_eq!(classify("IP:10.0.0.1"), LineKind::Data("IP:10.0.0.1"));
/// ```
pub fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim();

    if trimmed == "OK" {
        return LineKind::Ok;
    }
    if let Some(code) = ErrorCode::from_line(trimmed) {
        return LineKind::Error(code);
    }
    if let Some(cid) = trimmed
        .strip_prefix("DISCONNECT")
        .and_then(|rest| Cid::from_wire(rest.trim()))
    {
        return LineKind::Event(Event::Disconnected(cid));
    }
    if trimmed == "DISASSOCIATED" || trimmed.eq_ignore_ascii_case("Disassociation Event") {
        return LineKind::Event(Event::Disassociated);
    }

    LineKind::Data(trimmed)
}
